use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use anyhow::anyhow;

use speech_queue::script::ScriptLine;
use speech_queue::{
    LoggingObserver, QueueMode, SchedulerConfig, SimulatedEngine, SpeechHandle, SpeechProperties,
    SpeechService, StaticVoiceResolver, Transcript,
};

/// Speech queue - utterance scheduler driving a simulated speech engine
#[derive(Parser, Debug)]
#[command(name = "speech-queue")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Speak the given text once
    Say {
        /// Queue mode: queue, flush, category_flush or interject
        #[arg(short = 'm', long = "mode", default_value = "queue")]
        mode: QueueMode,

        /// Text to speak
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Read speech commands from stdin, one per line
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        SchedulerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        SchedulerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    let transcript = Transcript::new();
    let resolver = Arc::new(StaticVoiceResolver::new(config.simulator.voices.clone()));
    let chars_per_second = config.simulator.chars_per_second;
    let engine_transcript = transcript.clone();
    let service = SpeechService::start(config.scheduler_options(), resolver, move |events| {
        SimulatedEngine::new(events, chars_per_second, engine_transcript)
    });

    let speech = service.handle();
    speech.add_observer(Arc::new(LoggingObserver)).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Say { mode, text } => {
            speech
                .speak(text.join(" "), mode, SpeechProperties::new())
                .await?;
        }
        Commands::Run => run_script(&speech).await?,
    }

    speech.wait_until_idle().await?;
    service.shutdown().await?;
    info!("All speech finished");

    for entry in transcript.entries() {
        let outcome = entry
            .outcome
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "pending".to_string());
        println!("[{outcome}] {}", entry.text);
    }

    Ok(())
}

async fn run_script(speech: &SpeechHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parsed = ScriptLine::parse(&line);
        match &parsed {
            ScriptLine::Speak { text, mode, .. } => {
                speech.submit(text.clone(), *mode, parsed.properties())?;
            }
            ScriptLine::Stop => speech.stop()?,
            ScriptLine::Empty => {}
        }
    }
    Ok(())
}
