//! Test Fixtures Module
//!
//! Shared helpers for the integration tests:
//! - Recording collaborators for driving a `Scheduler` by hand
//! - Callback and observer recorders
//! - A simulated speech service

// Allow dead code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]

pub mod collaborators;

pub use collaborators::*;

use std::sync::Arc;

use parking_lot::Mutex;
use speech_queue::{
    SchedulerOptions, SimulatedEngine, SpeechObserver, SpeechProperties, SpeechService,
    StaticVoiceResolver, Transcript,
};

/// Shared log of callback and observer activity
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Log::default()
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// Properties whose callbacks append `name:start`, `name:end` or
/// `name:canceled` to `log`
pub fn tracked(log: &Log, name: &str) -> SpeechProperties {
    let start_log = log.clone();
    let end_log = log.clone();
    let start_name = name.to_string();
    let end_name = name.to_string();
    SpeechProperties::new()
        .on_start(move || start_log.lock().push(format!("{start_name}:start")))
        .on_end(move |interrupted| {
            let outcome = if interrupted { "canceled" } else { "end" };
            end_log.lock().push(format!("{end_name}:{outcome}"));
        })
}

/// Observer that appends `observer:<event>` to a log
pub struct RecordingObserver {
    log: Log,
}

impl RecordingObserver {
    pub fn new(log: &Log) -> Arc<Self> {
        Arc::new(Self { log: log.clone() })
    }
}

impl SpeechObserver for RecordingObserver {
    fn on_start(&self) {
        self.log.lock().push("observer:start".to_string());
    }

    fn on_end(&self) {
        self.log.lock().push("observer:end".to_string());
    }

    fn on_interrupted(&self) {
        self.log.lock().push("observer:interrupted".to_string());
    }
}

/// Playback speed used by service tests: one char per 10ms
pub const TEST_CHARS_PER_SECOND: f32 = 100.0;

/// Start a service over the simulated engine
pub fn simulated_service(
    options: SchedulerOptions,
    voices: &[&str],
) -> (SpeechService, Transcript) {
    let transcript = Transcript::new();
    let engine_transcript = transcript.clone();
    let resolver = Arc::new(StaticVoiceResolver::new(voices.iter().copied()));
    let service = SpeechService::start(options, resolver, move |events| {
        SimulatedEngine::new(events, TEST_CHARS_PER_SECOND, engine_transcript)
    });
    (service, transcript)
}
