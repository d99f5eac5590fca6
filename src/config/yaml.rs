use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// speech:
///   rate: 1.2
///   pitch: 1.0
///   volume: 0.8
///   voice: "alice"
///
/// queue:
///   max_chunk_chars: 1500
///
/// simulator:
///   chars_per_second: 15.0
///   voices:
///     - "alice"
///     - "bob"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub speech: Option<SpeechYaml>,
    pub queue: Option<QueueYaml>,
    pub simulator: Option<SimulatorYaml>,
}

/// Default speech parameters from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub voice: Option<String>,
}

/// Queue limits from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QueueYaml {
    pub max_chunk_chars: Option<usize>,
}

/// Simulated engine settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SimulatorYaml {
    pub chars_per_second: Option<f32>,
    pub voices: Option<Vec<String>>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
