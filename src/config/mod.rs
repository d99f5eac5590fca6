//! Configuration module for the speech scheduler
//!
//! Settings come from .env files, YAML files and environment variables.
//! Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Range checks shared with the runtime setters
//!
//! # Example
//! ```rust,no_run
//! use speech_queue::config::SchedulerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = SchedulerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("speech.yaml");
//! let config = SchedulerConfig::from_file(&config_path)?;
//!
//! println!("Chunk limit: {}", config.max_chunk_chars);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
pub mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::preferences::Preferences;
use crate::core::scheduler::{DEFAULT_MAX_CHUNK_CHARS, SchedulerOptions};
use crate::core::simulated::DEFAULT_CHARS_PER_SECOND;
use crate::core::voice::SYSTEM_VOICE;

/// Settings for the simulated engine
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Playback speed at rate 1.0
    pub chars_per_second: f32,
    /// Voice names the simulated engine advertises
    pub voices: Vec<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            chars_per_second: DEFAULT_CHARS_PER_SECOND,
            voices: vec![SYSTEM_VOICE.to_string()],
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Longest text sent to the engine in one request
    pub max_chunk_chars: usize,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub preferred_voice: Option<String>,
    pub simulator: SimulatorConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let preferences = Preferences::default();
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            rate: preferences.rate,
            pitch: preferences.pitch,
            volume: preferences.volume,
            preferred_voice: None,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables
    /// filling whatever the file leaves out
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable is malformed, or the merged values are out of range.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env values are already in the environment (loaded in main.rs).
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(self.rate, self.pitch, self.volume)
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_chunk_chars: self.max_chunk_chars,
            preferences: self.preferences(),
            preferred_voice: self.preferred_voice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn cleanup_env_vars() {
        unsafe {
            std::env::remove_var("SPEECH_MAX_CHUNK_CHARS");
            std::env::remove_var("SPEECH_RATE");
            std::env::remove_var("SPEECH_PITCH");
            std::env::remove_var("SPEECH_VOLUME");
            std::env::remove_var("SPEECH_VOICE");
            std::env::remove_var("SPEECH_SIM_CHARS_PER_SECOND");
            std::env::remove_var("SPEECH_SIM_VOICES");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = SchedulerConfig::from_env().unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.max_chunk_chars, 1500);
        assert_eq!(config.simulator.voices, vec![SYSTEM_VOICE.to_string()]);
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("SPEECH_RATE", "1.5");
            std::env::set_var("SPEECH_VOICE", "alice");
            std::env::set_var("SPEECH_SIM_VOICES", "alice,bob");
        }

        let config = SchedulerConfig::from_env().unwrap();
        assert_eq!(config.rate, 1.5);
        assert_eq!(config.preferred_voice, Some("alice".to_string()));
        assert_eq!(config.simulator.voices, vec!["alice", "bob"]);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_out_of_range() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("SPEECH_VOLUME", "3");
        }

        let result = SchedulerConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("volume"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("speech.yaml");

        let yaml_content = r#"
speech:
  rate: 2.0
  voice: "bob"
queue:
  max_chunk_chars: 120
simulator:
  chars_per_second: 40.0
"#;
        fs::write(&config_path, yaml_content).unwrap();

        let config = SchedulerConfig::from_file(&config_path).unwrap();
        assert_eq!(config.rate, 2.0);
        assert_eq!(config.preferred_voice, Some("bob".to_string()));
        assert_eq!(config.max_chunk_chars, 120);
        assert_eq!(config.simulator.chars_per_second, 40.0);
        assert_eq!(config.pitch, 1.0);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("speech.yaml");
        fs::write(&config_path, "speech:\n  rate: 0.5\n").unwrap();

        unsafe {
            std::env::set_var("SPEECH_RATE", "3.0");
            std::env::set_var("SPEECH_PITCH", "1.5");
        }

        let config = SchedulerConfig::from_file(&config_path).unwrap();
        // YAML overrides ENV
        assert_eq!(config.rate, 0.5);
        // ENV fills the gaps
        assert_eq!(config.pitch, 1.5);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/speech.yaml");
        let result = SchedulerConfig::from_file(&config_path);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }

    #[test]
    fn test_scheduler_options() {
        let config = SchedulerConfig {
            rate: 2.0,
            preferred_voice: Some("alice".to_string()),
            max_chunk_chars: 64,
            ..Default::default()
        };

        let options = config.scheduler_options();
        assert_eq!(options.max_chunk_chars, 64);
        assert_eq!(options.preferences.rate, 2.0);
        assert_eq!(options.preferred_voice.as_deref(), Some("alice"));
    }
}
