//! Merging YAML and environment configurations

use super::env::EnvConfig;
use super::yaml::YamlConfig;
use super::{SchedulerConfig, SimulatorConfig};

/// Build a configuration from the environment with optional YAML overrides
///
/// Priority: YAML > environment > defaults.
pub fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<SchedulerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    Ok(merge(env, yaml.unwrap_or_default()))
}

pub(crate) fn merge(env: EnvConfig, yaml: YamlConfig) -> SchedulerConfig {
    let defaults = SchedulerConfig::default();
    let speech = yaml.speech.unwrap_or_default();
    let queue = yaml.queue.unwrap_or_default();
    let simulator = yaml.simulator.unwrap_or_default();

    SchedulerConfig {
        max_chunk_chars: queue
            .max_chunk_chars
            .or(env.max_chunk_chars)
            .unwrap_or(defaults.max_chunk_chars),
        rate: speech.rate.or(env.rate).unwrap_or(defaults.rate),
        pitch: speech.pitch.or(env.pitch).unwrap_or(defaults.pitch),
        volume: speech.volume.or(env.volume).unwrap_or(defaults.volume),
        preferred_voice: speech.voice.or(env.voice),
        simulator: SimulatorConfig {
            chars_per_second: simulator
                .chars_per_second
                .or(env.chars_per_second)
                .unwrap_or(defaults.simulator.chars_per_second),
            voices: simulator
                .voices
                .or(env.voices)
                .unwrap_or(defaults.simulator.voices),
        },
    }
}
