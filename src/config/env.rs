//! Environment variable loading
//!
//! `.env` values are loaded into the process environment by the binary at
//! startup, so they are read here like any other variable.

use std::env;
use std::str::FromStr;

pub const MAX_CHUNK_CHARS: &str = "SPEECH_MAX_CHUNK_CHARS";
pub const RATE: &str = "SPEECH_RATE";
pub const PITCH: &str = "SPEECH_PITCH";
pub const VOLUME: &str = "SPEECH_VOLUME";
pub const VOICE: &str = "SPEECH_VOICE";
pub const SIM_CHARS_PER_SECOND: &str = "SPEECH_SIM_CHARS_PER_SECOND";
pub const SIM_VOICES: &str = "SPEECH_SIM_VOICES";

/// Values found in the environment; `None` where a variable is unset or empty
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub max_chunk_chars: Option<usize>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub voice: Option<String>,
    pub chars_per_second: Option<f32>,
    pub voices: Option<Vec<String>>,
}

impl EnvConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            max_chunk_chars: parse_var(MAX_CHUNK_CHARS)?,
            rate: parse_var(RATE)?,
            pitch: parse_var(PITCH)?,
            volume: parse_var(VOLUME)?,
            voice: string_var(VOICE),
            chars_per_second: parse_var(SIM_CHARS_PER_SECOND)?,
            voices: string_var(SIM_VOICES).map(|raw| parse_list(&raw)),
        })
    }
}

fn string_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match string_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} value '{raw}': {e}").into()),
        None => Ok(None),
    }
}

/// Split a comma separated list, dropping empty items
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
