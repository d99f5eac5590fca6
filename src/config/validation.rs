//! Configuration validation
//!
//! The same checks guard values loaded at startup and values changed at
//! runtime through the speech handle.

use super::SchedulerConfig;

pub const MAX_RATE: f32 = 10.0;
pub const MAX_PITCH: f32 = 2.0;
pub const MAX_VOLUME: f32 = 1.0;

/// Rate must be in (0, 10]
pub fn validate_rate(rate: f32) -> Result<(), String> {
    if rate.is_finite() && rate > 0.0 && rate <= MAX_RATE {
        Ok(())
    } else {
        Err(format!("rate must be in (0, {MAX_RATE}], got {rate}"))
    }
}

/// Pitch must be in [0, 2]
pub fn validate_pitch(pitch: f32) -> Result<(), String> {
    if (0.0..=MAX_PITCH).contains(&pitch) {
        Ok(())
    } else {
        Err(format!("pitch must be in [0, {MAX_PITCH}], got {pitch}"))
    }
}

/// Volume must be in [0, 1]
pub fn validate_volume(volume: f32) -> Result<(), String> {
    if (0.0..=MAX_VOLUME).contains(&volume) {
        Ok(())
    } else {
        Err(format!("volume must be in [0, {MAX_VOLUME}], got {volume}"))
    }
}

pub fn validate_config(config: &SchedulerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_rate(config.rate)?;
    validate_pitch(config.pitch)?;
    validate_volume(config.volume)?;

    if config.max_chunk_chars == 0 {
        return Err("max_chunk_chars must be at least 1".into());
    }
    let cps = config.simulator.chars_per_second;
    if !(cps.is_finite() && cps > 0.0) {
        return Err(format!("simulator chars_per_second must be positive, got {cps}").into());
    }

    Ok(())
}
