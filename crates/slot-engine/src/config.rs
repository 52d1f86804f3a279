//! Engine configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields the stock
//! behaviour: 30-minute candidate step, 1-hour conflict padding, half-hour
//! minimum chunk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::meridiem::MeridiemPolicy;

/// Weights for candidate scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: f64,
    pub energy_weight: f64,
    pub preference_weight: f64,
    /// Energy assumed for hours missing from the profile.
    pub default_energy: f64,
    /// Hour distance at which the preference term drops to zero.
    pub preference_span_hours: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            energy_weight: 0.3,
            preference_weight: 0.2,
            default_energy: 0.5,
            preference_span_hours: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub slot_step_minutes: u32,
    pub conflict_padding_minutes: u32,
    /// Chunks shorter than this are too fragmented to schedule.
    pub min_chunk_minutes: u32,
    /// Length of a non-meeting event that carries no duration.
    pub default_event_minutes: u32,
    pub calendar_id: String,
    /// Upper bound on occurrences generated per recurring entry.
    pub expansion_limit: u16,
    pub meridiem_policy: MeridiemPolicy,
    pub scoring: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_step_minutes: 30,
            conflict_padding_minutes: 60,
            min_chunk_minutes: 30,
            default_event_minutes: 60,
            calendar_id: "primary".to_string(),
            expansion_limit: 500,
            meridiem_policy: MeridiemPolicy::default(),
            scoring: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slot_step_minutes == 0 {
            return Err(EngineError::Config(
                "slot_step_minutes must be > 0".to_string(),
            ));
        }
        if self.min_chunk_minutes == 0 {
            return Err(EngineError::Config(
                "min_chunk_minutes must be > 0".to_string(),
            ));
        }
        if self.default_event_minutes == 0 {
            return Err(EngineError::Config(
                "default_event_minutes must be > 0".to_string(),
            ));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(EngineError::Config(
                "calendar_id must not be empty".to_string(),
            ));
        }
        if !(self.scoring.default_energy.is_finite()
            && (0.0..=1.0).contains(&self.scoring.default_energy))
        {
            return Err(EngineError::Config(
                "scoring.default_energy must be within [0, 1]".to_string(),
            ));
        }
        if self.scoring.preference_span_hours <= 0.0 {
            return Err(EngineError::Config(
                "scoring.preference_span_hours must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
