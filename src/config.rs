//! Pipeline configuration.
//!
//! Every heuristic constant the pipeline relies on lives here with its
//! default: region-selection bounds, the confidence threshold, the
//! required vote streak, the cycle cadence, and the plate grammar.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Lower bound (exclusive) on candidate aspect ratio (width/height).
    #[serde(default = "default_min_aspect")]
    pub min_aspect_ratio: f32,

    /// Upper bound (exclusive) on candidate aspect ratio.
    #[serde(default = "default_max_aspect")]
    pub max_aspect_ratio: f32,

    /// Minimum candidate area in px² at the working resolution.
    #[serde(default = "default_min_region_area")]
    pub min_region_area: u32,

    /// Recognition confidence a result must exceed to validate, 0–100.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Consecutive agreeing cycles required before a plate locks.
    #[serde(default = "default_required_streak")]
    pub required_streak: u32,

    /// Pause between the end of one cycle and the start of the next,
    /// in milliseconds.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Plate grammar as a regex over the normalized text. Anchoring is
    /// applied by the validator; do not include `^`/`$` here.
    #[serde(default = "default_grammar_pattern")]
    pub grammar_pattern: String,

    /// Separator character the charset admits alongside A-Z and 0-9.
    #[serde(default = "default_separator")]
    pub plate_separator: char,
}

fn default_min_aspect() -> f32 {
    2.0
}

fn default_max_aspect() -> f32 {
    5.0
}

fn default_min_region_area() -> u32 {
    1000
}

fn default_confidence_threshold() -> f32 {
    50.0
}

fn default_required_streak() -> u32 {
    2
}

fn default_cycle_interval_ms() -> u64 {
    800
}

fn default_grammar_pattern() -> String {
    "[A-Z]{3}-[0-9]{4}".to_string()
}

fn default_separator() -> char {
    '-'
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_aspect_ratio: default_min_aspect(),
            max_aspect_ratio: default_max_aspect(),
            min_region_area: default_min_region_area(),
            confidence_threshold: default_confidence_threshold(),
            required_streak: default_required_streak(),
            cycle_interval_ms: default_cycle_interval_ms(),
            grammar_pattern: default_grammar_pattern(),
            plate_separator: default_separator(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file. Missing fields fall back to
    /// their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.required_streak, 2);
        assert_eq!(config.confidence_threshold, 50.0);
        assert_eq!(config.min_region_area, 1000);
        assert_eq!(config.grammar_pattern, "[A-Z]{3}-[0-9]{4}");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "required_streak": 3 }"#).unwrap();
        assert_eq!(config.required_streak, 3);
        assert_eq!(config.cycle_interval_ms, 800);
    }
}
