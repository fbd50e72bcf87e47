//! Plate grammar validation.
//!
//! A recognition result becomes a [`ValidatedPlate`] only if the
//! normalized text matches the grammar over the ENTIRE string and the
//! engine confidence exceeds the configured threshold. Anchoring matters:
//! a plate embedded in longer text is a partial read, not a plate.

use crate::config::PipelineConfig;
use crate::models::{RecognitionResult, ValidatedPlate};
use regex::Regex;

pub struct FormatValidator {
    grammar: Regex,
    confidence_threshold: f32,
}

impl FormatValidator {
    /// Build a validator from an unanchored grammar pattern. The pattern
    /// is wrapped in `^(?:...)$` so substring matches never validate.
    pub fn new(pattern: &str, confidence_threshold: f32) -> Result<Self, regex::Error> {
        let grammar = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            grammar,
            confidence_threshold,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, regex::Error> {
        Self::new(&config.grammar_pattern, config.confidence_threshold)
    }

    /// Trim surrounding whitespace, collapse embedded newlines to spaces,
    /// and uppercase.
    pub fn normalize(text: &str) -> String {
        text.trim().replace('\n', " ").to_uppercase()
    }

    /// `None` is a validation miss: expected, frequent, and silently
    /// ignored by the cycle loop.
    pub fn validate(&self, result: &RecognitionResult) -> Option<ValidatedPlate> {
        if result.confidence <= self.confidence_threshold {
            return None;
        }
        let normalized = Self::normalize(&result.raw_text);
        if !self.grammar.is_match(&normalized) {
            return None;
        }
        Some(ValidatedPlate {
            normalized_text: normalized,
        })
    }
}
