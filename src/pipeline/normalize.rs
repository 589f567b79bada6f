//! Cell normalisation: strip extraction artefacts and canonicalise numbers.
//!
//! ## Rule Order
//!
//! 1. Remove every artefact marker (checkbox tokens such as `:unselected:`)
//! 2. Trim surrounding whitespace
//! 3. If the rest parses as a finite number, render it with a fixed number
//!    of decimal places; otherwise keep the trimmed text
//!
//! Markers go first so that `"12 :unselected:"` trims to `"12"` and is then
//! recognised as numeric. The result is idempotent: normalising a normalised
//! value returns it unchanged.

use crate::config::{ReconConfig, DEFAULT_ARTIFACT_MARKER};

/// Normalises cell text according to a marker list and a decimal precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellNormalizer {
    markers: Vec<String>,
    decimal_places: usize,
}

impl Default for CellNormalizer {
    fn default() -> Self {
        Self {
            markers: vec![DEFAULT_ARTIFACT_MARKER.to_string()],
            decimal_places: 2,
        }
    }
}

impl CellNormalizer {
    pub fn new(markers: Vec<String>, decimal_places: usize) -> Self {
        Self {
            markers: markers.into_iter().filter(|m| !m.is_empty()).collect(),
            decimal_places,
        }
    }

    pub fn from_config(config: &ReconConfig) -> Self {
        Self::new(config.artifact_markers.clone(), config.decimal_places)
    }

    /// Normalise one cell's raw text. Never fails.
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = self.strip_markers(raw);
        let trimmed = cleaned.trim();

        match parse_number(trimmed) {
            Some(value) => format!("{:.*}", self.decimal_places, value),
            None => trimmed.to_string(),
        }
    }

    // Repeat until no marker is left: removing one occurrence can splice
    // two fragments into a new one (":unse:unselected:lected:").
    fn strip_markers(&self, raw: &str) -> String {
        let mut out = raw.to_string();
        while let Some(marker) = self.markers.iter().find(|m| out.contains(m.as_str())) {
            out = out.replace(marker.as_str(), "");
        }
        out
    }
}

/// Normalise with the default marker list and two decimal places.
pub fn normalize_cell(raw: &str) -> String {
    CellNormalizer::default().normalize(raw)
}

fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}
