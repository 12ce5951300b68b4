//! Shared threshold configuration for the numeric and tabular diff engines.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::DiffSeverity;

/// Thresholds classifying a pair of numeric values into none/small/big.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Absolute difference at or below which a pair is considered equal.
    pub abs_equal: f64,
    /// Relative (fractional) difference below which a pair is still
    /// considered equal.
    pub rel_small: f64,
    /// Relative difference at or above which a pair is a big diff; anything
    /// between `rel_small` and `rel_big` is small.
    pub rel_big: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            abs_equal: 1e-4,
            rel_small: 5e-3,
            rel_big: 5e-2,
        }
    }
}

impl ThresholdConfig {
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read threshold config {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse threshold config {}", path.display()))
    }

    /// Classify one value pair.
    pub fn classify(&self, a: f64, b: f64) -> DiffSeverity {
        let abs = (a - b).abs();
        if abs <= self.abs_equal {
            return DiffSeverity::None;
        }
        let denom = a.abs().max(b.abs());
        let rel = if denom > 0.0 { abs / denom } else { 0.0 };
        if rel < self.rel_small {
            DiffSeverity::None
        } else if rel >= self.rel_big {
            DiffSeverity::Big
        } else {
            DiffSeverity::Small
        }
    }
}
