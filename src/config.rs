//! Calculator configuration
//!
//! Tunables shared by the calculator and anything that renders its output.
//! Defaults are the production values; a JSON file may override any subset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Minimum deal count before a pool counts as adequate support
pub const MIN_SUPPORT_N: usize = 15;

/// Maximum adjacency hops before falling back to statewide data
pub const MAX_HOPS: usize = 2;

/// Tunables for `recommend_with_config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Sample-size floor for the support set
    #[serde(default = "default_min_support_n")]
    pub min_support_n: usize,

    /// Adjacency expansion limit
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Target cut-loose rate for the caution cliff
    #[serde(default = "default_cliff_80")]
    pub cliff_caution_rate: f64,

    /// Target cut-loose rate for the hard cliff
    #[serde(default = "default_cliff_90")]
    pub cliff_hard_rate: f64,

    /// Tail rate at the input price that forces red on its own
    #[serde(default = "default_cliff_90")]
    pub tail_red_rate: f64,

    /// Green only when price <= multiplier × average sold price
    #[serde(default = "default_guardrail")]
    pub guardrail_multiplier: f64,

    /// County slice size needed before bins use county data
    #[serde(default = "default_min_support_n")]
    pub county_bins_min_n: usize,
}

fn default_min_support_n() -> usize {
    MIN_SUPPORT_N
}

fn default_max_hops() -> usize {
    MAX_HOPS
}

fn default_cliff_80() -> f64 {
    0.80
}

fn default_cliff_90() -> f64 {
    0.90
}

fn default_guardrail() -> f64 {
    1.10
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            min_support_n: MIN_SUPPORT_N,
            max_hops: MAX_HOPS,
            cliff_caution_rate: default_cliff_80(),
            cliff_hard_rate: default_cliff_90(),
            tail_red_rate: default_cliff_90(),
            guardrail_multiplier: default_guardrail(),
            county_bins_min_n: MIN_SUPPORT_N,
        }
    }
}

impl CalculatorConfig {
    /// Load configuration from a JSON file, filling omitted fields with defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read calculator config: {:?}", path))?;

        let config: CalculatorConfig = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse calculator config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the precedence rules meaningless
    pub fn validate(&self) -> Result<()> {
        if self.min_support_n == 0 {
            anyhow::bail!("min_support_n must be at least 1");
        }

        for (name, rate) in [
            ("cliff_caution_rate", self.cliff_caution_rate),
            ("cliff_hard_rate", self.cliff_hard_rate),
            ("tail_red_rate", self.tail_red_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                anyhow::bail!("{} must be in (0, 1], got {}", name, rate);
            }
        }

        if self.cliff_caution_rate > self.cliff_hard_rate {
            anyhow::bail!(
                "cliff_caution_rate ({}) must not exceed cliff_hard_rate ({})",
                self.cliff_caution_rate,
                self.cliff_hard_rate
            );
        }

        if !(self.guardrail_multiplier.is_finite() && self.guardrail_multiplier > 0.0) {
            anyhow::bail!("guardrail_multiplier must be positive, got {}", self.guardrail_multiplier);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = CalculatorConfig::default();
        assert_eq!(config.min_support_n, 15);
        assert_eq!(config.max_hops, 2);
        assert_eq!(config.cliff_caution_rate, 0.80);
        assert_eq!(config.cliff_hard_rate, 0.90);
        assert_eq!(config.guardrail_multiplier, 1.10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CalculatorConfig = serde_json::from_str(r#"{"max_hops": 3}"#).unwrap();
        assert_eq!(config.max_hops, 3);
        assert_eq!(config.min_support_n, MIN_SUPPORT_N);
        assert_eq!(config.tail_red_rate, 0.90);
    }

    #[test]
    fn test_validate_rejects_inverted_cliffs() {
        let config = CalculatorConfig {
            cliff_caution_rate: 0.95,
            ..CalculatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = CalculatorConfig::load(Path::new("/nonexistent/calculator.json"));
        assert!(result.is_err());
    }
}
