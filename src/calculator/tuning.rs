//! Sample-size dependent tuning and confidence
//!
//! Sparse support gets a coarser price grid and a lower tail floor, trading
//! resolution for stability.

use serde::{Deserialize, Serialize};

/// Grid step and population floors for one support set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Price grid step for cliffs and bins
    pub step: f64,
    /// Minimum tail size for a defined tail rate
    pub tail_min_n: usize,
    /// Minimum deals per emitted bin
    pub min_bin_n: usize,
}

impl Tuning {
    pub fn for_support_size(n: usize) -> Self {
        let (step, tail_min_n, min_bin_n) = match n {
            n if n >= 40 => (5000.0, 12, 6),
            n if n >= 20 => (5000.0, 8, 5),
            n if n >= 10 => (10000.0, 6, 4),
            _ => (20000.0, 5, 3),
        };
        Self { step, tail_min_n, min_bin_n }
    }
}

/// Confidence tier from support size
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_support_size(n: usize) -> Self {
        match n {
            n if n >= 30 => Confidence::High,
            n if n >= 15 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}
