//! Recommendation engine
//!
//! Combines the sold ceiling, the tail rate at the input price and the two
//! cliffs into a red / yellow / green call. Rules are evaluated in a fixed
//! order and the first match wins.
//!
//! The ceiling and cliff rules stay on once the price crosses them. The
//! tail-at-input rule does not: its tail shrinks as the price rises and
//! switches off once it holds fewer than `tail_min_n` deals, so a price just
//! above a dense cut-loose cluster can score better than a price inside it.

use crate::calculator::adjacency::CountyAdjacency;
use crate::calculator::bins::{build_bins, BinStat};
use crate::calculator::deal::{avg_sold_price, extract_deals, max_sold_price, Deal, DealCounts, Outcome};
use crate::calculator::support::build_support;
use crate::calculator::threshold::{find_crossing, tail_rate_at_price};
use crate::calculator::tuning::{Confidence, Tuning};
use crate::config::CalculatorConfig;
use crate::error::FeasibilityError;
use crate::utils::{dollars, title_case};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

const COUNTY_CEILING_LABEL: &str = "County SOLD ceiling (max sold effective price)";
const SUPPORT_CEILING_LABEL: &str = "Support SOLD ceiling (max sold effective price)";

/// Recommendation tier, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Green,
    Yellow,
    Red,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Green => "green",
            Tier::Yellow => "yellow",
            Tier::Red => "red",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Tier::Green => "🟢",
            Tier::Yellow => "🟡",
            Tier::Red => "🔴",
        }
    }
}

/// Which precedence rule decided the tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    CountySoldCeiling,
    SupportSoldCeiling,
    #[serde(rename = "tail_90_at_input")]
    Tail90AtInput,
    #[serde(rename = "cliff_90")]
    Cliff90,
    #[serde(rename = "cliff_80")]
    Cliff80,
    GuardrailGreen,
    GuardrailYellow,
}

impl ReasonTag {
    pub fn tier(&self) -> Tier {
        match self {
            ReasonTag::CountySoldCeiling
            | ReasonTag::SupportSoldCeiling
            | ReasonTag::Tail90AtInput
            | ReasonTag::Cliff90 => Tier::Red,
            ReasonTag::Cliff80 | ReasonTag::GuardrailYellow => Tier::Yellow,
            ReasonTag::GuardrailGreen => Tier::Green,
        }
    }

    /// Short human description of the rule
    pub fn description(&self) -> &'static str {
        match self {
            ReasonTag::CountySoldCeiling | ReasonTag::SupportSoldCeiling => "above sold ceiling",
            ReasonTag::Tail90AtInput => "likely cut loose (tail≥90%)",
            ReasonTag::Cliff90 => "crossed 90% cliff",
            ReasonTag::Cliff80 => "crossed 80% cliff",
            ReasonTag::GuardrailGreen => "within guardrail of average",
            ReasonTag::GuardrailYellow => "above guardrail, no cliff crossed",
        }
    }

    /// Banner text shown above the justification list
    pub fn headline(&self) -> &'static str {
        match self {
            ReasonTag::CountySoldCeiling | ReasonTag::SupportSoldCeiling => "RED — Above sold ceiling",
            ReasonTag::Tail90AtInput | ReasonTag::Cliff90 => "RED — Likely Cut Loose",
            ReasonTag::Cliff80 | ReasonTag::GuardrailYellow => "YELLOW — Caution / Needs justification",
            ReasonTag::GuardrailGreen => "GREEN — Contractable",
        }
    }
}

/// Support descriptor for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportSummary {
    /// True when the pool had to widen beyond the county
    pub used: bool,
    pub label: String,
    pub n: usize,
    pub sold: usize,
    pub cut: usize,
    pub counties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailDiagnostic {
    pub rate: Option<f64>,
    pub n: usize,
    pub tail_min_n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cliffs {
    pub p80: Option<f64>,
    pub p90: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub county_avg_sold: Option<f64>,
    pub support_avg_sold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ceiling {
    pub value: Option<f64>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSource {
    County,
    Support,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinTable {
    pub rows: Vec<BinStat>,
    pub source: BinSource,
    pub step: f64,
    pub min_bin_n: usize,
}

/// Complete calculator output for one (county, price) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityResult {
    pub county_key: String,
    pub county_title: String,
    pub input_price: f64,
    pub tier: Tier,
    pub reason: ReasonTag,
    pub headline: String,
    pub confidence: Confidence,
    pub county_counts: DealCounts,
    pub support: SupportSummary,
    pub tail: TailDiagnostic,
    pub cliffs: Cliffs,
    pub averages: Averages,
    pub ceiling: Ceiling,
    pub bins: BinTable,
    /// Ordered justification lines (Markdown bold for the key figures)
    pub reasons: Vec<String>,
}

/// Score a price for a county using default tunables
///
/// `sold` and `cut` are the pre-split outcome tables; each needs an effective
/// price column and a county column.
pub fn recommend(
    county_key: &str,
    input_price: f64,
    sold: &DataFrame,
    cut: &DataFrame,
    adjacency: &CountyAdjacency,
) -> Result<FeasibilityResult, FeasibilityError> {
    recommend_with_config(county_key, input_price, sold, cut, adjacency, &CalculatorConfig::default())
}

pub fn recommend_with_config(
    county_key: &str,
    input_price: f64,
    sold: &DataFrame,
    cut: &DataFrame,
    adjacency: &CountyAdjacency,
    config: &CalculatorConfig,
) -> Result<FeasibilityResult, FeasibilityError> {
    let deals = merge_outcome_tables(sold, cut)?;
    recommend_deals(county_key, input_price, &deals, adjacency, config)
}

/// Extract and concatenate the sold and cut-loose tables
pub fn merge_outcome_tables(sold: &DataFrame, cut: &DataFrame) -> Result<Vec<Deal>, FeasibilityError> {
    let mut deals = extract_deals(sold, Outcome::Sold, "sold deals")?;
    deals.extend(extract_deals(cut, Outcome::CutLoose, "cut-loose deals")?);
    Ok(deals)
}

/// Score a price against already-extracted deals
///
/// Deals with a non-finite price are ignored.
pub fn recommend_deals(
    county_key: &str,
    input_price: f64,
    deals: &[Deal],
    adjacency: &CountyAdjacency,
    config: &CalculatorConfig,
) -> Result<FeasibilityResult, FeasibilityError> {
    if !input_price.is_finite() {
        return Err(FeasibilityError::InvalidPrice(input_price));
    }

    let county_key = county_key.trim().to_uppercase();
    let deals: Vec<Deal> = deals.iter().filter(|d| d.price.is_finite()).cloned().collect();
    let deals = deals.as_slice();

    // ============================================================================
    // Slices
    // ============================================================================

    let county_deals: Vec<Deal> = deals.iter().filter(|d| d.county == county_key).cloned().collect();
    let county_counts = DealCounts::of(&county_deals);

    let support = build_support(deals, &county_key, adjacency, config.min_support_n, config.max_hops);
    let support_counts = support.counts();

    let tuning = Tuning::for_support_size(support.len());
    let confidence = Confidence::from_support_size(support.len());

    // ============================================================================
    // Statistics
    // ============================================================================

    let averages = Averages {
        county_avg_sold: avg_sold_price(&county_deals),
        support_avg_sold: avg_sold_price(&support.deals),
    };

    let county_max_sold = max_sold_price(&county_deals);
    let ceiling = match (county_max_sold, max_sold_price(&support.deals)) {
        (Some(value), _) => Ceiling {
            value: Some(value),
            label: Some(COUNTY_CEILING_LABEL.to_string()),
        },
        (None, Some(value)) => Ceiling {
            value: Some(value),
            label: Some(SUPPORT_CEILING_LABEL.to_string()),
        },
        (None, None) => Ceiling { value: None, label: None },
    };

    let cliffs = Cliffs {
        p80: find_crossing(&support.deals, config.cliff_caution_rate, tuning.tail_min_n, tuning.step),
        p90: find_crossing(&support.deals, config.cliff_hard_rate, tuning.tail_min_n, tuning.step),
    };

    let (tail_rate, tail_n) = tail_rate_at_price(&support.deals, input_price);
    let tail = TailDiagnostic {
        rate: tail_rate,
        n: tail_n,
        tail_min_n: tuning.tail_min_n,
    };

    let (bin_deals, bin_source) = if county_deals.len() >= config.county_bins_min_n {
        (county_deals.as_slice(), BinSource::County)
    } else {
        (support.deals.as_slice(), BinSource::Support)
    };
    let bins = BinTable {
        rows: build_bins(bin_deals, tuning.step, tuning.min_bin_n),
        source: bin_source,
        step: tuning.step,
        min_bin_n: tuning.min_bin_n,
    };

    // ============================================================================
    // Precedence
    // ============================================================================

    let reason = if ceiling.value.map_or(false, |c| input_price > c) {
        if county_max_sold.is_some() {
            ReasonTag::CountySoldCeiling
        } else {
            ReasonTag::SupportSoldCeiling
        }
    } else if tail.rate.map_or(false, |r| r >= config.tail_red_rate) && tail.n >= tail.tail_min_n {
        ReasonTag::Tail90AtInput
    } else if cliffs.p90.map_or(false, |p| input_price >= p) {
        ReasonTag::Cliff90
    } else if cliffs.p80.map_or(false, |p| input_price >= p) {
        ReasonTag::Cliff80
    } else if averages
        .support_avg_sold
        .map_or(false, |avg| input_price <= avg * config.guardrail_multiplier)
    {
        ReasonTag::GuardrailGreen
    } else {
        ReasonTag::GuardrailYellow
    };

    tracing::debug!(
        county = %county_key,
        price = input_price,
        support_n = support.len(),
        scope = support.scope.label(),
        reason = ?reason,
        "feasibility computed"
    );

    // ============================================================================
    // Justification
    // ============================================================================

    let mut reasons = Vec::new();

    match (&ceiling.value, &ceiling.label) {
        (Some(value), Some(label)) => reasons.push(format!("{}: **{}**", label, dollars(*value))),
        _ => reasons.push("No SOLD ceiling available (no sold deals in the support dataset).".to_string()),
    }

    if support.used_fallback {
        if let Some(avg) = averages.support_avg_sold {
            reasons.push(format!("Avg SOLD effective price (nearby data): **{}**", dollars(avg)));
        }
        if let Some(avg) = averages.county_avg_sold {
            reasons.push(format!("Avg SOLD effective price (this county): **{}**", dollars(avg)));
        }
    } else if let Some(avg) = averages.county_avg_sold {
        reasons.push(format!("Avg SOLD effective price: **{}**", dollars(avg)));
    }

    match tail.rate {
        Some(rate) => reasons.push(format!(
            "At {} and above: about **{} out of 10 deals** got cut loose (based on {} deals).",
            dollars(input_price),
            out_of_ten(rate),
            tail.n
        )),
        None => reasons.push(format!("At {} and above: —", dollars(input_price))),
    }

    if let Some(p90) = cliffs.p90 {
        let n90 = support.deals.iter().filter(|d| d.price >= p90).count();
        reasons.push(format!(
            "Around **{}** and above: about **9 out of 10 deals** got cut loose (based on {} deals).",
            dollars(p90),
            n90
        ));
    }

    Ok(FeasibilityResult {
        county_title: title_case(&county_key),
        county_key,
        input_price,
        tier: reason.tier(),
        reason,
        headline: reason.headline().to_string(),
        confidence,
        county_counts,
        support: SupportSummary {
            used: support.used_fallback,
            label: support.scope.label().to_string(),
            n: support_counts.n,
            sold: support_counts.sold,
            cut: support_counts.cut,
            counties: support.counties,
        },
        tail,
        cliffs,
        averages,
        ceiling,
        bins,
        reasons,
    })
}

/// Score many (county, price) pairs in parallel against one dataset
///
/// Results keep the order of `requests`; one bad price does not fail the batch.
pub fn recommend_many(
    requests: &[(String, f64)],
    deals: &[Deal],
    adjacency: &CountyAdjacency,
    config: &CalculatorConfig,
) -> Vec<Result<FeasibilityResult, FeasibilityError>> {
    requests
        .par_iter()
        .map(|(county, price)| recommend_deals(county, *price, deals, adjacency, config))
        .collect()
}

/// Tail rate as "N out of 10", half-to-even like the dashboard's rounding
fn out_of_ten(rate: f64) -> i64 {
    ((rate * 10.0).round_ties_even() as i64).clamp(0, 10)
}
