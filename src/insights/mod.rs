//! County insights shown alongside the calculator
//!
//! - `counts`: sold / cut tallies, buyer counts, overall stats
//! - `health`: volume-weighted close-rate score
//! - `rankings`: rankings table rows
//! - `trends`: 12-month county trends and buyer momentum
//! - `buyers`: top buyers per county
//! - `financials`: gross profit totals and the GP-by-county table

pub mod counts;
pub mod health;
pub mod rankings;
pub mod trends;
pub mod buyers;
pub mod financials;

pub use counts::{buyer_count_by_county, compute_overall_stats, county_sold_cut_counts, CountyCounts, OverallStats};
pub use health::compute_health_score;
pub use rankings::{build_rankings, RankingRow};
pub use trends::{buyer_label, compute_buyer_momentum, compute_county_trends, format_trend, TrendRow};
pub use buyers::top_buyers_by_county;
pub use financials::{build_gp_by_county, compute_financial_totals, CountyGpRow, FinancialTotals};
