//! Feasibility calculator
//!
//! Leaf-first:
//! - `deal`: row records extracted from the sold / cut-loose tables
//! - `adjacency`: county graph and hop expansion
//! - `support`: minimal-radius support pool
//! - `threshold`: tail rates and cliff crossings
//! - `bins`: fixed-width price bins
//! - `tuning`: grid step, floors and confidence by sample size
//! - `recommend`: precedence rules and the result structure

pub mod deal;
pub mod adjacency;
pub mod support;
pub mod threshold;
pub mod bins;
pub mod tuning;
pub mod recommend;

pub use deal::{extract_deals, Deal, DealCounts, Outcome, COUNTY_COL, EFFECTIVE_PRICE_COL};
pub use adjacency::CountyAdjacency;
pub use support::{build_support, SupportScope, SupportSet};
pub use threshold::{find_crossing, tail_rate_at_price};
pub use bins::{build_bins, BinStat};
pub use tuning::{Confidence, Tuning};
pub use recommend::{
    merge_outcome_tables, recommend, recommend_deals, recommend_many, recommend_with_config,
    Averages, BinSource, BinTable, Ceiling, Cliffs, FeasibilityResult, ReasonTag, SupportSummary,
    TailDiagnostic, Tier,
};
