//! County Deal Feasibility Engine
//!
//! Scores a proposed contract price for a county against historical sold and
//! cut-loose deals, and builds the county insights shown next to it.
//!
//! - `utils/`: county/status/money normalization and DataFrame helpers
//! - `data`: feed, MAO tiers and adjacency loading with Polars
//! - `filters`: time-window split into sold / cut-loose tables, admin filters
//! - `calculator/`: support pool, cliffs, bins and the tier decision
//! - `insights/`: counts, health score, rankings, trends, top buyers, financials
//! - `explanation/`: Markdown and JSON rendering of a result

pub mod error;
pub mod config;
pub mod utils;
pub mod data;
pub mod filters;
pub mod calculator;
pub mod insights;
pub mod explanation;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::FeasibilityError;
pub use config::CalculatorConfig;
pub use data::DealData;
pub use filters::{split_by_window, AdminFilter, TimeWindow, WindowedDeals};
pub use calculator::{
    recommend, recommend_deals, recommend_many, recommend_with_config, CountyAdjacency, Deal,
    FeasibilityResult, ReasonTag, Tier,
};
pub use explanation::{JsonFormatter, MarkdownFormatter};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState, DataPaths};
