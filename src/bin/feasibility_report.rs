// Feasibility Report Binary
//
// Scores one contract price for one county and prints the report.
// Usage: cargo run --bin feasibility_report -- deals.csv Davidson 185000 --adjacency adjacency.json

use anyhow::Context;
use clap::Parser;
use deal_feasibility::{
    recommend_with_config, split_by_window, CalculatorConfig, DealData, JsonFormatter, MarkdownFormatter,
    TimeWindow,
};
use deal_feasibility::utils::normalize_county;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// County deal feasibility report
#[derive(Parser)]
#[command(name = "feasibility_report", about = "Score a contract price against county deal history")]
struct Cli {
    /// Deals feed CSV (County, Status, Contract Price, ...)
    deals_csv: PathBuf,

    /// County name, with or without the "County" suffix
    county: String,

    /// Proposed contract price in dollars
    price: f64,

    /// County adjacency JSON ({"COUNTY": ["NEIGHBOR", ...]})
    #[arg(long)]
    adjacency: Option<PathBuf>,

    /// MAO tiers CSV
    #[arg(long)]
    tiers: Option<PathBuf>,

    /// Calculator tunables JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// "All years", a year such as "2024", or "Last 12 months"
    #[arg(long, default_value = "All years")]
    window: String,

    /// Print JSON instead of Markdown
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deal_feasibility=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CalculatorConfig::load(path)?,
        None => CalculatorConfig::default(),
    };

    let today = chrono::Local::now().date_naive();
    let window = TimeWindow::parse(&cli.window, today)
        .with_context(|| format!("Unknown window: {}", cli.window))?;

    let data = DealData::load(&cli.deals_csv, cli.tiers.as_deref(), cli.adjacency.as_deref())?;
    let split = split_by_window(&data.deals, &window)?;
    tracing::info!(
        window = %window.label(),
        sold = split.sold.height(),
        cut = split.cut.height(),
        "window applied"
    );

    let county = normalize_county(&cli.county);
    let result = recommend_with_config(&county, cli.price, &split.sold, &split.cut, &data.adjacency, &config)?;

    if cli.json {
        println!("{}", JsonFormatter::format(&result)?);
    } else {
        let tiers = data.tier_lookup()?;
        if let Some((tier, range)) = tiers.get(&result.county_key) {
            if !tier.is_empty() {
                println!("> MAO tier: **{}** ({})\n", tier, range);
            }
        }
        println!("{}", MarkdownFormatter::format(&result));
    }

    Ok(())
}
