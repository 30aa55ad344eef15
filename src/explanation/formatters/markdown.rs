use crate::calculator::{BinSource, FeasibilityResult};
use crate::utils::{dollars, dollars_opt};

/// Markdown formatter for feasibility results
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format a result as a Markdown report
    pub fn format(result: &FeasibilityResult) -> String {
        let mut md = String::with_capacity(2048);

        md.push_str(&format!(
            "# {} {}\n\n",
            result.tier.icon(),
            result.headline
        ));
        md.push_str(&format!(
            "**{} County** at **{}**  \n",
            result.county_title,
            dollars(result.input_price)
        ));
        md.push_str(&format!(
            "*Rule:* {}  \n*Confidence:* {}\n\n",
            result.reason.description(),
            result.confidence.display_text()
        ));

        // Why
        md.push_str("## Why\n\n");
        for line in &result.reasons {
            md.push_str(&format!("- {}\n", line));
        }
        md.push('\n');

        Self::format_support(&mut md, result);
        Self::format_cliffs(&mut md, result);
        Self::format_bins(&mut md, result);

        md
    }

    fn format_support(md: &mut String, result: &FeasibilityResult) {
        let support = &result.support;
        let counts = &result.county_counts;

        md.push_str("## Data Used\n\n");
        md.push_str(&format!(
            "- This county: {} deals ({} sold, {} cut loose)\n",
            counts.n, counts.sold, counts.cut
        ));
        md.push_str(&format!(
            "- Support: **{}** with {} deals ({} sold, {} cut loose)\n",
            support.label, support.n, support.sold, support.cut
        ));
        if support.used && !support.counties.is_empty() {
            md.push_str(&format!("- Counties: {}\n", support.counties.join(", ")));
        }
        md.push('\n');
    }

    fn format_cliffs(md: &mut String, result: &FeasibilityResult) {
        md.push_str("## Cliffs\n\n");
        md.push_str("| Cut-loose rate | Price |\n");
        md.push_str("|----------------|-------|\n");
        md.push_str(&format!("| 80% | {} |\n", dollars_opt(result.cliffs.p80)));
        md.push_str(&format!("| 90% | {} |\n", dollars_opt(result.cliffs.p90)));
        md.push_str(&format!(
            "\n*Tail floor:* {} deals per price point\n\n",
            result.tail.tail_min_n
        ));
    }

    fn format_bins(md: &mut String, result: &FeasibilityResult) {
        let bins = &result.bins;
        let source = match bins.source {
            BinSource::County => "this county",
            BinSource::Support => "support data",
        };

        md.push_str(&format!(
            "## Price Bins ({}, {} steps, min {} deals)\n\n",
            source,
            dollars(bins.step),
            bins.min_bin_n
        ));

        if bins.rows.is_empty() {
            md.push_str("*No bin has enough deals to show.*\n");
            return;
        }

        md.push_str("| Price range | Deals | Cut loose |\n");
        md.push_str("|-------------|-------|-----------|\n");
        for row in &bins.rows {
            md.push_str(&format!(
                "| {}–{} | {} | {:.0}% |\n",
                dollars(row.price_low),
                dollars(row.price_high),
                row.count,
                row.cut_rate * 100.0
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{recommend_deals, CountyAdjacency, Deal};
    use crate::config::CalculatorConfig;

    fn sample_result(price: f64) -> FeasibilityResult {
        let mut deals: Vec<Deal> = (0..12).map(|i| Deal::sold("DAVIDSON", 90000.0 + i as f64 * 5000.0)).collect();
        deals.extend((0..8).map(|i| Deal::cut("DAVIDSON", 205000.0 + i as f64 * 5000.0)));
        recommend_deals("DAVIDSON", price, &deals, &CountyAdjacency::empty(), &CalculatorConfig::default()).unwrap()
    }

    #[test]
    fn test_markdown_sections() {
        let md = MarkdownFormatter::format(&sample_result(210000.0));

        assert!(md.starts_with("# 🔴 RED — Above sold ceiling"));
        assert!(md.contains("**Davidson County** at **$210,000**"));
        assert!(md.contains("## Why"));
        assert!(md.contains("- County SOLD ceiling (max sold effective price): **$145,000**"));
        assert!(md.contains("## Data Used"));
        assert!(md.contains("Support: **County only** with 20 deals"));
        assert!(md.contains("| 90% | $150,000 |"));
        assert!(md.contains("## Price Bins (this county"));
    }
}
