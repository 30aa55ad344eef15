use crate::calculator::FeasibilityResult;

/// JSON formatter for feasibility results
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format result as pretty-printed JSON
    pub fn format(result: &FeasibilityResult) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(result)
    }

    /// Format result as compact JSON (no whitespace)
    pub fn format_compact(result: &FeasibilityResult) -> Result<String, serde_json::Error> {
        serde_json::to_string(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{recommend_deals, CountyAdjacency, Deal};
    use crate::config::CalculatorConfig;

    fn sample_result() -> FeasibilityResult {
        let deals: Vec<Deal> = (0..15).map(|i| Deal::sold("KNOX", 100000.0 + i as f64 * 2000.0)).collect();
        recommend_deals("knox", 110000.0, &deals, &CountyAdjacency::empty(), &CalculatorConfig::default()).unwrap()
    }

    #[test]
    fn test_format_json() {
        let json = JsonFormatter::format(&sample_result()).unwrap();

        assert!(json.contains("\"tier\": \"green\""));
        assert!(json.contains("\"reason\": \"guardrail_green\""));
        assert!(json.contains("\"county_key\": \"KNOX\""));
        assert!(json.contains("\"p90\": null"));
    }

    #[test]
    fn test_format_compact_round_trips() {
        let result = sample_result();
        let json = JsonFormatter::format_compact(&result).unwrap();

        assert!(!json.contains("\n  "));
        let parsed: FeasibilityResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
