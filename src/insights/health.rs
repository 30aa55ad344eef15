//! County health score
//!
//! raw = close_rate × ln(1 + total), scaled so the best county scores 100.

use crate::insights::counts::CountyCounts;
use rustc_hash::FxHashMap;

/// Health score (0-100, one decimal) for each county in `counties`
pub fn compute_health_score<S: AsRef<str>>(counties: &[S], counts: &CountyCounts) -> FxHashMap<String, f64> {
    let raw: Vec<(String, f64)> = counties
        .iter()
        .map(|county| {
            let county = county.as_ref();
            let sold = counts.sold_in(county);
            let total = sold + counts.cut_in(county);
            let score = if total == 0 {
                0.0
            } else {
                (sold as f64 / total as f64) * (total as f64).ln_1p()
            };
            (county.to_string(), score)
        })
        .collect();

    let max_raw = raw.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    raw.into_iter()
        .map(|(county, v)| {
            let score = if max_raw > 0.0 { v / max_raw * 100.0 } else { 0.0 };
            (county, (score * 10.0).round() / 10.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_health_score_normalized() {
        let mut counts = CountyCounts::default();
        counts.sold.insert("A".into(), 9);
        counts.cut.insert("A".into(), 1);
        counts.sold.insert("B".into(), 1);
        counts.cut.insert("B".into(), 1);

        let scores = compute_health_score(&["A", "B", "C"], &counts);
        assert_relative_eq!(scores["A"], 100.0);
        // B: 0.5 * ln(3) / (0.9 * ln(11)) * 100 = 25.45
        assert_relative_eq!(scores["B"], 25.5);
        assert_relative_eq!(scores["C"], 0.0);
    }

    #[test]
    fn test_health_score_all_zero() {
        let scores = compute_health_score(&["A"], &CountyCounts::default());
        assert_relative_eq!(scores["A"], 0.0);
    }
}
