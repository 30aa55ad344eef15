//! Top buyers per county (sold deals only)

use crate::data::BUYER_COL;
use crate::error::FeasibilityError;
use crate::utils::str_column_values;
use polars::prelude::*;
use rustc_hash::FxHashMap;

/// County → [(buyer, sold count)], most active buyer first
///
/// Ties are ordered by buyer name so the output is deterministic.
pub fn top_buyers_by_county(sold: &DataFrame) -> Result<FxHashMap<String, Vec<(String, usize)>>, FeasibilityError> {
    if sold.height() == 0 {
        return Ok(FxHashMap::default());
    }

    let counties = str_column_values(sold, "County_clean_up")?;
    let buyers = str_column_values(sold, BUYER_COL)?;

    let mut tallies: FxHashMap<String, FxHashMap<String, usize>> = FxHashMap::default();
    for (county, buyer) in counties.into_iter().zip(buyers) {
        let (Some(county), Some(buyer)) = (county, buyer) else { continue };
        let buyer = buyer.trim();
        if buyer.is_empty() {
            continue;
        }
        *tallies.entry(county).or_default().entry(buyer.to_string()).or_insert(0) += 1;
    }

    Ok(tallies
        .into_iter()
        .map(|(county, per_buyer)| {
            let mut ranked: Vec<(String, usize)> = per_buyer.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            (county, ranked)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_buyers_ranked() {
        let sold = df![
            "County_clean_up" => &["DAVIDSON", "DAVIDSON", "DAVIDSON", "DAVIDSON", "KNOX"],
            "Buyer_clean" => &["Beta", "Acme", "Beta", "", "Acme"],
        ]
        .unwrap();

        let top = top_buyers_by_county(&sold).unwrap();
        assert_eq!(
            top["DAVIDSON"],
            vec![("Beta".to_string(), 2), ("Acme".to_string(), 1)]
        );
        assert_eq!(top["KNOX"], vec![("Acme".to_string(), 1)]);
    }
}
