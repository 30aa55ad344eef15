//! Aggregate support builder
//!
//! Picks the smallest county pool whose deal count clears the sample floor:
//! the county alone, then adjacency rings of growing radius, then the whole
//! state. The statewide pool is returned even when it is still below the floor.

use crate::calculator::adjacency::CountyAdjacency;
use crate::calculator::deal::{Deal, DealCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How far the pool had to widen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportScope {
    CountyOnly,
    NearbyCounties,
    Statewide,
}

impl SupportScope {
    pub fn label(&self) -> &'static str {
        match self {
            SupportScope::CountyOnly => "County only",
            SupportScope::NearbyCounties => "Nearby counties",
            SupportScope::Statewide => "Statewide",
        }
    }
}

/// Deals backing a pricing decision for one county
#[derive(Debug, Clone)]
pub struct SupportSet {
    pub deals: Vec<Deal>,
    pub scope: SupportScope,
    /// Contributing counties (target first for county/nearby scopes)
    pub counties: Vec<String>,
    pub used_fallback: bool,
}

impl SupportSet {
    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    pub fn counts(&self) -> DealCounts {
        DealCounts::of(&self.deals)
    }
}

fn deals_in(deals: &[Deal], pool: &[String]) -> Vec<Deal> {
    deals
        .iter()
        .filter(|d| pool.iter().any(|c| *c == d.county))
        .cloned()
        .collect()
}

/// Select the support set for `target`
///
/// # Arguments
/// * `deals` - Every deal (sold and cut loose)
/// * `target` - Normalized county key
/// * `adjacency` - County graph; missing counties have no neighbors
/// * `min_support_n` - Sample-size floor
/// * `max_hops` - Largest adjacency radius tried before going statewide
pub fn build_support(
    deals: &[Deal],
    target: &str,
    adjacency: &CountyAdjacency,
    min_support_n: usize,
    max_hops: usize,
) -> SupportSet {
    let target = target.trim().to_uppercase();

    let county_only = deals_in(deals, std::slice::from_ref(&target));
    if county_only.len() >= min_support_n {
        tracing::debug!(county = %target, n = county_only.len(), "support: county only");
        return SupportSet {
            deals: county_only,
            scope: SupportScope::CountyOnly,
            counties: vec![target],
            used_fallback: false,
        };
    }

    for hop in 1..=max_hops {
        let mut pool = vec![target.clone()];
        pool.extend(adjacency.neighbors_within_hops(&target, hop));

        let pooled = deals_in(deals, &pool);
        if pooled.len() >= min_support_n {
            tracing::debug!(county = %target, hop, n = pooled.len(), "support: nearby counties");
            return SupportSet {
                deals: pooled,
                scope: SupportScope::NearbyCounties,
                counties: pool,
                used_fallback: true,
            };
        }
    }

    let counties: BTreeSet<&str> = deals.iter().map(|d| d.county.as_str()).collect();
    tracing::debug!(county = %target, n = deals.len(), "support: statewide");

    SupportSet {
        deals: deals.to_vec(),
        scope: SupportScope::Statewide,
        counties: counties.into_iter().map(str::to_string).collect(),
        used_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deals_for(county: &str, n: usize) -> Vec<Deal> {
        (0..n).map(|i| Deal::sold(county, 100000.0 + i as f64 * 1000.0)).collect()
    }

    fn chain() -> CountyAdjacency {
        CountyAdjacency::from_map(vec![("A", vec!["B"]), ("B", vec!["C"])])
    }

    #[test]
    fn test_county_only_when_floor_met() {
        let deals = deals_for("A", 15);
        let support = build_support(&deals, "a", &chain(), 15, 2);
        assert_eq!(support.scope, SupportScope::CountyOnly);
        assert!(!support.used_fallback);
        assert_eq!(support.counties, vec!["A"]);
        assert_eq!(support.len(), 15);
    }

    #[test]
    fn test_expands_one_hop() {
        let mut deals = deals_for("A", 5);
        deals.extend(deals_for("B", 10));
        deals.extend(deals_for("C", 50));

        let support = build_support(&deals, "A", &chain(), 15, 2);
        assert_eq!(support.scope, SupportScope::NearbyCounties);
        assert!(support.used_fallback);
        assert_eq!(support.counties, vec!["A", "B"]);
        assert_eq!(support.len(), 15);
    }

    #[test]
    fn test_expands_two_hops() {
        let mut deals = deals_for("A", 5);
        deals.extend(deals_for("B", 5));
        deals.extend(deals_for("C", 5));

        let support = build_support(&deals, "A", &chain(), 15, 2);
        assert_eq!(support.scope, SupportScope::NearbyCounties);
        assert_eq!(support.counties, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_statewide_when_hops_exhausted() {
        let mut deals = deals_for("A", 5);
        deals.extend(deals_for("Z", 20));

        let support = build_support(&deals, "A", &chain(), 15, 2);
        assert_eq!(support.scope, SupportScope::Statewide);
        assert!(support.used_fallback);
        assert_eq!(support.len(), 25);
        assert_eq!(support.counties, vec!["A", "Z"]);
    }

    #[test]
    fn test_statewide_below_floor_is_best_effort() {
        let deals = deals_for("A", 3);
        let support = build_support(&deals, "A", &CountyAdjacency::empty(), 15, 2);
        assert_eq!(support.scope, SupportScope::Statewide);
        assert_eq!(support.len(), 3);
        assert_eq!(support.scope.label(), "Statewide");
    }
}
