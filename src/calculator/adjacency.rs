//! County adjacency graph
//!
//! Undirected "borders" relation between counties. Loaded once per session and
//! only ever read by breadth-first expansion in the support builder.

use crate::utils::normalize_county;
use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct CountyAdjacency {
    neighbors: FxHashMap<String, Vec<String>>,
}

impl CountyAdjacency {
    /// Empty graph: every county has zero neighbors
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a county → neighbors mapping
    ///
    /// Names are normalized and every edge is inserted in both directions, so a
    /// one-sided entry in the source file still yields an undirected graph.
    /// Self-loops and duplicates are dropped; neighbor order follows first
    /// appearance.
    pub fn from_map<I, K, V, N>(map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut graph = Self::default();

        for (county, neighbors) in map {
            let county = normalize_county(county.as_ref());
            if county.is_empty() {
                continue;
            }
            graph.neighbors.entry(county.clone()).or_default();

            for neighbor in neighbors {
                let neighbor = normalize_county(neighbor.as_ref());
                if neighbor.is_empty() || neighbor == county {
                    continue;
                }
                graph.add_edge(&county, &neighbor);
                graph.add_edge(&neighbor, &county);
            }
        }

        graph
    }

    /// Load a JSON object of the form `{"DAVIDSON": ["WILLIAMSON", ...]}`
    pub fn load_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read adjacency file: {:?}", path))?;

        let raw: FxHashMap<String, Vec<String>> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse adjacency JSON: {:?}", path))?;

        let graph = Self::from_map(raw);
        tracing::info!(counties = graph.len(), "loaded county adjacency");
        Ok(graph)
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let list = self.neighbors.entry(from.to_string()).or_default();
        if !list.iter().any(|n| n == to) {
            list.push(to.to_string());
        }
    }

    /// Number of counties with an entry
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Direct neighbors; unknown counties have none
    pub fn neighbors(&self, county: &str) -> &[String] {
        self.neighbors
            .get(county)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Counties reachable within `max_hops` steps, excluding `county` itself
    ///
    /// Breadth-first, so the result lists 1-hop neighbors before 2-hop ones.
    pub fn neighbors_within_hops(&self, county: &str, max_hops: usize) -> Vec<String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        seen.insert(county);

        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        queue.push_back((county, 0));

        let mut reached = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_hops {
                continue;
            }
            for next in self.neighbors(current) {
                if seen.insert(next.as_str()) {
                    reached.push(next.clone());
                    queue.push_back((next.as_str(), depth + 1));
                }
            }
        }

        reached
    }
}
