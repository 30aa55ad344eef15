//! Normalization Utilities
//!
//! Single source of truth for turning raw sheet values into join keys and
//! canonical labels. Every loader and the calculator go through these so that
//! "Davidson County", "DAVIDSON" and " davidson " all land on the same county.

use serde::{Deserialize, Serialize};

/// Known historical typos in the County column (raw upper-case → fixed)
const COUNTY_TYPOS: &[(&str, &str)] = &[("STEWART COUTY", "STEWART")];

const SOLD_ALIASES: &[&str] = &["sold", "closed", "close", "closing", "settled"];
const CUT_ALIASES: &[&str] = &["cutloose", "cutlose", "cut"];

/// Canonical deal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusNorm {
    Sold,
    CutLoose,
    Unknown,
}

impl StatusNorm {
    /// Label stored in the `Status_norm` column
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusNorm::Sold => "sold",
            StatusNorm::CutLoose => "cut loose",
            StatusNorm::Unknown => "",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "sold" => StatusNorm::Sold,
            "cut loose" => StatusNorm::CutLoose,
            _ => StatusNorm::Unknown,
        }
    }
}

/// Display-level county name: trimmed, upper-case, trailing " COUNTY" removed
///
/// Map layers and the calculator use "DAVIDSON", not "DAVIDSON COUNTY".
pub fn normalize_county(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();

    let mut kept: Vec<&str> = Vec::new();
    for (idx, token) in upper.split_whitespace().enumerate() {
        // A leading "COUNTY" is part of the name, only a following one is a suffix
        if idx > 0 && is_county_word(token) {
            let rest = &token["COUNTY".len()..];
            if !rest.is_empty() {
                kept.push(rest);
            }
            continue;
        }
        kept.push(token);
    }
    let cleaned = kept.join(" ");

    COUNTY_TYPOS
        .iter()
        .find(|(typo, _)| *typo == cleaned)
        .map(|(_, fixed)| fixed.to_string())
        .unwrap_or(cleaned)
}

/// Forgiving join key: upper-case, word COUNTY removed, only A-Z kept
///
/// Used to join the deals sheet against the tiers sheet and the adjacency file.
pub fn normalize_county_key(raw: &str) -> String {
    let upper = raw.to_uppercase();
    upper
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty() && *word != "COUNTY")
        .flat_map(|word| word.chars())
        .filter(|c| c.is_ascii_uppercase())
        .collect()
}

/// Canonicalize a free-text status to sold / cut loose / unknown
pub fn normalize_status(raw: &str) -> StatusNorm {
    let compact: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();

    if SOLD_ALIASES.contains(&compact.as_str()) {
        StatusNorm::Sold
    } else if CUT_ALIASES.contains(&compact.as_str()) {
        StatusNorm::CutLoose
    } else {
        StatusNorm::Unknown
    }
}

/// Convert a money-like string to a float
///
/// "$74,000" → 74000.0; "", "nan", "None" and anything unparsable → None.
pub fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("nan") || cleaned == "None" {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// "COUNTY" followed by nothing or by a non-word character
fn is_county_word(token: &str) -> bool {
    token.starts_with("COUNTY")
        && token["COUNTY".len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'))
}
