//! Card reference dataset
//!
//! A single JSON document mapping exact card names to card metadata (costs,
//! type line, land flag, market prices, power/toughness). Loaded from disk or
//! fetched once per run; never cached.

use crate::error::Result;
use crate::http::read_json;
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Canonical color order used for costs and binder sorting
pub const COLORS: [(char, &str); 5] = [
    ('W', "White"),
    ('U', "Blue"),
    ('B', "Black"),
    ('R', "Red"),
    ('G', "Green"),
];

/// Reference metadata for one card name
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ReferenceEntry {
    /// Mana symbols, e.g. `{1}{U}{R}`
    #[serde(default)]
    pub mana_cost: Option<String>,
    /// Color composition text, e.g. `Blue Red`
    #[serde(default)]
    pub cost: Option<String>,
    /// Converted mana cost
    #[serde(default, alias = "cmc", deserialize_with = "lenient_f64")]
    pub flat_cost: Option<f64>,
    #[serde(default, rename = "type", alias = "type_line")]
    pub type_line: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_land: Option<bool>,
    #[serde(default, alias = "avg", deserialize_with = "lenient_f64")]
    pub avg_price: Option<f64>,
    #[serde(default, alias = "avg_foil", deserialize_with = "lenient_f64")]
    pub foil_price: Option<f64>,
    #[serde(default, alias = "pt")]
    pub power_toughness: Option<String>,
    /// Any other attributes the dataset carries
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ReferenceEntry {
    /// Color composition text, derived from the mana symbols when the
    /// dataset has no explicit `cost`.
    pub fn cost_text(&self) -> Option<String> {
        if let Some(cost) = self.cost.as_ref().filter(|c| !c.trim().is_empty()) {
            return Some(cost.trim().to_string());
        }
        self.mana_cost.as_deref().map(colors_of_mana_cost)
    }
}

/// Name the colors present in a mana cost, in canonical order.
///
/// `{2}{W}{U}` gives `White Blue`, hybrid `{R/G}` counts both colors, and a
/// cost without colored symbols gives `Colorless`.
pub fn colors_of_mana_cost(mana_cost: &str) -> String {
    let symbols: Vec<&str> = mana_cost
        .split(['{', '}'])
        .filter(|s| !s.is_empty())
        .collect();

    let names: Vec<&str> = COLORS
        .iter()
        .filter(|(letter, _)| symbols.iter().any(|sym| has_color(sym, *letter)))
        .map(|(_, name)| *name)
        .collect();

    if names.is_empty() {
        "Colorless".to_string()
    } else {
        names.join(" ")
    }
}

/// True when a symbol such as `U`, `U/P` or `W/U` includes the color `letter`
fn has_color(symbol: &str, letter: char) -> bool {
    symbol
        .split('/')
        .any(|part| part.to_ascii_uppercase() == letter.to_string())
}

/// Reference lookup by exact card name
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceTable {
    /// A table with no entries; every join misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the reference document from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading card reference from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, ReferenceEntry> = serde_json::from_str(&content)?;

        log::info!("Loaded {} reference entries", entries.len());
        Ok(Self { entries })
    }

    /// Fetch the reference document from a URL
    pub fn fetch_from(client: &Client, url: &str) -> Result<Self> {
        log::info!("Fetching card reference from: {}", url);

        let response = client.get(url).send()?;
        let entries: HashMap<String, ReferenceEntry> =
            read_json(response, "a card reference document")?;

        log::info!("Fetched {} reference entries", entries.len());
        Ok(Self { entries })
    }

    /// Build a table from `(name, entry)` pairs
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ReferenceEntry)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up a card by exact name
    pub fn get(&self, name: &str) -> Option<&ReferenceEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
