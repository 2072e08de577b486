//! Reference join
//!
//! Best-effort enrichment of normalized records with reference metadata.
//! Names without a reference entry pass through unchanged.

use crate::normalize::NormalizedRecord;
use crate::reference::{ReferenceEntry, ReferenceTable};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute keys owned by the inventory; reference data never replaces them
const PROTECTED_KEYS: [&str; 6] = ["name", "tla", "edition", "qty", "quantity", "foil"];

/// A normalized record plus whatever the reference dataset knows about it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichedRecord {
    pub name: String,
    pub edition: Option<String>,
    pub quantity: Option<u32>,
    pub foil: Option<bool>,
    pub price: Option<f64>,
    pub mana_cost: Option<String>,
    pub cost: Option<String>,
    pub flat_cost: Option<f64>,
    pub type_line: Option<String>,
    pub is_land: Option<bool>,
    pub avg_price: Option<f64>,
    pub foil_price: Option<f64>,
    pub power_toughness: Option<String>,
    pub attributes: BTreeMap<String, String>,
    /// Whether a reference entry was found for `name`
    pub matched: bool,
}

impl EnrichedRecord {
    pub fn is_owned(&self) -> bool {
        self.quantity.is_some()
    }

    pub fn is_foil(&self) -> bool {
        self.foil == Some(true)
    }

    fn apply(&mut self, entry: &ReferenceEntry) {
        self.mana_cost = entry.mana_cost.clone();
        self.cost = entry.cost_text();
        self.flat_cost = entry.flat_cost;
        self.type_line = entry.type_line.clone();
        self.is_land = entry.is_land;
        self.avg_price = entry.avg_price;
        self.foil_price = entry.foil_price;
        self.power_toughness = entry.power_toughness.clone();

        for (key, value) in &entry.extra {
            if PROTECTED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.attributes.insert(key.clone(), text);
        }
        self.matched = true;
    }
}

impl From<NormalizedRecord> for EnrichedRecord {
    fn from(record: NormalizedRecord) -> Self {
        Self {
            name: record.name,
            edition: record.edition,
            quantity: record.quantity,
            foil: record.foil,
            price: record.price,
            attributes: record.attributes,
            ..Self::default()
        }
    }
}

/// Join records with the reference table by exact name
pub fn join(records: Vec<NormalizedRecord>, reference: &ReferenceTable) -> Vec<EnrichedRecord> {
    let mut misses = 0;

    let enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|record| {
            let entry = reference.get(&record.name);
            let mut enriched = EnrichedRecord::from(record);
            match entry {
                Some(entry) => enriched.apply(entry),
                None => {
                    misses += 1;
                    log::debug!("No reference entry for {}", enriched.name);
                }
            }
            enriched
        })
        .collect();

    log::info!(
        "Joined {} records with reference data ({} without a match)",
        enriched.len(),
        misses
    );

    enriched
}
