//! Binder categorization
//!
//! Derives price tiers plus cost and type categories for every owned row and
//! sorts the binder-worthy ones into filing order:
//!
//! value tier (large first), non-lands before lands, cost category, type
//! category, converted cost, power/toughness, name, foil.

use crate::assemble::{foil_label, InventoryTable};
use crate::config::Thresholds;
use crate::error::Result;
use crate::join::EnrichedRecord;
use crate::reference::COLORS;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;

/// Price bucket deciding whether a card is worth filing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTier {
    Small,
    Medium,
    Large,
}

impl ValueTier {
    /// Bucket a price using half-open intervals `[0, bulk)`, `[bulk, main)`, `[main, ∞)`
    pub fn classify(price: f64, thresholds: Thresholds) -> Self {
        if price >= thresholds.main {
            ValueTier::Large
        } else if price >= thresholds.bulk {
            ValueTier::Medium
        } else {
            ValueTier::Small
        }
    }

    /// Position in the binder, most valuable first
    fn binder_rank(self) -> u8 {
        match self {
            ValueTier::Large => 0,
            ValueTier::Medium => 1,
            ValueTier::Small => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueTier::Small => "small",
            ValueTier::Medium => "medium",
            ValueTier::Large => "large",
        }
    }
}

impl fmt::Display for ValueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort key for a color-composition cost such as `White Blue`.
///
/// Fewer words first; then, color by color in WUBRG order, costs containing
/// the color before costs lacking it; then the text itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CostKey {
    words: usize,
    lacks_color: [bool; 5],
    text: String,
}

impl CostKey {
    pub fn new(cost: &str) -> Self {
        let words: Vec<&str> = cost.split_whitespace().collect();
        let mut lacks_color = [true; 5];
        for (slot, (_, color)) in lacks_color.iter_mut().zip(COLORS.iter()) {
            *slot = !words.iter().any(|w| w.eq_ignore_ascii_case(color));
        }
        Self {
            words: words.len(),
            lacks_color,
            text: cost.to_string(),
        }
    }
}

/// Distinct cost texts in category order
pub fn cost_category_order<'a, I>(costs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let distinct: BTreeSet<&str> = costs.into_iter().collect();
    let mut keys: Vec<CostKey> = distinct.into_iter().map(CostKey::new).collect();
    keys.sort();
    keys.into_iter().map(|k| k.text).collect()
}

/// Card type category, declared in binder order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeCategory {
    Planeswalker,
    Creature,
    Enchantment,
    Sorcery,
    Instant,
    Artifact,
    ArtifactCreature,
    Land,
    /// Anything else, ordered after the known categories by its text
    Other(String),
}

/// Qualifiers removed from type lines, longest first
const TYPE_QUALIFIERS: [&str; 4] = [
    "Legendary Enchantment ",
    "Enchantment ",
    "Tribal ",
    "Legendary ",
];

impl TypeCategory {
    /// Categorize a type line such as `Legendary Creature — Elf Druid`
    pub fn from_type_line(type_line: &str) -> Self {
        let text = normalize_type(type_line);
        match text.as_str() {
            "Planeswalker" => TypeCategory::Planeswalker,
            "Creature" => TypeCategory::Creature,
            "Enchantment" => TypeCategory::Enchantment,
            "Sorcery" => TypeCategory::Sorcery,
            "Instant" => TypeCategory::Instant,
            "Artifact" => TypeCategory::Artifact,
            "Artifact Creature" => TypeCategory::ArtifactCreature,
            "Land" => TypeCategory::Land,
            _ => TypeCategory::Other(text),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeCategory::Planeswalker => "Planeswalker",
            TypeCategory::Creature => "Creature",
            TypeCategory::Enchantment => "Enchantment",
            TypeCategory::Sorcery => "Sorcery",
            TypeCategory::Instant => "Instant",
            TypeCategory::Artifact => "Artifact",
            TypeCategory::ArtifactCreature => "Artifact Creature",
            TypeCategory::Land => "Land",
            TypeCategory::Other(text) => text,
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop subtypes and qualifiers, collapse compound lands to `Land`
pub fn normalize_type(type_line: &str) -> String {
    let main = type_line.split(['—', '–']).next().unwrap_or_default();
    let main = main.split(" - ").next().unwrap_or_default();

    let mut text = main.split_whitespace().collect::<Vec<_>>().join(" ");
    for qualifier in TYPE_QUALIFIERS {
        text = text.replace(qualifier, "");
    }
    let text = text.trim().to_string();

    match text.as_str() {
        "Artifact Land" | "Basic Land" => "Land".to_string(),
        _ => text,
    }
}

/// An owned, binder-worthy card with its filing categories
#[derive(Debug, Clone, PartialEq)]
pub struct BinderEntry {
    pub name: String,
    pub edition: Option<String>,
    pub quantity: u32,
    pub foil: bool,
    pub effective_price: f64,
    pub value_tier: ValueTier,
    pub cost_category: Option<String>,
    pub type_category: Option<TypeCategory>,
    pub flat_cost: Option<f64>,
    pub power_toughness: Option<String>,
}

/// Foil price for foils, average price otherwise; the row's own market
/// price when the reference has none.
pub fn effective_price(record: &EnrichedRecord) -> Option<f64> {
    let reference = if record.is_foil() {
        record.foil_price
    } else {
        record.avg_price
    };
    reference.or(record.price)
}

/// Total order over `f64` for sorting
#[derive(Debug, Clone, Copy)]
struct FlatCost(f64);

impl PartialEq for FlatCost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FlatCost {}

impl PartialOrd for FlatCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FlatCost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Missing values sort after present ones
fn last_if_none<T>(value: Option<T>) -> (bool, Option<T>) {
    (value.is_none(), value)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct BinderKey {
    tier: u8,
    is_land: bool,
    cost: (bool, Option<CostKey>),
    type_category: (bool, Option<TypeCategory>),
    flat_cost: (bool, Option<FlatCost>),
    power_toughness: Option<String>,
    name: String,
    foil: bool,
}

impl BinderKey {
    fn new(entry: &BinderEntry, is_land: bool) -> Self {
        Self {
            tier: entry.value_tier.binder_rank(),
            is_land,
            cost: last_if_none(entry.cost_category.as_deref().map(CostKey::new)),
            type_category: last_if_none(entry.type_category.clone()),
            flat_cost: last_if_none(entry.flat_cost.map(FlatCost)),
            power_toughness: entry.power_toughness.clone(),
            name: entry.name.clone(),
            foil: entry.foil,
        }
    }
}

/// Produce the binder listing: owned rows priced at or above the bulk
/// threshold, in filing order.
pub fn categorize(table: &InventoryTable, thresholds: Thresholds) -> Vec<BinderEntry> {
    let mut candidates: Vec<(BinderEntry, bool)> = Vec::new();
    let mut dropped = 0;

    for record in table.owned() {
        let Some(quantity) = record.quantity else {
            continue;
        };
        let Some(price) = effective_price(record) else {
            log::debug!("No price for {}, leaving it out of the binder", record.name);
            dropped += 1;
            continue;
        };
        let value_tier = ValueTier::classify(price, thresholds);
        if value_tier == ValueTier::Small {
            dropped += 1;
            continue;
        }

        let entry = BinderEntry {
            name: record.name.clone(),
            edition: record.edition.clone(),
            quantity,
            foil: record.is_foil(),
            effective_price: price,
            value_tier,
            cost_category: record.cost.clone(),
            type_category: record.type_line.as_deref().map(TypeCategory::from_type_line),
            flat_cost: record.flat_cost,
            power_toughness: record.power_toughness.clone(),
        };
        candidates.push((entry, record.is_land.unwrap_or(false)));
    }

    candidates.sort_by_cached_key(|(entry, is_land)| BinderKey::new(entry, *is_land));

    log::info!(
        "Binder holds {} entries ({} owned rows below the bulk threshold or unpriced)",
        candidates.len(),
        dropped
    );

    candidates.into_iter().map(|(entry, _)| entry).collect()
}

/// One line of the binder CSV
#[derive(Debug, Serialize)]
struct BinderRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Edition")]
    edition: &'a str,
    #[serde(rename = "Qty")]
    qty: u32,
    #[serde(rename = "Foil")]
    foil: &'static str,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Tier")]
    tier: &'static str,
    #[serde(rename = "Cost")]
    cost: &'a str,
    #[serde(rename = "Type")]
    type_category: &'a str,
    #[serde(rename = "CMC")]
    cmc: Option<f64>,
    #[serde(rename = "P/T")]
    power_toughness: &'a str,
}

const BINDER_HEADER: [&str; 10] = [
    "Name", "Edition", "Qty", "Foil", "Price", "Tier", "Cost", "Type", "CMC", "P/T",
];

/// Write binder entries as CSV, in the order given
pub fn write_binder<W: Write>(entries: &[BinderEntry], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if entries.is_empty() {
        wtr.write_record(BINDER_HEADER)?;
    }
    for entry in entries {
        wtr.serialize(BinderRow {
            name: &entry.name,
            edition: entry.edition.as_deref().unwrap_or_default(),
            qty: entry.quantity,
            foil: foil_label(Some(entry.foil)),
            price: format!("{:.2}", entry.effective_price),
            tier: entry.value_tier.as_str(),
            cost: entry.cost_category.as_deref().unwrap_or_default(),
            type_category: entry
                .type_category
                .as_ref()
                .map(|t| t.as_str())
                .unwrap_or_default(),
            cmc: entry.flat_cost,
            power_toughness: entry.power_toughness.as_deref().unwrap_or_default(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render binder entries to an in-memory CSV document
pub fn render_binder(entries: &[BinderEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_binder(entries, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
