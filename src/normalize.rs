//! Record normalization
//!
//! Turns a [`RawRecord`] into a flat [`NormalizedRecord`]. Card identity lives
//! in `data-*` attributes of an anchor inside the `card` HTML fragment; the
//! market price is the text of the `market_price` fragment.

use crate::error::{Error, Result};
use crate::inventory::RawRecord;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;

const DATA_PREFIX: &str = "data-";

/// Attribute keys that may carry the edition short code, in priority order
const EDITION_KEYS: [&str; 3] = ["tla", "edition", "set"];

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a").expect("static selector");
    static ref NUMBER: Regex =
        Regex::new(r"(-)?\s*\$?\s*(\d[\d,]*(?:\.\d+)?|\.\d+)").expect("static regex");
}

/// A collection record with its markup flattened into fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    /// Card name, with `/` of split cards escaped to `//`
    pub name: String,
    /// Edition short code
    pub edition: Option<String>,
    /// Owned copies. `None` for deck-only placements.
    pub quantity: Option<u32>,
    /// `None` means not foil
    pub foil: Option<bool>,
    /// Market price, `None` when the price fragment holds no number
    pub price: Option<f64>,
    /// Remaining `data-*` attributes (prefix stripped) and edit overrides
    pub attributes: BTreeMap<String, String>,
}

impl NormalizedRecord {
    pub fn is_owned(&self) -> bool {
        self.quantity.is_some()
    }

    pub fn is_foil(&self) -> bool {
        self.foil == Some(true)
    }
}

/// A record that could not be normalized, with its position in the fetch
#[derive(Debug)]
pub struct RecordFailure {
    pub index: usize,
    pub error: Error,
}

/// Normalize a single raw record.
///
/// Fails with [`Error::MalformedRecord`] when the card markup has no anchor
/// or the anchor yields no name.
pub fn normalize(raw: &RawRecord) -> Result<NormalizedRecord> {
    let card = raw
        .card
        .as_deref()
        .ok_or_else(|| Error::MalformedRecord("record has no card markup".to_string()))?;
    let mut attributes = extract_card_attributes(card)?;

    let name = match attributes.remove("name") {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => anchor_text(card),
    };
    if name.is_empty() {
        return Err(Error::MalformedRecord(format!("card markup has no name: {card}")));
    }

    let top_qty = raw.amount.as_ref().and_then(|a| a.qty.as_ref());
    let (quantity, foil) = match &raw.edit {
        Some(edit) => {
            let quantity = match edit.get("qty") {
                Some(v) => parse_quantity(v),
                None => top_qty.and_then(parse_quantity),
            };
            let foil = match edit.get("foil") {
                Some(v) => truthy(v),
                None => raw.foil.as_ref().and_then(truthy),
            };
            for (key, value) in edit {
                if matches!(key.as_str(), "qty" | "foil" | "name") {
                    continue;
                }
                if let Some(text) = value_text(value) {
                    attributes.insert(key.clone(), text);
                }
            }
            (quantity, foil)
        }
        None => (
            top_qty.and_then(parse_quantity),
            raw.foil.as_ref().and_then(truthy),
        ),
    };

    let edition = EDITION_KEYS
        .iter()
        .find(|key| attributes.get(**key).is_some_and(|v| !v.is_empty()))
        .and_then(|key| attributes.remove(*key));

    let price = match &raw.market_price {
        Some(Value::String(fragment)) => parse_price(fragment),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };

    Ok(NormalizedRecord {
        name: escape_name(&name),
        edition,
        quantity,
        foil,
        price,
        attributes,
    })
}

/// Normalize every record, setting aside the ones that fail.
///
/// Malformed records are logged and reported rather than aborting the batch.
pub fn normalize_all(raws: &[RawRecord]) -> (Vec<NormalizedRecord>, Vec<RecordFailure>) {
    let mut records = Vec::with_capacity(raws.len());
    let mut failures = Vec::new();

    for (index, raw) in raws.iter().enumerate() {
        match normalize(raw) {
            Ok(record) => records.push(record),
            Err(error) => {
                log::warn!("Skipping record #{index}: {error}");
                failures.push(RecordFailure { index, error });
            }
        }
    }

    (records, failures)
}

/// Collect the `data-*` attributes of the first anchor, prefix stripped
pub fn extract_card_attributes(fragment: &str) -> Result<BTreeMap<String, String>> {
    let html = Html::parse_fragment(fragment);
    let anchor = html.select(&ANCHOR).next().ok_or_else(|| {
        Error::MalformedRecord(format!("no anchor element in card markup: {fragment:?}"))
    })?;

    Ok(anchor
        .value()
        .attrs()
        .filter_map(|(key, value)| {
            key.strip_prefix(DATA_PREFIX)
                .map(|k| (k.to_string(), value.to_string()))
        })
        .collect())
}

fn anchor_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    html.select(&ANCHOR)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Escape split-card names: `Fire/Ice` becomes `Fire//Ice`
pub fn escape_name(name: &str) -> String {
    name.replace('/', "//")
}

/// Parse the first number in the text content of a price fragment.
///
/// `"$1.23"`, `"$.99"` and `"<span>$1,234.50</span>"` all parse. Text without
/// digits, or a negative amount, gives `None`.
pub fn parse_price(fragment: &str) -> Option<f64> {
    let text: String = Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect();

    let found = NUMBER.captures(&text)?;
    if found.get(1).is_some() {
        log::debug!("Negative price fragment: {fragment:?}");
        return None;
    }
    let price = found[2].replace(',', "").parse::<f64>().ok();
    if price.is_none() {
        log::debug!("Unparseable price fragment: {fragment:?}");
    }
    price
}

fn parse_quantity(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(q) => u32::try_from(q).ok(),
            // whole-number floats such as `2.0`
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(f))
                .map(|f| f as u32),
        },
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret a loosely typed flag. `null` stays `None`.
fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => {
            let s = s.trim();
            Some(
                !s.is_empty()
                    && !s.eq_ignore_ascii_case("false")
                    && !s.eq_ignore_ascii_case("no")
                    && s != "0",
            )
        }
        Value::Array(a) => Some(!a.is_empty()),
        Value::Object(o) => Some(!o.is_empty()),
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
