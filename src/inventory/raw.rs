//! Wire models for the collection-board inventory endpoint

use serde::Deserialize;
use serde_json::{Map, Value};

/// One page of the inventory listing. An empty `data` array ends pagination.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawPage {
    pub data: Vec<RawRecord>,
}

/// A collection record as received from the API.
///
/// `card` and `market_price` are HTML fragments. `edit` holds the corrected
/// quantity/foil values and any other per-record overrides.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawRecord {
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub foil: Option<Value>,
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub market_price: Option<Value>,
    #[serde(default)]
    pub edit: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawAmount {
    #[serde(default)]
    pub qty: Option<Value>,
}
