//! Inventory API client: paginated fetching of raw collection records

mod client;
mod raw;

pub use client::{fetch_all, InventoryClient, PageSource};
pub use raw::{RawAmount, RawPage, RawRecord};
