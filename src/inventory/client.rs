//! Paginated fetching from the inventory endpoint
//!
//! Pages are requested with `start = 0, length, 2 * length, ...` until the
//! server answers with an empty `data` array. There is no retry: any failure
//! aborts the fetch so a collection is never silently truncated.

use super::raw::{RawPage, RawRecord};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::read_json;
use reqwest::blocking::Client;

/// Anything that can serve one page of an owner's inventory
pub trait PageSource {
    fn fetch_page(&self, owner: &str, start: usize, length: usize) -> Result<RawPage>;
}

/// Blocking HTTP client for the collection-board API
pub struct InventoryClient {
    client: Client,
    url: String,
}

impl InventoryClient {
    /// Create a client for the configured endpoint, honouring its timeout
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, &config.inventory_url))
    }

    /// Create a client for `url` using an existing HTTP client
    pub fn with_client(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    /// Fetch every record of `owner`'s inventory
    pub fn fetch_all(&self, owner: &str, page_size: usize) -> Result<Vec<RawRecord>> {
        fetch_all(self, owner, page_size)
    }
}

impl PageSource for InventoryClient {
    fn fetch_page(&self, owner: &str, start: usize, length: usize) -> Result<RawPage> {
        log::debug!("Requesting inventory page: owner={owner} start={start} length={length}");

        let response = self
            .client
            .get(&self.url)
            .query(&[("owner", owner), ("type", "inventory")])
            .query(&[("start", start), ("length", length)])
            .send()?;

        read_json(response, "an inventory page")
    }
}

/// Fetch pages from `source` until an empty page is returned
pub fn fetch_all<S: PageSource + ?Sized>(
    source: &S,
    owner: &str,
    page_size: usize,
) -> Result<Vec<RawRecord>> {
    if page_size == 0 {
        return Err(Error::Config("page size must be at least 1".to_string()));
    }

    let mut records = Vec::new();
    let mut start = 0;

    loop {
        let page = source.fetch_page(owner, start, page_size)?;
        if page.data.is_empty() {
            break;
        }
        records.extend(page.data);
        log::info!("Fetched {} records so far for {}", records.len(), owner);
        start += page_size;
    }

    Ok(records)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
