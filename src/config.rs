//! Run configuration
//!
//! Everything a pipeline run needs is carried in a [`Config`] value, so tests
//! can point the fetcher at a mock server or use other owners and thresholds.

use crate::assemble::ExportView;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Collection-board inventory endpoint
pub const DEFAULT_INVENTORY_URL: &str = "https://tappedout.net/api/collection-board/";

/// Records requested per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default HTTP timeout for every request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "collection_binder/0.1";

/// Price boundaries for the binder value tiers.
///
/// Tiers are half-open: `[0, bulk)` is small, `[bulk, main)` is medium and
/// `[main, ∞)` is large.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub bulk: f64,
    pub main: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bulk: 0.30,
            main: 1.00,
        }
    }
}

/// Where the card reference dataset comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceSource {
    Url(String),
    File(PathBuf),
}

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct Config {
    pub inventory_url: String,
    pub owner: String,
    pub page_size: usize,
    pub reference: Option<ReferenceSource>,
    pub thresholds: Thresholds,
    pub timeout: Duration,
    pub user_agent: String,
    pub output: PathBuf,
    pub view: ExportView,
    pub binder_output: Option<PathBuf>,
}

impl Config {
    /// Create a configuration for `owner` with default settings
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            inventory_url: DEFAULT_INVENTORY_URL.to_string(),
            owner: owner.into(),
            page_size: DEFAULT_PAGE_SIZE,
            reference: None,
            thresholds: Thresholds::default(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            output: default_output_path(),
            view: ExportView::Summary,
            binder_output: None,
        }
    }

    pub fn with_inventory_url(mut self, url: impl Into<String>) -> Self {
        self.inventory_url = url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_reference(mut self, source: ReferenceSource) -> Self {
        self.reference = Some(source);
        self
    }

    pub fn with_thresholds(mut self, bulk: f64, main: f64) -> Self {
        self.thresholds = Thresholds { bulk, main };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_view(mut self, view: ExportView) -> Self {
        self.view = view;
        self
    }

    pub fn with_binder_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.binder_output = Some(output.into());
        self
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(Error::Config("owner must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page size must be at least 1".to_string()));
        }
        let Thresholds { bulk, main } = self.thresholds;
        if !bulk.is_finite() || !main.is_finite() || bulk < 0.0 {
            return Err(Error::Config(format!(
                "thresholds must be finite and non-negative (bulk={bulk}, main={main})"
            )));
        }
        if bulk > main {
            return Err(Error::Config(format!(
                "bulk threshold {bulk} is above main threshold {main}"
            )));
        }
        Ok(())
    }

    /// Build the blocking HTTP client used for every request of a run
    pub fn http_client(&self) -> Result<reqwest::blocking::Client> {
        Ok(reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()?)
    }
}

/// Returns the default export path: <tmp>/mtg_inventory.csv
pub fn default_output_path() -> PathBuf {
    std::env::temp_dir().join("mtg_inventory.csv")
}
