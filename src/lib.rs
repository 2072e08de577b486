//! Collection Binder - MTG collection export and binder ordering
//!
//! Pulls an owner's paginated inventory from the collection-board API,
//! flattens the HTML-embedded card attributes, joins them with a card
//! reference dataset and produces a CSV export plus a binder filing order.

pub mod assemble;
pub mod binder;
pub mod config;
pub mod error;
mod http;
pub mod inventory;
pub mod join;
pub mod normalize;
pub mod pipeline;
pub mod reference;

pub use assemble::{assemble, to_export, ExportRow, ExportView, InventoryTable};
pub use binder::{categorize, BinderEntry, TypeCategory, ValueTier};
pub use config::{Config, ReferenceSource, Thresholds};
pub use error::{Error, Result};
pub use inventory::{fetch_all, InventoryClient, PageSource, RawPage, RawRecord};
pub use join::{join, EnrichedRecord};
pub use normalize::{normalize, normalize_all, NormalizedRecord, RecordFailure};
pub use pipeline::{run, RunReport};
pub use reference::{ReferenceEntry, ReferenceTable};
