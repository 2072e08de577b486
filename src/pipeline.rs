//! End-to-end run: fetch, normalize, join, assemble, export, categorize.
//!
//! Transport, reference and staging failures abort before anything is written.
//! Malformed records are skipped and listed in the [`RunReport`].

use crate::assemble::{assemble, render_export, to_export, InventoryTable};
use crate::binder::{categorize, render_binder, BinderEntry};
use crate::config::{Config, ReferenceSource};
use crate::error::Result;
use crate::inventory::{fetch_all, InventoryClient, PageSource};
use crate::join::join;
use crate::normalize::{normalize_all, RecordFailure};
use crate::reference::ReferenceTable;
use reqwest::blocking::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One inventory snapshot after normalization and the reference join
#[derive(Debug)]
pub struct Snapshot {
    pub table: InventoryTable,
    pub records_fetched: usize,
    pub join_misses: usize,
    pub skipped: Vec<RecordFailure>,
}

/// Outcome of a successful run
#[derive(Debug)]
pub struct RunReport {
    pub output: PathBuf,
    pub records_fetched: usize,
    pub rows_exported: usize,
    pub join_misses: usize,
    pub skipped: Vec<RecordFailure>,
    pub binder: Vec<BinderEntry>,
    pub binder_output: Option<PathBuf>,
}

/// Build a snapshot from any page source and an already loaded reference
pub fn collect_from<S: PageSource + ?Sized>(
    source: &S,
    reference: &ReferenceTable,
    owner: &str,
    page_size: usize,
) -> Result<Snapshot> {
    let raws = fetch_all(source, owner, page_size)?;
    let records_fetched = raws.len();

    let (records, skipped) = normalize_all(&raws);
    if !skipped.is_empty() {
        log::warn!(
            "{} of {} records could not be normalized and were skipped",
            skipped.len(),
            records_fetched
        );
    }

    let enriched = join(records, reference);
    let join_misses = enriched.iter().filter(|r| !r.matched).count();

    Ok(Snapshot {
        table: assemble(enriched),
        records_fetched,
        join_misses,
        skipped,
    })
}

/// Load the configured reference dataset; no source means an empty table
pub fn load_reference(config: &Config, client: &Client) -> Result<ReferenceTable> {
    match &config.reference {
        Some(ReferenceSource::Url(url)) => ReferenceTable::fetch_from(client, url),
        Some(ReferenceSource::File(path)) => ReferenceTable::load(path),
        None => {
            log::info!("No card reference configured, binder will use inventory prices only");
            Ok(ReferenceTable::empty())
        }
    }
}

/// Fetch the configured owner's inventory and join it with the reference
pub fn collect(config: &Config) -> Result<Snapshot> {
    config.validate()?;

    let client = config.http_client()?;
    let inventory = InventoryClient::with_client(client.clone(), &config.inventory_url);

    let reference = load_reference(config, &client)?;

    log::info!("Fetching inventory for {}", config.owner);
    collect_from(&inventory, &reference, &config.owner, config.page_size)
}

/// Run the whole pipeline and write the configured outputs
pub fn run(config: &Config) -> Result<RunReport> {
    let snapshot = collect(config)?;

    let rows = to_export(&snapshot.table, config.view);
    let export = render_export(&rows)?;

    let binder = categorize(&snapshot.table, config.thresholds);
    let binder_csv = match &config.binder_output {
        Some(_) => Some(render_binder(&binder)?),
        None => None,
    };

    // Both outputs are staged before either is moved into place
    let staged_export = stage(&config.output, &export)?;
    let staged_binder = match (&config.binder_output, &binder_csv) {
        (Some(path), Some(csv)) => Some((path, stage(path, csv)?)),
        _ => None,
    };

    persist(staged_export, &config.output)?;
    log::info!("Wrote {} rows to {}", rows.len(), config.output.display());

    if let Some((path, staged)) = staged_binder {
        persist(staged, path)?;
        log::info!("Wrote {} binder entries to {}", binder.len(), path.display());
    }

    Ok(RunReport {
        output: config.output.clone(),
        records_fetched: snapshot.records_fetched,
        rows_exported: rows.len(),
        join_misses: snapshot.join_misses,
        skipped: snapshot.skipped,
        binder,
        binder_output: config.binder_output.clone(),
    })
}

/// Write `contents` to a temporary file in the target's directory
fn stage(target: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

fn persist(staged: NamedTempFile, target: &Path) -> Result<()> {
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}
