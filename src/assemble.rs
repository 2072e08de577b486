//! Inventory assembly and CSV export

use crate::error::Result;
use crate::join::EnrichedRecord;
use serde::Serialize;
use std::io::Write;

/// Which rows go into the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportView {
    /// Owned rows only: deck-only placements (no quantity) are dropped
    #[default]
    Summary,
    /// Every fetched row; deck-only placements get an empty `Qty`
    Raw,
}

/// All enriched rows of one inventory snapshot, in fetch order
#[derive(Debug, Clone, Default)]
pub struct InventoryTable {
    rows: Vec<EnrichedRecord>,
}

impl InventoryTable {
    pub fn rows(&self) -> &[EnrichedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with a resolved quantity
    pub fn owned(&self) -> impl Iterator<Item = &EnrichedRecord> {
        self.rows.iter().filter(|r| r.is_owned())
    }
}

/// Collect enriched records into a table. Rows are not deduplicated.
pub fn assemble(records: Vec<EnrichedRecord>) -> InventoryTable {
    InventoryTable { rows: records }
}

/// One line of the inventory CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Edition")]
    pub edition: String,
    #[serde(rename = "Qty")]
    pub qty: Option<u32>,
    #[serde(rename = "Foil")]
    pub foil: &'static str,
}

/// `Yes`/`No` label for a foil flag
pub fn foil_label(foil: Option<bool>) -> &'static str {
    if foil == Some(true) {
        "Yes"
    } else {
        "No"
    }
}

/// Select and rename the export columns: Name, Edition, Qty, Foil
pub fn to_export(table: &InventoryTable, view: ExportView) -> Vec<ExportRow> {
    table
        .rows
        .iter()
        .filter(|r| view == ExportView::Raw || r.is_owned())
        .map(|r| ExportRow {
            name: r.name.clone(),
            edition: r.edition.clone().unwrap_or_default(),
            qty: r.quantity,
            foil: foil_label(r.foil),
        })
        .collect()
}

/// Write export rows as CSV with a header row
pub fn write_export<W: Write>(rows: &[ExportRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(["Name", "Edition", "Qty", "Foil"])?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render export rows to an in-memory CSV document
pub fn render_export(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_export(rows, &mut buf)?;
    Ok(buf)
}
