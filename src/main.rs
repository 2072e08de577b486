//! Collection Binder - exports an MTG collection to CSV and binder order

use clap::Parser;
use collection_binder::config::{default_output_path, DEFAULT_INVENTORY_URL, DEFAULT_PAGE_SIZE};
use collection_binder::{run, Config, ExportView, ReferenceSource};
use std::path::PathBuf;
use std::time::Duration;

/// Export an online MTG inventory to CSV and sort it into binder order
#[derive(Parser, Debug)]
#[command(name = "collection_binder")]
#[command(version, about, long_about = None)]
struct Args {
    /// Account whose collection is exported
    #[arg(short, long)]
    owner: String,

    /// Inventory endpoint
    #[arg(long, default_value = DEFAULT_INVENTORY_URL)]
    url: String,

    /// Records requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Card reference document URL
    #[arg(long, conflicts_with = "reference_file")]
    reference_url: Option<String>,

    /// Card reference document on disk
    #[arg(long)]
    reference_file: Option<PathBuf>,

    /// Prices below this are bulk and stay out of the binder
    #[arg(long, default_value_t = 0.30)]
    bulk_threshold: f64,

    /// Prices from this up are filed in the large tier
    #[arg(long, default_value_t = 1.00)]
    main_threshold: f64,

    /// CSV output path
    #[arg(short = 'f', long, default_value_os_t = default_output_path())]
    output: PathBuf,

    /// Which rows to export
    #[arg(long, value_enum, default_value_t = ExportView::Summary)]
    view: ExportView,

    /// Also write the binder listing to this CSV file
    #[arg(long)]
    binder_output: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.owner)
            .with_inventory_url(self.url)
            .with_page_size(self.page_size)
            .with_thresholds(self.bulk_threshold, self.main_threshold)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_output(self.output)
            .with_view(self.view);

        if let Some(url) = self.reference_url {
            config = config.with_reference(ReferenceSource::Url(url));
        } else if let Some(path) = self.reference_file {
            config = config.with_reference(ReferenceSource::File(path));
        }
        if let Some(path) = self.binder_output {
            config = config.with_binder_output(path);
        }
        config
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();

    match run(&config) {
        Ok(report) => {
            log::info!(
                "{} records fetched, {} skipped, {} without reference data, {} in the binder",
                report.records_fetched,
                report.skipped.len(),
                report.join_misses,
                report.binder.len()
            );
            println!(
                "Wrote {} rows to {}",
                report.rows_exported,
                report.output.display()
            );
            if let Some(path) = &report.binder_output {
                println!("Wrote binder listing to {}", path.display());
            }
        }
        Err(e) => {
            log::error!("Export failed: {}", e);
            std::process::exit(1);
        }
    }
}
