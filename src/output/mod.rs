//! Output module for exported records and crawl statistics
//!
//! This module handles:
//! - Writing record lists as JSON (always) and CSV (optional)
//! - Naming export files `<site>_<YYYYMMDD_HHMMSS>.<ext>`
//! - Printing per-crawl statistics

mod csv;
mod json;
pub mod stats;
mod traits;

pub use csv::{union_header, CsvExporter};
pub use json::{read_json, JsonExporter};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{Exporter, OutputError, OutputResult};

use crate::extract::Record;
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Builds the default export file name for `site`
///
/// Names have second resolution, so two exports of the same site within one
/// second overwrite each other.
pub fn default_file_name(site: &str, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        site,
        Local::now().format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Writes `records` to `directory` with the given exporter
///
/// # Arguments
///
/// * `exporter` - File format
/// * `records` - Records to write
/// * `directory` - Target directory, created if missing
/// * `site` - Site name used for the default file name
/// * `filename` - Explicit file name; the default name is used if None
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - The directory or file could not be written
pub fn export(
    exporter: &dyn Exporter,
    records: &[Record],
    directory: &Path,
    site: &str,
    filename: Option<&str>,
) -> OutputResult<PathBuf> {
    std::fs::create_dir_all(directory)?;

    let name = match filename {
        Some(name) => name.to_string(),
        None => default_file_name(site, exporter.extension()),
    };
    let path = directory.join(name);

    let mut writer = BufWriter::new(File::create(&path)?);
    exporter.write(records, &mut writer)?;
    writer.flush()?;

    tracing::info!(
        "Saved {} records to {}",
        records.len(),
        path.display()
    );
    Ok(path)
}
