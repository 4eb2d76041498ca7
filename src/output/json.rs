//! JSON export: a pretty-printed array of records, UTF-8, field order preserved

use crate::extract::Record;
use crate::output::traits::{Exporter, OutputResult};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, records: &[Record], writer: &mut dyn Write) -> OutputResult<()> {
        serde_json::to_writer_pretty(&mut *writer, records)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Reads back a file written by [`JsonExporter`]
pub fn read_json(path: &std::path::Path) -> OutputResult<Vec<Record>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
