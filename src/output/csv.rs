//! CSV export
//!
//! The header is the union of all record keys in first-seen order, so
//! records of different shapes share one table. Missing cells are empty and
//! nested values are written as compact JSON.

use crate::extract::Record;
use crate::output::traits::{Exporter, OutputResult};
use serde_json::Value;
use std::io::{self, Write};

const SEPARATOR: char = ',';

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, records: &[Record], writer: &mut dyn Write) -> OutputResult<()> {
        let columns = union_header(records);
        if columns.is_empty() {
            return Ok(());
        }

        write_row(&mut *writer, &columns)?;
        for record in records {
            let row: Vec<String> = columns
                .iter()
                .map(|column| record.get(column).map(cell_text).unwrap_or_default())
                .collect();
            write_row(&mut *writer, &row)?;
        }
        Ok(())
    }
}

/// All keys of all records, in the order they are first seen
pub fn union_header(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes one CSV row
fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", SEPARATOR)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}
