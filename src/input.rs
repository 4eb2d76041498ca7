//! Newline-delimited input lists
//!
//! Search and URL-list crawls read their inputs (company names, profile
//! URLs) from plain text files: one entry per line, `#` starts a comment
//! line, blank lines are ignored. Inputs can also be collected from the
//! JSON export of an earlier crawl (officer profile links of a company search).

use crate::extract::Record;
use crate::output::{read_json, OutputResult};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Reads the entries of an input list file
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Trimmed entries in file order
/// * `Err(std::io::Error)` - The file could not be read
pub fn load_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let lines = parse_lines(&content);
    tracing::info!("Loaded {} entries from {}", lines.len(), path.display());
    Ok(lines)
}

/// Splits input list text into entries
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Collects the strings found at `path` in every record
///
/// `path` is a dot-separated key path; lists met along the way are walked
/// item by item, so `officers.officer_link` reads the link of every officer
/// of every record. Links are returned sorted, without duplicates.
pub fn collect_links(records: &[Record], path: &str) -> Vec<String> {
    let keys: Vec<&str> = path.split('.').filter(|k| !k.is_empty()).collect();
    let Some((first, rest)) = keys.split_first() else {
        return Vec::new();
    };

    let mut links = BTreeSet::new();
    for record in records {
        if let Some(value) = record.get(first) {
            walk(value, rest, &mut links);
        }
    }
    links.into_iter().collect()
}

fn walk(value: &Value, keys: &[&str], links: &mut BTreeSet<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk(item, keys, links);
            }
        }
        Value::Object(map) => {
            if let Some((first, rest)) = keys.split_first() {
                if let Some(next) = map.get(*first) {
                    walk(next, rest, links);
                }
            }
        }
        Value::String(text) if keys.is_empty() && !text.trim().is_empty() => {
            links.insert(text.trim().to_string());
        }
        _ => {}
    }
}

/// Reads a JSON export and collects the links at `path`
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Sorted unique links
/// * `Err(OutputError)` - The export could not be read or is not a record list
pub fn links_from_export(file: &Path, path: &str) -> OutputResult<Vec<String>> {
    let links = collect_links(&read_json(file)?, path);
    tracing::info!(
        "Collected {} '{}' links from {}",
        links.len(),
        path,
        file.display()
    );
    Ok(links)
}
