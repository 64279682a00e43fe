//! CSV resources and the dataset manifest
//!
//! Each [`OutputUnit`] becomes a UTF-8 CSV file. The manifest
//! (`dataset.json`) carries the catalog metadata and points at the files so
//! a catalog client can create or update the dataset from it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::dataset::{Dataset, OutputUnit};
use crate::error::util::{UTF8_BOM, ensure_directory};
use crate::error::{EveError, Result};
use crate::utils::logging::{
    create_main_progress_bar, finish_progress_bar, log_stage_complete, log_stage_start, log_warning,
};

/// Manifest file name inside the output directory
pub const MANIFEST_FILE: &str = "dataset.json";

/// Options that control how files are written
#[derive(Debug, Clone, Default)]
pub struct WriteOptions<'a> {
    /// HXL hashtag per column; an empty map disables the hashtag row
    pub hxl_tags: Option<&'a IndexMap<String, String>>,
    /// Prefix every CSV with a UTF-8 byte-order mark
    pub write_bom: bool,
}

/// Files produced by [`write_dataset`]
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub manifest: PathBuf,
    pub files: Vec<PathBuf>,
    pub rows_written: usize,
}

#[derive(Debug, Serialize)]
struct NamedEntry<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ResourceEntry<'a> {
    name: &'a str,
    description: &'a str,
    format: &'static str,
    resource_type: &'static str,
    url_type: &'static str,
    file: String,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    name: &'a str,
    title: &'a str,
    dataset_date: String,
    tags: Vec<NamedEntry<'a>>,
    groups: Vec<NamedEntry<'a>>,
    #[serde(flatten)]
    static_metadata: &'a serde_json::Map<String, Value>,
    resources: Vec<ResourceEntry<'a>>,
}

/// Write every resource of `dataset` plus the manifest into `dir`
pub fn write_dataset(dataset: &Dataset, dir: &Path, options: &WriteOptions) -> Result<WriteSummary> {
    ensure_directory(dir, "writing dataset resources")?;
    log_stage_start("write", dir.display());
    let start = Instant::now();

    let pb = create_main_progress_bar(dataset.resources.len() as u64, Some("Writing resources"));
    let mut files = Vec::with_capacity(dataset.resources.len());
    let mut rows_written = 0;
    for unit in &dataset.resources {
        pb.set_message(unit.name.clone());
        let path = dir.join(&unit.name);
        rows_written += write_resource(unit, &path, options)?;
        files.push(path);
        pb.inc(1);
    }
    finish_progress_bar(&pb, Some("Resources written"));

    let manifest = write_manifest(dataset, dir)?;
    log_stage_complete("write", rows_written, Some(start.elapsed()));

    Ok(WriteSummary {
        manifest,
        files,
        rows_written,
    })
}

/// Write one resource as CSV, returning the number of records written
pub fn write_resource(unit: &OutputUnit, path: &Path, options: &WriteOptions) -> Result<usize> {
    if unit.records.is_empty() {
        log_warning("Writing resource with no records", Some(path));
    }

    let file = File::create(path).map_err(|e| EveError::from(e).with_path(path))?;
    let mut out = BufWriter::new(file);
    if options.write_bom {
        out.write_all(UTF8_BOM.as_bytes())
            .map_err(|e| EveError::from(e).with_path(path))?;
    }

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&unit.headers)?;

    if let Some(tags) = options.hxl_tags.filter(|tags| !tags.is_empty()) {
        writer.write_record(
            unit.headers
                .iter()
                .map(|h| tags.get(h).map_or("", String::as_str)),
        )?;
    }

    for record in &unit.records {
        writer.write_record(unit.headers.iter().map(|h| cell(record.get(h))))?;
    }
    writer
        .flush()
        .map_err(|e| EveError::from(e).with_path(path))?;

    log::debug!("Wrote {} records to {}", unit.records.len(), path.display());
    Ok(unit.records.len())
}

/// Render a field value as a CSV cell
#[must_use]
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write `dataset.json` describing the dataset and its resource files
pub fn write_manifest(dataset: &Dataset, dir: &Path) -> Result<PathBuf> {
    let manifest = Manifest {
        name: &dataset.name,
        title: &dataset.title,
        dataset_date: dataset.time_period.to_dataset_date(),
        tags: dataset.tags.iter().map(|t| NamedEntry { name: t }).collect(),
        groups: dataset
            .locations
            .iter()
            .map(|l| NamedEntry { name: l })
            .collect(),
        static_metadata: &dataset.static_metadata,
        resources: dataset
            .resources
            .iter()
            .map(|unit| ResourceEntry {
                name: &unit.name,
                description: &unit.description,
                format: "csv",
                resource_type: "file.upload",
                url_type: "upload",
                file: dir.join(&unit.name).display().to_string(),
            })
            .collect(),
    };

    let path = dir.join(MANIFEST_FILE);
    let body = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&path, body).map_err(|e| EveError::from(e).with_path(&path))?;
    Ok(path)
}
