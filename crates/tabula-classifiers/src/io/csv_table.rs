//! CSV/TSV tables to and from [`Dataset`].
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::dataset::{Attribute, Dataset, Value};

/// Configuration for reading delimited tables.
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    /// Field delimiter. `None` picks tab for `.tsv` paths and comma otherwise.
    pub delimiter: Option<u8>,
    /// Cells read as missing outright.
    pub missing_tokens: Vec<String>,
    /// Tokens tolerated in numeric columns; kept as text until the
    /// missing-value normalization stage.
    pub numeric_sentinels: Vec<String>,
    /// Text columns with more distinct values load as String attributes.
    pub max_nominal_labels: usize,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            missing_tokens: vec![String::new(), "?".to_string()],
            numeric_sentinels: vec!["NA".to_string()],
            max_nominal_labels: 64,
        }
    }
}

impl CsvReaderConfig {
    fn is_missing(&self, cell: &str) -> bool {
        self.missing_tokens.iter().any(|t| t == cell)
    }

    fn is_sentinel(&self, cell: &str) -> bool {
        self.numeric_sentinels.iter().any(|t| t == cell)
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read a CSV (or TSV) file; the dataset is named after the file stem.
pub fn read_csv<P: AsRef<Path>>(path: P, config: &CsvReaderConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open table: {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();
    let mut config = config.clone();
    config.delimiter = Some(config.delimiter.unwrap_or_else(|| delimiter_for(path)));
    read_csv_from_reader(file, &name, &config)
        .with_context(|| format!("Failed to read table: {}", path.display()))
}

/// Read a delimited table with a header row from any reader.
pub fn read_csv_from_reader<R: Read>(reader: R, name: &str, config: &CsvReaderConfig) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter.unwrap_or(b','))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse record {}", line + 1))?;
        if record.len() != headers.len() {
            anyhow::bail!(
                "Record {} has {} fields, header has {}",
                line + 1,
                record.len(),
                headers.len()
            );
        }
        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            column.push(cell.to_string());
        }
    }

    let rows = columns.first().map_or(0, Vec::len);
    let mut attributes = Vec::with_capacity(headers.len());
    let mut values: Vec<Vec<Value>> = Vec::with_capacity(headers.len());
    for (header, cells) in headers.iter().zip(&columns) {
        let (attribute, column) = infer_column(header, cells, config);
        log::debug!("Column '{}' loaded as {}", header, attribute.kind());
        attributes.push(attribute);
        values.push(column);
    }

    let instances: Vec<Vec<Value>> = (0..rows)
        .map(|r| values.iter().map(|column| column[r].clone()).collect())
        .collect();
    let dataset = Dataset::from_rows(name, attributes, instances)?;
    log::info!(
        "Loaded '{}': {} instances, {} attributes",
        dataset.name(),
        dataset.instance_count(),
        dataset.attribute_count()
    );
    Ok(dataset)
}

/// Finite numbers only; `nan` and `inf` stay text.
fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn infer_column(name: &str, cells: &[String], config: &CsvReaderConfig) -> (Attribute, Vec<Value>) {
    let present: Vec<&str> = cells
        .iter()
        .map(String::as_str)
        .filter(|c| !config.is_missing(c))
        .collect();

    let parsed = present.iter().filter(|c| parse_number(c).is_some()).count();
    let numeric = present
        .iter()
        .all(|c| parse_number(c).is_some() || config.is_sentinel(c));

    // all-missing columns default to numeric
    if numeric && (parsed > 0 || present.is_empty()) {
        let values = cells
            .iter()
            .map(|c| {
                if config.is_missing(c) {
                    Value::Missing
                } else {
                    parse_number(c).map_or_else(|| Value::Text(c.clone()), Value::Number)
                }
            })
            .collect();
        return (Attribute::numeric(name), values);
    }

    let mut seen = HashSet::new();
    let labels: Vec<String> = present
        .iter()
        .filter(|c| seen.insert(**c))
        .map(|c| c.to_string())
        .collect();
    let values = cells
        .iter()
        .map(|c| {
            if config.is_missing(c) {
                Value::Missing
            } else {
                Value::Text(c.clone())
            }
        })
        .collect();

    if labels.len() <= config.max_nominal_labels {
        (Attribute::nominal(name, labels), values)
    } else {
        (Attribute::string(name), values)
    }
}

/// Write `dataset` as CSV (TSV for `.tsv` paths).
pub fn write_csv<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv_to_writer(dataset, BufWriter::new(file), delimiter_for(path))
        .with_context(|| format!("Failed to write table: {}", path.display()))?;
    log::info!("Wrote {} rows to {}", dataset.instance_count(), path.display());
    Ok(())
}

pub fn write_csv_to_writer<W: Write>(dataset: &Dataset, writer: W, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    writer.write_record(dataset.attribute_names())?;
    for instance in dataset.instances() {
        writer.write_record(instance.values().iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
