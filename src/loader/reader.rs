use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{LoadError, Result};
use crate::schema::{Column, ColumnType, TableSchema};

/// Field values treated as null
pub const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// What happened while reading one CSV file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStats {
    pub table: &'static str,
    pub found: bool,
    pub rows: usize,
    pub columns: usize,
    pub null_values: usize,
    /// Date/time values that could not be parsed, per column; loaded as null
    pub unparseable: BTreeMap<&'static str, usize>,
    /// Headers that match no known column; ignored
    pub unknown_columns: Vec<String>,
}

impl TableStats {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            found: false,
            rows: 0,
            columns: 0,
            null_values: 0,
            unparseable: BTreeMap::new(),
            unknown_columns: Vec::new(),
        }
    }

    pub fn unparseable_total(&self) -> usize {
        self.unparseable.values().sum()
    }
}

/// Read `<dir>/<table>.csv` into typed records.
///
/// A missing file yields an empty table; whether that is fatal is decided
/// by the transformer. Headers are matched to schema columns (aliases
/// included), null markers are blanked and date/time values are
/// normalized to ISO form before deserializing.
pub fn read_table<T: DeserializeOwned>(
    dir: &Path,
    schema: &'static TableSchema,
) -> Result<(Vec<T>, TableStats)> {
    let path = dir.join(schema.file_name());
    let mut stats = TableStats::new(schema.name);

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(table = schema.name, path = ?path, "source file not found, loading empty table");
            return Ok((Vec::new(), stats));
        }
        Err(source) => return Err(LoadError::Io { path, source }),
    };
    stats.found = true;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let raw_headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.clone(),
            source,
        })?
        .clone();

    let columns: Vec<Option<&Column>> = raw_headers
        .iter()
        .map(|h| schema.column_for_header(h))
        .collect();

    let headers: StringRecord = raw_headers
        .iter()
        .zip(&columns)
        .map(|(header, column)| column.map_or(header, |c| c.name))
        .collect();

    for (header, column) in raw_headers.iter().zip(&columns) {
        if column.is_none() {
            stats.unknown_columns.push(header.to_string());
        }
    }
    stats.columns = headers.len();

    let mut records = Vec::new();

    for result in reader.records() {
        let raw = result.map_err(|source| LoadError::Csv {
            path: path.clone(),
            source,
        })?;
        let line = raw.position().map_or(0, |p| p.line());

        let normalized: StringRecord = raw
            .iter()
            .enumerate()
            .map(|(idx, field)| normalize_field(field, columns.get(idx).copied().flatten(), &mut stats))
            .collect();

        let record: T = normalized
            .deserialize(Some(&headers))
            .map_err(|e| LoadError::Record {
                path: path.clone(),
                line,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    stats.rows = records.len();

    for (column, count) in &stats.unparseable {
        warn!(
            table = schema.name,
            column, count, "unparseable date/time values loaded as null"
        );
    }
    debug!(table = schema.name, rows = stats.rows, "table loaded");

    Ok((records, stats))
}

fn normalize_field(field: &str, column: Option<&Column>, stats: &mut TableStats) -> String {
    if is_null_marker(field) {
        stats.null_values += 1;
        return String::new();
    }

    let Some(column) = column else {
        return field.to_string();
    };

    let parsed = match column.col_type {
        ColumnType::Date => parse_date(field).map(|d| d.format("%Y-%m-%d").to_string()),
        ColumnType::DateTime => {
            parse_datetime(field).map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        _ => return field.to_string(),
    };

    parsed.unwrap_or_else(|| {
        *stats.unparseable.entry(column.name).or_insert(0) += 1;
        String::new()
    })
}

pub fn is_null_marker(field: &str) -> bool {
    NULL_MARKERS.contains(&field.trim())
}

/// Parse a date, accepting a full timestamp and keeping only its date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| parse_datetime(value).map(|dt| dt.date()))
}

/// Parse a timestamp; a bare date means midnight
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
