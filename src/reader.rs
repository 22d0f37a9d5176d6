// src/reader.rs
// Row reader for the 2-column header + 2-column data CSV layout

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

use crate::error::{Result, ScopeError};
use crate::header::RawHeader;

const PARAMETER_COL: usize = 0;
const VALUE_COL: usize = 1;
const TIME_COL: usize = 3;
const SAMPLE_COL: usize = 4;

/// Header pairs and sample columns of one capture file, before typing.
#[derive(Debug, Default, Clone)]
pub struct CaptureRows {
    pub header: RawHeader,
    pub time: Vec<f64>,
    pub value: Vec<f64>,
    /// Rows past the header window that still carry a parameter pair.
    pub ignored_rows: Vec<usize>,
}

/// Read a capture file from disk.
pub fn read_file<P: AsRef<Path>>(path: P, header_rows: usize) -> Result<CaptureRows> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read_rows(file, header_rows, path)
}

/// Read only the header pairs of a capture file.
pub fn read_header<P: AsRef<Path>>(path: P, header_rows: usize) -> Result<RawHeader> {
    let path = path.as_ref();
    let mut reader = builder().from_path(path)?;
    let mut header = RawHeader::new();

    for record in reader.records().take(header_rows) {
        let record = record?;
        if let Some((key, value)) = pair(&record, PARAMETER_COL, VALUE_COL) {
            header.insert(key.to_string(), value.to_string());
        }
    }

    Ok(header)
}

/// Split CSV rows into header pairs (first `header_rows` rows, columns 0-1)
/// and samples (every row, columns 3-4). Rows with a blank cell in either
/// column of a pair are dropped for that pair.
pub fn read_rows<R: Read>(input: R, header_rows: usize, path: &Path) -> Result<CaptureRows> {
    let mut reader = builder().from_reader(input);
    let mut rows = CaptureRows::default();

    for (row, record) in reader.records().enumerate() {
        let record = record?;

        if let Some((key, value)) = pair(&record, PARAMETER_COL, VALUE_COL) {
            if row < header_rows {
                rows.header.insert(key.to_string(), value.to_string());
            } else {
                rows.ignored_rows.push(row);
            }
        }

        if let Some((time, value)) = pair(&record, TIME_COL, SAMPLE_COL) {
            rows.time.push(number(time, path, row)?);
            rows.value.push(number(value, path, row)?);
        }
    }

    if let Some(first) = rows.ignored_rows.first() {
        warn!(
            "{:?}: ignored {} header row(s) past the first {} rows (first at row {})",
            path,
            rows.ignored_rows.len(),
            header_rows,
            first
        );
    }

    debug!(
        "Read {:?}: {} header pairs, {} samples",
        path,
        rows.header.len(),
        rows.time.len()
    );

    Ok(rows)
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

fn pair(record: &csv::StringRecord, a: usize, b: usize) -> Option<(&str, &str)> {
    let first = record.get(a).map(str::trim).filter(|s| !s.is_empty())?;
    let second = record.get(b).map(str::trim).filter(|s| !s.is_empty())?;
    Some((first, second))
}

fn number(cell: &str, path: &Path, row: usize) -> Result<f64> {
    cell.parse::<f64>().map_err(|e| ScopeError::InvalidData {
        path: path.to_path_buf(),
        row,
        reason: format!("'{cell}' is not a number ({e})"),
    })
}
