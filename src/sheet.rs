//! Tabular file codec
//!
//! CSV is the row format for both import and export. Import reads the whole
//! file up front (plans are staged whole, there is no streaming path);
//! export writes through `csv::Writer` to any sink.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row {row}: {source}")]
    Malformed {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully parsed sheet: one header row plus data rows of trimmed cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a sheet from disk. Rows may be ragged; short rows simply yield
/// fewer cells.
pub fn read(path: &Path) -> Result<Sheet, SheetError> {
    let file = File::open(path).map_err(|e| SheetError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        // 1-based source position, header row included
        let record = record.map_err(|e| SheetError::Malformed {
            row: idx + 2,
            source: e,
        })?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(Sheet { headers, rows })
}

/// Write a sheet to any sink
pub fn write<W: Write>(out: W, headers: &[&str], rows: &[Vec<String>]) -> Result<(), SheetError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
