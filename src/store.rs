use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::snapshot::{MarketSnapshot, COLUMNS};

/// Read every recorded snapshot. A missing or empty file is an empty log.
///
/// Rows are matched to fields by header name, so column order in the file
/// does not matter; unknown columns are dropped. A header lacking any
/// canonical column, or a malformed row, is an error.
pub fn load(path: &Path) -> Result<Vec<MarketSnapshot>, ScrapeError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ScrapeError::persistence(path, e)),
    };

    let mut reader = csv::Reader::from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| ScrapeError::persistence(path, e))?
        .clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let missing: Vec<&str> = COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(ScrapeError::persistence(
            path,
            format!("missing columns: {}", missing.join(", ")),
        ));
    }

    let extra: Vec<&str> = headers
        .iter()
        .filter(|h| !COLUMNS.iter().any(|c| c == h))
        .collect();
    if !extra.is_empty() {
        warn!(
            "Dropping unknown columns from {}: {}",
            path.display(),
            extra.join(", ")
        );
    }

    reader
        .deserialize::<MarketSnapshot>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScrapeError::persistence(path, e))
}

/// Append one snapshot, creating the file with the canonical header if
/// needed. The whole table is rewritten. Returns the new row count.
pub fn append(record: &MarketSnapshot, path: &Path) -> Result<usize, ScrapeError> {
    let mut rows = load(path)?;
    rows.push(record.clone());
    write_all(path, &rows)?;
    info!("Appended row {} to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn write_all(path: &Path, rows: &[MarketSnapshot]) -> Result<(), ScrapeError> {
    // Serialize fully before touching the file so a failure leaves it intact.
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(COLUMNS)
        .map_err(|e| ScrapeError::persistence(path, e))?;
    for row in rows {
        writer
            .write_record(row.values())
            .map_err(|e| ScrapeError::persistence(path, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ScrapeError::persistence(path, e.error()))?;
    std::fs::write(path, bytes).map_err(|e| ScrapeError::persistence(path, e))
}
