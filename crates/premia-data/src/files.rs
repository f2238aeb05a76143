//! CSV reading and writing for panel records.

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Deserialize every row of a headed CSV stream.
pub fn read_csv_from<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Deserialize every row of the CSV file at `path`.
pub fn read_csv<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let rows = read_csv_from(File::open(path)?)?;
    debug!(path = %path.display(), rows = rows.len(), "read csv");
    Ok(rows)
}

/// Serialize `rows` as a headed CSV stream.
pub fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialize `rows` to the CSV file at `path`, replacing it.
pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    write_csv_to(File::create(path)?, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}
