use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::errors::SinkError;
use crate::models::transfer::{TransferRow, TRANSFER_CSV_HEADER};

/// Append rows to the transfer CSV.
///
/// The header is written only when the file is new or empty; an existing
/// file with content only ever gets rows appended. Returns the number of
/// rows written.
pub fn append_rows(path: &Path, rows: &[TransferRow]) -> Result<usize, SinkError> {
    let needs_header = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record(TRANSFER_CSV_HEADER)?;
    }

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;

    tracing::debug!(
        path = %path.display(),
        rows = rows.len(),
        header = needs_header,
        "Appended transfer rows"
    );

    Ok(rows.len())
}
