use crate::config::ExportFormat;
use crate::error::ExportError;
use crate::results::ProductRecord;
use crate::utils::export_file_name;
use chrono::{Local, NaiveDateTime};
use csv::WriterBuilder;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes `records` to a new timestamped file in `dir` and returns its path.
///
/// The file is assembled under a temporary name in the same directory and
/// only renamed into place once fully written; a failure leaves nothing
/// behind. An existing file with the same name is never replaced.
pub fn export(
    records: &[ProductRecord],
    dir: &Path,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    export_at(records, dir, format, Local::now().naive_local())
}

/// Same as [`export`] with an explicit generation time
pub fn export_at(
    records: &[ProductRecord],
    dir: &Path,
    format: ExportFormat,
    generated_at: NaiveDateTime,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(generated_at, format.extension()));

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(temp.as_file_mut());
        match format {
            ExportFormat::Csv => write_csv(records, &mut out)?,
            ExportFormat::Json => serde_json::to_writer_pretty(&mut out, records)?,
        }
        out.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist_noclobber(&path).map_err(|e| ExportError::Persist {
        path: path.clone(),
        message: e.error.to_string(),
    })?;

    ::log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(path)
}

/// Header row with the field names, then one row per record. Nulls are
/// empty cells.
fn write_csv<W: Write>(records: &[ProductRecord], out: W) -> Result<(), ExportError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(ProductRecord::FIELDS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
