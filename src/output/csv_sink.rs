use crate::output::error::OutputError;
use crate::types::record::NormalizedRecord;
use log::info;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// UTF-8 byte-order mark, so spreadsheet tools detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV output file that many tasks append to.
///
/// The file is not held open: every [`append`](CsvSink::append) opens it in
/// append mode, writes one whole batch and closes it again. Appends are
/// serialized, so the rows of one batch are never interleaved with another's.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    columns: usize,
    append_lock: Mutex<()>,
}

impl CsvSink {
    /// Creates (or truncates) `path` and writes the byte-order mark and header row.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Create`] if the file or its parent directory cannot be created.
    pub async fn create(path: &Path, header: &[&str]) -> Result<Self, OutputError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OutputError::Create(parent.to_path_buf(), e))?;
        }

        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend(encode_rows(std::iter::once(header.iter().copied()))?);
        fs::write(path, bytes)
            .await
            .map_err(|e| OutputError::Create(path.to_path_buf(), e))?;
        info!("Created {} with {} columns", path.display(), header.len());

        Ok(Self {
            path: path.to_path_buf(),
            columns: header.len(),
            append_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `rows` in order as one batch. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::RowWidth`] if a row does not match the header,
    /// [`OutputError::Encode`] if the rows cannot be encoded and
    /// [`OutputError::Append`] if the file cannot be opened or written. Nothing
    /// is written when a row is rejected or encoding fails.
    pub async fn append(&self, rows: &[NormalizedRecord]) -> Result<usize, OutputError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if let Some(row) = rows.iter().find(|row| row.len() != self.columns) {
            return Err(OutputError::RowWidth {
                path: self.path.clone(),
                expected: self.columns,
                found: row.len(),
            });
        }
        let bytes = encode_rows(rows.iter().map(|row| row.values()))?;

        let _guard = self.append_lock.lock().await;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| OutputError::Append(self.path.clone(), e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| OutputError::Append(self.path.clone(), e))?;
        file.flush()
            .await
            .map_err(|e| OutputError::Append(self.path.clone(), e))?;
        Ok(rows.len())
    }
}

fn encode_rows<'a, R, I>(rows: R) -> Result<Vec<u8>, OutputError>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = &'a str>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| OutputError::Encode(csv::Error::from(e.into_error())))
}
