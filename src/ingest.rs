//! Rowdeck - CSV ingest pipeline
//!
//! Validates the upload's file type, streams the spooled bytes through the CSV
//! reader one record at a time, checks the header row against
//! [`HEADER_SCHEMA`], and publishes the rows as the new dataset.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐  extension  ┌─────────────┐  headers  ┌─────────────┐  rows  ┌──────────────┐
//! │  Upload  │────────────▶│ csv::Reader │──────────▶│ schema check│───────▶│ DatasetStore │
//! │ (spool)  │             │ (streaming) │           │             │        │  (replace)   │
//! └──────────┘             └─────────────┘           └─────────────┘        └──────────────┘
//! ```
//!
//! The spool file belongs to the [`Upload`] and is removed when the upload is
//! dropped, so every return path out of [`ingest`] releases it exactly once.
//!
//! Rows shorter than the header are padded with empty strings; extra trailing
//! fields are ignored.

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::data::{Dataset, DatasetStore, Row};
use crate::format::{headers_match, normalize_header, InputFormat, HEADER_SCHEMA};

/// Errors reported by [`ingest`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No file uploaded.")]
    NoFile,

    #[error("Invalid file type. Only CSV files are allowed.")]
    UnsupportedType { file_name: String },

    #[error("Invalid CSV headers. Expected headers: {}.", .expected.join(", "))]
    SchemaMismatch {
        expected: &'static [&'static str],
        found: Vec<String>,
    },

    #[error("Error processing file.")]
    ReadFailure(#[from] io::Error),
}

impl IngestError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::NoFile => 400,
            IngestError::UnsupportedType { .. } => 400,
            IngestError::SchemaMismatch { .. } => 400,
            IngestError::ReadFailure(_) => 500,
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::ReadFailure(io::Error::from(e))
    }
}

/// An uploaded file spooled to a request-owned temporary file.
pub struct Upload {
    file_name: String,
    spool: NamedTempFile,
    size: u64,
}

impl Upload {
    /// Create an empty spool for `file_name` inside `dir`.
    pub fn create_in(file_name: impl Into<String>, dir: &Path) -> io::Result<Self> {
        let spool = tempfile::Builder::new()
            .prefix("rowdeck-upload-")
            .tempfile_in(dir)?;
        Ok(Self {
            file_name: file_name.into(),
            spool,
            size: 0,
        })
    }

    /// Spool a whole reader, e.g. a file already on disk.
    pub fn from_reader<R: Read>(
        file_name: impl Into<String>,
        dir: &Path,
        mut reader: R,
    ) -> io::Result<Self> {
        let mut upload = Self::create_in(file_name, dir)?;
        upload.size = io::copy(&mut reader, upload.spool.as_file_mut())?;
        Ok(upload)
    }

    /// Append one chunk of the upload body.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.spool.write_all(chunk)?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Declared name of the uploaded file
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Location of the spool file while the upload is alive
    pub fn path(&self) -> &Path {
        self.spool.path()
    }

    /// Bytes spooled so far
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Run the full pipeline and publish the result into `store`.
///
/// On any error the store keeps whatever it held before.
pub fn ingest(upload: Option<Upload>, store: &DatasetStore) -> Result<Arc<Dataset>, IngestError> {
    let Upload {
        file_name,
        spool,
        size,
    } = upload.ok_or(IngestError::NoFile)?;

    if InputFormat::detect(&file_name).is_none() {
        return Err(IngestError::UnsupportedType { file_name });
    }

    let rows = parse_rows(spool.reopen()?)?;
    drop(spool);

    Ok(store.replace(Dataset::new(rows, file_name, size)))
}

/// Parse delimited text with a header row into rows.
///
/// Records are pulled one at a time, so the input is never buffered whole.
/// Reading stops at the header row if it doesn't match the schema.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<Row>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?;
    if !headers_match(headers.iter()) {
        return Err(IngestError::SchemaMismatch {
            expected: &HEADER_SCHEMA,
            found: headers.iter().map(normalize_header).collect(),
        });
    }

    let mut rows = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        rows.push(row_from_record(&record));
    }

    Ok(rows)
}

/// Map a record positionally onto the schema columns.
fn row_from_record(record: &csv::StringRecord) -> Row {
    let field = |i: usize| record.get(i).unwrap_or("").to_string();
    Row {
        post_id: field(0),
        id: field(1),
        name: field(2),
        email: field(3),
        body: field(4),
    }
}
