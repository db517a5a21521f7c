//! Rowdeck - In-memory dataset handling
//!
//! Holds the rows of the most recent successful upload. The store is a single
//! slot: every successful ingest swaps in a wholly new [`Dataset`], and readers
//! work on an `Arc` snapshot so they never see a half-replaced collection.

use serde::Serialize;
use std::sync::{Arc, RwLock};

/// One validated record with the five canonical string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub post_id: String,
    pub id: String,
    pub name: String,
    pub email: String,
    pub body: String,
}

impl Row {
    /// Field values in schema order.
    pub fn fields(&self) -> [&str; 5] {
        [
            self.post_id.as_str(),
            self.id.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.body.as_str(),
        ]
    }

    /// Case-insensitive substring test across every field.
    ///
    /// `needle` must already be lower-cased.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        self.fields()
            .iter()
            .any(|value| value.to_lowercase().contains(needle))
    }
}

/// An ordered, immutable collection of rows from one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    /// Rows in source-file order
    rows: Vec<Row>,
    /// Declared name of the uploaded file
    pub source: String,
    /// Size of the ingested input in bytes
    pub size: u64,
}

impl Dataset {
    pub fn new(rows: Vec<Row>, source: impl Into<String>, size: u64) -> Self {
        Self {
            rows,
            source: source.into(),
            size,
        }
    }

    /// Total number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get formatted input size string
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size >= GB {
            format!("{:.2} GB", self.size as f64 / GB as f64)
        } else if self.size >= MB {
            format!("{:.2} MB", self.size as f64 / MB as f64)
        } else if self.size >= KB {
            format!("{:.2} KB", self.size as f64 / KB as f64)
        } else {
            format!("{} B", self.size)
        }
    }
}

/// Shared handle to the current dataset slot.
///
/// Cloning the store clones the handle, not the data. The slot starts empty
/// (`snapshot()` returns `None`) until the first successful ingest.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    slot: Arc<RwLock<Option<Arc<Dataset>>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new dataset, dropping the previous one. Last write wins.
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let next = Arc::new(dataset);
        // A poisoned lock still guards a whole `Option<Arc<_>>`, never a partial value.
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::clone(&next));
        next
    }

    /// The dataset as of this instant, or `None` if nothing was ever ingested.
    pub fn snapshot(&self) -> Option<Arc<Dataset>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }
}
