//! Two-column backing range for the gateway server.
//!
//! Column A holds keys, column B holds values. Row 1 is the header
//! (`key`, `value`); writes start at row 2 and only replace as many rows as
//! they carry, so rows below a shorter write stay in place.

use crate::saving;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Row number (1-based) at which gateway writes begin.
pub const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("range store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct SheetRange {
    pub rows: Vec<Vec<String>>,
}

impl SheetRange {
    /// A range holding only the header row.
    pub fn with_header() -> Self {
        SheetRange {
            rows: vec![vec!["key".to_string(), "value".to_string()]],
        }
    }

    /// Writes `rows` starting at the 1-based row `start_row`.
    pub fn write_from(&mut self, start_row: usize, rows: Vec<Vec<String>>) {
        let start = start_row.saturating_sub(1);
        if self.rows.len() < start {
            self.rows.resize(start, Vec::new());
        }
        for (offset, row) in rows.into_iter().enumerate() {
            let at = start + offset;
            if at < self.rows.len() {
                self.rows[at] = row;
            } else {
                self.rows.push(row);
            }
        }
    }
}

/// Storage behind the gateway endpoint.
pub trait RangeStore: Send + Sync {
    /// Every row of the range, header included.
    fn read_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;

    /// Overwrites rows beginning at the 1-based `start_row`.
    fn write_rows(&self, start_row: usize, rows: Vec<Vec<String>>) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Range kept in memory; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryRange {
    range: Mutex<SheetRange>,
}

impl MemoryRange {
    pub fn new(range: SheetRange) -> Self {
        MemoryRange {
            range: Mutex::new(range),
        }
    }

    pub fn with_header() -> Self {
        Self::new(SheetRange::with_header())
    }
}

impl RangeStore for MemoryRange {
    fn read_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        Ok(lock(&self.range).rows.clone())
    }

    fn write_rows(&self, start_row: usize, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        lock(&self.range).write_from(start_row, rows);
        Ok(())
    }
}

/// Range persisted to a gzip-compressed file after every write.
#[derive(Debug)]
pub struct FileRange {
    path: PathBuf,
    // serializes read-modify-write cycles on the file
    guard: Mutex<()>,
}

impl FileRange {
    /// Opens the range file at `path`, creating it with a header row if it
    /// does not exist yet.
    ///
    /// # Errors
    /// * Returns an error if the file cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            saving::save_range(&SheetRange::with_header(), &path)?;
        }
        Ok(FileRange {
            path,
            guard: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RangeStore for FileRange {
    fn read_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let _guard = lock(&self.guard);
        Ok(saving::load_range(&self.path)?.rows)
    }

    fn write_rows(&self, start_row: usize, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        let mut range = saving::load_range(&self.path)?;
        range.write_from(start_row, rows);
        saving::save_range(&range, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value: &str) -> Vec<String> {
        vec![key.to_string(), value.to_string()]
    }

    #[test]
    fn writes_start_below_the_header() {
        let store = MemoryRange::with_header();
        store
            .write_rows(FIRST_DATA_ROW, vec![row("client", "Aldar")])
            .unwrap();
        let rows = store.read_rows().unwrap();
        assert_eq!(rows, vec![row("key", "value"), row("client", "Aldar")]);
    }

    #[test]
    fn shorter_write_leaves_trailing_rows() {
        let mut range = SheetRange::with_header();
        range.write_from(2, vec![row("a", "1"), row("b", "2"), row("c", "3")]);
        range.write_from(2, vec![row("x", "9")]);
        assert_eq!(
            range.rows,
            vec![row("key", "value"), row("x", "9"), row("b", "2"), row("c", "3")]
        );
    }

    #[test]
    fn write_past_the_end_pads_with_empty_rows() {
        let mut range = SheetRange::default();
        range.write_from(3, vec![row("a", "1")]);
        assert_eq!(range.rows.len(), 3);
        assert!(range.rows[0].is_empty());
        assert_eq!(range.rows[2], row("a", "1"));
    }

    #[test]
    fn file_range_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sheet.bin.gz");

        let store = FileRange::open(&path).unwrap();
        assert_eq!(store.read_rows().unwrap(), vec![row("key", "value")]);
        store
            .write_rows(FIRST_DATA_ROW, vec![row("projectCode", "DT-7")])
            .unwrap();
        drop(store);

        let reopened = FileRange::open(&path).unwrap();
        assert_eq!(reopened.read_rows().unwrap()[1], row("projectCode", "DT-7"));
    }
}
