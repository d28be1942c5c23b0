//! Student record storage
//!
//! Records live as human-readable text blocks in a single append-ordered
//! file. There is no index and no uniqueness constraint on the roll number:
//! the same roll may appear in any number of blocks, and deleting a roll
//! removes all of them by rewriting the whole file.
//!
//! The [`RecordStore`] trait is the seam the dispatcher works against;
//! [`FileStore`] is the flat-file implementation.

pub mod block;
pub mod file;

pub use block::{BlockDecoder, SEPARATOR};
pub use file::FileStore;

use crate::record::{QueryRecord, StudentRecord};
use std::io;
use std::path::PathBuf;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store operation errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Operations the dispatcher needs from a record store
pub trait RecordStore {
    /// Persist one record after any existing ones
    fn append(&mut self, record: &StudentRecord) -> Result<()>;

    /// Every stored record, oldest first
    ///
    /// A store that has never been written to yields an empty list.
    fn scan_all(&self) -> Result<Vec<QueryRecord>>;

    /// Remove every record with this roll number
    ///
    /// Rolls `<= 0` are a no-op. Returns the number of records removed.
    fn delete_by_roll(&mut self, roll: i32) -> Result<usize>;
}
