//! Flat-file record store
//!
//! Appends go straight to the end of the store file. Deletes stream the file
//! into a temporary sibling without the matching blocks, then swap it in with
//! two renames: store → backup, temporary → store. A crash between the two
//! renames leaves no store file and the pre-delete contents in the backup;
//! that state is not repaired automatically.

use super::block::{self, decode_all, rewrite_without};
use super::{RecordStore, Result, StoreError};
use crate::record::{QueryRecord, StudentRecord};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default store file name
pub const STORE_FILE: &str = "grades.txt";

/// Default backup file name, written by delete
pub const BACKUP_FILE: &str = "grades.bak";

/// Default rewrite target used during delete
pub const TEMP_FILE: &str = "grades.tmp";

/// Record store backed by a single text file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    backup_path: PathBuf,
    temp_path: PathBuf,
}

impl FileStore {
    /// Store using the default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        FileStore {
            path: dir.join(STORE_FILE),
            backup_path: dir.join(BACKUP_FILE),
            temp_path: dir.join(TEMP_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    fn open_existing(&self) -> Result<Option<File>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("open", &self.path, e)),
        }
    }

    fn write_temp(&self, source: File, roll: i32) -> Result<usize> {
        let temp = File::create(&self.temp_path)
            .map_err(|e| StoreError::io("create", &self.temp_path, e))?;
        let mut writer = BufWriter::new(temp);

        let removed = rewrite_without(BufReader::new(source), &mut writer, roll)
            .map_err(|e| StoreError::io("rewrite", &self.temp_path, e))?;

        let temp = writer
            .into_inner()
            .map_err(|e| StoreError::io("flush", &self.temp_path, e.into_error()))?;
        temp.sync_all()
            .map_err(|e| StoreError::io("sync", &self.temp_path, e))?;

        Ok(removed)
    }

    fn swap_in_temp(&self) -> Result<()> {
        match fs::remove_file(&self.backup_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io("remove", &self.backup_path, e)),
        }
        fs::rename(&self.path, &self.backup_path)
            .map_err(|e| StoreError::io("back up", &self.path, e))?;
        fs::rename(&self.temp_path, &self.path)
            .map_err(|e| StoreError::io("replace", &self.path, e))
    }
}

impl RecordStore for FileStore {
    fn append(&mut self, record: &StudentRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io("open", &self.path, e))?;

        file.write_all(block::encode(record).as_bytes())
            .map_err(|e| StoreError::io("append to", &self.path, e))?;

        tracing::debug!(path = %self.path.display(), roll = record.roll, "Appended block");
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<QueryRecord>> {
        let Some(file) = self.open_existing()? else {
            return Ok(Vec::new());
        };

        decode_all(BufReader::new(file)).map_err(|e| StoreError::io("read", &self.path, e))
    }

    fn delete_by_roll(&mut self, roll: i32) -> Result<usize> {
        if roll <= 0 {
            return Ok(0);
        }
        let Some(source) = self.open_existing()? else {
            return Ok(0);
        };

        let removed = match self.write_temp(source, roll) {
            Ok(removed) => removed,
            Err(e) => {
                let _ = fs::remove_file(&self.temp_path);
                return Err(e);
            }
        };
        self.swap_in_temp()?;

        tracing::debug!(path = %self.path.display(), roll, removed, "Rewrote store");
        Ok(removed)
    }
}
