//! WAL writer with fsync enforcement
//!
//! - Every append is followed by fsync before the call returns
//! - A failed write or fsync fails the call; the caller must not apply the
//!   mutation
//! - A failed append is cut back off the file, so a rejected mutation is
//!   never replayed. If that cut fails the writer is poisoned and refuses
//!   appends until `clear`
//! - `clear` truncates after a successful checkpoint

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::observability::Event;
use crate::value::{Document, DocumentId};

use super::errors::{WalError, WalResult};
use super::reader::WalReader;
use super::record::WalEntry;

/// Directory under the data dir holding the log
pub const WAL_DIR: &str = "wal";
/// Log file name
pub const WAL_FILE: &str = "wal.log";

const TAIL_CHUNK: u64 = 4096;

/// Append-only NDJSON log writer
#[derive(Debug)]
pub struct WalWriter {
    wal_path: PathBuf,
    file: File,
    /// Records appended since open or the last `clear`
    records_written: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl WalWriter {
    /// Opens or creates `<data_dir>/wal/wal.log`, creating directories as
    /// needed.
    ///
    /// An unterminated final line left by an interrupted append is repaired
    /// first: kept (newline added) if it is a valid record, cut otherwise.
    pub fn open(data_dir: &Path) -> WalResult<Self> {
        let wal_dir = data_dir.join(WAL_DIR);
        let wal_path = wal_dir.join(WAL_FILE);

        fs::create_dir_all(&wal_dir).map_err(|e| {
            WalError::io(format!("Failed to create WAL directory: {}", wal_dir.display()), e)
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&wal_path)
            .map_err(|e| WalError::io(format!("Failed to open WAL file: {}", wal_path.display()), e))?;

        Self::repair_tail(&mut file, &wal_path)?;

        Ok(Self {
            wal_path,
            file,
            records_written: 0,
            poisoned: false,
        })
    }

    /// Ensures the file is empty or ends with a newline.
    fn repair_tail(file: &mut File, wal_path: &Path) -> WalResult<()> {
        let io_err = |e: std::io::Error| WalError::io(format!("Failed to inspect WAL tail: {}", wal_path.display()), e);

        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            return Ok(());
        }

        let tail_start = Self::last_line_start(file, len).map_err(io_err)?;
        if tail_start == len {
            return Ok(());
        }

        let mut tail = Vec::with_capacity((len - tail_start) as usize);
        file.seek(SeekFrom::Start(tail_start)).map_err(io_err)?;
        file.read_to_end(&mut tail).map_err(io_err)?;

        let complete = std::str::from_utf8(&tail)
            .ok()
            .map(str::trim)
            .is_some_and(|text| text.is_empty() || WalEntry::from_line(text).is_ok());

        if complete {
            file.write_all(b"\n").map_err(|e| WalError::append_failed("Failed to terminate WAL tail", e))?;
        } else {
            warn!(
                target: "cairndb::wal",
                path = %wal_path.display(),
                byte_offset = tail_start,
                discarded_bytes = len - tail_start,
                "truncating interrupted WAL append"
            );
            file.set_len(tail_start).map_err(io_err)?;
        }

        file.sync_all()
            .map_err(|e| WalError::fsync_failed("fsync failed after WAL tail repair", e))
    }

    /// Offset just past the last newline (0 if there is none).
    fn last_line_start(file: &mut File, len: u64) -> std::io::Result<u64> {
        let mut end = len;
        let mut chunk = vec![0u8; TAIL_CHUNK as usize];
        while end > 0 {
            let start = end.saturating_sub(TAIL_CHUNK);
            let buf = &mut chunk[..(end - start) as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(buf)?;
            if let Some(pos) = buf.iter().rposition(|b| *b == b'\n') {
                return Ok(start + pos as u64 + 1);
            }
            end = start;
        }
        Ok(0)
    }

    pub fn path(&self) -> &Path {
        &self.wal_path
    }

    /// Records appended since open or the last `clear`
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Appends a record with fsync enforcement.
    ///
    /// # Errors
    ///
    /// - `CAIRN_WAL_APPEND_FAILED` if serialization or the write fails
    /// - `CAIRN_WAL_FSYNC_FAILED` if fsync fails
    /// - `CAIRN_WAL_POISONED` if an earlier failure could not be rolled back
    ///
    /// On a write or fsync failure the file is truncated back to its length
    /// before the call.
    pub fn append(&mut self, entry: &WalEntry) -> WalResult<()> {
        if self.poisoned {
            return Err(WalError::poisoned(&self.wal_path));
        }

        let line = entry.to_line().map_err(|e| {
            WalError::append_failed(
                format!("Failed to serialize {} record", entry.record_type.as_str()),
                e.into(),
            )
        })?;

        let prev_len = self
            .file
            .metadata()
            .map_err(|e| WalError::io(format!("Failed to stat WAL: {}", self.wal_path.display()), e))?
            .len();

        let written = self
            .file
            .write_all(line.as_bytes())
            .map_err(|e| {
                WalError::append_failed(
                    format!("Failed to write {} record", entry.record_type.as_str()),
                    e,
                )
            })
            .and_then(|()| self.fsync());

        if let Err(e) = written {
            self.roll_back(prev_len);
            return Err(e);
        }
        self.records_written += 1;

        debug!(
            target: "cairndb::wal",
            event = Event::WalAppend.as_str(),
            record_type = entry.record_type.as_str(),
            id = ?entry.target_id(),
            bytes = line.len(),
            "wal append"
        );
        Ok(())
    }

    /// Cuts the file back to `len` after a failed append.
    fn roll_back(&mut self, len: u64) {
        let result = self.file.set_len(len).and_then(|()| self.file.sync_all());
        if let Err(e) = result {
            self.poisoned = true;
            error!(
                target: "cairndb::wal",
                path = %self.wal_path.display(),
                byte_offset = len,
                error = %e,
                "failed append could not be rolled back; WAL poisoned"
            );
        }
    }

    /// Whether appends are refused after an unrecoverable failure
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Logs an insert of the fully stamped document
    pub fn log_insert(&mut self, document: &Document) -> WalResult<()> {
        self.append(&WalEntry::insert(document.clone()))
    }

    /// Logs the post-update document
    pub fn log_update(&mut self, id: DocumentId, document: &Document) -> WalResult<()> {
        self.append(&WalEntry::update(id, document.clone()))
    }

    pub fn log_delete(&mut self, id: DocumentId) -> WalResult<()> {
        self.append(&WalEntry::delete(id))
    }

    /// Explicitly fsync the WAL file.
    pub fn fsync(&self) -> WalResult<()> {
        self.file
            .sync_all()
            .map_err(|e| WalError::fsync_failed("WAL fsync failed", e))
    }

    /// Starts a fresh lazy pass over the log.
    pub fn read_all_entries(&self) -> WalResult<WalReader> {
        WalReader::open(&self.wal_path)
    }

    /// Truncates the log to zero bytes.
    ///
    /// Called only after a snapshot holding every logged mutation is durable.
    /// The file and its directory are fsynced before returning.
    pub fn clear(&mut self) -> WalResult<()> {
        self.file
            .set_len(0)
            .map_err(|e| WalError::io(format!("Failed to truncate WAL: {}", self.wal_path.display()), e))?;
        self.fsync()?;

        if let Some(wal_dir) = self.wal_path.parent() {
            let dir = File::open(wal_dir).map_err(|e| {
                WalError::io(format!("Failed to open WAL directory: {}", wal_dir.display()), e)
            })?;
            dir.sync_all().map_err(|e| {
                WalError::fsync_failed(format!("Failed to fsync WAL directory: {}", wal_dir.display()), e)
            })?;
        }

        self.records_written = 0;
        self.poisoned = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(id: u64) -> Document {
        Document::from_json(json!({"_id": id, "name": format!("doc{}", id)})).unwrap()
    }

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let wal_dir = temp_dir.path().join("wal");
        assert!(!wal_dir.exists());

        let writer = WalWriter::open(temp_dir.path()).unwrap();
        assert!(wal_dir.exists());
        assert_eq!(writer.path(), wal_dir.join("wal.log"));
    }

    #[test]
    fn test_appends_one_line_per_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();

        writer.log_insert(&doc(1)).unwrap();
        writer.log_update(1, &doc(1)).unwrap();
        writer.log_delete(1).unwrap();
        assert_eq!(writer.records_written(), 3);

        let content = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.ends_with('\n'));

        let types: Vec<_> = writer
            .read_all_entries()
            .unwrap()
            .map(|e| e.unwrap().record_type.as_str())
            .collect();
        assert_eq!(types, vec!["insert", "update", "delete"]);
    }

    #[test]
    fn test_reopen_appends() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            writer.log_insert(&doc(1)).unwrap();
        }
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.log_insert(&doc(2)).unwrap();

        let entries = writer.read_all_entries().unwrap().read_all().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_clear_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.log_insert(&doc(1)).unwrap();
        writer.clear().unwrap();

        assert_eq!(fs::metadata(writer.path()).unwrap().len(), 0);
        assert_eq!(writer.records_written(), 0);

        writer.log_insert(&doc(2)).unwrap();
        let entries = writer.read_all_entries().unwrap().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target_id(), Some(2));
    }

    #[test]
    fn test_open_truncates_torn_tail() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let mut writer = WalWriter::open(temp_dir.path()).unwrap();
            writer.log_insert(&doc(1)).unwrap();
            writer.path().to_path_buf()
        };
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"type":"insert","timest"#).unwrap();
        drop(file);

        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.log_insert(&doc(2)).unwrap();

        let ids: Vec<_> = writer
            .read_all_entries()
            .unwrap()
            .map(|e| e.unwrap().target_id().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_open_terminates_complete_tail() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wal").join("wal.log");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let line = WalEntry::insert(doc(1)).to_line().unwrap();
        fs::write(&path, line.trim_end()).unwrap();

        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.log_insert(&doc(2)).unwrap();

        let entries = writer.read_all_entries().unwrap().read_all().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_failed_append_is_rolled_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.log_insert(&doc(1)).unwrap();
        let len = fs::metadata(writer.path()).unwrap().len();

        // A write that died halfway through the line
        writer.file.write_all(br#"{"type":"update","id":1,"docu"#).unwrap();
        writer.roll_back(len);
        assert!(!writer.is_poisoned());
        assert_eq!(fs::metadata(writer.path()).unwrap().len(), len);

        writer.log_insert(&doc(2)).unwrap();
        let ids: Vec<_> = writer
            .read_all_entries()
            .unwrap()
            .map(|e| e.unwrap().target_id().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_poisoned_writer_refuses_appends_until_clear() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = WalWriter::open(temp_dir.path()).unwrap();
        writer.log_insert(&doc(1)).unwrap();
        let len = fs::metadata(writer.path()).unwrap().len();

        writer.poisoned = true;
        let err = writer.log_insert(&doc(2)).unwrap_err();
        assert_eq!(err.code(), crate::wal::WalErrorCode::CairnWalPoisoned);
        assert!(err.is_fatal());
        assert_eq!(fs::metadata(writer.path()).unwrap().len(), len);

        writer.clear().unwrap();
        assert!(!writer.is_poisoned());
        writer.log_insert(&doc(3)).unwrap();
        assert_eq!(writer.read_all_entries().unwrap().read_all().unwrap().len(), 1);
    }
}
