//! WAL reader for sequential replay
//!
//! Records are yielded lazily in file order. A malformed line stops the
//! iteration with a corruption error; the one exception is an unterminated
//! final line that does not parse, which is the residue of an append
//! interrupted before its fsync and is skipped with a warning.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::errors::{WalError, WalResult};
use super::record::WalEntry;

/// Lazy, restartable iterator over WAL entries
pub struct WalReader {
    wal_path: PathBuf,
    /// `None` when the log file does not exist
    reader: Option<BufReader<File>>,
    /// Byte offset of the next line
    offset: u64,
    /// 1-based number of the next line
    line: u64,
    /// Set after end of file or the first error
    finished: bool,
    torn_tail: bool,
    buf: String,
}

impl WalReader {
    /// Opens a WAL file for reading. A missing file reads as empty.
    pub fn open(wal_path: &Path) -> WalResult<Self> {
        let reader = match File::open(wal_path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(WalError::io(
                    format!("Failed to open WAL file: {}", wal_path.display()),
                    e,
                ))
            }
        };

        Ok(Self {
            wal_path: wal_path.to_path_buf(),
            reader,
            offset: 0,
            line: 1,
            finished: false,
            torn_tail: false,
            buf: String::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.wal_path
    }

    /// Byte offset of the next unread line
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Whether an interrupted final append was skipped
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Rewinds to the first record
    pub fn reset(&mut self) -> WalResult<()> {
        if let Some(reader) = self.reader.as_mut() {
            reader
                .seek(SeekFrom::Start(0))
                .map_err(|e| WalError::io("Failed to seek to start of WAL", e))?;
        }
        self.offset = 0;
        self.line = 1;
        self.finished = false;
        self.torn_tail = false;
        Ok(())
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(entry))` for a valid record
    /// - `Ok(None)` at end of file (or after a skipped torn tail)
    /// - `Err` for an unreadable file or a malformed complete line
    pub fn read_next(&mut self) -> WalResult<Option<WalEntry>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            let Some(reader) = self.reader.as_mut() else {
                self.finished = true;
                return Ok(None);
            };

            self.buf.clear();
            let read = match reader.read_line(&mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    self.finished = true;
                    if e.kind() == io::ErrorKind::InvalidData {
                        return Err(WalError::corruption_at_line(
                            self.line,
                            self.offset,
                            "record is not valid UTF-8",
                        ));
                    }
                    return Err(WalError::io(format!("Failed to read WAL line {}", self.line), e));
                }
            };
            if read == 0 {
                self.finished = true;
                return Ok(None);
            }

            let line_no = self.line;
            let line_offset = self.offset;
            let terminated = self.buf.ends_with('\n');
            self.offset += read as u64;
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            match WalEntry::from_line(text) {
                Ok(entry) => return Ok(Some(entry)),
                Err(reason) if !terminated => {
                    self.finished = true;
                    self.torn_tail = true;
                    warn!(
                        target: "cairndb::wal",
                        path = %self.wal_path.display(),
                        line = line_no,
                        byte_offset = line_offset,
                        reason = %reason,
                        "ignoring unterminated final WAL record"
                    );
                    return Ok(None);
                }
                Err(reason) => {
                    self.finished = true;
                    return Err(WalError::corruption_at_line(line_no, line_offset, reason));
                }
            }
        }
    }

    /// Reads every remaining record.
    pub fn read_all(&mut self) -> WalResult<Vec<WalEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read_next()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl Iterator for WalReader {
    type Item = WalResult<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Document;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn insert_line(id: u64) -> String {
        let doc = Document::from_json(json!({"_id": id, "n": id})).unwrap();
        WalEntry::insert(doc).to_line().unwrap()
    }

    fn write_wal(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("wal.log");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let mut reader = WalReader::open(&dir.path().join("absent.log")).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_reads_in_order() {
        let dir = TempDir::new().unwrap();
        let content = format!("{}{}{}", insert_line(1), insert_line(2), insert_line(3));
        let path = write_wal(&dir, &content);

        let ids: Vec<_> = WalReader::open(&path)
            .unwrap()
            .map(|e| e.unwrap().target_id().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_reset_allows_rereading() {
        let dir = TempDir::new().unwrap();
        let path = write_wal(&dir, &format!("{}{}", insert_line(1), insert_line(2)));

        let mut reader = WalReader::open(&path).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
        assert!(reader.read_next().unwrap().is_none());

        reader.reset().unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_torn_tail_is_ignored() {
        let dir = TempDir::new().unwrap();
        let full = insert_line(2);
        let content = format!("{}{}", insert_line(1), &full[..full.len() / 2]);
        let path = write_wal(&dir, &content);

        let mut reader = WalReader::open(&path).unwrap();
        let entries = reader.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(reader.torn_tail());
    }

    #[test]
    fn test_unterminated_but_complete_record_is_kept() {
        let dir = TempDir::new().unwrap();
        let content = format!("{}{}", insert_line(1), insert_line(2).trim_end());
        let path = write_wal(&dir, &content);

        let mut reader = WalReader::open(&path).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
        assert!(!reader.torn_tail());
    }

    #[test]
    fn test_corruption_in_the_middle_is_fatal() {
        let dir = TempDir::new().unwrap();
        let content = format!("{}{{not json}}\n{}", insert_line(1), insert_line(3));
        let path = write_wal(&dir, &content);

        let mut reader = WalReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        let err = reader.read_next().unwrap_err();
        assert!(err.is_corruption());
        assert!(err.details().unwrap().contains("line: 2"));

        // The iterator is fused after an error
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_invalid_record_shape_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_wal(&dir, "{\"type\":\"update\",\"timestamp\":\"t\",\"id\":1}\n");
        let err = WalReader::open(&path).unwrap().read_all().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_wal(&dir, &format!("\n{}\n{}", insert_line(1), insert_line(2)));
        assert_eq!(WalReader::open(&path).unwrap().read_all().unwrap().len(), 2);
    }
}
