//! Write-ahead journal
//!
//! Every committed mutation is appended as one JSON line before the pool
//! state changes and before the caller is acknowledged. Recovery replays the
//! lines through [`Pool::apply`], which is deterministic because each entry
//! carries the timestamp it was executed with.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use cosmo_core::{PoolError, StorageError, Timestamp};
use serde::{Deserialize, Serialize};

use crate::pool::Pool;
use crate::state::Operation;

/// One journaled mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub operation: Operation,
}

/// Durable, append-only record of committed operations
pub trait Journal: Send {
    /// Append an entry; it must be durable when this returns `Ok`
    fn append(&mut self, entry: &JournalEntry) -> Result<(), StorageError>;

    /// Number of entries written so far
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Journal kept in memory; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Vec<JournalEntry>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }
}

impl Journal for MemoryJournal {
    fn append(&mut self, entry: &JournalEntry) -> Result<(), StorageError> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn len(&self) -> u64 {
        self.entries.len() as u64
    }
}

/// Storage underneath a [`FileJournal`]
pub trait JournalFile: Write + Send {
    /// Current length in bytes
    fn size(&self) -> io::Result<u64>;

    /// Cut the file back to `len` bytes and make that durable
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Flush written data to stable storage
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_all()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// What a scan of journal contents found
struct Scan {
    entries: Vec<JournalEntry>,
    /// Bytes up to the end of the last complete entry
    valid_len: u64,
    torn_at: Option<usize>,
}

/// Parse JSON lines, tolerating one unreadable record only at the very end
fn scan(mut reader: impl BufRead) -> Result<Scan, StorageError> {
    let mut entries = Vec::new();
    let mut valid_len: u64 = 0;
    let mut torn_at: Option<usize> = None;
    let mut line = String::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        line_no += 1;

        if torn_at.is_some() {
            // A bad line followed by more data is not a torn tail.
            return Err(StorageError::Corrupt {
                line: line_no - 1,
                message: "unreadable entry before end of journal".to_string(),
            });
        }

        let complete = line.ends_with('\n');
        let trimmed = line.trim_end();
        if trimmed.is_empty() && complete {
            valid_len += read as u64;
            continue;
        }

        match serde_json::from_str::<JournalEntry>(trimmed) {
            Ok(entry) if complete => {
                entries.push(entry);
                valid_len += read as u64;
            }
            _ => torn_at = Some(line_no),
        }
    }
    Ok(Scan {
        entries,
        valid_len,
        torn_at,
    })
}

/// JSON-lines journal file
///
/// A failed append is cut back off the file before the error is returned.
/// If that cut fails too, the journal refuses every later append.
#[derive(Debug)]
pub struct FileJournal<F = File> {
    path: PathBuf,
    file: F,
    sync_writes: bool,
    count: u64,
    failed: bool,
}

impl FileJournal {
    /// Open (or create) a journal and return it with the entries it holds.
    ///
    /// A torn final record left by a crash mid-append is cut off. Damage
    /// anywhere else is reported as corruption.
    pub fn open(
        path: impl AsRef<Path>,
        sync_writes: bool,
    ) -> Result<(Self, Vec<JournalEntry>), StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let Scan {
            entries,
            valid_len,
            torn_at,
        } = scan(BufReader::new(&mut file))?;

        if let Some(line) = torn_at {
            tracing::warn!(
                "Truncating torn journal record at line {} of {}",
                line,
                path.display()
            );
            file.truncate(valid_len)?;
        }
        file.seek(SeekFrom::End(0))?;

        tracing::debug!(
            "Opened journal {} with {} entries",
            path.display(),
            entries.len()
        );

        let journal = Self {
            path,
            file,
            sync_writes,
            count: entries.len() as u64,
            failed: false,
        };
        Ok((journal, entries))
    }
}

impl<F> FileJournal<F> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: JournalFile> FileJournal<F> {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        if self.sync_writes {
            self.file.sync()?;
        }
        Ok(())
    }
}

impl<F: JournalFile> Journal for FileJournal<F> {
    fn append(&mut self, entry: &JournalEntry) -> Result<(), StorageError> {
        if self.failed {
            return Err(StorageError::Io(io::Error::other(format!(
                "journal {} is unusable after a failed rollback",
                self.path.display()
            ))));
        }

        let mut line = serde_json::to_vec(entry).map_err(|e| StorageError::Corrupt {
            line: self.count as usize + 1,
            message: e.to_string(),
        })?;
        line.push(b'\n');

        let start = self.file.size()?;
        if let Err(e) = self.write_line(&line) {
            match self.file.truncate(start) {
                Ok(()) => tracing::warn!(
                    "Rolled back journal entry {} in {}: {}",
                    entry.sequence,
                    self.path.display(),
                    e
                ),
                Err(rollback) => {
                    tracing::error!(
                        "Could not roll back journal entry {} in {}: {}",
                        entry.sequence,
                        self.path.display(),
                        rollback
                    );
                    self.failed = true;
                }
            }
            return Err(e.into());
        }
        self.count += 1;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.count
    }
}

/// Rebuild pool state by replaying journal entries in order
pub fn replay(pool: &mut Pool, entries: &[JournalEntry]) -> Result<(), StorageError> {
    for entry in entries {
        let expected = pool.sequence() + 1;
        if entry.sequence != expected {
            return Err(StorageError::Replay {
                sequence: entry.sequence,
                source: PoolError::invalid(format!("expected sequence {}", expected)),
            });
        }
        pool.apply(&entry.operation, entry.timestamp)
            .map_err(|source| StorageError::Replay {
                sequence: entry.sequence,
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cosmo_core::Direction;

    use super::*;
    use crate::pool::test_support::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cosmodex-journal-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&dir);
        dir
    }

    fn entries() -> Vec<JournalEntry> {
        vec![
            JournalEntry {
                sequence: 1,
                timestamp: 10,
                operation: Operation::AddLiquidity {
                    caller: addr(1),
                    amount_a: 1000 * E18,
                    amount_b: 1000 * E6,
                    min_liquidity: 0,
                },
            },
            JournalEntry {
                sequence: 2,
                timestamp: 11,
                operation: Operation::Swap {
                    caller: addr(2),
                    amount_in: 100 * E18,
                    min_amount_out: 0,
                    direction: Direction::AToB,
                },
            },
        ]
    }

    #[test]
    fn test_file_journal_roundtrip() {
        let path = temp_path("roundtrip");
        {
            let (mut journal, existing) = FileJournal::open(&path, true).unwrap();
            assert!(existing.is_empty());
            for entry in entries() {
                journal.append(&entry).unwrap();
            }
            assert_eq!(journal.len(), 2);
        }

        let (journal, loaded) = FileJournal::open(&path, true).unwrap();
        assert_eq!(loaded, entries());
        assert_eq!(journal.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let path = temp_path("torn");
        {
            let (mut journal, _) = FileJournal::open(&path, false).unwrap();
            journal.append(&entries()[0]).unwrap();
        }
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"sequence\":2,\"timest").unwrap();
        }

        let (mut journal, loaded) = FileJournal::open(&path, false).unwrap();
        assert_eq!(loaded.len(), 1);
        journal.append(&entries()[1]).unwrap();
        drop(journal);

        let (_, reloaded) = FileJournal::open(&path, false).unwrap();
        assert_eq!(reloaded, entries());
        let _ = std::fs::remove_file(&path);
    }

    /// In-memory journal file that fails on demand
    #[derive(Debug, Default)]
    struct FlakyFile {
        data: Vec<u8>,
        /// Accept this many more bytes, then fail writes
        write_budget: Option<usize>,
        fail_sync: bool,
        fail_truncate: bool,
    }

    impl Write for FlakyFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = match self.write_budget {
                Some(0) => return Err(io::Error::other("no space left on device")),
                Some(budget) => {
                    let n = budget.min(buf.len());
                    self.write_budget = Some(budget - n);
                    n
                }
                None => buf.len(),
            };
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl JournalFile for FlakyFile {
        fn size(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.fail_truncate {
                return Err(io::Error::other("read-only file system"));
            }
            self.data.truncate(len as usize);
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            if self.fail_sync {
                return Err(io::Error::other("fsync failed"));
            }
            Ok(())
        }
    }

    fn flaky_journal() -> FileJournal<FlakyFile> {
        FileJournal {
            path: PathBuf::from("flaky.journal"),
            file: FlakyFile::default(),
            sync_writes: true,
            count: 0,
            failed: false,
        }
    }

    fn reload(journal: &FileJournal<FlakyFile>) -> Vec<JournalEntry> {
        let found = scan(&journal.file.data[..]).unwrap();
        assert_eq!(found.torn_at, None);
        found.entries
    }

    #[test]
    fn test_partial_write_is_rolled_back() {
        let mut journal = flaky_journal();
        journal.append(&entries()[0]).unwrap();
        let clean_len = journal.file.data.len();

        journal.file.write_budget = Some(12);
        assert!(journal.append(&entries()[1]).is_err());
        assert_eq!(journal.file.data.len(), clean_len);
        assert_eq!(journal.len(), 1);

        journal.file.write_budget = None;
        journal.append(&entries()[1]).unwrap();
        assert_eq!(reload(&journal), entries());
    }

    #[test]
    fn test_failed_sync_is_rolled_back() {
        let mut journal = flaky_journal();
        journal.file.fail_sync = true;
        assert!(journal.append(&entries()[0]).is_err());
        assert!(journal.file.data.is_empty());
        assert!(journal.is_empty());

        journal.file.fail_sync = false;
        journal.append(&entries()[0]).unwrap();
        assert_eq!(reload(&journal), entries()[..1].to_vec());
    }

    #[test]
    fn test_failed_rollback_stops_appends() {
        let mut journal = flaky_journal();
        journal.file.fail_sync = true;
        journal.file.fail_truncate = true;
        assert!(journal.append(&entries()[0]).is_err());

        journal.file.fail_sync = false;
        journal.file.fail_truncate = false;
        let err = journal.append(&entries()[0]).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_corrupt_middle_line_is_an_error() {
        let path = temp_path("corrupt");
        let first = serde_json::to_string(&entries()[0]).unwrap();
        let second = serde_json::to_string(&entries()[1]).unwrap();
        std::fs::write(&path, format!("{}\nnot json\n{}\n", first, second)).unwrap();

        let err = FileJournal::open(&path, false).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_replay_rebuilds_state() {
        let mut pool = icecream_usdc();
        replay(&mut pool, &entries()).unwrap();

        let mut expected = icecream_usdc();
        expected.add_liquidity(addr(1), 1000 * E18, 1000 * E6, 0).unwrap();
        expected.swap(addr(2), 100 * E18, 0, Direction::AToB, 11).unwrap();

        assert_eq!(pool.snapshot(), expected.snapshot());
        assert_eq!(pool.trades().batch(0, 1), expected.trades().batch(0, 1));
    }

    #[test]
    fn test_replay_rejects_gaps_and_failures() {
        let mut pool = icecream_usdc();
        let mut gapped = entries();
        gapped[1].sequence = 5;
        assert!(matches!(
            replay(&mut pool, &gapped),
            Err(StorageError::Replay { sequence: 5, .. })
        ));

        let mut pool = icecream_usdc();
        let failing = vec![JournalEntry {
            sequence: 1,
            timestamp: 1,
            operation: Operation::RemoveLiquidity {
                caller: addr(1),
                liquidity: 1,
                min_amount_a: 0,
                min_amount_b: 0,
            },
        }];
        assert!(matches!(
            replay(&mut pool, &failing),
            Err(StorageError::Replay { sequence: 1, .. })
        ));
    }

    #[test]
    fn test_memory_journal() {
        let mut journal = MemoryJournal::new();
        assert!(journal.is_empty());
        journal.append(&entries()[0]).unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entries()[0].sequence, 1);
    }
}
