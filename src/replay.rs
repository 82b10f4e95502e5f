//! Single-use enforcement for attestations.
//!
//! A [`ReplayKey`] is recorded at most once and never removed. Recording is
//! the only mutation, so the consumed set grows monotonically for the life of
//! the system.
//!
//! [`FileReplayGuard`] keeps the set across restarts with an append-only log
//! of hex-encoded keys, one per line. Each record is written with a single
//! `write_all` and fsynced before `consume` returns, so an attestation is
//! never applied without its record being durable first.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{errors::AttestError, types::ReplayKey};

pub trait ReplayGuard: Send + Sync {
    /// Record `key`. Succeeds exactly once per key.
    ///
    /// # Errors
    ///
    /// `AttestationAlreadyUsed` if `key` was recorded before; `ReplayLog` if a
    /// durable implementation could not persist it (the key is then not
    /// recorded).
    fn consume(&self, key: ReplayKey) -> Result<(), AttestError>;

    fn is_consumed(&self, key: &ReplayKey) -> bool;

    /// Number of recorded keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process replay guard.
#[derive(Debug, Default)]
pub struct MemoryReplayGuard {
    consumed: Mutex<HashSet<ReplayKey>>,
}

impl MemoryReplayGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplayGuard for MemoryReplayGuard {
    fn consume(&self, key: ReplayKey) -> Result<(), AttestError> {
        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if !consumed.insert(key) {
            return Err(AttestError::AttestationAlreadyUsed);
        }
        Ok(())
    }

    fn is_consumed(&self, key: &ReplayKey) -> bool {
        self.consumed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    fn len(&self) -> usize {
        self.consumed.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Append-only, fsynced replay log.
pub struct FileReplayGuard {
    path: PathBuf,
    consumed: Mutex<HashSet<ReplayKey>>,
    file: Mutex<File>,
}

impl std::fmt::Debug for FileReplayGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReplayGuard")
            .field("path", &self.path)
            .field("consumed_count", &self.len())
            .finish_non_exhaustive()
    }
}

fn parse_line(line: &[u8]) -> Result<ReplayKey, String> {
    let bytes = hex::decode(line.trim_ascii()).map_err(|e| format!("invalid hex: {e}"))?;
    ReplayKey::try_from(bytes.as_slice()).map_err(|_| format!("expected 32 bytes, got {}", bytes.len()))
}

/// Outcome of scanning the log's unterminated final segment.
enum Tail {
    Clean,
    /// A whole key whose newline never reached disk.
    MissingNewline,
    /// A partial record starting at this offset.
    Torn(u64),
}

impl FileReplayGuard {
    /// Open or create the log at `path` and rebuild the consumed set from it.
    ///
    /// Every newline-terminated line must hold a key; anything else fails the
    /// open. An unterminated final segment is the trace of a crash during
    /// `consume`: a complete key gets its newline restored, a partial one is
    /// truncated away.
    ///
    /// # Errors
    ///
    /// `ReplayLog` on I/O failure or mid-file corruption.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AttestError> {
        let path = path.as_ref().to_path_buf();
        let mut consumed = HashSet::new();

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .truncate(false)
            .append(true)
            .open(&path)?;

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut contents)?;

        let mut offset: u64 = 0;
        let mut tail = Tail::Clean;
        let mut segments = contents.split_inclusive(|&b| b == b'\n').enumerate().peekable();
        while let Some((idx, segment)) = segments.next() {
            let terminated = segment.ends_with(b"\n");
            let body = segment.strip_suffix(b"\n").unwrap_or(segment);
            if !body.trim_ascii().is_empty() {
                match parse_line(body) {
                    Ok(key) => {
                        consumed.insert(key);
                        if !terminated {
                            tail = Tail::MissingNewline;
                        }
                    }
                    Err(reason) if !terminated && segments.peek().is_none() => {
                        tracing::warn!(
                            line = idx + 1,
                            reason = %reason,
                            path = %path.display(),
                            "truncating torn tail record from replay log"
                        );
                        tail = Tail::Torn(offset);
                    }
                    Err(reason) => {
                        return Err(AttestError::ReplayLog(format!(
                            "corrupt replay log entry at line {}: {reason}",
                            idx + 1
                        )));
                    }
                }
            }
            offset += segment.len() as u64;
        }

        match tail {
            Tail::Clean => {}
            Tail::MissingNewline => {
                tracing::warn!(path = %path.display(), "restoring newline after final replay log record");
                file.write_all(b"\n")?;
                file.sync_all()?;
            }
            Tail::Torn(pos) => {
                file.set_len(pos)?;
                file.sync_all()?;
            }
        }

        tracing::debug!(path = %path.display(), entries = consumed.len(), "replay log opened");
        Ok(Self {
            path,
            consumed: Mutex::new(consumed),
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single write. On failure the file is cut back
    /// to its previous length so the next append starts on a fresh line.
    fn append_record(file: &mut File, key: &ReplayKey) -> Result<(), AttestError> {
        let mut record = hex::encode(key.0).into_bytes();
        record.push(b'\n');
        let len_before = file.metadata()?.len();
        let written = file.write_all(&record).and_then(|()| file.sync_all());
        if let Err(e) = written {
            if let Err(rollback) = file.set_len(len_before) {
                tracing::error!(error = %rollback, "replay log rollback failed");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl ReplayGuard for FileReplayGuard {
    fn consume(&self, key: ReplayKey) -> Result<(), AttestError> {
        let mut consumed = self.consumed.lock().unwrap_or_else(PoisonError::into_inner);
        if consumed.contains(&key) {
            return Err(AttestError::AttestationAlreadyUsed);
        }

        // Durable before visible.
        {
            let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            Self::append_record(&mut file, &key)?;
        }

        consumed.insert(key);
        Ok(())
    }
    fn is_consumed(&self, key: &ReplayKey) -> bool {
        self.consumed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    fn len(&self) -> usize {
        self.consumed.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
