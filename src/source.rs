//! External collaborators: file enumeration and file moving
//!
//! The engine only depends on the traits here; the concrete implementations
//! are what the binary wires in. Tests substitute their own.

use crate::domain::{FileKind, FileRecord};
use crate::error::{DesksweepError, MoveError, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// How much of a file feeds the content fingerprint.
const FINGERPRINT_PREFIX: usize = 64 * 1024;

/// Enumerates a location and yields untriaged file records.
pub trait FileSource {
    fn enumerate(&self, location: &Path) -> Result<Vec<FileRecord>>;
}

/// Moves a file to the system trash.
pub trait FileMover {
    fn trash(&self, record: &FileRecord) -> std::result::Result<(), MoveError>;
}

/// Relocates a file to cloud storage. Exercised by the Cloud decision only;
/// the actual transfer is outside this crate.
pub trait CloudMover {
    fn relocate(&self, record: &FileRecord) -> std::result::Result<(), MoveError>;
}

/// Reads one directory level, skipping hidden entries, and classifies each
/// entry. Subdirectories become `Folder` records; they are not recursed
/// into. Per-entry failures are skipped, only the top-level read is fatal.
#[derive(Debug, Default)]
pub struct DirectorySource;

impl FileSource for DirectorySource {
    fn enumerate(&self, location: &Path) -> Result<Vec<FileRecord>> {
        if location.exists() && !location.is_dir() {
            return Err(DesksweepError::NotADirectory(location.to_path_buf()));
        }

        let entries = fs::read_dir(location).map_err(|source| DesksweepError::Scan {
            path: location.to_path_buf(),
            source,
        })?;

        let mut records = Vec::new();

        for entry_result in entries {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();

            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };

            if file_name.starts_with('.') {
                continue;
            }

            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    debug!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let modified: DateTime<Utc> = metadata
                .modified()
                .map(Into::into)
                .unwrap_or_else(|_| Utc::now());
            // Creation time is unavailable on some filesystems.
            let created: DateTime<Utc> = metadata
                .created()
                .map(Into::into)
                .unwrap_or(modified);

            let (kind, size, fingerprint) = if metadata.is_dir() {
                (FileKind::Folder, 0, None)
            } else {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                (
                    FileKind::from_extension(ext),
                    metadata.len(),
                    fingerprint_file(&path),
                )
            };

            records.push(FileRecord::new(
                path,
                size,
                created,
                modified,
                kind,
                fingerprint,
            ));
        }

        // Oldest first, so long-forgotten files come up for review early.
        records.sort_by(|a, b| a.created.cmp(&b.created));

        Ok(records)
    }
}

/// Checksums the first 64 KiB of content. A cheap equality signal, not a
/// cryptographic digest; `None` when the file cannot be read.
fn fingerprint_file(path: &Path) -> Option<u32> {
    let mut file = File::open(path).ok()?;
    let mut buf = vec![0u8; FINGERPRINT_PREFIX];
    let mut read_total = 0;

    while read_total < buf.len() {
        match file.read(&mut buf[read_total..]) {
            Ok(0) => break,
            Ok(n) => read_total += n,
            Err(_) => return None,
        }
    }

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf[..read_total]);
    Some(hasher.finalize())
}

/// Production mover backed by the platform trash.
#[derive(Debug, Default)]
pub struct SystemTrashMover;

impl FileMover for SystemTrashMover {
    fn trash(&self, record: &FileRecord) -> std::result::Result<(), MoveError> {
        trash::delete(&record.path).map_err(|e| MoveError {
            path: record.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Placeholder cloud relocator: logs the request and reports success. The
/// real transfer belongs to an external service.
#[derive(Debug, Default)]
pub struct NullCloudMover;

impl CloudMover for NullCloudMover {
    fn relocate(&self, record: &FileRecord) -> std::result::Result<(), MoveError> {
        warn!("cloud relocation not configured, leaving {} in place", record.path.display());
        Ok(())
    }
}
