//! Core data model for a declutter session

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Opaque file identity, unique for the lifetime of a session.
///
/// Assigned by the session store at load time and never reused, so a stale
/// id from an old suggestion can never alias a different file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

/// Classified file type, derived from the extension (or directory-ness).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    App,
    Folder,
    Other,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "svg" | "ico" | "heic" | "heif"
            | "tiff" | "tif" => FileKind::Image,

            "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" | "wmv" | "flv" => FileKind::Video,

            "mp3" | "wav" | "aac" | "flac" | "ogg" | "m4a" | "aiff" => FileKind::Audio,

            "pdf" | "doc" | "docx" | "txt" | "md" | "rtf" | "odt" | "pages" | "xls" | "xlsx"
            | "numbers" | "ppt" | "pptx" | "key" | "csv" => FileKind::Document,

            "zip" | "tar" | "gz" | "bz2" | "xz" | "7z" | "rar" | "dmg" | "iso" => {
                FileKind::Archive
            }

            "app" | "exe" | "msi" | "pkg" | "deb" | "rpm" | "appimage" => FileKind::App,

            _ => FileKind::Other,
        }
    }
}

/// A terminal-for-the-session classification applied to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Leave the file where it is.
    Keep,
    /// Send the file to the trash (immediately or at session end).
    Bin,
    /// Set aside for later, undecided.
    Stack,
    /// Hand off to the cloud relocator.
    Cloud,
}

/// Opaque handle to a generated preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailHandle(pub PathBuf);

/// A single file under review.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: FileId,
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub kind: FileKind,
    /// Cheap content-equality signal, `None` when the content could not be
    /// read. Equal fingerprints plus equal sizes mean "same content".
    pub fingerprint: Option<u32>,
    /// Set by the decision engine once the file has been triaged.
    pub decision: Option<Decision>,
    pub thumbnail: Option<ThumbnailHandle>,
}

impl FileRecord {
    /// Builds an untriaged record. The id is a placeholder until the session
    /// store assigns a real one at load time.
    pub fn new(
        path: PathBuf,
        size: u64,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        kind: FileKind,
        fingerprint: Option<u32>,
    ) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        FileRecord {
            id: FileId(0),
            path,
            name,
            size,
            created,
            modified,
            kind,
            fingerprint,
            decision: None,
            thumbnail: None,
        }
    }
}

/// Session counters. Monotonically increase on decisions, decrease
/// (clamped at zero) on matching undos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub kept: usize,
    pub binned: usize,
    pub reclaimed_bytes: u64,
}

/// Formats a byte count for human-readable messages ("3.2 MB").
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes / KB)
    } else {
        format!("{} B", bytes)
    }
}
