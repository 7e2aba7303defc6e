//! Suggestion types and detection rules
//!
//! Each rule is a pure function over the focused file and a bounded
//! comparison window, so the background worker can run them one at a time
//! with cancellation checks in between.

use crate::domain::{format_size, FileId, FileRecord};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SUGGESTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a suggestion, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuggestionId(pub u64);

impl SuggestionId {
    fn next() -> Self {
        SuggestionId(NEXT_SUGGESTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Tunable detection thresholds.
///
/// The defaults follow the product copy ("keep newest 5", "older than a
/// week"); everything here is configuration, not a hard requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionThresholds {
    /// How many working-list files the comparison window covers.
    pub comparison_window: usize,
    /// Delay before a computation starts, so fast navigation stays cheap.
    pub debounce_ms: u64,
    /// Minimum group size for a similar-names suggestion.
    pub similar_min_group: usize,
    /// Two files created within this window belong to the same session.
    pub session_window_secs: i64,
    /// A file untouched for this long counts as old.
    pub old_after_days: i64,
    /// A file at least this big counts as large.
    pub large_bytes: u64,
    /// How many files the "keep newest" smart action keeps.
    pub keep_newest: usize,
    /// Group members older than this feed the "bin aged" smart action.
    pub aged_after_days: i64,
}

impl Default for SuggestionThresholds {
    fn default() -> Self {
        SuggestionThresholds {
            comparison_window: 100,
            debounce_ms: 100,
            similar_min_group: 3,
            session_window_secs: 5 * 60,
            old_after_days: 90,
            large_bytes: 50 * 1024 * 1024,
            keep_newest: 5,
            aged_after_days: 7,
        }
    }
}

/// What a suggestion claims about the focused file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionKind {
    Duplicate {
        count: usize,
        members: Vec<FileId>,
    },
    SimilarNames {
        prefix: String,
        count: usize,
        members: Vec<FileId>,
    },
    SameSession {
        members: Vec<FileId>,
    },
    OldFile,
    LargeFile,
    TemporaryFile,
}

/// A derived hint that the focused file relates to others in a specific
/// way. Read-only; rebuilt on demand, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: SuggestionId,
    /// The file this suggestion was computed for.
    pub subject: FileId,
    pub kind: SuggestionKind,
    pub message: String,
    pub hint: Option<String>,
}

impl Suggestion {
    fn new(subject: FileId, kind: SuggestionKind, message: String, hint: Option<String>) -> Self {
        Suggestion {
            id: SuggestionId::next(),
            subject,
            kind,
            message,
            hint,
        }
    }

    /// The files this suggestion is about, the subject included. Group
    /// kinds carry their members; single-file kinds cover just the subject.
    pub fn member_ids(&self) -> Vec<FileId> {
        match &self.kind {
            SuggestionKind::Duplicate { members, .. }
            | SuggestionKind::SimilarNames { members, .. }
            | SuggestionKind::SameSession { members } => members.clone(),
            SuggestionKind::OldFile
            | SuggestionKind::LargeFile
            | SuggestionKind::TemporaryFile => vec![self.subject],
        }
    }
}

/// Rule signature shared by every detector, so the worker can iterate them
/// with a cancellation check between each.
pub type DetectRule =
    fn(&FileRecord, &[FileRecord], &SuggestionThresholds, DateTime<Utc>) -> Option<Suggestion>;

/// All rules, in presentation order.
pub const DETECT_RULES: [DetectRule; 6] = [
    detect_duplicates,
    detect_similar_names,
    detect_same_session,
    detect_old_file,
    detect_large_file,
    detect_temporary_file,
];

/// Runs every rule against the window. The worker prefers iterating
/// `DETECT_RULES` itself; this is the synchronous convenience used by tests.
pub fn compute_suggestions(
    focused: &FileRecord,
    window: &[FileRecord],
    thresholds: &SuggestionThresholds,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    DETECT_RULES
        .iter()
        .filter_map(|rule| rule(focused, window, thresholds, now))
        .collect()
}

fn others<'a>(focused: &FileRecord, window: &'a [FileRecord]) -> impl Iterator<Item = &'a FileRecord> {
    let id = focused.id;
    window.iter().filter(move |r| r.id != id)
}

pub fn detect_duplicates(
    focused: &FileRecord,
    window: &[FileRecord],
    _thresholds: &SuggestionThresholds,
    _now: DateTime<Utc>,
) -> Option<Suggestion> {
    let fingerprint = focused.fingerprint?;

    let mut members: Vec<FileId> = others(focused, window)
        .filter(|r| r.size == focused.size && r.fingerprint == Some(fingerprint))
        .map(|r| r.id)
        .collect();

    if members.is_empty() {
        return None;
    }

    members.insert(0, focused.id);
    let count = members.len();

    Some(Suggestion::new(
        focused.id,
        SuggestionKind::Duplicate {
            count,
            members: members.clone(),
        },
        format!("{} identical copies of this file", count),
        Some("Keep the newest copy and bin the rest".to_string()),
    ))
}

pub fn detect_similar_names(
    focused: &FileRecord,
    window: &[FileRecord],
    thresholds: &SuggestionThresholds,
    _now: DateTime<Utc>,
) -> Option<Suggestion> {
    let key = normalize_stem(&focused.name);
    if key.is_empty() {
        return None;
    }

    let mut group: Vec<&FileRecord> = vec![focused];
    group.extend(others(focused, window).filter(|r| normalize_stem(&r.name) == key));

    if group.len() < thresholds.similar_min_group {
        return None;
    }

    let names: Vec<&str> = group.iter().map(|r| r.name.as_str()).collect();
    let mut prefix = longest_common_prefix(&names)
        .trim_end_matches(|c: char| c.is_ascii_digit() || matches!(c, ' ' | '-' | '_' | '.' | '('))
        .to_string();
    if prefix.is_empty() {
        prefix = key.clone();
    }

    let members: Vec<FileId> = group.iter().map(|r| r.id).collect();
    let count = members.len();

    Some(Suggestion::new(
        focused.id,
        SuggestionKind::SimilarNames {
            prefix: prefix.clone(),
            count,
            members,
        },
        format!("One of {} files named like \"{}\"", count, prefix),
        Some("Keep the newest few and bin the rest".to_string()),
    ))
}

pub fn detect_same_session(
    focused: &FileRecord,
    window: &[FileRecord],
    thresholds: &SuggestionThresholds,
    _now: DateTime<Utc>,
) -> Option<Suggestion> {
    let window_span = Duration::seconds(thresholds.session_window_secs);

    let nearby: Vec<FileId> = others(focused, window)
        .filter(|r| {
            let gap = r.created.signed_duration_since(focused.created);
            gap.abs() <= window_span
        })
        .map(|r| r.id)
        .collect();

    if nearby.len() < 2 {
        return None;
    }

    let mut members = vec![focused.id];
    members.extend(nearby);
    let count = members.len();

    Some(Suggestion::new(
        focused.id,
        SuggestionKind::SameSession { members },
        format!("Created in the same burst as {} other files", count - 1),
        Some("Review the whole batch together".to_string()),
    ))
}

pub fn detect_old_file(
    focused: &FileRecord,
    _window: &[FileRecord],
    thresholds: &SuggestionThresholds,
    now: DateTime<Utc>,
) -> Option<Suggestion> {
    let age = now.signed_duration_since(focused.modified);
    if age <= Duration::days(thresholds.old_after_days) {
        return None;
    }

    Some(Suggestion::new(
        focused.id,
        SuggestionKind::OldFile,
        format!("Untouched for {} days", age.num_days()),
        Some("Probably safe to bin".to_string()),
    ))
}

pub fn detect_large_file(
    focused: &FileRecord,
    _window: &[FileRecord],
    thresholds: &SuggestionThresholds,
    _now: DateTime<Utc>,
) -> Option<Suggestion> {
    if focused.size < thresholds.large_bytes {
        return None;
    }

    Some(Suggestion::new(
        focused.id,
        SuggestionKind::LargeFile,
        format!("Takes up {}", format_size(focused.size)),
        Some("Binning it reclaims the space".to_string()),
    ))
}

const TEMP_EXTENSIONS: &[&str] = &[
    "tmp",
    "temp",
    "bak",
    "old",
    "swp",
    "part",
    "crdownload",
    "download",
    "dmp",
    "cache",
];

pub fn detect_temporary_file(
    focused: &FileRecord,
    _window: &[FileRecord],
    _thresholds: &SuggestionThresholds,
    _now: DateTime<Utc>,
) -> Option<Suggestion> {
    let name = focused.name.to_lowercase();

    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    let transient = TEMP_EXTENSIONS.contains(&ext)
        || name.starts_with("~$")
        || name.ends_with('~')
        || name.contains(".tmp.");

    if !transient {
        return None;
    }

    Some(Suggestion::new(
        focused.id,
        SuggestionKind::TemporaryFile,
        "Looks like a leftover temporary file".to_string(),
        Some("Safe to bin".to_string()),
    ))
}

/// Collapses a file name to a comparison key: extension dropped,
/// lowercased, digit runs removed, separator runs folded to one space.
/// `IMG_0142.jpg` and `IMG_0157.jpg` both become `img`; a dated screenshot
/// series collapses to its textual skeleton.
pub fn normalize_stem(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((s, _)) if !s.is_empty() => s,
        _ => name,
    };

    let mut out = String::with_capacity(stem.len());
    let mut last_was_sep = false;
    for c in stem.to_lowercase().chars() {
        if c.is_ascii_digit() {
            continue;
        }
        if matches!(c, ' ' | '-' | '_' | '.' | '(' | ')') {
            if !last_was_sep && !out.is_empty() {
                out.push(' ');
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }

    out.trim().to_string()
}

fn longest_common_prefix(names: &[&str]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };

    let mut end = first.chars().count();
    for name in &names[1..] {
        end = first
            .chars()
            .zip(name.chars())
            .take_while(|(a, b)| a == b)
            .count()
            .min(end);
    }

    first.chars().take(end).collect()
}
