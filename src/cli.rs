//! CLI argument parsing and session configuration

use crate::decide::BinMode;
use crate::domain::FileKind;
use crate::suggest::SuggestionThresholds;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Desksweep - declutter a folder one file at a time
///
/// Review each file, keep what you need, bin the rest; a background
/// analyzer flags duplicates, bursts, and stale files as you go.
#[derive(Parser, Debug, Clone)]
#[command(name = "desksweep")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to review
    ///
    /// If not specified, defaults to the current directory.
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Only review files of this type
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: Option<KindFilter>,

    /// Collect binned files for review instead of trashing immediately
    #[arg(long = "deferred-bin", action = ArgAction::SetTrue)]
    pub deferred_bin: bool,

    /// Age in days after which a file counts as old
    #[arg(long = "old-days")]
    pub old_days: Option<i64>,

    /// Size in megabytes after which a file counts as large
    #[arg(long = "large-mb")]
    pub large_mb: Option<u64>,

    /// Minutes between creation times that still count as one session
    #[arg(long = "session-window-mins")]
    pub session_window_mins: Option<i64>,

    /// How many files the background analyzer compares against
    #[arg(long = "window")]
    pub comparison_window: Option<usize>,
}

/// File type filter options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    App,
    Folder,
    Other,
}

impl From<KindFilter> for FileKind {
    fn from(filter: KindFilter) -> Self {
        match filter {
            KindFilter::Image => FileKind::Image,
            KindFilter::Video => FileKind::Video,
            KindFilter::Audio => FileKind::Audio,
            KindFilter::Document => FileKind::Document,
            KindFilter::Archive => FileKind::Archive,
            KindFilter::App => FileKind::App,
            KindFilter::Folder => FileKind::Folder,
            KindFilter::Other => FileKind::Other,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if !self.directory.exists() {
            return Err(format!(
                "Directory does not exist: {}",
                self.directory.display()
            ));
        }

        if !self.directory.is_dir() {
            return Err(format!(
                "Path is not a directory: {}",
                self.directory.display()
            ));
        }

        if self.old_days == Some(0) {
            return Err("old-days must be at least 1".to_string());
        }

        if self.comparison_window == Some(0) {
            return Err("window must be at least 1".to_string());
        }

        Ok(())
    }

    /// Overlay the CLI overrides onto configured thresholds.
    pub fn apply_overrides(&self, mut thresholds: SuggestionThresholds) -> SuggestionThresholds {
        if let Some(days) = self.old_days {
            thresholds.old_after_days = days;
        }
        if let Some(mb) = self.large_mb {
            thresholds.large_bytes = mb * 1024 * 1024;
        }
        if let Some(mins) = self.session_window_mins {
            thresholds.session_window_secs = mins * 60;
        }
        if let Some(window) = self.comparison_window {
            thresholds.comparison_window = window;
        }
        thresholds
    }
}

/// Configuration derived from CLI arguments and preferences
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub kind_filter: Option<FileKind>,
    pub bin_mode: BinMode,
    pub thresholds: SuggestionThresholds,
}

impl AppConfig {
    pub fn from_args(args: &Args, prefs_deferred: bool, thresholds: SuggestionThresholds) -> Self {
        AppConfig {
            directory: args.directory.clone(),
            kind_filter: args.kind.map(Into::into),
            bin_mode: if args.deferred_bin || prefs_deferred {
                BinMode::Deferred
            } else {
                BinMode::Immediate
            },
            thresholds: args.apply_overrides(thresholds),
        }
    }
}
