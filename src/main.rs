use desksweep::cli::{AppConfig, Args};
use desksweep::config::Preferences;
use desksweep::domain::{format_size, Decision, FileKind};
use desksweep::engine::{DesksweepEngine, EngineOptions};
use desksweep::source::{DirectorySource, NullCloudMover, SystemTrashMover};
use desksweep::suggest::SuggestionId;
use desksweep::thumbs::NoThumbnails;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .init();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let prefs = Preferences::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load preferences: {}", e);
        Preferences::default()
    });

    let config = AppConfig::from_args(&args, prefs.deferred_bin, prefs.thresholds);

    run_session(&config)
}

fn run_session(config: &AppConfig) -> io::Result<()> {
    let mut engine = DesksweepEngine::new(
        Box::new(DirectorySource),
        Arc::new(NoThumbnails),
        Box::new(SystemTrashMover),
        Box::new(NullCloudMover),
        EngineOptions {
            bin_mode: config.bin_mode,
            thresholds: config.thresholds.clone(),
        },
    )
    .map_err(|e| io::Error::other(e.to_string()))?;

    let count = engine
        .load_session(&config.directory)
        .map_err(|e| io::Error::other(e.to_string()))?;

    if count == 0 {
        println!("Nothing to review in {}", config.directory.display());
        return Ok(());
    }

    if let Some(kind) = config.kind_filter {
        engine.set_filter(Some(kind));
    }

    println!(
        "Reviewing {} files in {} (h for help)",
        count,
        config.directory.display()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        engine.poll();
        print_status(&mut engine);

        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let argument = parts.next();

        match command {
            "" | "n" => engine.skip(),
            "k" => apply(&mut engine, Decision::Keep),
            "b" => apply(&mut engine, Decision::Bin),
            "s" => apply(&mut engine, Decision::Stack),
            "c" => apply(&mut engine, Decision::Cloud),
            "u" => {
                if !engine.undo() {
                    println!("Nothing to undo");
                }
            }
            "f" => match argument {
                Some(name) => match parse_kind(name) {
                    Some(kind) => engine.set_filter(Some(kind)),
                    None => println!("Unknown type: {}", name),
                },
                None => engine.set_filter(None),
            },
            "g" => match argument.and_then(|a| a.parse::<u64>().ok()) {
                Some(raw) => {
                    if let Err(e) = engine.start_group_review(SuggestionId(raw)) {
                        println!("{}", e);
                    } else {
                        print_review(&engine);
                    }
                }
                None => println!("Usage: g <suggestion id>"),
            },
            "a" => match argument.and_then(|a| a.parse::<usize>().ok()) {
                Some(index) => {
                    if let Err(e) = engine.apply_group_action(index) {
                        println!("{}", e);
                    }
                }
                None => println!("Usage: a <action index>"),
            },
            "x" => engine.close_group_review(),
            "h" => print_help(),
            "q" => break,
            other => println!("Unknown command: {} (h for help)", other),
        }

        if engine.is_finished() && engine.active_review().is_none() {
            println!("All files reviewed.");
            break;
        }
    }

    engine.commit_pending();
    print_summary(&engine);
    Ok(())
}

fn apply(engine: &mut DesksweepEngine, decision: Decision) {
    if let Err(e) = engine.decide(decision) {
        println!("{}", e);
    }
}

fn print_status(engine: &mut DesksweepEngine) {
    if let Some(ctx) = engine.active_review() {
        println!(
            "-- group review: {} ({} members) --",
            ctx.suggestion.message,
            ctx.members.len()
        );
        for member in &ctx.members {
            println!("   {} ({})", member.name, format_size(member.size));
        }
        for (i, action) in engine.group_actions().iter().enumerate() {
            println!("   a {} - {}", i, action.label);
        }
        return;
    }

    let Some(file) = engine.current() else {
        return;
    };

    println!(
        "[{}/{}] {} ({}, {})",
        engine.session().cursor() + 1,
        engine.visible_len(),
        file.name,
        kind_name(file.kind),
        format_size(file.size)
    );

    let suggestions = engine.current_suggestions();
    if suggestions.is_empty() {
        println!("   (no flags yet)");
    }
    for suggestion in &suggestions {
        match &suggestion.hint {
            Some(hint) => println!(
                "   [{}] {} - {} (g {} to review)",
                suggestion.id.0, suggestion.message, hint, suggestion.id.0
            ),
            None => println!("   [{}] {}", suggestion.id.0, suggestion.message),
        }
    }
}

fn print_review(engine: &DesksweepEngine) {
    if let Some(ctx) = engine.active_review() {
        println!("Opened review with {} members", ctx.members.len());
    }
}

fn print_summary(engine: &DesksweepEngine) {
    let counters = engine.counters();
    println!();
    println!("Session summary");
    println!("   kept:      {}", counters.kept);
    println!("   binned:    {}", counters.binned);
    println!("   stacked:   {}", engine.stacked().len());
    println!("   relocated: {}", engine.relocated().len());
    println!("   reclaimed: {}", format_size(counters.reclaimed_bytes));
}

fn print_help() {
    println!("Commands:");
    println!("   k         keep the current file");
    println!("   b         bin the current file");
    println!("   s         stack the current file for later");
    println!("   c         relocate the current file to cloud storage");
    println!("   n/enter   skip without deciding");
    println!("   u         undo the last decision");
    println!("   f [type]  filter by type (image, video, ...); no arg clears");
    println!("   g <id>    open a group review for a flagged suggestion");
    println!("   a <i>     apply a smart action inside a group review");
    println!("   x         close the group review");
    println!("   q         quit");
}

fn parse_kind(name: &str) -> Option<FileKind> {
    match name.to_lowercase().as_str() {
        "image" => Some(FileKind::Image),
        "video" => Some(FileKind::Video),
        "audio" => Some(FileKind::Audio),
        "document" | "doc" => Some(FileKind::Document),
        "archive" => Some(FileKind::Archive),
        "app" => Some(FileKind::App),
        "folder" => Some(FileKind::Folder),
        "other" => Some(FileKind::Other),
        _ => None,
    }
}

fn kind_name(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Image => "image",
        FileKind::Video => "video",
        FileKind::Audio => "audio",
        FileKind::Document => "document",
        FileKind::Archive => "archive",
        FileKind::App => "app",
        FileKind::Folder => "folder",
        FileKind::Other => "other",
    }
}
