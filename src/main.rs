// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the settings file (defaults merged over missing keys)
// 3. Run the localize pipeline over one note or a whole vault
// 4. Print the summary and exit with proper code
//    (0 = everything resolved, 1 = some downloads failed, 2 = error)
//
// Rust concepts used:
// - async/await: Because every image in a note downloads concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - the persistent settings
mod pipeline; // src/pipeline/ - the batch link-rewrite pipeline
mod vault; // src/vault/ - file access, rooted at the note collection

// Import items we need from our modules
use cli::{Cli, Commands};
use clap::Parser; // Parser trait enables the parse() method

use anyhow::{ensure, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use pipeline::NoteReport;
use vault::FsVault;

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Diagnostic logging goes to stderr and is controlled by RUST_LOG
//
// The terminal output below is the user-facing summary; per-download
// failure detail only shows up here (try RUST_LOG=notedown=info).
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

// This is the main application logic
// Returns:
//   Ok(0) = every attempted image resolved (or there was nothing to do)
//   Ok(1) = some images failed to download
//   Err = unexpected error (printed, exits 2)
async fn run() -> Result<i32> {
    // Parse command-line arguments into our Cli struct
    // This will automatically handle --help, --version, etc.
    let cli = Cli::parse();

    match cli.command {
        Commands::Note {
            note_path,
            root,
            config,
            json,
        } => handle_note(&root, &note_path, config.as_deref(), json).await,
        Commands::Vault {
            vault_dir,
            config,
            json,
        } => handle_vault(&vault_dir, config.as_deref(), json).await,
    }
}

// Handles the 'note' subcommand: one note, one batch of downloads
async fn handle_note(root: &str, note_path: &str, config: Option<&str>, json: bool) -> Result<i32> {
    if !note_path.ends_with(".md") {
        println!("⚠️  {} is not a Markdown note, nothing to do", note_path);
        return Ok(0);
    }

    let settings = load_settings(Path::new(root), config)?;
    let fs_vault = FsVault::new(root);
    let client = pipeline::download_client()?;

    if !json {
        println!("🔍 Scanning note: {}", note_path);
    }

    let report =
        pipeline::localize_note(&fs_vault, &client, &settings, Path::new(note_path)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(exit_code_for(&[report]))
}

// Handles the 'vault' subcommand
//
// Walks the directory for .md files and runs the pipeline over each one in
// turn. Notes are processed strictly one at a time (only the images inside
// a single note download concurrently), and one unreadable note does not
// stop the rest of the walk.
async fn handle_vault(vault_dir: &str, config: Option<&str>, json: bool) -> Result<i32> {
    let root = Path::new(vault_dir);
    ensure!(root.is_dir(), "Vault directory not found: {}", vault_dir);

    let settings = load_settings(root, config)?;
    let fs_vault = FsVault::new(vault_dir);
    let client = pipeline::download_client()?;

    let notes = collect_notes(root);
    if !json {
        println!("🔍 Scanning vault: {}", vault_dir);
        println!("📄 Found {} note(s)", notes.len());
    }

    let mut reports = Vec::new();
    for note in notes {
        match pipeline::localize_note(&fs_vault, &client, &settings, &note).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("  Warning: Skipping {}: {:#}", note.display(), e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_table(&reports);
    }

    Ok(exit_code_for(&reports))
}

// Finds every .md file under the root, sorted for a stable top-to-bottom
// processing order. Paths come back vault-relative so they line up with
// what FsVault expects.
fn collect_notes(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == "md")
        })
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_path_buf()
        })
        .collect()
}

// Resolves the settings file: an explicit --config must exist, the default
// notedown.json under the root may be absent (plain defaults then)
fn load_settings(root: &Path, config: Option<&str>) -> Result<config::Settings> {
    match config {
        Some(path) => {
            ensure!(
                Path::new(path).exists(),
                "Settings file not found: {}",
                path
            );
            config::load(Path::new(path))
        }
        None => config::load(&root.join(config::DEFAULT_CONFIG_FILE)),
    }
}

// Prints the single-note summary in human-readable form
fn print_report(report: &NoteReport) {
    if report.attempted == 0 {
        println!("✅ No remote images found, nothing to do");
        return;
    }

    let failed = report.attempted - report.resolved;
    if failed == 0 {
        println!("🖼️  Downloaded all {} image(s)", report.resolved);
    } else {
        println!(
            "🖼️  Downloaded {} image(s), {} failed",
            report.resolved, failed
        );
    }
    println!("💾 Saved {} new file(s)", report.saved);

    if report.changed {
        println!("✏️  Note updated");
    } else {
        println!("✅ Note already up to date");
    }
}

// Prints the vault results as a human-readable table in the terminal
fn print_table(reports: &[NoteReport]) {
    // Print table header
    println!(
        "{:<50} {:>8} {:>9} {:>7} {:>8}",
        "NOTE", "IMAGES", "FETCHED", "SAVED", "UPDATED"
    );
    println!("{}", "=".repeat(86));

    // Print each result
    for report in reports {
        // Truncate the note path if too long for display
        let note_display = if report.note.len() > 47 {
            format!("{}...", &report.note[..47])
        } else {
            report.note.clone()
        };

        println!(
            "{:<50} {:>8} {:>9} {:>7} {:>8}",
            note_display,
            report.attempted,
            report.resolved,
            report.saved,
            if report.changed { "yes" } else { "no" }
        );
    }

    println!();

    // Print summary
    let attempted: usize = reports.iter().map(|r| r.attempted).sum();
    let resolved: usize = reports.iter().map(|r| r.resolved).sum();
    let saved: usize = reports.iter().map(|r| r.saved).sum();

    println!("📊 Summary:");
    println!("   🖼️  Images found: {}", attempted);
    println!("   ✅ Downloaded: {}", resolved);
    println!("   ❌ Failed: {}", attempted - resolved);
    println!("   💾 Newly saved: {}", saved);
}

// Determines the process exit code from the reports
// 0 = clean run, 1 = at least one image failed to resolve
fn exit_code_for(reports: &[NoteReport]) -> i32 {
    if reports.iter().all(|r| r.is_clean()) {
        0
    } else {
        1
    }
}
