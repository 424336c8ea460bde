// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::{Parser, Subcommand};

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "notedown",
    version = "0.1.0",
    about = "Download remote images in Markdown notes and relink them to local copies",
    long_about = "notedown scans Markdown notes for images hosted on http(s) URLs, downloads \
                  each one, names it from a configurable template, and rewrites the note to \
                  point at the local file. Links whose download fails are left untouched."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (note, vault)
//
// Each variant represents a different subcommand the user can run
// The fields inside each variant become the arguments for that subcommand
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Localize the remote images of a single note
    ///
    /// Example: notedown note journal/trip.md --root ~/vault
    Note {
        /// Path to the note, relative to the vault root
        note_path: String,

        /// The vault root directory; note paths and saved assets are
        /// resolved against it
        #[arg(long, default_value = ".")]
        root: String,

        /// Settings file path (JSON). Default: notedown.json under the root
        #[arg(long)]
        config: Option<String>,

        /// Output the report in JSON format instead of text
        #[arg(long)]
        json: bool,
    },

    /// Localize every Markdown note under a directory, one note at a time
    ///
    /// Example: notedown vault ~/vault --json
    Vault {
        /// The vault root directory to walk for .md notes
        vault_dir: String,

        /// Settings file path (JSON). Default: notedown.json under the root
        #[arg(long)]
        config: Option<String>,

        /// Output the reports in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}
