//! CLI argument parsing for the study generator.
//!
//! The CLI is intentionally thin: subcommands route into the library modules
//! without embedding policy, so the same resolver/formatter pair serves every
//! entry point.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::BibleVersion;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "etude",
    version,
    about = "French Bible study generator (verse-by-verse)",
    after_help = "Examples:\n  etude generate --book Jean --chapter 3 --verse 16\n  etude generate --book \"Genèse\" --chapter 1 --length 1500 --out etude.html\n  etude format --input brut.txt\n  etude last\n  etude books\n  etude link --book Jean --chapter 3\n  etude proxy --listen 127.0.0.1:8002 --target-base https://backend.example.org",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Generate(GenerateArgs),
    Format(FormatArgs),
    Last(LastArgs),
    /// Remove the saved session record
    Reset,
    /// List the book catalog with chapter counts
    Books,
    Link(LinkArgs),
    Proxy(ProxyArgs),
}

/// Generate a study for a passage and render it as HTML.
#[derive(Parser, Debug)]
#[command(about = "Generate and render a verse-by-verse study")]
pub struct GenerateArgs {
    /// Canonical French book name (e.g. "Jean", "Genèse")
    #[arg(long, value_name = "NOM")]
    pub book: String,

    /// Chapter number, bounded by the book
    #[arg(long, value_name = "N")]
    pub chapter: u32,

    /// Verse number; omit for the whole chapter
    #[arg(long, value_name = "N")]
    pub verse: Option<u32>,

    /// Bible text version
    #[arg(long, value_enum, default_value_t = BibleVersion::Lsg)]
    pub version: BibleVersion,

    /// Target length in characters, snapped to the 500/1500/2500 tiers
    #[arg(long, value_name = "CHARS", default_value_t = 500)]
    pub length: u32,

    /// Backend base URL (overrides ETUDE_BACKEND_URL and the defaults)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Skip the enriched endpoints and call the standard ones directly
    #[arg(long)]
    pub no_enriched: bool,

    /// Write the HTML here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Re-run the formatter on raw generation text.
#[derive(Parser, Debug)]
#[command(about = "Format raw study text to HTML")]
pub struct FormatArgs {
    /// Raw text file; stdin when omitted
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Write the HTML here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Re-render the last session's cached content.
#[derive(Parser, Debug)]
#[command(about = "Re-render the content of the last session")]
pub struct LastArgs {
    /// Write the HTML here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Print the external reading link for a chapter.
#[derive(Parser, Debug)]
#[command(about = "Print the external reading link for a chapter")]
pub struct LinkArgs {
    /// Canonical French book name
    #[arg(long, value_name = "NOM")]
    pub book: String,

    /// Chapter number
    #[arg(long, value_name = "N")]
    pub chapter: u32,
}

/// Run the forwarding proxy.
#[derive(Parser, Debug)]
#[command(about = "Forward API requests to an upstream base")]
pub struct ProxyArgs {
    /// Listen address
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8002")]
    pub listen: String,

    /// Upstream base URL (falls back to API_TARGET_BASE)
    #[arg(long, value_name = "URL")]
    pub target_base: Option<String>,
}
