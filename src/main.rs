use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::net::TcpListener;
use std::path::Path;

mod api;
mod catalog;
mod cli;
mod config;
mod proxy;
mod render;
mod session;
mod util;

use api::{ApiClient, GenerationRequest};
use catalog::Passage;
use cli::{Command, FormatArgs, GenerateArgs, LastArgs, LinkArgs, ProxyArgs, RootArgs};
use session::{SessionRecord, SESSION_SCHEMA_VERSION};

/// Placeholder shown when the API answers without any content.
const DEFAULT_CONTENT: &str = "Étude Verset par Verset\n";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Format(args) => cmd_format(args),
        Command::Last(args) => cmd_last(args),
        Command::Reset => cmd_reset(),
        Command::Books => cmd_books(),
        Command::Link(args) => cmd_link(args),
        Command::Proxy(args) => cmd_proxy(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let passage = Passage::new(&args.book, args.chapter, args.verse)?;
    let target_chars = catalog::snap_target_chars(args.length);
    let backend = config::backend_url(args.base_url.as_deref());
    let client = ApiClient::new(&config::api_base(&backend));
    let enriched = !args.no_enriched;
    let request = GenerationRequest {
        passage: passage.to_string(),
        version: args.version,
        enriched,
        target_chars,
    };

    // The enriched route can be missing in production; fall back to the
    // standard chain rather than surfacing its failure.
    let success = if enriched {
        match client.post_with_fallback(api::ENRICHED_ENDPOINTS, &request) {
            Ok(success) => success,
            Err(err) => {
                tracing::warn!(error = %err, "enriched endpoints failed, falling back to standard");
                client.post_with_fallback(api::STANDARD_ENDPOINTS, &request)?
            }
        }
    } else {
        client.post_with_fallback(api::STANDARD_ENDPOINTS, &request)?
    };
    tracing::info!(url = %success.url, "study generated");

    let raw = api::content_text(&success.data).unwrap_or_else(|| DEFAULT_CONTENT.to_string());
    let html = render::format_study(&raw);
    write_output(args.out.as_deref(), &html)?;

    let mut completion = BTreeMap::new();
    completion.insert("0".to_string(), true);
    let record = SessionRecord {
        schema_version: SESSION_SCHEMA_VERSION,
        passage,
        version: args.version,
        target_chars,
        active_section: 0,
        last_content: raw,
        completion,
    };
    let path = session::default_session_path()?;
    session::save_session(&path, &record)?;
    Ok(())
}

fn cmd_format(args: FormatArgs) -> Result<()> {
    let raw = match &args.input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            buf
        }
    };
    let html = render::format_study(&raw);
    write_output(args.out.as_deref(), &html)
}

fn cmd_last(args: LastArgs) -> Result<()> {
    let path = session::default_session_path()?;
    let record = session::load_session(&path)?
        .ok_or_else(|| anyhow!("no saved session (run `etude generate` first)"))?;
    eprintln!(
        "Dernière session : {} ({}, {} caractères)",
        record.passage, record.version, record.target_chars
    );
    let html = render::format_study(&record.last_content);
    write_output(args.out.as_deref(), &html)
}

fn cmd_reset() -> Result<()> {
    let path = session::default_session_path()?;
    if session::clear_session(&path)? {
        println!("Session supprimée.");
    } else {
        println!("Aucune session enregistrée.");
    }
    Ok(())
}

fn cmd_books() -> Result<()> {
    for name in catalog::book_names() {
        let chapters = catalog::chapter_count(name).unwrap_or(0);
        println!("{name} ({chapters})");
    }
    Ok(())
}

fn cmd_link(args: LinkArgs) -> Result<()> {
    // Validates the book name and chapter bound before building the link.
    let passage = Passage::new(&args.book, args.chapter, None)?;
    let link = catalog::reading_link(&passage.book, passage.chapter)
        .ok_or_else(|| anyhow!("no reading link for {}", passage.book))?;
    println!("{link}");
    Ok(())
}

fn cmd_proxy(args: ProxyArgs) -> Result<()> {
    let target_base = args
        .target_base
        .or_else(|| std::env::var(config::API_TARGET_BASE_ENV).ok());
    let listener = TcpListener::bind(&args.listen)
        .with_context(|| format!("bind proxy listener on {}", args.listen))?;
    let config = proxy::ProxyConfig { target_base };
    proxy::serve(listener, &config)
}

fn write_output(out: Option<&Path>, html: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("write {}", path.display()))?;
            eprintln!("Wrote study to {}", path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}
