//! CLI entry point for lbxd.

use std::io::{self, IsTerminal, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lbxd::codec::internal_id_from_signed;
use lbxd::pagination::{combined_watchlists, member_watches};
use lbxd::{ApiClient, ApiConfig, ExternalId, FetchOptions, Fetcher, IdKind, resolve_member_id};
use tracing::{debug, info, warn};

mod cli;
mod output;
mod progress;

use cli::{Args, Command, FetchArgs};
use output::{MemberIdRow, OutputFormat, write_json_lines, write_rows, write_unresolved};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Load .env before building the filter so it can carry RUST_LOG too
    let dotenv = dotenvy::dotenv();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to read .env file"),
    }
    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::MemberId { usernames, format } => run_member_id(&usernames, format).await,
        Command::Watchlist { member_ids, format } => run_watchlist(&member_ids, format).await,
        Command::Watches { member_id, format } => run_watches(&member_id, format).await,
        Command::Fetch(fetch) => run_fetch(fetch, args.quiet).await,
        Command::Encode { id, member } => run_encode(id, member),
        Command::Decode {
            external_id,
            with_kind,
        } => run_decode(&external_id, with_kind),
    }
}

fn build_client() -> Result<ApiClient> {
    let config = ApiConfig::from_env().context("API credentials are required for this command")?;
    debug!(?config, "API configuration loaded");
    Ok(ApiClient::new(config)?)
}

async fn run_member_id(usernames: &[String], format: OutputFormat) -> Result<()> {
    let client = build_client()?;

    let mut rows = Vec::with_capacity(usernames.len());
    for username in usernames {
        let member_id = resolve_member_id(&client, username)
            .await
            .with_context(|| format!("could not resolve member '{username}'"))?;
        rows.push(MemberIdRow {
            username: username.clone(),
            member_id,
        });
    }

    let mut out = io::stdout().lock();
    write_rows(&mut out, &rows, format)?;
    out.flush()?;
    Ok(())
}

async fn run_watchlist(member_ids: &[String], format: OutputFormat) -> Result<()> {
    let client = build_client()?;
    let entries = combined_watchlists(&client, member_ids).await?;

    let mut out = io::stdout().lock();
    write_rows(&mut out, &entries, format)?;
    out.flush()?;
    Ok(())
}

async fn run_watches(member_id: &str, format: OutputFormat) -> Result<()> {
    let client = build_client()?;
    let entries = member_watches(&client, member_id).await?;

    let mut out = io::stdout().lock();
    write_rows(&mut out, &entries, format)?;
    out.flush()?;
    Ok(())
}

async fn run_fetch(args: FetchArgs, quiet: bool) -> Result<()> {
    // Validate options before touching credentials or stdin
    let fetcher = Fetcher::new(FetchOptions {
        max_retries: args.max_retries,
        max_workers: usize::from(args.max_workers),
        progress_interval: args.progress_interval,
    })?;

    let paths = read_paths(args.paths)?;
    if paths.is_empty() {
        info!("No endpoint paths provided. Pass them as arguments or pipe them via stdin.");
        info!("Example: echo 'film/2bbs' | lbxd fetch");
        return Ok(());
    }

    let client = Arc::new(build_client()?);

    let bar = progress::fetch_progress_bar(!quiet && io::stderr().is_terminal(), paths.len());
    let fetcher = progress::track_fetch(fetcher, bar.as_ref());

    let report = fetcher.fetch_all(client, paths).await?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    for path in &report.not_found {
        info!(path = %path, "not found");
    }

    let mut out = io::stdout().lock();
    write_json_lines(&mut out, &report.successes)?;
    out.flush()?;

    if !quiet {
        let mut err = io::stderr().lock();
        write_unresolved(&mut err, &report)?;
        err.flush()?;
    }
    Ok(())
}

/// Collects endpoint paths from arguments, or from stdin when none were given.
fn read_paths(args: Vec<String>) -> Result<Vec<String>> {
    let raw = if !args.is_empty() {
        args
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer.lines().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    Ok(raw
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn run_encode(id: i64, member: bool) -> Result<()> {
    let internal_id = internal_id_from_signed(id)?;
    let kind = if member {
        IdKind::Secondary
    } else {
        IdKind::Primary
    };
    println!("{}", ExternalId::encode(internal_id, kind)?);
    Ok(())
}

fn run_decode(external_id: &str, with_kind: bool) -> Result<()> {
    let id: ExternalId = external_id.parse()?;
    if with_kind {
        let kind = id.kind().map_or_else(|| "unknown".to_string(), |k| k.to_string());
        println!("{}\t{kind}", id.internal_id());
    } else {
        println!("{}", id.internal_id());
    }
    Ok(())
}
