//! Reads a listing page from stdin and prints its records as JSON.
//!
//! The source is either looked up by name in a YAML site list or described
//! on the command line. With `--seen`, only records whose URL is not listed
//! in that file (one URL per line) are printed.

use std::collections::HashSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use feedsift::{diff, extract_bytes, Error, Result, Settings, SourceConfig, Status};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "extract_stdin")]
#[command(about = "Extract listing records from a page read on stdin")]
#[command(version)]
struct Cli {
    /// YAML site list to take the source from
    #[arg(short, long, requires = "source")]
    config: Option<PathBuf>,

    /// Source name within the site list
    #[arg(short, long)]
    source: Option<String>,

    /// Page URL, used to resolve relative links when no site list is given
    #[arg(long, conflicts_with = "config")]
    url: Option<String>,

    /// Container selector when no site list is given
    #[arg(long, conflicts_with = "config")]
    selector: Option<String>,

    /// Treat stdin as a JSON feed with the item list at this path
    #[arg(long, conflicts_with = "config")]
    json_path: Option<String>,

    /// Content-Type of the page, for charset detection
    #[arg(long)]
    content_type: Option<String>,

    /// File of already known URLs; only new records are printed
    #[arg(long)]
    seen: Option<PathBuf>,

    /// Also print diagnostics
    #[arg(short, long)]
    diagnostics: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    status: Status,
    records: &'a [feedsift::Record],
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a [feedsift::Diagnostic]>,
}

fn resolve_source(cli: &Cli) -> Result<SourceConfig> {
    if let Some(path) = &cli.config {
        let settings = Settings::load(path)?;
        let name = cli.source.as_deref().unwrap_or_default();
        return settings
            .source(name)
            .cloned()
            .ok_or_else(|| Error::Configuration(format!("no source named `{name}`")));
    }

    let Some(url) = &cli.url else {
        return Err(Error::Configuration(
            "either --config or --url is required".to_string(),
        ));
    };
    let name = cli.source.clone().unwrap_or_else(|| "stdin".to_string());
    let mut source = SourceConfig::new(name, url.clone());
    if let Some(selector) = &cli.selector {
        source = source.with_selector(selector.clone());
    }
    if let Some(path) = &cli.json_path {
        source = source.with_json_path(path.clone());
    }
    Ok(source)
}

fn read_seen(path: &Path) -> Result<HashSet<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn run(cli: &Cli) -> Result<Status> {
    let source = resolve_source(cli)?;

    let mut body = Vec::new();
    io::stdin().read_to_end(&mut body)?;

    let extraction = extract_bytes(&body, cli.content_type.as_deref(), &source);
    let records = match &cli.seen {
        Some(path) => diff::diff(&read_seen(path)?, &extraction.records),
        None => extraction.records.clone(),
    };

    let status = extraction.status();
    let output = Output {
        status,
        records: &records,
        diagnostics: cli.diagnostics.then_some(extraction.diagnostics.as_slice()),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(status)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(Status::Failed) => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
