use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_enrich::{config::Config, show_info::ShowInfoService, utils::xmltv};

#[derive(Parser)]
#[command(name = "epg-enrich")]
#[command(version)]
#[command(about = "Pattern-driven EPG metadata enrichment")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Pattern document path (overrides the config file)
    #[arg(short = 'p', long, value_name = "FILE")]
    patterns: Option<PathBuf>,

    /// Input XMLTV document, stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file, stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "xmltv")]
    format: OutputFormat,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Enriched XMLTV document
    Xmltv,
    /// JSON array of enriched programmes
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the enriched document
    let log_filter = format!("epg_enrich={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting epg-enrich v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(patterns) = cli.patterns {
        config.enrichment.pattern_file = Some(patterns);
    }

    // Pattern-file problems disable enrichment but never fail the run;
    // the guide is then passed through unchanged
    let service = ShowInfoService::new(&config.enrichment, &config.engine);
    if !service.is_enabled() {
        warn!("show info extraction unavailable, passing guide through unchanged");
    }

    let content = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading input {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let mut programmes = xmltv::parse_programmes(&content)?;

    let mut enriched = 0usize;
    for programme in &mut programmes {
        let before = programme.entry.clone();
        service.extract_from_entry(&mut programme.entry);
        if programme.entry != before {
            enriched += 1;
        }
    }
    info!(
        enriched,
        total = programmes.len(),
        "guide enrichment complete"
    );

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    match cli.format {
        OutputFormat::Xmltv => xmltv::write_programmes(&programmes, &mut out)?,
        OutputFormat::Json => serde_json::to_writer_pretty(&mut out, &programmes)?,
    }
    out.write_all(b"\n")?;

    Ok(())
}
