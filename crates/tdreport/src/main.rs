//! `tdreport` - CLI for the shift report server
//!
//! Runs the HTTP server and offers offline access to the stored reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use tdreport::cli::{Cli, Command, ConfigCommand, ExportCommand, ListCommand, SaveCommand};
use tdreport::{init_logging, Config, ReportRecord, ReportStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => {
            if let Some(host) = serve_cmd.host {
                config.server.host = host;
            }
            if let Some(port) = serve_cmd.port {
                config.server.port = port;
            }
            config.validate()?;
            let store = ReportStore::from_config(&config);
            tdreport::serve(&config, store).await?;
            Ok(())
        }
        Command::List(list_cmd) => handle_list(&config, &list_cmd).await,
        Command::Export(export_cmd) => handle_export(&config, &export_cmd).await,
        Command::Save(save_cmd) => handle_save(&config, &save_cmd).await,
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let store = ReportStore::from_config(config);
    let reports = store.list_all().await.context("listing reports")?;

    if cmd.json {
        let listing = serde_json::json!({
            "count": reports.len(),
            "laporan": reports,
        });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No reports in {}", store.dir().display());
        return Ok(());
    }

    println!("{:<40} {:<24} {:>6}", "FILENAME", "TECHNICAL DIRECTOR", "FIELDS");
    for report in &reports {
        println!(
            "{:<40} {:<24} {:>6}",
            report.filename,
            report.technical_director().unwrap_or("-"),
            report.field_count()
        );
    }
    println!();
    println!("{} report(s) in {}", reports.len(), store.dir().display());
    Ok(())
}

async fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    let store = ReportStore::from_config(config);
    let bytes = store
        .read_report(&cmd.filename)
        .await
        .with_context(|| format!("exporting {}", cmd.filename))?;

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {} to {}", cmd.filename, path.display());
        }
        None => write_export(&mut std::io::stdout().lock(), &bytes)?,
    }
    Ok(())
}

/// Write a report exactly as stored, with nothing appended.
fn write_export(out: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

async fn handle_save(config: &Config, cmd: &SaveCommand) -> anyhow::Result<()> {
    let content = if cmd.reads_stdin() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(&cmd.file)
            .with_context(|| format!("reading {}", cmd.file.display()))?
    };

    let record: ReportRecord =
        serde_json::from_str(&content).context("parsing form fields as a JSON object of strings")?;

    let store = ReportStore::from_config(config);
    if let Err(err) = store.activity().init().await {
        tracing::warn!("Activity log unavailable: {err}");
    }
    let saved = store.save(&record).await?;

    println!("Saved {}", saved.filename);
    println!("Path: {}", saved.path.display());
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Address:            {}", config.bind_address());
                println!("  Max body (bytes):   {}", config.server.max_body_bytes);
                println!("  Public dir:         {}", config.server.public_dir.display());
                println!();
                println!("[Storage]");
                println!("  Reports dir:        {}", config.storage.reports_dir.display());
                println!("  Logs dir:           {}", config.storage.logs_dir.display());
                println!(
                    "  Skip invalid:       {}",
                    config.storage.skip_invalid_reports
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            validate_config_file(path)?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn validate_config_file(path: PathBuf) -> anyhow::Result<()> {
    if let Err(e) = Config::load_from(Some(path)) {
        anyhow::bail!("Configuration error: {e}");
    }
    Ok(())
}
