//! Liveset - command-line front end for the project catalog.
//!
//! Logs go to stderr; stdout carries only command output so it can be piped.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liveset_catalog::{
    CatalogApi, CatalogConfig, CatalogError, DocumentConfig, ProjectRecord, ScanOptions,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "liveset")]
#[command(version, about = "Catalog Ableton Live project folders")]
struct Args {
    /// Catalog file (defaults to the per-user data directory)
    #[arg(long, global = true, env = CatalogConfig::CATALOG_PATH_ENV)]
    catalog: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Project document extension
    #[arg(long, global = true, default_value = DocumentConfig::DOCUMENT_EXTENSION)]
    extension: String,

    /// Scan sibling folders one after another instead of concurrently
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover projects under a folder and merge them into the catalog
    Scan {
        root: PathBuf,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the persisted catalog
    List {
        #[arg(long)]
        json: bool,
    },
    /// Decode one project folder without touching the catalog
    Show {
        folder: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Re-read every cataloged folder, keeping stale entries that fail to scan
    Reconcile {
        #[arg(long)]
        json: bool,
    },
    /// Drop catalog entries whose folders no longer exist
    Prune,
    /// Print the sidecar tags of a project folder
    Tags {
        folder: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Remove devices by value from a project document
    StripDevices {
        document: PathBuf,
        /// Device value to remove (repeatable)
        #[arg(long = "device", required = true)]
        devices: Vec<String>,
        /// Write the result here instead of stdout (compressed for document paths)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the generic tree of a project document as JSON
    Dump { document: PathBuf },
    /// Delete the persisted catalog
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Set up logging
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<CatalogError>()
                .map(CatalogError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let options = ScanOptions {
        document_extension: args.extension.trim_start_matches('.').to_string(),
        parallel: !args.sequential,
        ..ScanOptions::default()
    };

    let api = match args.catalog {
        Some(path) => CatalogApi::builder(path).auto_create_dirs(true),
        None => CatalogApi::builder(liveset_catalog::platform::default_catalog_path()?)
            .auto_create_dirs(true),
    }
    .scan_options(options)
    .build()
    .await?;
    debug!("Catalog: {}", api.catalog_path().display());

    match args.command {
        Command::Scan { root, json } => {
            let outcome = api.scan_and_save(&root).await?;
            for skipped in &outcome.report.skipped {
                eprintln!("skipped {}: {}", skipped.folder.display(), skipped.reason);
            }
            print_records(&outcome.report.records, json)?;
            eprintln!(
                "{} found, {} new, {} in catalog",
                outcome.report.records.len(),
                outcome.added,
                outcome.catalog.len()
            );
        }
        Command::List { json } => {
            let records = api.try_load().await?;
            print_records(&records, json)?;
        }
        Command::Show { folder, json } => {
            let record = api.load_project(&folder).await?;
            print_records(std::slice::from_ref(&record), json)?;
        }
        Command::Reconcile { json } => {
            let mut records = Vec::new();
            let report = api.reconcile(&mut records).await?;
            print_records(&records, json)?;
            eprintln!(
                "{} refreshed, {} stale, {} missing, {} failed",
                report.refreshed,
                report.stale,
                report.missing.len(),
                report.failures.len()
            );
        }
        Command::Prune => {
            let removed = api.prune().await?;
            println!("{}", removed);
        }
        Command::Tags { folder, json } => {
            let tags = api.tags(&folder).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for tag in tags {
                    println!("{}\t{}", tag.group, tag.label);
                }
            }
        }
        Command::StripDevices {
            document,
            devices,
            output,
        } => {
            let values: HashSet<String> = devices.into_iter().collect();
            let outcome = api.strip_devices(&document, values, output).await?;
            match &outcome.written_to {
                Some(path) => eprintln!("{} removed, wrote {}", outcome.removed, path.display()),
                None => println!("{}", outcome.text),
            }
        }
        Command::Dump { document } => {
            let tree = api
                .dump_document(&document)
                .await
                .with_context(|| format!("Failed to dump {}", document.display()))?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Clear => {
            api.clear().await?;
        }
    }

    Ok(())
}

fn print_records(records: &[ProjectRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    for record in records {
        let bpm = if record.has_tempo() {
            format!("{:.2}", record.bpm)
        } else {
            "-".to_string()
        };
        let scale = if record.has_scale() {
            record.scale.as_str()
        } else {
            "-"
        };
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.title,
            bpm,
            scale,
            record.last_modified.format("%Y-%m-%d %H:%M"),
            record.project_folder.display()
        );
    }
    Ok(())
}
