use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;

use watchlist::batch::{run_batch, BatchSummary};
use watchlist::config::{load_config, AppConfig};
use watchlist::database::{open_for_provisioning, run_sql_script};
use watchlist::{logging, vendors, Coordinator, IdIssuer, MemoryIdIssuer, SqliteIdIssuer};

#[derive(Parser)]
#[command(name = "watchlist", version, about = "Vendor product extraction and id issuance")]
struct Cli {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = "Settings.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract products from the pages listed in a manifest.
    Extract {
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Issue ids from an in-memory counter instead of the store.
        #[arg(long)]
        dry_run: bool,
    },
    /// Issue a single id.
    Issue { label: String },
    /// Run a provisioning script against the id store.
    InitDb { script: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    logging::init(&config.logging.level)?;
    println!("{}", "Settings loaded".green());

    match cli.command {
        Command::Extract {
            manifest,
            output,
            dry_run,
        } => extract(&config, manifest, output, dry_run).await,
        Command::Issue { label } => {
            let issuer = SqliteIdIssuer::open(&config.database).context("Failed to open id store")?;
            let id = issuer.issue(&label).await?;
            println!("{}", id);
            Ok(())
        }
        Command::InitDb { script } => {
            let conn = open_for_provisioning(&config.database.path)?;
            let report = run_sql_script(&conn, &script)?;
            println!(
                "{}",
                format!(
                    "Processed {} lines ({} statements) in {}",
                    report.lines,
                    report.statements,
                    script.display()
                )
                .green()
            );
            Ok(())
        }
    }
}

async fn extract(
    config: &AppConfig,
    manifest: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let profiles = vendors::builtin(&config.vendors.enabled).map_err(|name| anyhow!("Unknown vendor {:?}", name))?;
    let manifest = manifest.unwrap_or_else(|| PathBuf::from(&config.batch.manifest));
    let output = output.unwrap_or_else(|| PathBuf::from(&config.batch.output));
    let concurrency = config.batch.max_concurrency;

    let summary = if dry_run {
        println!("{}", "Dry run: ids are not persisted".yellow());
        let coordinator = Coordinator::new(profiles, MemoryIdIssuer::new());
        run_batch(&coordinator, &manifest, &output, concurrency).await?
    } else {
        let issuer = SqliteIdIssuer::open(&config.database).context("Failed to open id store")?;
        let coordinator = Coordinator::new(profiles, issuer);
        run_batch(&coordinator, &manifest, &output, concurrency).await?
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "{}",
        format!(
            "{} pages: {} complete, {} partial, {} rejected, {} skipped",
            summary.total(),
            summary.complete,
            summary.partial,
            summary.rejected,
            summary.skipped
        )
        .green()
    );
    if summary.unassigned > 0 {
        eprintln!(
            "{}",
            format!("{} extracted pages have no id, see warnings above", summary.unassigned).red()
        );
    }
}
