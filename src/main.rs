use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use harlem_tms::config::Config;
use harlem_tms::constants;
use harlem_tms::logging;
use harlem_tms::pipeline::Pipeline;
use harlem_tms::storage::{FileStorage, Storage};

#[derive(Parser)]
#[command(name = "harlem_tms")]
#[command(about = "Unifies partner delivery exports and builds operational reports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file (defaults to harlem_tms.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every partner export, unify them and write the reports
    Process {
        /// Specific partners to load (comma-separated). Defaults to all configured partners
        #[arg(long)]
        partners: Option<String>,
    },
    /// Print the last unified table as JSON
    Data,
    /// Print the location of a generated report
    Report {
        /// Report file name, e.g. blacklist_clientes.csv
        name: String,
    },
    /// List configured partners and whether their export is present
    Partners,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let storage = Arc::new(FileStorage::new(&config.reports_dir));

    match cli.command {
        Commands::Process { partners } => {
            println!("🚀 Running delivery unification pipeline...");

            let only: Option<Vec<String>> = partners.map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });

            let pipeline = Pipeline::new(config, storage);
            match pipeline.run(only.as_deref()).await {
                Ok(result) => {
                    info!(run_id = %result.run_id, "Pipeline finished");
                    println!("\n📊 Pipeline Results (run {}):", result.run_id);
                    println!("   Rows loaded: {}", result.total_rows);
                    println!("   Rows rejected: {}", result.rejected_rows);
                    println!("   Duplicates discarded: {}", result.duplicates_discarded);
                    println!("   Unified rows: {}", result.unified_rows);
                    println!("   Unified table: {}", result.unified_file);
                    println!("   SHA-256: {}", result.unified_sha256);
                    println!("   Blacklisted customers: {}", result.blacklisted_customers);
                    println!("   Scored couriers: {}", result.scored_couriers);
                    println!("   Expiring today: {}", result.expiring_today);

                    println!("\n🏢 Partners:");
                    for outcome in &result.partners {
                        println!(
                            "   - {}: {} rows ({} rejected) {}",
                            outcome.partner,
                            outcome.records,
                            outcome.rejected_rows,
                            serde_json::to_string(&outcome.status)?
                        );
                    }

                    let degraded = result.degraded_partners().count();
                    if degraded > 0 {
                        warn!("{} partners contributed no rows", degraded);
                        println!("\n⚠️  {} partners contributed no rows", degraded);
                    }

                    println!("\n📄 Reports:");
                    for report in &result.reports {
                        println!("   {}", report);
                    }
                    println!("\n✅ Pipeline completed successfully!");
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Data => match storage.load_unified().await? {
            Some(records) => {
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
            None => bail!(
                "No unified table in {}. Run `harlem_tms process` first.",
                config.reports_dir.display()
            ),
        },
        Commands::Report { name } => match storage.locate_report(&name).await? {
            Some(location) => println!("{}", location),
            None => bail!(
                "Report '{}' not found. Known reports: {}",
                name,
                constants::get_report_files().join(", ")
            ),
        },
        Commands::Partners => {
            println!("🏢 Configured partners:");
            for source in config.partner_sources(None)? {
                let marker = if source.path.exists() { "✅" } else { "❌" };
                println!("   {} {} ({})", marker, source.name, source.path.display());
            }
        }
    }

    Ok(())
}
