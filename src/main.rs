use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, warn};

use template_harvester::config::Config;
use template_harvester::logging;
use template_harvester::pipeline::{self, ShutdownFlag};
use template_harvester::types::Platform;

#[derive(Parser)]
#[command(name = "template_harvester")]
#[command(about = "Automation template metadata harvester for n8n, Make.com and Zapier")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and normalize templates into per-platform CSV files
    Harvest {
        /// Specific platforms to run (comma-separated). Available: make, n8n, zapier
        #[arg(long)]
        platforms: Option<String>,
    },
    /// Merge per-platform CSV files into one unified, deduplicated CSV
    Merge {
        /// Per-platform CSV files to merge
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Add derived classification columns to a unified CSV
    Enrich {
        /// A unified CSV produced by merge or run
        input: PathBuf,
    },
    /// Run the full pipeline: harvest, merge, export
    Run {
        /// Specific platforms to run (comma-separated)
        #[arg(long)]
        platforms: Option<String>,
        /// Also compute enrichment columns in the final artifact
        #[arg(long)]
        enrich: bool,
    },
}

fn parse_platforms(arg: Option<String>) -> Vec<Platform> {
    match arg {
        Some(list) => list
            .split(',')
            .filter_map(|name| {
                let platform = Platform::from_name(name);
                if platform.is_none() {
                    warn!("Unknown platform specified");
                    println!("⚠️  Unknown platform: {}", name.trim());
                }
                platform
            })
            .collect(),
        None => Platform::all().to_vec(),
    }
}

/// Restrict the configured platform set to the CLI selection
fn select_platforms(config: &mut Config, selected: &[Platform]) {
    config.platforms.make.enabled &= selected.contains(&Platform::Make);
    config.platforms.n8n.enabled &= selected.contains(&Platform::N8n);
    config.platforms.zapier.enabled &= selected.contains(&Platform::Zapier);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    let shutdown = ShutdownFlag::new();
    shutdown.listen_for_ctrl_c();

    match cli.command {
        Commands::Harvest { platforms } => {
            println!("🔄 Running harvest pipeline...");
            let platforms = parse_platforms(platforms);
            let outputs = pipeline::run_harvest(&platforms, &config, shutdown).await?;

            println!("\n📊 Harvest Results:");
            for (platform, path, written) in &outputs {
                println!(
                    "   • {}: {} templates → {}",
                    platform.as_str().to_uppercase(),
                    written,
                    path.display()
                );
            }
            if outputs.len() < platforms.len() {
                warn!(
                    "{} of {} platforms did not produce output",
                    platforms.len() - outputs.len(),
                    platforms.len()
                );
                println!(
                    "⚠️  {} of {} platforms did not produce output",
                    platforms.len() - outputs.len(),
                    platforms.len()
                );
            }
        }
        Commands::Merge { inputs } => {
            println!("🔗 Merging {} CSV files...", inputs.len());
            match pipeline::run_merge_files(&inputs, &config) {
                Ok((path, report)) => {
                    println!("✅ Unified CSV created successfully!");
                    println!("   File: {}", path.display());
                    println!("   Templates: {}", report.total_records);
                }
                Err(e) => {
                    error!("Merge failed: {}", e);
                    println!("❌ Merge failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Enrich { input } => {
            println!("🧮 Enriching unified CSV...");
            match pipeline::run_enrich_file(&input, &config) {
                Ok((path, written)) => {
                    println!("✅ Enriched CSV created successfully!");
                    println!("   File: {}", path.display());
                    println!("   Templates: {}", written);
                }
                Err(e) => {
                    error!("Enrichment failed: {}", e);
                    println!("❌ Enrichment failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Run { platforms, enrich } => {
            println!("🚀 Running full pipeline (harvest + merge + export)...");
            let mut config = config;
            let selected = parse_platforms(platforms);
            select_platforms(&mut config, &selected);

            match pipeline::run_full(&config, shutdown, enrich).await {
                Ok(result) => {
                    println!("\n📊 Pipeline Results:");
                    for (platform, count) in &result.per_platform {
                        println!("   • {}: {} templates", platform.to_uppercase(), count);
                    }
                    println!("   Merged: {}", result.merged_records);
                    println!("   Invalid dropped: {}", result.invalid_dropped);
                    println!("   Duplicates removed: {}", result.duplicates_removed);
                    println!("   Output file: {}", result.output_file);
                    println!("\n✅ Full pipeline completed successfully!");
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}
