use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::apis;
use crate::config::Config;
use crate::enrich::Enricher;
use crate::error::{HarvestError, Result};
use crate::export::{load_unified_csv, CsvExporter};
use crate::merge::{merge, CoverageReport};
use crate::normalize::normalizer_for;
use crate::types::{Platform, UnifiedRecord};

/// Cooperative interrupt flag. Sources check it between pages and the
/// pipeline between platforms; once set, whatever has been normalized and
/// merged so far is still flushed to the artifact.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Trip the flag on ctrl-c. The first interrupt degrades to an early
    /// flush rather than killing the process.
    pub fn listen_for_ctrl_c(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received. Finishing current batch and saving progress...");
                println!("\n⚠️  Interrupt received. Finishing current batch and saving progress...");
                flag.set();
            }
        });
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub per_platform: Vec<(String, usize)>,
    pub merged_records: usize,
    pub invalid_dropped: usize,
    pub duplicates_removed: usize,
    pub enriched: bool,
    pub output_file: String,
}

fn timestamp_stem(prefix: &str) -> String {
    format!("{}_{}", prefix, Utc::now().format("%Y%m%d_%H%M%S"))
}

/// Fetch and normalize one platform's stream
#[instrument(skip(config, shutdown), fields(platform = %platform))]
pub async fn harvest_platform(
    platform: Platform,
    config: &Config,
    shutdown: ShutdownFlag,
) -> Result<Vec<UnifiedRecord>> {
    let platform_name = platform.as_str();
    counter!("harvest_runs_total", "platform" => platform_name).increment(1);

    info!("📡 Fetching templates from {}...", platform_name);
    let fetch_start = std::time::Instant::now();
    let source = apis::source_for(platform, config, shutdown)?;
    let raw_templates = source.fetch_templates().await?;
    histogram!("fetch_duration_seconds", "platform" => platform_name)
        .record(fetch_start.elapsed().as_secs_f64());
    info!("✅ Fetched {} raw templates", raw_templates.len());

    let normalizer = normalizer_for(platform);
    let records: Vec<UnifiedRecord> = raw_templates
        .iter()
        .map(|raw| normalizer.normalize(raw))
        .collect();
    counter!("templates_normalized_total", "platform" => platform_name)
        .increment(records.len() as u64);

    Ok(records)
}

/// Per-platform harvest into standalone CSV artifacts (one per platform),
/// written incrementally as records normalize.
pub async fn run_harvest(
    platforms: &[Platform],
    config: &Config,
    shutdown: ShutdownFlag,
) -> Result<Vec<(Platform, PathBuf, usize)>> {
    let mut outputs = Vec::new();

    for (i, &platform) in platforms.iter().enumerate() {
        if shutdown.is_set() {
            warn!("Shutdown requested, skipping remaining platforms");
            break;
        }

        let stem = timestamp_stem(&format!("{}_templates", platform));
        match harvest_platform(platform, config, shutdown.clone()).await {
            Ok(records) => {
                let mut exporter =
                    CsvExporter::create_unified(&config.export.output_dir, &stem)?;
                for record in &records {
                    exporter.write_record(record)?;
                }
                let written = exporter.rows_written();
                let path = exporter.finish()?;
                info!("💾 Saved {} {} templates to {}", written, platform, path.display());
                outputs.push((platform, path, written));
            }
            Err(e) => {
                error!("Harvest failed for {}: {}", platform, e);
            }
        }

        if i + 1 < platforms.len() && !shutdown.is_set() {
            tokio::time::sleep(std::time::Duration::from_millis(
                config.scrape.platform_delay_ms,
            ))
            .await;
        }
    }

    Ok(outputs)
}

/// The full pipeline: harvest every enabled platform sequentially, merge,
/// optionally enrich, export one artifact plus the coverage report.
///
/// Partial platform failure degrades coverage but never aborts the run;
/// the only hard failure is an entirely empty dataset, surfaced after the
/// (header-only) artifact and report have been written.
pub async fn run_full(
    config: &Config,
    shutdown: ShutdownFlag,
    enrich: bool,
) -> Result<PipelineResult> {
    let run_start = std::time::Instant::now();
    counter!("pipeline_runs_total").increment(1);

    let enabled: Vec<Platform> = Platform::all()
        .into_iter()
        .filter(|p| match p {
            Platform::Make => config.platforms.make.enabled,
            Platform::N8n => config.platforms.n8n.enabled,
            Platform::Zapier => config.platforms.zapier.enabled,
        })
        .collect();

    let mut streams: Vec<(Platform, Vec<UnifiedRecord>)> = Vec::new();
    let mut per_platform = Vec::new();

    for (i, &platform) in enabled.iter().enumerate() {
        if shutdown.is_set() {
            warn!("Shutdown requested, merging what has been harvested so far");
            break;
        }

        match harvest_platform(platform, config, shutdown.clone()).await {
            Ok(records) => {
                info!("🔧 Normalized {} {} templates", records.len(), platform);
                per_platform.push((platform.as_str().to_string(), records.len()));
                streams.push((platform, records));
            }
            Err(e) => {
                // One unreachable platform reduces coverage, nothing more
                error!("Platform {} failed, continuing without it: {}", platform, e);
                counter!("platform_failures_total", "platform" => platform.as_str())
                    .increment(1);
                per_platform.push((platform.as_str().to_string(), 0));
            }
        }

        if i + 1 < enabled.len() && !shutdown.is_set() {
            tokio::time::sleep(std::time::Duration::from_millis(
                config.scrape.platform_delay_ms,
            ))
            .await;
        }
    }

    info!("🔍 Merging {} platform streams...", streams.len());
    let outcome = merge(streams);
    counter!("records_merged_total").increment(outcome.records.len() as u64);
    counter!("records_invalid_total").increment(outcome.report.invalid_dropped as u64);
    counter!("records_duplicate_total").increment(outcome.report.duplicates_removed as u64);

    let stem = if enrich {
        timestamp_stem("unified_templates_enriched")
    } else {
        timestamp_stem("unified_templates")
    };
    let output_file = export_outcome(&outcome.records, config, &stem, enrich)?;

    outcome.report.log_summary();
    histogram!("pipeline_duration_seconds").record(run_start.elapsed().as_secs_f64());

    let result = PipelineResult {
        per_platform,
        merged_records: outcome.records.len(),
        invalid_dropped: outcome.report.invalid_dropped,
        duplicates_removed: outcome.report.duplicates_removed,
        enriched: enrich,
        output_file: output_file.to_string_lossy().to_string(),
    };

    if outcome.is_empty() {
        // The artifact and report exist; the caller still needs to know
        // the run produced nothing.
        error!("No valid records from any platform");
        return Err(HarvestError::EmptyDataset);
    }

    Ok(result)
}

/// Merge previously harvested per-platform CSVs into one unified artifact
pub fn run_merge_files(
    inputs: &[PathBuf],
    config: &Config,
) -> Result<(PathBuf, CoverageReport)> {
    let mut by_platform: std::collections::BTreeMap<Platform, Vec<UnifiedRecord>> =
        std::collections::BTreeMap::new();

    for path in inputs {
        let (records, _skipped) = load_unified_csv(path)?;
        info!("📥 Loaded {} rows from {}", records.len(), path.display());
        for record in records {
            by_platform.entry(record.platform).or_default().push(record);
        }
    }

    // BTreeMap iteration gives the fixed platform order; within a platform,
    // file order is arrival order.
    let streams: Vec<(Platform, Vec<UnifiedRecord>)> = by_platform.into_iter().collect();
    let outcome = merge(streams);

    let stem = timestamp_stem("unified_templates");
    let output = export_outcome(&outcome.records, config, &stem, false)?;
    outcome.report.log_summary();

    if outcome.is_empty() {
        error!("No valid records in any input file");
        return Err(HarvestError::EmptyDataset);
    }
    Ok((output, outcome.report))
}

/// Enrich a unified CSV into the 73-column artifact
pub fn run_enrich_file(input: &Path, config: &Config) -> Result<(PathBuf, usize)> {
    let (records, _skipped) = load_unified_csv(input)?;
    info!("📥 Loaded {} templates from {}", records.len(), input.display());

    info!("📊 Calculating popularity distributions...");
    let enricher = Enricher::new();
    let enriched = enricher.enrich_all(&records);
    info!("✅ Enriched {} templates", enriched.len());

    let stem = timestamp_stem("unified_templates_enriched");
    let mut exporter = CsvExporter::create_enriched(&config.export.output_dir, &stem)?;
    for record in &enriched {
        exporter.write_enriched(record)?;
    }
    let written = exporter.rows_written();
    let path = exporter.finish()?;
    info!("💾 Saved enriched CSV to {}", path.display());

    if written == 0 {
        error!("No templates to enrich in {}", input.display());
        return Err(HarvestError::EmptyDataset);
    }
    Ok((path, written))
}

fn export_outcome(
    records: &[UnifiedRecord],
    config: &Config,
    stem: &str,
    enrich: bool,
) -> Result<PathBuf> {
    let dir = &config.export.output_dir;
    let path = if enrich {
        let enricher = Enricher::new();
        let enriched = enricher.enrich_all(records);
        let mut exporter = CsvExporter::create_enriched(dir, stem)?;
        for record in &enriched {
            exporter.write_enriched(record)?;
        }
        exporter.finish()?
    } else {
        let mut exporter = CsvExporter::create_unified(dir, stem)?;
        for record in records {
            exporter.write_record(record)?;
        }
        exporter.finish()?
    };
    info!("💾 Saved {} records to {}", records.len(), path.display());
    Ok(path)
}
