use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

use crate::types::{Platform, UnifiedRecord};

/// How many of a record's apps feed the top-apps ranking. Long tail apps on
/// mega-templates would otherwise dominate the counts.
const TOP_APPS_PER_RECORD: usize = 10;

/// Summary statistics describing merge outcomes and data completeness
#[derive(Debug, Clone, Serialize, Default)]
pub struct CoverageReport {
    pub total_records: usize,
    pub by_platform: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub invalid_dropped: usize,
    pub duplicates_removed: usize,
    pub with_creator: usize,
    pub with_views: usize,
    pub with_usage: usize,
    pub public_templates: usize,
    pub verified_creators: usize,
    /// (app, template count), most used first
    pub top_apps: Vec<(String, usize)>,
}

impl CoverageReport {
    fn percentage(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            count as f64 / self.total_records as f64 * 100.0
        }
    }

    pub fn with_creator_pct(&self) -> f64 {
        self.percentage(self.with_creator)
    }

    pub fn with_views_pct(&self) -> f64 {
        self.percentage(self.with_views)
    }

    pub fn with_usage_pct(&self) -> f64 {
        self.percentage(self.with_usage)
    }

    /// Render the human-readable statistics block
    pub fn log_summary(&self) {
        println!("\n{}", "=".repeat(80));
        println!("  UNIFIED DATASET STATISTICS");
        println!("{}\n", "=".repeat(80));

        println!("📊 Total Templates: {}\n", self.total_records);

        println!("📦 By Platform:");
        for (platform, count) in &self.by_platform {
            println!(
                "   • {}: {} ({:.1}%)",
                platform.to_uppercase(),
                count,
                self.percentage(*count)
            );
        }
        println!();

        println!("📈 Status Distribution:");
        for (status, count) in &self.by_status {
            println!("   • {}: {} ({:.1}%)", status, count, self.percentage(*count));
        }
        println!();

        println!("📋 Data Coverage:");
        println!(
            "   • Templates with creator info: {} ({:.1}%)",
            self.with_creator,
            self.with_creator_pct()
        );
        println!(
            "   • Templates with view counts: {} ({:.1}%)",
            self.with_views,
            self.with_views_pct()
        );
        println!(
            "   • Templates with usage counts: {} ({:.1}%)",
            self.with_usage,
            self.with_usage_pct()
        );
        println!(
            "   • Public templates: {} ({:.1}%)",
            self.public_templates,
            self.percentage(self.public_templates)
        );
        println!("   • Verified creators: {}", self.verified_creators);
        println!(
            "   • Invalid rows dropped: {} | Duplicates removed: {}",
            self.invalid_dropped, self.duplicates_removed
        );
        println!();

        println!("🔥 Top 20 Most Used Apps/Nodes:");
        for (i, (app, count)) in self.top_apps.iter().take(20).enumerate() {
            println!("   {:2}. {}: {} templates", i + 1, app, count);
        }
        println!();
    }
}

/// Result of merging all platform streams
#[derive(Debug)]
pub struct MergeOutcome {
    /// Validated, deduplicated, sorted records
    pub records: Vec<UnifiedRecord>,
    pub report: CoverageReport,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Cross-platform merge: validate, deduplicate by `platform_id`, sort.
///
/// Streams are consumed in the order given; within a stream, arrival order
/// decides which duplicate is "first". Callers feed platforms sequentially
/// in `Platform::all()` order, which makes first-seen-wins deterministic.
pub fn merge(streams: Vec<(Platform, Vec<UnifiedRecord>)>) -> MergeOutcome {
    let mut report = CoverageReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut records: Vec<UnifiedRecord> = Vec::new();

    for (platform, stream) in streams {
        let mut kept = 0usize;
        let total = stream.len();
        for record in stream {
            if !is_valid(&record, platform) {
                report.invalid_dropped += 1;
                continue;
            }
            // First occurrence wins; later arrivals of the same identity
            // are dropped and counted.
            if !seen_ids.insert(record.platform_id.clone()) {
                report.duplicates_removed += 1;
                continue;
            }
            kept += 1;
            records.push(record);
        }
        if kept < total {
            warn!(
                "Platform {}: kept {}/{} records ({} invalid or duplicate)",
                platform,
                kept,
                total,
                total - kept
            );
        } else {
            info!("Platform {}: kept all {} records", platform, total);
        }
    }

    // Primary key platform (lexicographic), secondary popularity descending.
    // The sort is stable, so ties keep arrival order.
    records.sort_by(|a, b| {
        a.platform
            .cmp(&b.platform)
            .then(b.popularity().cmp(&a.popularity()))
    });

    fill_statistics(&records, &mut report);
    MergeOutcome { records, report }
}

/// A record missing its identity or display essentials cannot be merged
fn is_valid(record: &UnifiedRecord, stream_platform: Platform) -> bool {
    record.platform == stream_platform
        && !record.platform_id.trim().is_empty()
        && !record.name.trim().is_empty()
        && !record.url.trim().is_empty()
}

fn fill_statistics(records: &[UnifiedRecord], report: &mut CoverageReport) {
    report.total_records = records.len();

    let mut app_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *report
            .by_platform
            .entry(record.platform.as_str().to_string())
            .or_insert(0) += 1;
        *report
            .by_status
            .entry(record.status.as_str().to_string())
            .or_insert(0) += 1;

        if record.creator_name.is_some() {
            report.with_creator += 1;
        }
        if record.total_views.is_some() {
            report.with_views += 1;
        }
        if record.usage_count.is_some() {
            report.with_usage += 1;
        }
        if record.is_public {
            report.public_templates += 1;
        }
        if record.creator_verified {
            report.verified_creators += 1;
        }
        for app in record.apps_used.iter().take(TOP_APPS_PER_RECORD) {
            *app_counts.entry(app.as_str()).or_insert(0) += 1;
        }
    }

    let mut top_apps: Vec<(String, usize)> = app_counts
        .into_iter()
        .map(|(app, count)| (app.to_string(), count))
        .collect();
    // Count descending, name ascending for a deterministic report
    top_apps.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    report.top_apps = top_apps;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TemplateStatus;

    fn record(platform: Platform, native_id: &str, name: &str) -> UnifiedRecord {
        let mut r = UnifiedRecord::empty(platform);
        r.native_id = native_id.to_string();
        r.platform_id = platform.platform_id(native_id);
        r.name = name.to_string();
        r.title = name.to_string();
        r.url = format!("https://example.com/{}/{}", platform, native_id);
        r.status = TemplateStatus::Published;
        r.is_public = true;
        r
    }

    #[test]
    fn same_native_id_on_different_platforms_does_not_collide() {
        let mut n8n = record(Platform::N8n, "5", "Sync Leads");
        n8n.total_views = Some(100);
        let mut make = record(Platform::Make, "5", "Sync Leads");
        make.usage_count = Some(50);

        let outcome = merge(vec![
            (Platform::Make, vec![make]),
            (Platform::N8n, vec![n8n]),
        ]);

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].platform_id, "make_5");
        assert_eq!(outcome.records[1].platform_id, "n8n_5");
        assert_eq!(outcome.report.duplicates_removed, 0);
    }

    #[test]
    fn duplicate_fetch_keeps_first_occurrence() {
        let mut first = record(Platform::N8n, "7", "First copy");
        first.total_views = Some(10);
        let mut second = record(Platform::N8n, "7", "Second copy");
        second.total_views = Some(999);

        let outcome = merge(vec![(Platform::N8n, vec![first, second])]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "First copy");
        assert_eq!(outcome.report.duplicates_removed, 1);
    }

    #[test]
    fn records_missing_name_or_url_are_dropped_and_counted() {
        let good = record(Platform::Make, "1", "Good");
        let mut no_name = record(Platform::Make, "2", "");
        no_name.title = "has title but no name".to_string();
        let mut no_url = record(Platform::Make, "3", "No url");
        no_url.url = String::new();

        let outcome = merge(vec![(Platform::Make, vec![good, no_name, no_url])]);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.report.invalid_dropped, 2);
        assert_eq!(outcome.report.total_records, 1);
    }

    #[test]
    fn record_on_wrong_stream_is_invalid() {
        let strayed = record(Platform::Zapier, "9", "Wrong lane");
        let outcome = merge(vec![(Platform::Make, vec![strayed])]);
        assert!(outcome.is_empty());
        assert_eq!(outcome.report.invalid_dropped, 1);
    }

    #[test]
    fn sort_is_platform_then_popularity_descending() {
        let mut z = record(Platform::Zapier, "1", "Z");
        z.total_views = Some(9_999);
        let mut n_low = record(Platform::N8n, "1", "N low");
        n_low.total_views = Some(10);
        let mut n_high = record(Platform::N8n, "2", "N high");
        n_high.total_views = Some(500);
        let m = record(Platform::Make, "1", "M");

        let outcome = merge(vec![
            (Platform::Zapier, vec![z]),
            (Platform::N8n, vec![n_low, n_high]),
            (Platform::Make, vec![m]),
        ]);

        let order: Vec<&str> = outcome
            .records
            .iter()
            .map(|r| r.platform_id.as_str())
            .collect();
        assert_eq!(order, vec!["make_1", "n8n_2", "n8n_1", "zapier_1"]);

        for pair in outcome.records.windows(2) {
            assert!(pair[0].platform <= pair[1].platform);
            if pair[0].platform == pair[1].platform {
                assert!(pair[0].popularity() >= pair[1].popularity());
            }
        }
    }

    #[test]
    fn ties_preserve_arrival_order() {
        let first = record(Platform::Make, "a", "first");
        let second = record(Platform::Make, "b", "second");
        let third = record(Platform::Make, "c", "third");

        let outcome = merge(vec![(Platform::Make, vec![first, second, third])]);
        let order: Vec<&str> = outcome.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let build = || {
            vec![
                (Platform::Make, vec![record(Platform::Make, "1", "m1")]),
                (
                    Platform::N8n,
                    vec![
                        record(Platform::N8n, "1", "n1"),
                        record(Platform::N8n, "1", "n1 dup"),
                    ],
                ),
            ]
        };
        let a = merge(build());
        let b = merge(build());
        assert_eq!(a.records, b.records);
        assert_eq!(a.report.duplicates_removed, b.report.duplicates_removed);
    }

    #[test]
    fn empty_streams_produce_empty_outcome_not_panic() {
        let outcome = merge(vec![(Platform::Make, vec![]), (Platform::N8n, vec![])]);
        assert!(outcome.is_empty());
        assert_eq!(outcome.report.total_records, 0);
        assert_eq!(outcome.report.with_creator_pct(), 0.0);
    }

    #[test]
    fn coverage_counts_metrics() {
        let mut with_creator = record(Platform::Make, "1", "a");
        with_creator.creator_name = Some("Ada".to_string());
        with_creator.creator_verified = true;
        with_creator.usage_count = Some(5);
        let mut with_views = record(Platform::N8n, "2", "b");
        with_views.total_views = Some(50);
        with_views.apps_used = vec!["Slack".to_string(), "Gmail".to_string()];
        let plain = record(Platform::Zapier, "3", "c");

        let outcome = merge(vec![
            (Platform::Make, vec![with_creator]),
            (Platform::N8n, vec![with_views]),
            (Platform::Zapier, vec![plain]),
        ]);

        let report = &outcome.report;
        assert_eq!(report.total_records, 3);
        assert_eq!(report.with_creator, 1);
        assert_eq!(report.with_views, 1);
        assert_eq!(report.with_usage, 1);
        assert_eq!(report.verified_creators, 1);
        assert_eq!(report.by_platform.get("make"), Some(&1));
        assert!(report.top_apps.contains(&("Slack".to_string(), 1)));
    }
}
