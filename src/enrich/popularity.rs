use crate::types::UnifiedRecord;

/// Popularity distribution over the whole merged collection. Percentile
/// tiers need this first pass before any record can be classified, so
/// enrichment is collect-then-classify rather than row-local.
#[derive(Debug, Default, Clone)]
pub struct PopularityIndex {
    views: Vec<u64>,
    usage: Vec<u64>,
}

impl PopularityIndex {
    /// First pass: collect the view-count and usage-count distributions
    pub fn collect(records: &[UnifiedRecord]) -> Self {
        let mut views: Vec<u64> = records.iter().filter_map(|r| r.total_views).collect();
        let mut usage: Vec<u64> = records.iter().filter_map(|r| r.usage_count).collect();
        views.sort_unstable();
        usage.sort_unstable();
        Self { views, usage }
    }

    /// Percentile of a record against the relevant distribution: views when
    /// the record has views, usage otherwise. None when the record has no
    /// metric or the distribution is empty.
    pub fn percentile_for(&self, record: &UnifiedRecord) -> Option<f64> {
        if let Some(views) = record.total_views {
            percentile(&self.views, views)
        } else if let Some(usage) = record.usage_count {
            percentile(&self.usage, usage)
        } else {
            None
        }
    }

    pub fn views_count(&self) -> usize {
        self.views.len()
    }

    pub fn usage_count(&self) -> usize {
        self.usage.len()
    }
}

/// percentile(v) = |{x : x <= v}| / N * 100
fn percentile(sorted: &[u64], target: u64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let at_or_below = sorted.partition_point(|&v| v <= target);
    Some(at_or_below as f64 / sorted.len() as f64 * 100.0)
}

/// Tier thresholds: top 1% VIRAL/95, top 10% POPULAR/80, top half
/// MODERATE/50, the rest NICHE/20; no data at all is UNKNOWN/0.
pub fn tier_for(percentile: Option<f64>) -> (&'static str, u8) {
    match percentile {
        Some(p) if p >= 99.0 => ("VIRAL", 95),
        Some(p) if p >= 90.0 => ("POPULAR", 80),
        Some(p) if p >= 50.0 => ("MODERATE", 50),
        Some(_) => ("NICHE", 20),
        None => ("UNKNOWN", 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, UnifiedRecord};

    fn with_views(views: u64) -> UnifiedRecord {
        let mut r = UnifiedRecord::empty(Platform::N8n);
        r.total_views = Some(views);
        r
    }

    #[test]
    fn percentile_counts_values_at_or_below() {
        let sorted: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile(&sorted, 100), Some(100.0));
        assert_eq!(percentile(&sorted, 50), Some(50.0));
        assert_eq!(percentile(&sorted, 1), Some(1.0));
        assert_eq!(percentile(&sorted, 0), Some(0.0));
        assert_eq!(percentile(&[], 10), None);
    }

    #[test]
    fn record_without_metrics_has_no_percentile() {
        let records = vec![with_views(10), with_views(20)];
        let index = PopularityIndex::collect(&records);
        let bare = UnifiedRecord::empty(Platform::Zapier);
        assert_eq!(index.percentile_for(&bare), None);
        assert_eq!(tier_for(None), ("UNKNOWN", 0));
    }

    #[test]
    fn usage_distribution_is_separate_from_views() {
        let mut usage_only = UnifiedRecord::empty(Platform::Make);
        usage_only.usage_count = Some(5);
        let records = vec![with_views(1_000_000), usage_only.clone()];
        let index = PopularityIndex::collect(&records);
        // The usage-only record ranks against the usage distribution, where
        // it is the single (and therefore top) value.
        assert_eq!(index.percentile_for(&usage_only), Some(100.0));
    }

    #[test]
    fn synthetic_thousand_value_distribution_buckets_exactly() {
        let records: Vec<UnifiedRecord> = (1..=1000).map(with_views).collect();
        let index = PopularityIndex::collect(&records);

        let mut counts = std::collections::HashMap::new();
        for record in &records {
            let (tier, _) = tier_for(index.percentile_for(record));
            *counts.entry(tier).or_insert(0usize) += 1;
        }

        // percentile(v) = v/10 here, so: VIRAL at v >= 990 (11 values),
        // POPULAR at 900 <= v < 990 (90), MODERATE at 500 <= v < 900 (400),
        // NICHE below (499).
        assert_eq!(counts["VIRAL"], 11);
        assert_eq!(counts["POPULAR"], 90);
        assert_eq!(counts["MODERATE"], 400);
        assert_eq!(counts["NICHE"], 499);
    }

    #[test]
    fn tier_scores_follow_thresholds() {
        assert_eq!(tier_for(Some(99.0)), ("VIRAL", 95));
        assert_eq!(tier_for(Some(98.9)), ("POPULAR", 80));
        assert_eq!(tier_for(Some(90.0)), ("POPULAR", 80));
        assert_eq!(tier_for(Some(50.0)), ("MODERATE", 50));
        assert_eq!(tier_for(Some(49.9)), ("NICHE", 20));
    }
}
