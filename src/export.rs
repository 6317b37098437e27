use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::enrich::{EnrichedAttributes, EnrichedRecord};
use crate::error::Result;
use crate::normalize::parse_datetime_str;
use crate::types::{Platform, TemplateStatus, UnifiedRecord};

/// Column order of the unified CSV artifact. The header row is always
/// written first; downstream consumers key on these names.
pub const UNIFIED_COLUMNS: [&str; 30] = [
    "platform",
    "platform_id",
    "native_id",
    "name",
    "title",
    "description",
    "description_html",
    "description_plain",
    "url",
    "create_url",
    "slug",
    "status",
    "is_public",
    "category",
    "tags",
    "apps_used",
    "nodes_used",
    "total_views",
    "total_downloads",
    "usage_count",
    "creator_name",
    "creator_verified",
    "creator_avatar_url",
    "created_at",
    "updated_at",
    "published_at",
    "approved_at",
    "approval_requested",
    "team_id",
    "type",
];

/// Derived columns appended after the unified ones in the enriched artifact
pub const ENRICHED_COLUMNS: [&str; 43] = [
    "app_count",
    "node_count",
    "automation_type",
    "automation_subtype",
    "primary_industry",
    "use_case_tags",
    "complexity_level",
    "estimated_setup_time",
    "requires_coding",
    "requires_api_keys",
    "is_ai_powered",
    "is_webhook_based",
    "is_scheduled",
    "is_realtime",
    "has_conditional_logic",
    "has_loops",
    "uses_llm",
    "uses_embeddings",
    "uses_vision",
    "uses_voice",
    "has_memory",
    "uses_spreadsheet",
    "uses_email",
    "uses_storage",
    "uses_communication",
    "uses_crm",
    "uses_social_media",
    "uses_ecommerce",
    "uses_project_mgmt",
    "uses_forms",
    "integration_pattern",
    "primary_trigger_type",
    "primary_action_type",
    "popularity_tier",
    "engagement_score",
    "trending_potential",
    "ai_use_case",
    "ai_provider",
    "has_rag",
    "business_value_tags",
    "target_company_size",
    "estimated_time_saved",
    "keywords",
];

/// Incremental CSV writer. Rows are flushed as they are written so an
/// interrupted run still leaves a valid artifact on disk.
pub struct CsvExporter {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: usize,
}

impl CsvExporter {
    /// Open `<dir>/<stem>.csv` with the unified header
    pub fn create_unified(dir: impl AsRef<Path>, stem: &str) -> Result<Self> {
        Self::create(dir, stem, &UNIFIED_COLUMNS, &[])
    }

    /// Open `<dir>/<stem>.csv` with the unified + enriched header
    pub fn create_enriched(dir: impl AsRef<Path>, stem: &str) -> Result<Self> {
        Self::create(dir, stem, &UNIFIED_COLUMNS, &ENRICHED_COLUMNS)
    }

    fn create(
        dir: impl AsRef<Path>,
        stem: &str,
        columns: &[&str],
        extra: &[&str],
    ) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{stem}.csv"));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(columns.iter().chain(extra.iter()))?;
        writer.flush()?;
        debug!("Opened CSV artifact at {}", path.display());
        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    pub fn write_record(&mut self, record: &UnifiedRecord) -> Result<()> {
        self.writer.write_record(unified_row(record))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_enriched(&mut self, enriched: &EnrichedRecord) -> Result<()> {
        let mut row = unified_row(&enriched.record);
        row.extend(enriched_cells(&enriched.attributes));
        self.writer.write_record(row)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and hand back the artifact path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

fn opt_str(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_num<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(T::to_string).unwrap_or_default()
}

fn opt_ts(value: &Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map(|ts| ts.to_rfc3339()).unwrap_or_default()
}

/// Lists are semicolon-joined in the CSV; app names never contain semicolons
fn join_list(items: &[String]) -> String {
    items.join("; ")
}

fn json_list<S: serde::Serialize>(items: &[S]) -> String {
    if items.is_empty() {
        String::new()
    } else {
        serde_json::to_string(items).unwrap_or_default()
    }
}

fn unified_row(record: &UnifiedRecord) -> Vec<String> {
    vec![
        record.platform.as_str().to_string(),
        record.platform_id.clone(),
        record.native_id.clone(),
        record.name.clone(),
        record.title.clone(),
        opt_str(&record.description),
        opt_str(&record.description_html),
        opt_str(&record.description_plain),
        record.url.clone(),
        opt_str(&record.create_url),
        opt_str(&record.slug),
        record.status.as_str().to_string(),
        record.is_public.to_string(),
        opt_str(&record.category),
        join_list(&record.tags),
        join_list(&record.apps_used),
        opt_num(&record.nodes_used),
        opt_num(&record.total_views),
        opt_num(&record.total_downloads),
        opt_num(&record.usage_count),
        opt_str(&record.creator_name),
        record.creator_verified.to_string(),
        opt_str(&record.creator_avatar_url),
        opt_ts(&record.created_at),
        opt_ts(&record.updated_at),
        opt_ts(&record.published_at),
        opt_ts(&record.approved_at),
        record.approval_requested.to_string(),
        opt_str(&record.team_id),
        record.kind.clone(),
    ]
}

fn enriched_cells(attrs: &EnrichedAttributes) -> Vec<String> {
    vec![
        attrs.app_count.to_string(),
        attrs.node_count.to_string(),
        attrs.automation_type.to_string(),
        attrs.automation_subtype.to_string(),
        attrs.primary_industry.to_string(),
        json_list(&attrs.use_case_tags),
        attrs.complexity_level.to_string(),
        attrs.estimated_setup_time.to_string(),
        attrs.requires_coding.to_string(),
        attrs.requires_api_keys.to_string(),
        attrs.is_ai_powered.to_string(),
        attrs.is_webhook_based.to_string(),
        attrs.is_scheduled.to_string(),
        attrs.is_realtime.to_string(),
        attrs.has_conditional_logic.to_string(),
        attrs.has_loops.to_string(),
        attrs.uses_llm.to_string(),
        attrs.uses_embeddings.to_string(),
        attrs.uses_vision.to_string(),
        attrs.uses_voice.to_string(),
        attrs.has_memory.to_string(),
        attrs.uses_spreadsheet.to_string(),
        attrs.uses_email.to_string(),
        attrs.uses_storage.to_string(),
        attrs.uses_communication.to_string(),
        attrs.uses_crm.to_string(),
        attrs.uses_social_media.to_string(),
        attrs.uses_ecommerce.to_string(),
        attrs.uses_project_mgmt.to_string(),
        attrs.uses_forms.to_string(),
        attrs.integration_pattern.to_string(),
        attrs.primary_trigger_type.to_string(),
        attrs.primary_action_type.to_string(),
        attrs.popularity_tier.to_string(),
        attrs.engagement_score.to_string(),
        attrs.trending_potential.to_string(),
        attrs.ai_use_case.to_string(),
        attrs.ai_provider.to_string(),
        attrs.has_rag.to_string(),
        json_list(&attrs.business_value_tags),
        attrs.target_company_size.to_string(),
        attrs.estimated_time_saved.to_string(),
        json_list(&attrs.keywords),
    ]
}

/// Load a previously exported unified CSV back into records. Rows whose
/// platform cannot be recognized are skipped and counted, everything else
/// degrades field by field like the normalizers do.
pub fn load_unified_csv(path: impl AsRef<Path>) -> Result<(Vec<UnifiedRecord>, usize)> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row?;

        let Some(platform) = Platform::from_name(cell(&index, &row, "platform")) else {
            skipped += 1;
            continue;
        };

        let mut record = UnifiedRecord::empty(platform);
        record.platform_id = cell(&index, &row, "platform_id").to_string();
        record.native_id = cell(&index, &row, "native_id").to_string();
        record.name = cell(&index, &row, "name").to_string();
        record.title = cell(&index, &row, "title").to_string();
        record.description = parse_opt_str(cell(&index, &row, "description"));
        record.description_html = parse_opt_str(cell(&index, &row, "description_html"));
        record.description_plain = parse_opt_str(cell(&index, &row, "description_plain"));
        record.url = cell(&index, &row, "url").to_string();
        record.create_url = parse_opt_str(cell(&index, &row, "create_url"));
        record.slug = parse_opt_str(cell(&index, &row, "slug"));
        record.status = TemplateStatus::from_name(cell(&index, &row, "status"));
        record.is_public = parse_bool(cell(&index, &row, "is_public"));
        record.category = parse_opt_str(cell(&index, &row, "category"));
        record.tags = split_list(cell(&index, &row, "tags"));
        record.apps_used = split_list(cell(&index, &row, "apps_used"));
        record.nodes_used = cell(&index, &row, "nodes_used").parse().ok();
        record.total_views = cell(&index, &row, "total_views").parse().ok();
        record.total_downloads = cell(&index, &row, "total_downloads").parse().ok();
        record.usage_count = cell(&index, &row, "usage_count").parse().ok();
        record.creator_name = parse_opt_str(cell(&index, &row, "creator_name"));
        record.creator_verified = parse_bool(cell(&index, &row, "creator_verified"));
        record.creator_avatar_url = parse_opt_str(cell(&index, &row, "creator_avatar_url"));
        record.created_at = parse_datetime_str(cell(&index, &row, "created_at"));
        record.updated_at = parse_datetime_str(cell(&index, &row, "updated_at"));
        record.published_at = parse_datetime_str(cell(&index, &row, "published_at"));
        record.approved_at = parse_datetime_str(cell(&index, &row, "approved_at"));
        record.approval_requested = parse_bool(cell(&index, &row, "approval_requested"));
        record.team_id = parse_opt_str(cell(&index, &row, "team_id"));
        record.kind = cell(&index, &row, "type").to_string();
        records.push(record);
    }

    if skipped > 0 {
        warn!(
            "Skipped {} rows with unrecognized platform in {}",
            skipped,
            path.display()
        );
    }
    Ok((records, skipped))
}

fn cell<'a>(index: &HashMap<&str, usize>, row: &'a csv::StringRecord, name: &str) -> &'a str {
    index
        .get(name)
        .and_then(|&i| row.get(i))
        .unwrap_or_default()
        .trim()
}

fn parse_opt_str(cell: &str) -> Option<String> {
    (!cell.is_empty()).then(|| cell.to_string())
}

/// Accepts Rust-style `true` and the Python exporter's `True`
fn parse_bool(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true")
}

fn split_list(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.replace(';', ",")
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::Enricher;
    use tempfile::tempdir;

    fn sample_record() -> UnifiedRecord {
        let mut record = UnifiedRecord::empty(Platform::N8n);
        record.native_id = "5".to_string();
        record.platform_id = "n8n_5".to_string();
        record.name = "Sync Leads".to_string();
        record.title = "Sync Leads".to_string();
        record.url = "https://n8n.io/workflows/5/".to_string();
        record.status = TemplateStatus::Published;
        record.is_public = true;
        record.apps_used = vec!["Webhook".to_string(), "Slack".to_string()];
        record.nodes_used = Some(4);
        record.total_views = Some(100);
        record.creator_name = Some("Ada".to_string());
        record.kind = "workflow".to_string();
        record
    }

    #[test]
    fn header_column_counts_match_layouts() {
        assert_eq!(UNIFIED_COLUMNS.len(), 30);
        assert_eq!(ENRICHED_COLUMNS.len(), 43);
        let record = sample_record();
        assert_eq!(unified_row(&record).len(), UNIFIED_COLUMNS.len());
        let enricher = Enricher::new();
        let enriched = enricher.enrich_all(std::slice::from_ref(&record));
        assert_eq!(
            enriched_cells(&enriched[0].attributes).len(),
            ENRICHED_COLUMNS.len()
        );
    }

    #[test]
    fn unified_roundtrip_preserves_records() {
        let dir = tempdir().unwrap();
        let record = sample_record();

        let mut exporter = CsvExporter::create_unified(dir.path(), "unified_test").unwrap();
        exporter.write_record(&record).unwrap();
        let path = exporter.finish().unwrap();

        let (loaded, skipped) = load_unified_csv(&path).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], record);
    }

    #[test]
    fn empty_export_leaves_header_only_artifact() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::create_unified(dir.path(), "empty").unwrap();
        assert_eq!(exporter.rows_written(), 0);
        let path = exporter.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("platform,platform_id,native_id,name"));
        assert_eq!(lines.next(), None);

        let (loaded, skipped) = load_unified_csv(&path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn loader_skips_unknown_platform_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        std::fs::write(
            &path,
            "platform,platform_id,native_id,name,url\n\
             n8n,n8n_1,1,Good,https://n8n.io/workflows/1/\n\
             airtable,at_1,1,Stray,https://example.com\n",
        )
        .unwrap();

        let (loaded, skipped) = load_unified_csv(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(loaded[0].platform_id, "n8n_1");
    }

    #[test]
    fn enriched_rows_serialize_json_lists() {
        let dir = tempdir().unwrap();
        let record = sample_record();
        let enricher = Enricher::new();
        let enriched = enricher.enrich_all(std::slice::from_ref(&record));

        let mut exporter = CsvExporter::create_enriched(dir.path(), "enriched_test").unwrap();
        exporter.write_enriched(&enriched[0]).unwrap();
        let path = exporter.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.contains("automation_type"));
        assert!(header.contains("keywords"));
        assert!(content.lines().nth(1).unwrap().contains("n8n_5"));
    }
}
