use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::{daemon::storage::entities::StatsDocument, utils::time::date_key};

/// What the export file holds: the stored document verbatim plus the moment
/// it was taken.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    #[serde(flatten)]
    document: &'a StatsDocument,
    export_date: String,
}

/// Default export file name for a given day.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("productivity-data-{}.json", date_key(now.date_naive()))
}

/// Writes the document to a JSON file and returns the path. No validation
/// happens on the way out: whatever is in storage is what lands in the file.
pub async fn export_data(
    document: &StatsDocument,
    out: Option<PathBuf>,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let path = out.unwrap_or_else(|| PathBuf::from(export_file_name(now)));
    let payload = serde_json::to_vec_pretty(&ExportDocument {
        document,
        export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })?;
    tokio::fs::write(&path, payload).await?;
    Ok(path)
}
