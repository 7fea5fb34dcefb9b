use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabular::Record;

/// Aggregate statistics for one upload. Averages are rounded to 2 decimals
/// and are `None` when the column has no values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_count: u64,
    pub avg_flowrate: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub type_distribution: BTreeMap<String, u64>,
}

#[derive(Clone, Debug)]
pub struct DatasetRecord {
    pub id: i64,
    pub file: String, // relative to the media root: uploads/<uuid>_<name>
    pub uploaded_at: DateTime<Utc>,
    pub summary: Summary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvictedDataset {
    pub id: i64,
    pub file: String,
}

#[derive(Serialize)]
pub struct UploadInfo {
    pub message: &'static str,
    pub note: &'static str,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub summary: Summary,
    pub data_preview: Vec<Record>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub uploaded_at: String,
    pub summary: Summary,
}

impl From<DatasetRecord> for HistoryItem {
    fn from(r: DatasetRecord) -> Self {
        Self {
            id: r.id,
            uploaded_at: r.uploaded_at.to_rfc3339(),
            summary: r.summary,
        }
    }
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
}
