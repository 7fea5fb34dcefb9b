//! Persistence for uploaded dataset records

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;

use crate::types::{DatasetRecord, EvictedDataset, Summary};

#[derive(Clone, Debug)]
pub struct Inserted {
    pub record: DatasetRecord,
    /// Records trimmed by the retention cap; their files are still on disk.
    pub evicted: Vec<EvictedDataset>,
}

#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Insert a record and trim the table to the `cap` newest rows, as one
    /// transaction.
    async fn insert_with_retention(&self, file: &str, summary: &Summary, cap: usize) -> Result<Inserted>;

    /// Up to `limit` records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<DatasetRecord>>;

    async fn count(&self) -> Result<u64>;
}

pub struct SqliteDatasetStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DatasetRow {
    id: i64,
    file: String,
    uploaded_at: DateTime<Utc>,
    summary: Json<Summary>,
}

impl From<DatasetRow> for DatasetRecord {
    fn from(r: DatasetRow) -> Self {
        Self {
            id: r.id,
            file: r.file,
            uploaded_at: r.uploaded_at,
            summary: r.summary.0,
        }
    }
}

impl SqliteDatasetStore {
    /// Open (or create) the database at `url` and apply migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid DATABASE_URL: {url}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let parent = opts.clone().get_filename().parent().map(Path::to_path_buf);
        if let Some(parent) = parent.filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(&parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // single writer; also keeps an in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .context("Failed to open SQLite database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatasetStore for SqliteDatasetStore {
    async fn insert_with_retention(&self, file: &str, summary: &Summary, cap: usize) -> Result<Inserted> {
        let mut tx = self.pool.begin().await?;
        // stamped once the connection is ours, so stamp order is commit order
        let uploaded_at = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO uploaded_datasets (file, uploaded_at, summary)
            VALUES (?1, ?2, ?3)
            RETURNING id
            "#,
        )
        .bind(file)
        .bind(uploaded_at)
        .bind(Json(summary))
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert dataset")?;

        // One statement, so the cap holds however many rows piled up.
        let evicted: Vec<(i64, String)> = sqlx::query_as(
            r#"
            DELETE FROM uploaded_datasets
            WHERE id NOT IN (
                SELECT id FROM uploaded_datasets
                ORDER BY uploaded_at DESC, id DESC
                LIMIT ?1
            )
            RETURNING id, file
            "#,
        )
        .bind(cap as i64)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to apply retention cap")?;

        tx.commit().await?;

        Ok(Inserted {
            record: DatasetRecord {
                id,
                file: file.to_string(),
                uploaded_at,
                summary: summary.clone(),
            },
            evicted: evicted
                .into_iter()
                .map(|(id, file)| EvictedDataset { id, file })
                .collect(),
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<DatasetRecord>> {
        let rows: Vec<DatasetRow> = sqlx::query_as(
            r#"
            SELECT id, file, uploaded_at, summary
            FROM uploaded_datasets
            ORDER BY uploaded_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list datasets")?;

        Ok(rows.into_iter().map(DatasetRecord::from).collect())
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploaded_datasets")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn summary(n: u64) -> Summary {
        Summary {
            total_count: n,
            avg_flowrate: Some(1.5),
            avg_pressure: None,
            avg_temperature: Some(100.25),
            type_distribution: BTreeMap::from([("Pump".to_string(), n)]),
        }
    }

    async fn store() -> SqliteDatasetStore {
        SqliteDatasetStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let s = store().await;
        let ins = s.insert_with_retention("uploads/a.csv", &summary(3), 5).await.unwrap();
        assert!(ins.evicted.is_empty());

        let recent = s.recent(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, ins.record.id);
        assert_eq!(recent[0].file, "uploads/a.csv");
        assert_eq!(recent[0].summary, summary(3));
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_cap() {
        let s = store().await;
        let mut ids = Vec::new();
        let mut evicted = Vec::new();
        for i in 0..7 {
            let ins = s
                .insert_with_retention(&format!("uploads/{i}.csv"), &summary(i), 5)
                .await
                .unwrap();
            assert!(ins.evicted.len() <= 1);
            ids.push(ins.record.id);
            evicted.extend(ins.evicted);
        }

        assert_eq!(s.count().await.unwrap(), 5);
        assert_eq!(
            evicted,
            vec![
                EvictedDataset { id: ids[0], file: "uploads/0.csv".into() },
                EvictedDataset { id: ids[1], file: "uploads/1.csv".into() },
            ]
        );

        let recent: Vec<i64> = s.recent(5).await.unwrap().iter().map(|r| r.id).collect();
        let mut expected: Vec<i64> = ids[2..].to_vec();
        expected.reverse();
        assert_eq!(recent, expected);
    }

    #[tokio::test]
    async fn smaller_cap_trims_backlog() {
        let s = store().await;
        for i in 0..4 {
            s.insert_with_retention(&format!("uploads/{i}.csv"), &summary(i), 10).await.unwrap();
        }
        let ins = s.insert_with_retention("uploads/4.csv", &summary(4), 2).await.unwrap();
        assert_eq!(ins.evicted.len(), 3);
        assert_eq!(s.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn queued_insert_is_not_evicted_by_earlier_commits() {
        let s = std::sync::Arc::new(store().await);

        // hold the only connection so the next insert has to queue
        let mut conn = s.pool.acquire().await.unwrap();
        let queued = {
            let s = s.clone();
            tokio::spawn(async move { s.insert_with_retention("uploads/A.csv", &summary(1), 5).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        for i in 0..5 {
            sqlx::query("INSERT INTO uploaded_datasets (file, uploaded_at, summary) VALUES (?1, ?2, ?3)")
                .bind(format!("uploads/{i}.csv"))
                .bind(Utc::now())
                .bind(Json(summary(i)))
                .execute(&mut *conn)
                .await
                .unwrap();
        }
        drop(conn);

        let ins = queued.await.unwrap().unwrap();
        assert!(ins.evicted.iter().all(|e| e.id != ins.record.id));
        assert_eq!(ins.evicted.len(), 1);

        let recent = s.recent(5).await.unwrap();
        assert_eq!(recent[0].id, ins.record.id);
        assert_eq!(recent[0].file, "uploads/A.csv");
        assert_eq!(s.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn recent_respects_limit_and_order() {
        let s = store().await;
        for i in 0..3 {
            s.insert_with_retention(&format!("uploads/{i}.csv"), &summary(i), 5).await.unwrap();
        }
        let recent = s.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].uploaded_at >= recent[1].uploaded_at);
        assert!(recent[0].id > recent[1].id);
    }
}
