//! # SQLite
//!
//! Disk database.
//!
//! Core purpose is to persist feedback left on the message board. One table, no cache in front of it, so every read
//! reflects the latest committed write.
//!
//! ## Requirements
//!
//! - Durable writes
//! - Ids never reused, even after the newest record is deleted
//! - Listing returns newest first
//! - Deleting a missing id is not an error
//!
//! ## Implementation
//!
//! - `AUTOINCREMENT` primary key so SQLite never hands out a freed id again
//! - `created_at` is filled in by SQLite with millisecond precision, RFC 3339 in UTC
//! - Ordering falls back to `id` for records created within the same millisecond
//! - Single pooled connection, SQLite serializes the writes
use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{
    FromRow,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use tracing::info;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        message TEXT NOT NULL,
        client_ip TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
"#;

#[derive(Serialize, FromRow, Debug, Clone)]
pub struct FeedbackRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(rename = "clientIP")]
    pub client_ip: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A validated submission, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub message: String,
    pub client_ip: String,
}

pub async fn init_sqlite(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

#[derive(Clone)]
pub struct FeedbackStore {
    pool: SqlitePool,
}

impl FeedbackStore {
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let pool = init_sqlite(path).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;

        info!("Connected to database at {}", path.display());

        Ok(Self { pool })
    }

    pub async fn insert(&self, entry: &NewFeedback) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO feedback (name, email, message, client_ip) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.name)
        .bind(&entry.email)
        .bind(&entry.message)
        .bind(&entry.client_ip)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_all(&self) -> Result<Vec<FeedbackRecord>, sqlx::Error> {
        sqlx::query_as::<_, FeedbackRecord>(
            "SELECT id, name, email, message, client_ip, created_at FROM feedback \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Waits for in-flight statements, then closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::{TempDir, tempdir};

    use super::*;

    fn entry(name: &str) -> NewFeedback {
        NewFeedback {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            message: format!("hello from {name}"),
            client_ip: "127.0.0.1".to_string(),
        }
    }

    async fn open_temp() -> (FeedbackStore, TempDir) {
        let dir = tempdir().unwrap();
        let store = FeedbackStore::open(&dir.path().join("feedback.db"))
            .await
            .unwrap();

        (store, dir)
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let (store, _dir) = open_temp().await;

        let first = store.insert(&entry("a")).await.unwrap();
        let second = store.insert(&entry("b")).await.unwrap();
        let third = store.insert(&entry("c")).await.unwrap();

        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (store, _dir) = open_temp().await;
        assert!(store.list_all().await.unwrap().is_empty());

        for name in ["a", "b", "c"] {
            store.insert(&entry(name)).await.unwrap();
        }

        let records = store.list_all().await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["c", "b", "a"]);

        assert!(records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        assert_eq!(records[0].client_ip, "127.0.0.1");
        assert_eq!(records[0].email, "c@example.com");
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _dir) = open_temp().await;
        let keep = store.insert(&entry("keep")).await.unwrap();
        let removed = store.insert(&entry("removed")).await.unwrap();

        store.delete_by_id(removed).await.unwrap();
        let ids: Vec<i64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, [keep]);

        store.delete_by_id(removed).await.unwrap();
        store.delete_by_id(9999).await.unwrap();
        let ids: Vec<i64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, [keep]);
    }

    #[tokio::test]
    async fn test_ids_not_reused() {
        let (store, _dir) = open_temp().await;
        let newest = store.insert(&entry("a")).await.unwrap();

        store.delete_by_id(newest).await.unwrap();
        let next = store.insert(&entry("b")).await.unwrap();

        assert!(next > newest);
    }

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("feedback.db");

        let store = FeedbackStore::open(&path).await.unwrap();
        store.insert(&entry("a")).await.unwrap();
        store.close().await;
        assert!(store.is_closed());

        let store = FeedbackStore::open(&path).await.unwrap();
        let records = store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
    }
}
