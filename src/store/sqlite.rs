//! SQLite-backed store.

use super::{Analysis, AnalysisStore, User};
use crate::error::{GleanError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    id TEXT PRIMARY KEY,
    video_id TEXT NOT NULL,
    video_title TEXT NOT NULL,
    analysis_text TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_analyses_owner_created ON analyses(owner_id, created_at);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    name TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const ANALYSIS_COLUMNS: &str =
    "id, video_id, video_title, analysis_text, owner_id, created_at, updated_at";

/// SQLite store for analyses and users.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| GleanError::Internal(format!("Failed to acquire database lock: {}", e)))
    }
}

/// Fixed-width RFC 3339 so lexical order matches time order.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<Analysis> {
    let id: String = row.get(0)?;
    Ok(Analysis {
        id: Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        video_id: row.get(1)?,
        video_title: row.get(2)?,
        analysis_text: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
        updated_at: parse_timestamp(row, 6)?,
    })
}

fn select_analysis(conn: &Connection, id: Uuid) -> Result<Option<Analysis>> {
    let analysis = conn
        .query_row(
            &format!("SELECT {} FROM analyses WHERE id = ?1", ANALYSIS_COLUMNS),
            params![id.to_string()],
            analysis_from_row,
        )
        .optional()?;
    Ok(analysis)
}

#[async_trait]
impl AnalysisStore for SqliteStore {
    #[instrument(skip(self, analysis), fields(id = %analysis.id))]
    async fn insert(&self, analysis: &Analysis) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO analyses
            (id, video_id, video_title, analysis_text, owner_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                analysis.id.to_string(),
                analysis.video_id,
                analysis.video_title,
                analysis.analysis_text,
                analysis.owner_id,
                timestamp(&analysis.created_at),
                timestamp(&analysis.updated_at),
            ],
        )?;

        debug!("Inserted analysis {}", analysis.id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Analysis>> {
        let conn = self.lock()?;
        select_analysis(&conn, id)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Analysis>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analyses WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
            ANALYSIS_COLUMNS
        ))?;

        let rows = stmt.query_map(params![owner_id], analysis_from_row)?;
        let analyses = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Found {} analyses for {}", analyses.len(), owner_id);
        Ok(analyses)
    }

    #[instrument(skip(self, analysis_text))]
    async fn update_text(
        &self,
        id: Uuid,
        analysis_text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Analysis>> {
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE analyses SET analysis_text = ?1, updated_at = ?2 WHERE id = ?3",
            params![analysis_text, timestamp(&updated_at), id.to_string()],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        select_analysis(&conn, id)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM analyses WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }
}

// Mirrored identity-provider users (not part of AnalysisStore)
impl SqliteStore {
    /// Insert or update a user, keeping the original creation time.
    #[instrument(skip(self, email, name))]
    pub fn upsert_user(&self, id: &str, email: &str, name: Option<&str>) -> Result<()> {
        let conn = self.lock()?;
        let now = timestamp(&Utc::now());

        conn.execute(
            r#"
            INSERT INTO users (id, email, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                updated_at = excluded.updated_at
            "#,
            params![id, email, name, now],
        )?;

        info!("Upserted user {}", id);
        Ok(())
    }

    /// Get a mirrored user.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.lock()?;

        let user = conn
            .query_row(
                "SELECT id, email, name, created_at, updated_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        created_at: parse_timestamp(row, 3)?,
                        updated_at: parse_timestamp(row, 4)?,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    /// Delete a user and every analysis they own. Returns whether the user existed.
    #[instrument(skip(self))]
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let analyses = tx.execute("DELETE FROM analyses WHERE owner_id = ?1", params![id])?;
        let users = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        tx.commit()?;

        info!("Deleted user {} and {} analyses", id, analyses);
        Ok(users > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn analysis(owner: &str, video_id: &str) -> Analysis {
        Analysis::new(
            owner.to_string(),
            video_id.to_string(),
            "Test Video".to_string(),
            "Some analysis".to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let store = SqliteStore::in_memory().unwrap();
        let saved = analysis("user_a", "dQw4w9WgXcQ");
        store.insert(&saved).await.unwrap();

        let loaded = store.get(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.analysis_text, "Some analysis");
        assert_eq!(loaded.created_at, saved.created_at);

        let later = saved.updated_at + Duration::seconds(5);
        let updated = store
            .update_text(saved.id, "Edited", later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.analysis_text, "Edited");
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.created_at, saved.created_at);

        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert!(store.get(saved.id).await.unwrap().is_none());
        assert!(store
            .update_text(saved.id, "gone", later)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let store = SqliteStore::in_memory().unwrap();

        let mut first = analysis("user_a", "aaaaaaaaaaa");
        first.created_at = Utc::now() - Duration::minutes(10);
        let second = analysis("user_a", "bbbbbbbbbbb");
        let other = analysis("user_b", "ccccccccccc");

        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();
        store.insert(&other).await.unwrap();

        let listed = store.list_by_owner("user_a").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.video_id.as_str()).collect();
        assert_eq!(ids, vec!["bbbbbbbbbbb", "aaaaaaaaaaa"]);

        assert!(store.list_by_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_users_and_cascade_delete() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .upsert_user("user_a", "a@example.com", Some("Ada"))
            .unwrap();
        let created = store.get_user("user_a").unwrap().unwrap();
        assert_eq!(created.email, "a@example.com");

        store.upsert_user("user_a", "ada@example.com", None).unwrap();
        let updated = store.get_user("user_a").unwrap().unwrap();
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.name, None);
        assert_eq!(updated.created_at, created.created_at);

        store.insert(&analysis("user_a", "dQw4w9WgXcQ")).await.unwrap();
        store.insert(&analysis("user_b", "dQw4w9WgXcQ")).await.unwrap();

        assert!(store.delete_user("user_a").unwrap());
        assert!(store.get_user("user_a").unwrap().is_none());
        assert!(store.list_by_owner("user_a").await.unwrap().is_empty());
        assert_eq!(store.list_by_owner("user_b").await.unwrap().len(), 1);
        assert!(!store.delete_user("user_a").unwrap());
    }

    #[tokio::test]
    async fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("glean.db");

        let saved = analysis("user_a", "dQw4w9WgXcQ");
        {
            let store = SqliteStore::new(&path).unwrap();
            store.insert(&saved).await.unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(reopened.get(saved.id).await.unwrap(), Some(saved));
    }
}
