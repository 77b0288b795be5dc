//! Persistence for saved analyses and mirrored users.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved analysis, owned by one user.
///
/// Serialized with the field names the web client expects (`analysis`, `userId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub video_id: String,
    pub video_title: String,
    #[serde(rename = "analysis")]
    pub analysis_text: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current time at the precision rows are stored with (microseconds).
pub fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Analysis {
    /// Create a new analysis with a fresh id and timestamps.
    pub fn new(owner_id: String, video_id: String, video_title: String, analysis_text: String) -> Self {
        let now = stored_now();
        Self {
            id: Uuid::new_v4(),
            video_id,
            video_title,
            analysis_text,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row-level storage for analyses. Ownership is enforced by [`crate::library::Library`].
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert a new analysis.
    async fn insert(&self, analysis: &Analysis) -> Result<()>;

    /// Get an analysis by id.
    async fn get(&self, id: Uuid) -> Result<Option<Analysis>>;

    /// List an owner's analyses, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Analysis>>;

    /// Replace the analysis text. Returns the updated row, or `None` if it does not exist.
    async fn update_text(
        &self,
        id: Uuid,
        analysis_text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Analysis>>;

    /// Delete an analysis. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
