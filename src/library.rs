//! Owner-scoped access to saved analyses.
//!
//! Every operation takes a resolved [`Caller`]. A missing row is `NotFound`,
//! a row owned by someone else is `Forbidden`.

use crate::error::{GleanError, Result};
use crate::store::{stored_now, Analysis, AnalysisStore};
use crate::transcript::extract_video_id;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Title used when a save request does not name the video.
pub const DEFAULT_VIDEO_TITLE: &str = "Untitled Video";

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Resolve the caller from the identity header set by the auth proxy.
    pub fn from_headers(headers: &HeaderMap, header_name: &str) -> Result<Self> {
        headers
            .get(header_name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Self::new)
            .ok_or(GleanError::Unauthorized)
    }
}

/// Fields for a new analysis.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    /// A video id or any URL form the normalizer accepts.
    pub video_id: String,
    pub video_title: Option<String>,
    pub analysis_text: String,
}

/// Saved-analysis operations for authenticated callers.
#[derive(Clone)]
pub struct Library {
    store: Arc<dyn AnalysisStore>,
}

impl Library {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, new), fields(user = %caller.user_id))]
    pub async fn create(&self, caller: &Caller, new: NewAnalysis) -> Result<Analysis> {
        let video_id = extract_video_id(&new.video_id)?;

        if new.analysis_text.trim().is_empty() {
            return Err(GleanError::InvalidInput("analysis is required".to_string()));
        }

        let title = new
            .video_title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_VIDEO_TITLE.to_string());

        let analysis = Analysis::new(caller.user_id.clone(), video_id, title, new.analysis_text);
        self.store.insert(&analysis).await?;

        info!("Saved analysis {} for video {}", analysis.id, analysis.video_id);
        Ok(analysis)
    }

    pub async fn get(&self, caller: &Caller, id: &str) -> Result<Analysis> {
        self.owned(caller, id).await
    }

    /// The caller's analyses, newest first.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Analysis>> {
        self.store.list_by_owner(&caller.user_id).await
    }

    #[instrument(skip(self, analysis_text), fields(user = %caller.user_id))]
    pub async fn update(&self, caller: &Caller, id: &str, analysis_text: String) -> Result<Analysis> {
        if analysis_text.trim().is_empty() {
            return Err(GleanError::InvalidInput("analysis is required".to_string()));
        }

        let existing = self.owned(caller, id).await?;
        self.store
            .update_text(existing.id, &analysis_text, stored_now())
            .await?
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self), fields(user = %caller.user_id))]
    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<()> {
        let existing = self.owned(caller, id).await?;
        if !self.store.delete(existing.id).await? {
            return Err(not_found(id));
        }

        info!("Deleted analysis {}", existing.id);
        Ok(())
    }

    async fn owned(&self, caller: &Caller, id: &str) -> Result<Analysis> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            debug!("Rejecting malformed analysis id {:?}", id);
            return Err(not_found(id));
        };

        let analysis = self.store.get(uuid).await?.ok_or_else(|| not_found(id))?;

        if analysis.owner_id != caller.user_id {
            return Err(GleanError::Forbidden(
                "analysis belongs to another user".to_string(),
            ));
        }

        Ok(analysis)
    }
}

fn not_found(id: &str) -> GleanError {
    GleanError::NotFound(format!("analysis {}", id))
}
