//! Request handlers.

use super::AppState;
use crate::analysis::AnalysisReport;
use crate::error::{GleanError, Result};
use crate::library::{Caller, NewAnalysis};
use crate::rate_limit::client_key;
use crate::store::Analysis;
use crate::transcript::{extract_video_id, join_text, language_preferences, TranscriptSegment};
use crate::webhook::{self, WebhookHeaders};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

type AppStateRef = State<Arc<AppState>>;

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = GleanError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers, &state.user_header)
    }
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRequest {
    video_url: String,
    /// Overrides the configured language order.
    #[serde(default)]
    languages: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResponse {
    video_id: String,
    transcript: Vec<TranscriptSegment>,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    transcript: Vec<TranscriptSegment>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    analysis: AnalysisReport,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    video_id: String,
    #[serde(default)]
    video_title: Option<String>,
    analysis: Value,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    analysis: Value,
}

#[derive(Serialize)]
pub struct SavedResponse {
    success: bool,
    analysis: Analysis,
}

/// Saved analyses are text; structured reports are stored as compact JSON.
fn analysis_text(value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        v @ (Value::Object(_) | Value::Array(_)) => Ok(v.to_string()),
        _ => Err(GleanError::InvalidInput(
            "analysis must be a string or a JSON object".to_string(),
        )),
    }
}

// === Handlers ===

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn transcript(
    State(state): AppStateRef,
    payload: std::result::Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<TranscriptResponse>> {
    let Json(req) = payload?;
    let video_id = extract_video_id(&req.video_url)?;

    let transcript = match req.languages {
        Some(codes) if !codes.is_empty() => {
            state
                .fetcher
                .fetch_with_languages(&video_id, &language_preferences(codes.as_slice()))
                .await?
        }
        _ => state.fetcher.fetch(&video_id).await?,
    };

    info!("Fetched {} segments for {}", transcript.len(), video_id);
    Ok(Json(TranscriptResponse {
        video_id,
        transcript,
    }))
}

pub async fn analyze(
    State(state): AppStateRef,
    headers: HeaderMap,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>> {
    let key = client_key(&headers);
    state.limiter.check(&key)?;

    let Json(req) = payload?;
    let text = join_text(&req.transcript);
    if text.is_empty() {
        return Err(GleanError::InvalidInput(
            "transcript is required".to_string(),
        ));
    }

    debug!("Analyzing {} characters for {}", text.len(), key);
    let analysis = state.analyzer.analyze(&text).await?;
    Ok(Json(AnalyzeResponse { analysis }))
}

pub async fn create_analysis(
    State(state): AppStateRef,
    caller: Caller,
    payload: std::result::Result<Json<SaveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedResponse>)> {
    let Json(req) = payload?;

    let analysis = state
        .library
        .create(
            &caller,
            NewAnalysis {
                video_id: req.video_id,
                video_title: req.video_title,
                analysis_text: analysis_text(req.analysis)?,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SavedResponse {
            success: true,
            analysis,
        }),
    ))
}

pub async fn list_analyses(State(state): AppStateRef, caller: Caller) -> Result<Json<Value>> {
    let analyses = state.library.list(&caller).await?;
    Ok(Json(json!({ "analyses": analyses })))
}

pub async fn get_analysis(
    State(state): AppStateRef,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let analysis = state.library.get(&caller, &id).await?;
    Ok(Json(json!({ "analysis": analysis })))
}

pub async fn update_analysis(
    State(state): AppStateRef,
    caller: Caller,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<SavedResponse>> {
    let Json(req) = payload?;
    let analysis = state
        .library
        .update(&caller, &id, analysis_text(req.analysis)?)
        .await?;

    Ok(Json(SavedResponse {
        success: true,
        analysis,
    }))
}

pub async fn delete_analysis(
    State(state): AppStateRef,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.library.delete(&caller, &id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn identity_webhook(
    State(state): AppStateRef,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let secret = state.webhook_secret.as_deref().ok_or_else(|| {
        GleanError::Config(format!(
            "{} is not set. Add the webhook signing secret from your identity provider dashboard.",
            state.webhook_secret_env
        ))
    })?;

    let delivery = WebhookHeaders::from_headers(&headers)?;
    let event = webhook::verify(
        secret,
        &delivery,
        &body,
        Utc::now(),
        state.webhook_tolerance_secs,
    )?;

    let user_event = event.user_event()?;
    webhook::apply(&state.store, &user_event)?;

    Ok(Json(json!({ "success": true })))
}
