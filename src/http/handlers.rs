use super::state::AppState;
use crate::analysis::is_remote_url;
use crate::recommendation::Scope;
use crate::session::{AnalysisResult, Classification, ImageSource, SessionSummary, Sweeper};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Header carrying the client's session id when the body does not
pub const SESSION_HEADER: &str = "x-session-id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Existing session id; a new session is created if absent or unknown
    pub session_id: Option<String>,

    #[serde(default)]
    pub uploads: Vec<UploadedImage>,

    /// http(s) URLs or paths on the server
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedImage {
    pub filename: String,

    /// Base64-encoded image bytes
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzedImage {
    pub image: ImageSource,
    pub result: AnalysisResult,
    pub recommendation: String,

    /// Whether the analysis made it into the history
    pub recorded: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub results: Vec<AnalyzedImage>,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub removed: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryStats {
    pub sessions: SessionTotals,
    pub live: LiveTotals,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionTotals {
    pub active_sessions: usize,
    pub total_analyses: usize,
    pub retention_hours: i64,
}

#[derive(Debug, Serialize)]
pub struct LiveTotals {
    pub total_analyses: usize,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailedStats {
    pub sessions: SessionDetails,
    pub live: LiveTotals,
    pub system: SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct SessionDetails {
    pub active_sessions: usize,
    pub total_analyses: usize,
    pub details: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub retention_hours: i64,
    pub sessions_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a new, empty session
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.sessions.create(None).await {
        Ok(session_id) => (
            StatusCode::CREATED,
            Json(CreateSessionResponse { session_id }),
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create session: {}", e),
        ),
    }
}

/// POST /analyze
/// Classify uploaded and referenced images and record them in the caller's session
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let requested = req.session_id.clone().or_else(|| {
        headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let session_id = match resolve_session(&state, requested).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to resolve session: {:#}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create session: {:#}", e),
            );
        }
    };
    state.sessions.touch(&session_id).await;

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for upload in &req.uploads {
        match analyze_upload(&state, upload).await {
            Ok((image, classification)) => {
                results.push(record_for_session(&state, &session_id, image, &classification).await)
            }
            Err(e) => {
                warn!("Upload {} failed: {:#}", upload.filename, e);
                errors.push(format!("{}: {:#}", upload.filename, e));
            }
        }
    }

    for url in req.urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        match analyze_reference(&state, url).await {
            Ok((image, classification)) => {
                results.push(record_for_session(&state, &session_id, image, &classification).await)
            }
            Err(e) => {
                warn!("Image {} failed: {:#}", url, e);
                errors.push(format!("{}: {:#}", url, e));
            }
        }
    }

    info!(
        "Analyzed {} images for session {} ({} errors)",
        results.len(),
        session_id,
        errors.len()
    );

    (
        StatusCode::OK,
        Json(AnalyzeResponse {
            session_id,
            results,
            errors,
        }),
    )
        .into_response()
}

/// GET /analyze/live?url=...
/// Classify one image for the live feed and record it in the live ledger
pub async fn analyze_live(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
) -> impl IntoResponse {
    let Some(url) = query.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "No URL or path provided");
    };

    let (image, classification) = match analyze_reference(&state, url).await {
        Ok(analyzed) => analyzed,
        Err(e) => {
            error!("Live analysis of {} failed: {:#}", url, e);
            return error_response(StatusCode::BAD_REQUEST, format!("{:#}", e));
        }
    };

    let recommendation = state
        .rotator
        .next(classification.label.as_str(), &Scope::Global);
    let recorded = state
        .recorder
        .record_live(image.clone(), &classification, &recommendation)
        .await;

    (
        StatusCode::OK,
        Json(AnalyzedImage {
            image,
            result: AnalysisResult::from(&classification),
            recommendation,
            recorded,
        }),
    )
        .into_response()
}

/// GET /history?session_id=...
/// Full history of one session
pub async fn session_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let Some(session_id) = query.session_id.filter(|s| !s.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "session_id is required");
    };

    match state.sessions.get(&session_id).await {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
    }
}

/// GET /history/live
/// Full history of the live feed
pub async fn live_history(State(state): State<AppState>) -> impl IntoResponse {
    match state.live.read().await {
        Some(ledger) => (StatusCode::OK, Json(ledger)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No live history available"),
    }
}

/// GET /history/stats
/// Combined counts for sessions and the live feed
pub async fn history_stats(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.stats().await;
    let live = live_totals(&state).await;

    (
        StatusCode::OK,
        Json(HistoryStats {
            total: sessions.total_analyses + live.total_analyses,
            sessions: SessionTotals {
                active_sessions: sessions.active_sessions,
                total_analyses: sessions.total_analyses,
                retention_hours: state.janitor.retention_hours(),
            },
            live,
        }),
    )
}

/// POST /admin/sessions/cleanup
/// Sweep expired sessions now
pub async fn force_cleanup(State(state): State<AppState>) -> impl IntoResponse {
    match state.janitor.sweep().await {
        Ok(removed) => {
            info!("Manual cleanup removed {} sessions", removed);
            (
                StatusCode::OK,
                Json(CleanupResponse {
                    success: true,
                    removed,
                    message: format!("Cleanup finished: {} sessions removed", removed),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Manual cleanup failed: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Cleanup failed: {:#}", e),
            )
        }
    }
}

/// GET /admin/stats
/// Per-session details plus live totals
pub async fn detailed_stats(State(state): State<AppState>) -> impl IntoResponse {
    let details = state.sessions.summaries().await;
    let total_analyses = details.iter().map(|s| s.total_analyses).sum();

    (
        StatusCode::OK,
        Json(DetailedStats {
            sessions: SessionDetails {
                active_sessions: details.len(),
                total_analyses,
                details,
            },
            live: live_totals(&state).await,
            system: SystemInfo {
                retention_hours: state.janitor.retention_hours(),
                sessions_dir: state.sessions.backend().dir().to_path_buf(),
            },
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Helpers
// ============================================================================

/// Reuse the requested session if it exists, otherwise start a new one
async fn resolve_session(state: &AppState, requested: Option<String>) -> Result<String> {
    if let Some(id) = requested {
        if state.sessions.get(&id).await.is_some() {
            return Ok(id);
        }
        info!("Session {} not found, creating a new one", id);
    }

    Ok(state.sessions.create(None).await?)
}

async fn analyze_upload(
    state: &AppState,
    upload: &UploadedImage,
) -> Result<(ImageSource, Classification)> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(upload.data.trim())
        .context("Invalid base64 image data")?;
    let image = state.uploads.save_upload(&upload.filename, &bytes).await?;
    classify_stored(state, image).await
}

/// Fetch an http(s) URL, or classify a path on this machine
async fn analyze_reference(state: &AppState, reference: &str) -> Result<(ImageSource, Classification)> {
    if is_remote_url(reference) {
        let bytes = state.fetcher.fetch(reference).await?;
        let image = state.uploads.save_fetched(reference, &bytes).await?;
        return classify_stored(state, image).await;
    }

    let path = Path::new(reference);
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        anyhow::bail!("Local path does not exist");
    }

    // Only images the model accepted are copied where they get served
    let classification = classify(state, path).await?;
    let image = state.uploads.copy_local(path).await?;
    Ok((image, classification))
}

/// Classify an image already saved under uploads; it is removed again if
/// classification fails
async fn classify_stored(
    state: &AppState,
    image: ImageSource,
) -> Result<(ImageSource, Classification)> {
    match classify(state, image.stored_path()).await {
        Ok(classification) => Ok((image, classification)),
        Err(e) => {
            state.uploads.discard(&image).await;
            Err(e)
        }
    }
}

async fn classify(state: &AppState, image: &Path) -> Result<Classification> {
    state
        .classifier
        .classify(image)
        .await
        .context("Classification failed")
}

async fn record_for_session(
    state: &AppState,
    session_id: &str,
    image: ImageSource,
    classification: &Classification,
) -> AnalyzedImage {
    let recommendation = state
        .rotator
        .next(classification.label.as_str(), &Scope::session(session_id));
    let recorded = state
        .recorder
        .record_session(session_id, image.clone(), classification, &recommendation)
        .await;

    AnalyzedImage {
        image,
        result: AnalysisResult::from(classification),
        recommendation,
        recorded,
    }
}

async fn live_totals(state: &AppState) -> LiveTotals {
    match state.live.read().await {
        Some(ledger) => LiveTotals {
            total_analyses: ledger.total_analyses(),
            available: true,
        },
        None => LiveTotals {
            total_analyses: 0,
            available: false,
        },
    }
}
