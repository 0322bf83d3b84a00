use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::{extract_relevant_section, extract_text_from_bytes};
use crate::matching::engine::{DiscoveryMode, MatchReport};
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const JOB_FIELD: &str = "job_description";

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_text: String,
    pub job_text: String,
    pub resume_label: Option<String>,
    pub job_label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractSkillsRequest {
    pub text: String,
    /// Falls back to the configured discovery mode.
    pub mode: Option<DiscoveryMode>,
}

#[derive(Debug, Serialize)]
pub struct ExtractSkillsResponse {
    pub skills: Vec<String>,
    pub candidates: Vec<String>,
    pub mode: DiscoveryMode,
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".into()));
    }

    let resume_label = req.resume_label.as_deref().unwrap_or(RESUME_FIELD);
    let job_label = req.job_label.as_deref().unwrap_or(JOB_FIELD);

    let report = state
        .engine
        .match_texts(resume_label, &req.resume_text, job_label, &req.job_text)
        .await;
    Ok(Json(report))
}

/// POST /api/v1/match/upload
/// Multipart with `resume` and `job_description` file fields (.pdf or .txt).
pub async fn handle_match_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchReport>, AppError> {
    let mut resume: Option<(String, String)> = None;
    let mut job: Option<(String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != RESUME_FIELD && name != JOB_FIELD {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("Field '{name}' must be a file")))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read field '{name}': {e}")))?;

        let label = filename.clone();
        let text = tokio::task::spawn_blocking(move || extract_text_from_bytes(&filename, &bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        if name == RESUME_FIELD {
            resume = Some((label, text));
        } else {
            job = Some((label, text));
        }
    }

    let (resume_label, resume_text) =
        resume.ok_or_else(|| AppError::Validation(format!("Missing '{RESUME_FIELD}' file")))?;
    let (job_label, job_text) =
        job.ok_or_else(|| AppError::Validation(format!("Missing '{JOB_FIELD}' file")))?;

    info!("Matching uploaded {resume_label} against {job_label}");

    let report = state
        .engine
        .match_texts(
            &resume_label,
            extract_relevant_section(&resume_text),
            &job_label,
            extract_relevant_section(&job_text),
        )
        .await;
    Ok(Json(report))
}

/// POST /api/v1/skills/extract
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    Json(req): Json<ExtractSkillsRequest>,
) -> Result<Json<ExtractSkillsResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".into()));
    }

    let mode = req.mode.unwrap_or_else(|| state.engine.discovery_mode());
    let found = state.engine.discover_job_skills(&req.text, mode);

    Ok(Json(ExtractSkillsResponse {
        skills: found.confirmed.into_iter().collect(),
        candidates: found.candidates.into_iter().collect(),
        mode,
    }))
}
