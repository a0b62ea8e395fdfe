//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::debug;

use crate::analysis::pipeline::{extract_blocking, run_analysis, AnalysisOutcome};
use crate::errors::AppError;
use crate::extract::{MediaType, SourceDocument};
use crate::state::AppState;

/// Largest accepted size for a single uploaded document.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "job_description";
const DOCUMENT_FIELD: &str = "document";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file_name: Option<String>,
    pub media_type: MediaType,
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
///
/// Multipart upload with `resume` and `job_description` file fields.
/// Runs the full pipeline: extract → prompt → model → parse → render.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisOutcome>, AppError> {
    let mut uploads = read_uploads(multipart, &[RESUME_FIELD, JOB_DESCRIPTION_FIELD]).await?;
    let resume = take_upload(&mut uploads, RESUME_FIELD)?;
    let job_description = take_upload(&mut uploads, JOB_DESCRIPTION_FIELD)?;

    let outcome = run_analysis(state.llm.as_ref(), resume, job_description).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/documents/extract
///
/// Returns the text extracted from a single `document` upload.
/// Useful for previewing what the model will see, without a model call.
pub async fn handle_extract(multipart: Multipart) -> Result<Json<ExtractResponse>, AppError> {
    let mut uploads = read_uploads(multipart, &[DOCUMENT_FIELD]).await?;
    let document = take_upload(&mut uploads, DOCUMENT_FIELD)?;

    let (document, text) = extract_blocking(document).await?;
    Ok(Json(ExtractResponse {
        file_name: document.file_name().map(String::from),
        media_type: document.media_type(),
        text: text.into_string(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads the wanted file fields; everything else is drained and ignored.
/// A repeated field keeps its last occurrence.
async fn read_uploads(
    mut multipart: Multipart,
    wanted: &[&str],
) -> Result<Vec<(String, SourceDocument)>, AppError> {
    let mut uploads: Vec<(String, SourceDocument)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if !wanted.contains(&name.as_str()) {
            debug!("Ignoring multipart field '{name}'");
            let _ = field.bytes().await.map_err(multipart_error)?;
            continue;
        }

        let file_name = field.file_name().map(String::from);
        let media_type = MediaType::from_declared(field.content_type(), file_name.as_deref());
        let data = field.bytes().await.map_err(multipart_error)?;

        if data.len() > MAX_DOCUMENT_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "'{name}' exceeds the {} MiB limit",
                MAX_DOCUMENT_BYTES / (1024 * 1024)
            )));
        }

        let mut document = SourceDocument::new(data, media_type);
        if let Some(file_name) = file_name {
            document = document.with_file_name(file_name);
        }
        uploads.retain(|(existing, _)| existing != &name);
        uploads.push((name, document));
    }

    Ok(uploads)
}

fn take_upload(
    uploads: &mut Vec<(String, SourceDocument)>,
    field: &str,
) -> Result<SourceDocument, AppError> {
    let index = uploads
        .iter()
        .position(|(name, _)| name == field)
        .ok_or_else(|| AppError::Validation(format!("'{field}' file is required")))?;
    Ok(uploads.swap_remove(index).1)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}
