//! Analysis pipeline: one resume against one job description.
//!
//! Flow: extract (blocking pool) → build_prompt → invoke model → parse →
//!       score check → render. Strictly sequential; nothing is retried or stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::parser::parse;
use crate::analysis::prompts::build_prompt;
use crate::analysis::result::AnalysisResult;
use crate::analysis::scores::{check_scores, ScoreCheck};
use crate::errors::AppError;
use crate::extract::{extract, ExtractedText, MediaType, SourceDocument};
use crate::llm_client::Inference;
use crate::render::{render, Report};

/// What the caller learns about each uploaded document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub file_name: Option<String>,
    pub media_type: MediaType,
    pub chars: usize,
}

impl DocumentSummary {
    fn new(document: &SourceDocument, text: &ExtractedText) -> Self {
        Self {
            file_name: document.file_name().map(String::from),
            media_type: document.media_type(),
            chars: text.char_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub resume: DocumentSummary,
    pub job_description: DocumentSummary,
    pub result: AnalysisResult,
    /// Present only when the model returned a `percentage_scores` section.
    pub score_check: Option<ScoreCheck>,
    pub report: Report,
    pub report_markdown: String,
}

/// Runs extraction off the async executor. Extraction itself never fails.
pub async fn extract_blocking(
    document: SourceDocument,
) -> Result<(SourceDocument, ExtractedText), AppError> {
    tokio::task::spawn_blocking(move || {
        let text = extract(&document);
        (document, text)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("extraction task failed")))
}

pub async fn run_analysis(
    llm: &dyn Inference,
    resume: SourceDocument,
    job_description: SourceDocument,
) -> Result<AnalysisOutcome, AppError> {
    let analysis_id = Uuid::new_v4();

    let (resume, resume_text) = extract_blocking(resume).await?;
    let (job_description, job_text) = extract_blocking(job_description).await?;

    info!(
        %analysis_id,
        resume_chars = resume_text.char_count(),
        job_chars = job_text.char_count(),
        "Extracted documents"
    );
    if resume_text.is_empty() || job_text.is_empty() {
        warn!(%analysis_id, "At least one document produced no text; sending prompt anyway");
    }

    let prompt = build_prompt(resume_text.as_str(), job_text.as_str());
    let completion = llm.invoke(&prompt).await?;
    info!(
        %analysis_id,
        completion_chars = completion.text().len(),
        "Model completion received"
    );

    let result = parse(&completion)?;

    let score_check = result.percentage_scores.as_ref().map(check_scores);
    if let Some(ScoreCheck {
        consistent: Some(false),
        reported_overall,
        expected_overall,
    }) = &score_check
    {
        warn!(
            %analysis_id,
            ?reported_overall,
            ?expected_overall,
            "Model-reported overall score does not match its component scores"
        );
    }

    let report = render(&result);
    let report_markdown = report.to_markdown();

    Ok(AnalysisOutcome {
        analysis_id,
        analyzed_at: Utc::now(),
        resume: DocumentSummary::new(&resume, &resume_text),
        job_description: DocumentSummary::new(&job_description, &job_text),
        result,
        score_check,
        report,
        report_markdown,
    })
}
