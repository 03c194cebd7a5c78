//! Submission intake.
//!
//! Reads an assignment description and turns each entry into a [`SubmissionText`]. Text comes
//! from the inline `text` field, else a local file, else a URL download; files go through
//! [`crate::extract`]. Intake never fails a submission: anything that cannot be read or
//! extracted is logged and evaluated as empty text.

use crate::extract::extract_document;
use anyhow::{Context, Result};
use integrity::{Grade, SubmissionText};
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use util::http::fetch_document;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentInput {
    pub assignment_id: String,
    #[serde(default)]
    pub submissions: Vec<SubmissionInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionInput {
    pub submission_id: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Relative paths resolve against the assignment file's directory.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub grade: Option<Grade>,
}

/// Parses the assignment file at `path`.
pub fn load_assignment(path: &Path) -> Result<AssignmentInput> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn read_local(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.to_string_lossy();
    extract_document(&bytes, Some(name.as_ref()), None)
        .with_context(|| format!("extracting {}", path.display()))
}

async fn read_remote(client: &Client, url: &str) -> Result<String> {
    let download = fetch_document(client, url)
        .await
        .with_context(|| format!("downloading {url}"))?;
    let name = url.split(['?', '#']).next().unwrap_or(url);
    extract_document(&download.bytes, Some(name), download.content_type.as_deref())
        .with_context(|| format!("extracting {url}"))
}

/// Extracts the text of one submission. Failures yield an empty string.
pub async fn extract_text(input: &SubmissionInput, base_dir: &Path, client: &Client) -> String {
    if let Some(text) = input.text.as_deref().filter(|t| !t.trim().is_empty()) {
        return text.to_string();
    }

    if let Some(rel) = &input.file_path {
        let path = base_dir.join(rel);
        match read_local(&path) {
            Ok(text) => return text,
            Err(e) => warn!("Submission {}: {e:#}", input.submission_id),
        }
    }

    if let Some(url) = &input.file_url {
        match read_remote(client, url).await {
            Ok(text) => return text,
            Err(e) => warn!("Submission {}: {e:#}", input.submission_id),
        }
    }

    info!("Submission {} has no readable text", input.submission_id);
    String::new()
}

/// Extracts every submission of `assignment`, preserving input order.
pub async fn collect_submissions(
    assignment: &AssignmentInput,
    base_dir: &Path,
    client: &Client,
) -> Vec<SubmissionText> {
    let mut out = Vec::with_capacity(assignment.submissions.len());
    for input in &assignment.submissions {
        let text = extract_text(input, base_dir, client).await;
        let mut submission = SubmissionText::new(input.submission_id.clone(), text);
        submission.existing_grade = input.grade.clone();
        out.push(submission);
    }
    out
}
