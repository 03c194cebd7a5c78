//! Offline reference corpus.
//!
//! A directory of `.txt`/`.md` documents searched in memory, for runs without network access
//! or for comparing against course material and previous cohorts.

use crate::matching::{MatchPolicy, snippet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use integrity::{LookupError, SourceLookup, SourceMatch};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

const CORPUS_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Clone)]
struct Document {
    location: String,
    title: String,
    content: String,
}

/// In-memory collection of reference documents.
#[derive(Debug, Clone, Default)]
pub struct LocalCorpus {
    documents: Vec<Document>,
    policy: MatchPolicy,
}

impl LocalCorpus {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            documents: Vec::new(),
            policy,
        }
    }

    pub fn with_document(
        mut self,
        location: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.documents.push(Document {
            location: location.into(),
            title: title.into(),
            content: content.into(),
        });
        self
    }

    /// Loads every `.txt`/`.md` file under `dir`, recursively.
    ///
    /// Unreadable files are skipped with a warning; a missing directory is an error.
    pub fn from_dir(dir: &Path, policy: MatchPolicy) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("corpus directory {} does not exist", dir.display());
        }

        let mut corpus = Self::new(policy);
        let mut paths: Vec<_> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| CORPUS_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();

        for path in paths {
            let content = match fs::read(&path)
                .with_context(|| format!("reading {}", path.display()))
            {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!("Skipping corpus document: {e:#}");
                    continue;
                }
            };
            let title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let location = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            corpus = corpus.with_document(location, title, content);
        }

        debug!("Loaded {} corpus document(s) from {}", corpus.len(), dir.display());
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents similar to `text`, strongest first.
    pub fn search(&self, text: &str) -> Vec<SourceMatch> {
        let mut matches: Vec<SourceMatch> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let similarity = self.policy.score(text, &doc.content)?;
                Some(SourceMatch {
                    url: doc.location.clone(),
                    title: Some(doc.title.clone()),
                    similarity,
                    snippet: Some(snippet(doc.content.trim())),
                })
            })
            .collect();
        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(self.policy.max_results);
        matches
    }
}

#[async_trait]
impl SourceLookup for LocalCorpus {
    fn name(&self) -> &str {
        "local-corpus"
    }

    async fn lookup(&self, text: &str) -> Result<Vec<SourceMatch>, LookupError> {
        Ok(self.search(text))
    }
}
