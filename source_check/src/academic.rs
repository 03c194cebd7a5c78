//! Academic knowledge-base lookup.
//!
//! Queries a vector-search endpoint with the full submission text and scores the
//! returned passages with the shared [`MatchPolicy`]. Without an endpoint configured the
//! lookup is a no-op.

use crate::matching::{MatchPolicy, snippet};
use async_trait::async_trait;
use integrity::{LookupError, SourceLookup, SourceMatch};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use util::config::AppConfig;
use util::http::build_client;

const DEFAULT_SOURCE: &str = "knowledge_base";
const DEFAULT_TITLE: &str = "Academic Source";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    collection: &'a str,
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: HitMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct HitMetadata {
    pub source: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

/// Scores knowledge-base hits against `text`.
pub fn matches_from_hits(
    response: &SearchResponse,
    text: &str,
    policy: &MatchPolicy,
) -> Vec<SourceMatch> {
    response
        .results
        .iter()
        .filter(|hit| !hit.content.trim().is_empty())
        .filter_map(|hit| {
            let similarity = policy.score(text, &hit.content)?;
            let meta = &hit.metadata;
            Some(SourceMatch {
                url: meta
                    .source
                    .clone()
                    .or_else(|| meta.url.clone())
                    .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                title: Some(meta.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string())),
                similarity,
                snippet: Some(snippet(&hit.content)),
            })
        })
        .take(policy.max_results)
        .collect()
}

/// Lookup against an academic vector-search service.
#[derive(Debug, Clone)]
pub struct AcademicSearch {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    collection: String,
    policy: MatchPolicy,
}

impl AcademicSearch {
    pub fn new(client: Client, endpoint: Option<String>, policy: MatchPolicy) -> Self {
        Self {
            client,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            api_key: None,
            collection: "teachmate".to_string(),
            policy,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(config.lookup_timeout_secs)?;
        let endpoint = config
            .academic_search_enabled()
            .then(|| config.academic_search_url.clone());
        let search = Self::new(client, endpoint, MatchPolicy::from_config(config))
            .with_collection(config.academic_collection.clone());
        Ok(if config.academic_search_api_key.trim().is_empty() {
            search
        } else {
            search.with_api_key(config.academic_search_api_key.clone())
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl SourceLookup for AcademicSearch {
    fn name(&self) -> &str {
        "academic"
    }

    async fn lookup(&self, text: &str) -> Result<Vec<SourceMatch>, LookupError> {
        let Some(endpoint) = &self.endpoint else {
            debug!("Academic search endpoint not configured, skipping");
            return Ok(Vec::new());
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Vector search takes the whole submission; only web queries are shortened.
        let body = SearchRequest {
            collection: &self.collection,
            query: text,
            limit: self.policy.max_results,
        };
        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let response: SearchResponse = resp
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        let matches = matches_from_hits(&response, text, &self.policy);
        info!("Found {} academic source(s)", matches.len());
        Ok(matches)
    }
}
