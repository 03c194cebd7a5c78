//! Web source lookup.
//!
//! Tries SerpAPI (Google results) when a key is configured and falls back to scraping the
//! DuckDuckGo HTML endpoint. Result titles and snippets are scored against the submission
//! with the bag-of-words [`MatchPolicy`]; search-engine ranking is not trusted.

use crate::matching::{MatchPolicy, snippet};
use crate::query::{build_search_query, take_chars};
use anyhow::{Context, Result};
use async_trait::async_trait;
use integrity::{LookupError, SourceLookup, SourceMatch};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{info, warn};
use util::config::AppConfig;
use util::http::build_client;

pub const SERPAPI_URL: &str = "https://serpapi.com/search";
pub const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";

static RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("valid selector"));
static WEB_RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.web-result").expect("valid selector"));
static RESULT_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));

#[derive(Debug, Deserialize)]
pub struct SerpApiResponse {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

/// Scores SerpAPI organic results against `text`.
///
/// Only the first `max_results` results are considered; each is scored on its title and
/// snippet combined.
pub fn matches_from_serpapi(
    response: &SerpApiResponse,
    text: &str,
    policy: &MatchPolicy,
) -> Vec<SourceMatch> {
    response
        .organic_results
        .iter()
        .take(policy.max_results)
        .filter(|r| !r.link.is_empty())
        .filter_map(|r| {
            let combined = format!("{} {}", r.title, r.snippet);
            let similarity = policy.score(text, &combined)?;
            Some(SourceMatch {
                url: r.link.clone(),
                title: (!r.title.is_empty()).then(|| r.title.clone()),
                similarity,
                snippet: Some(if r.snippet.is_empty() {
                    snippet(&r.title)
                } else {
                    snippet(&r.snippet)
                }),
            })
        })
        .collect()
}

/// Extracts `(href, title)` pairs from a DuckDuckGo HTML result page.
///
/// The page layout varies, so three selectors are tried in order.
pub fn duckduckgo_links(html: &str, limit: usize) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let link = |a: scraper::ElementRef<'_>| {
        (
            a.value().attr("href").unwrap_or("").trim().to_string(),
            a.text().collect::<String>().trim().to_string(),
        )
    };

    let mut links: Vec<(String, String)> = doc.select(&RESULT_LINK).take(limit).map(link).collect();
    if links.is_empty() {
        links = doc.select(&WEB_RESULT_LINK).take(limit).map(link).collect();
    }
    if links.is_empty() {
        links = doc
            .select(&RESULT_CONTAINER)
            .take(limit)
            .filter_map(|container| container.select(&ANCHOR).next())
            .map(link)
            .collect();
    }
    links
}

/// Scores DuckDuckGo result titles against `text`.
pub fn matches_from_duckduckgo(html: &str, text: &str, policy: &MatchPolicy) -> Vec<SourceMatch> {
    duckduckgo_links(html, policy.max_results)
        .into_iter()
        .filter(|(url, title)| !url.is_empty() && !title.is_empty())
        .filter_map(|(url, title)| {
            let similarity = policy.score(text, &title)?;
            Some(SourceMatch {
                url,
                snippet: Some(snippet(&title)),
                title: Some(title),
                similarity,
            })
        })
        .take(policy.max_results)
        .collect()
}

/// Web lookup backed by SerpAPI and/or DuckDuckGo.
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    serpapi_key: Option<String>,
    serpapi_url: String,
    duckduckgo_url: String,
    fallback: bool,
    policy: MatchPolicy,
}

impl WebSearch {
    /// DuckDuckGo-only lookup.
    pub fn new(client: Client, policy: MatchPolicy) -> Self {
        Self {
            client,
            serpapi_key: None,
            serpapi_url: SERPAPI_URL.to_string(),
            duckduckgo_url: DUCKDUCKGO_URL.to_string(),
            fallback: true,
            policy,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.lookup_timeout_secs).context("building HTTP client")?;
        let search = Self::new(client, MatchPolicy::from_config(config))
            .with_fallback(config.web_search_fallback);
        Ok(if config.serpapi_enabled() {
            search.with_serpapi_key(config.serpapi_api_key.clone())
        } else {
            search
        })
    }

    pub fn with_serpapi_key(mut self, key: impl Into<String>) -> Self {
        self.serpapi_key = Some(key.into());
        self
    }

    /// Enables or disables the DuckDuckGo fallback.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    /// Points the lookup at different search endpoints.
    pub fn with_endpoints(
        mut self,
        serpapi_url: impl Into<String>,
        duckduckgo_url: impl Into<String>,
    ) -> Self {
        self.serpapi_url = serpapi_url.into();
        self.duckduckgo_url = duckduckgo_url.into();
        self
    }

    async fn search_serpapi(&self, key: &str, query: &str, text: &str) -> Result<Vec<SourceMatch>> {
        let num = self.policy.max_results.to_string();
        let response: SerpApiResponse = self
            .client
            .get(&self.serpapi_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", key),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("GET {}", self.serpapi_url))?
            .error_for_status()
            .context("non-success status from SerpAPI")?
            .json()
            .await
            .context("decoding SerpAPI response")?;

        Ok(matches_from_serpapi(&response, text, &self.policy))
    }

    async fn search_duckduckgo(&self, query: &str, text: &str) -> Result<Vec<SourceMatch>> {
        let resp = self
            .client
            .get(&self.duckduckgo_url)
            .query(&[("q", query)])
            .send()
            .await
            .with_context(|| format!("GET {}", self.duckduckgo_url))?
            .error_for_status()
            .context("non-success status from DuckDuckGo")?;
        let html = resp.text().await.context("reading DuckDuckGo body")?;

        Ok(matches_from_duckduckgo(&html, text, &self.policy))
    }
}

#[async_trait]
impl SourceLookup for WebSearch {
    fn name(&self) -> &str {
        "web"
    }

    async fn lookup(&self, text: &str) -> Result<Vec<SourceMatch>, LookupError> {
        let query = build_search_query(text);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        info!("Searching web for: {}...", take_chars(&query, 100));

        if let Some(key) = &self.serpapi_key {
            match self.search_serpapi(key, &query, text).await {
                Ok(matches) => {
                    info!("Found {} web source(s) via SerpAPI", matches.len());
                    return Ok(matches);
                }
                Err(e) if self.fallback => warn!("SerpAPI error, falling back to DuckDuckGo: {e:#}"),
                Err(e) => return Err(LookupError::Failed(format!("{e:#}"))),
            }
        }

        if !self.fallback {
            return Ok(Vec::new());
        }

        let matches = self
            .search_duckduckgo(&query, text)
            .await
            .map_err(|e| LookupError::Failed(format!("{e:#}")))?;
        info!("Found {} web source(s) via DuckDuckGo", matches.len());
        Ok(matches)
    }
}
