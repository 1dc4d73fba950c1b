use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Instant;
use webask_core::normalize::render_direct_hits;
use webask_core::{
    resolve_credential, AnswerProvider, DirectAnswer, DirectHit, Error, FailureKind,
    ProviderOutput, ProviderSelection, Query, Result, SecretStore, FIRECRAWL_API_KEY,
};

use crate::ProviderConfig;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.firecrawl.dev/v2/search";
/// Top-N results requested per query.
pub const RESULT_LIMIT: usize = 3;

pub const MISSING_KEY_MESSAGE: &str =
    "Error: API key not found. Please configure your Firecrawl API key.";

pub fn connection_error_message(detail: &str) -> String {
    format!(
        "Connection Error: Unable to connect to Firecrawl API.\n\
         This could be due to:\n  \
         - No internet connection\n  \
         - DNS resolution failure\n  \
         - Firewall or proxy blocking the connection\n\n\
         Original error: {detail}"
    )
}

pub fn search_error_message(e: &Error) -> String {
    format!(
        "Error occurred while searching: {}\nDetails: {}",
        e.kind(),
        e.detail()
    )
}

#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FirecrawlClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Web search with each hit scraped to markdown (+ links).
    ///
    /// Only hits that carry a `markdown` field are returned, in upstream order.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<DirectHit>> {
        let body = serde_json::json!({
            "query": query,
            "limit": limit,
            "scrapeOptions": { "formats": ["markdown", "links"] }
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(crate::classify)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(match crate::upstream_error_message(&body) {
                Some(m) => format!("firecrawl search HTTP {status}: {m}"),
                None => format!("firecrawl search HTTP {status}"),
            }));
        }

        let parsed: FirecrawlSearchResponse = resp.json().await.map_err(crate::classify)?;
        if !parsed.success {
            return Err(Error::Upstream(format!(
                "firecrawl search returned success=false{}",
                parsed.error.map(|e| format!(": {e}")).unwrap_or_default()
            )));
        }

        Ok(hits_from(parsed))
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}

fn hits_from(parsed: FirecrawlSearchResponse) -> Vec<DirectHit> {
    let web = parsed.data.and_then(|d| d.web).unwrap_or_default();
    web.into_iter()
        .filter_map(|r| {
            // `markdown` present (even null) marks a scraped document.
            let markdown = r.markdown?;
            let meta = r.metadata.unwrap_or_default();
            Some(DirectHit {
                title: non_empty(meta.title),
                url: non_empty(meta.source_url).or_else(|| non_empty(meta.url)),
                markdown: non_empty(markdown),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct FirecrawlSearchResponse {
    #[serde(default)]
    success: bool,
    data: Option<FirecrawlSearchData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlSearchData {
    #[serde(default)]
    web: Option<Vec<FirecrawlWebResult>>,
}

#[derive(Debug, Deserialize)]
struct FirecrawlWebResult {
    #[serde(default, deserialize_with = "present")]
    markdown: Option<Option<String>>,
    #[serde(default)]
    metadata: Option<FirecrawlMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct FirecrawlMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "sourceURL")]
    source_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Distinguishes a missing key (outer `None`) from an explicit `null`.
fn present<'de, D>(d: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Some)
}

/// Provider B: Firecrawl search + scrape, rendered as flat text.
pub struct DirectSearch {
    client: reqwest::Client,
    secrets: Arc<dyn SecretStore>,
    endpoint: String,
}

impl DirectSearch {
    pub fn new(
        client: reqwest::Client,
        secrets: Arc<dyn SecretStore>,
        cfg: &ProviderConfig,
    ) -> Self {
        Self {
            client,
            secrets,
            endpoint: cfg.firecrawl_search_endpoint.clone(),
        }
    }

    pub async fn search(&self, query: &Query) -> DirectAnswer {
        let Some(api_key) = resolve_credential(self.secrets.as_ref(), FIRECRAWL_API_KEY) else {
            return DirectAnswer::failed(FailureKind::MissingCredential, MISSING_KEY_MESSAGE);
        };
        let api = FirecrawlClient::new(self.client.clone(), self.endpoint.as_str(), api_key);

        let t0 = Instant::now();
        match api.search(query.as_str(), RESULT_LIMIT).await {
            Ok(hits) => {
                tracing::debug!(
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    hits = hits.len(),
                    "direct search done"
                );
                DirectAnswer {
                    text: render_direct_hits(&hits),
                    failure: hits.is_empty().then_some(FailureKind::NoResults),
                    hits,
                }
            }
            Err(Error::Connect(detail)) => {
                tracing::error!(kind = "ConnectionError", "firecrawl unreachable: {detail}");
                DirectAnswer::failed(
                    FailureKind::UpstreamConnectivity,
                    connection_error_message(&detail),
                )
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), "firecrawl search failed: {}", e.detail());
                DirectAnswer::failed(e.failure_kind(), search_error_message(&e))
            }
        }
    }
}

#[async_trait::async_trait]
impl AnswerProvider for DirectSearch {
    fn selection(&self) -> ProviderSelection {
        ProviderSelection::DirectSearch
    }

    async fn answer(&self, query: &Query) -> ProviderOutput {
        ProviderOutput::Direct(self.search(query).await)
    }
}
