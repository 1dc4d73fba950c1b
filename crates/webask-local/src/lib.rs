use std::sync::Arc;
use webask_core::session::Providers;
use webask_core::{Error, SecretStore};

pub mod credentials;
pub mod firecrawl;
pub mod openai;

pub use credentials::{EnvSecrets, LayeredSecrets, MapSecrets};
pub use firecrawl::{DirectSearch, FirecrawlClient};
pub use openai::{AgenticSearch, OpenAiResponsesClient};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Non-secret provider settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub openai_endpoint: String,
    pub openai_model: String,
    pub firecrawl_search_endpoint: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_endpoint: openai::DEFAULT_ENDPOINT.to_string(),
            openai_model: openai::DEFAULT_MODEL.to_string(),
            firecrawl_search_endpoint: firecrawl::DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Endpoint overrides exist for tests / enterprise proxies (never put secrets here).
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            openai_endpoint: env("WEBASK_OPENAI_ENDPOINT").unwrap_or(d.openai_endpoint),
            openai_model: env("WEBASK_OPENAI_MODEL").unwrap_or(d.openai_model),
            firecrawl_search_endpoint: env("WEBASK_FIRECRAWL_SEARCH_ENDPOINT")
                .unwrap_or(d.firecrawl_search_endpoint),
        }
    }
}

pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("webask/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Builds both providers over one shared client and secret store.
pub fn providers(
    client: reqwest::Client,
    secrets: Arc<dyn SecretStore>,
    cfg: &ProviderConfig,
) -> webask_core::Result<Providers> {
    Providers::new(
        Arc::new(AgenticSearch::new(client.clone(), secrets.clone(), cfg)),
        Arc::new(DirectSearch::new(client, secrets, cfg)),
    )
}

/// reqwest's Display hides the cause (DNS, refused, TLS); keep the chain.
fn error_chain(e: &reqwest::Error) -> String {
    let mut s = e.to_string();
    let mut cur = std::error::Error::source(e);
    while let Some(src) = cur {
        s.push_str(": ");
        s.push_str(&src.to_string());
        cur = std::error::Error::source(src);
    }
    s
}

pub(crate) fn classify(e: reqwest::Error) -> Error {
    let msg = error_chain(&e);
    if e.is_connect() {
        Error::Connect(msg)
    } else if e.is_decode() {
        Error::Decode(msg)
    } else {
        Error::Upstream(msg)
    }
}

/// Best-effort `{"error": {"message": ..}}` / `{"error": ".."}` extraction from a failed call.
pub(crate) fn upstream_error_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let e = v.get("error")?;
    e.get("message")
        .and_then(|m| m.as_str())
        .or_else(|| e.as_str())
        .map(|s| s.to_string())
}
