use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod normalize;
pub mod session;

/// Canonical secret name for the agentic (OpenAI Responses) provider.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Canonical secret name for the direct (Firecrawl search) provider.
pub const FIRECRAWL_API_KEY: &str = "FIRECRAWL_API_KEY";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("upstream failed: {0}")]
    Upstream(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Stable name of the failure kind (shown to users next to the detail text).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotConfigured(_) => "NotConfigured",
            Error::Connect(_) => "ConnectionError",
            Error::Upstream(_) => "UpstreamError",
            Error::Decode(_) => "DecodeError",
            Error::InvalidInput(_) => "InvalidInput",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Error::NotConfigured(s)
            | Error::Connect(s)
            | Error::Upstream(s)
            | Error::Decode(s)
            | Error::InvalidInput(s) => s,
        }
    }

    /// Maps an adapter error onto the user-facing failure taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::NotConfigured(_) => FailureKind::MissingCredential,
            Error::Connect(_) => FailureKind::UpstreamConnectivity,
            Error::Upstream(_) | Error::Decode(_) | Error::InvalidInput(_) => {
                FailureKind::UpstreamProtocolOrAuth
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single user question. Only non-emptiness is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Whitespace-only input counts as empty, a stricter check than a plain
    /// `""` test. The text is otherwise kept verbatim.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSelection {
    /// LLM-orchestrated web search (OpenAI Responses + `web_search` tool).
    #[default]
    AgenticSearch,
    /// Search/scrape API returning markdown per result (Firecrawl).
    DirectSearch,
}

impl ProviderSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderSelection::AgenticSearch => "agentic",
            ProviderSelection::DirectSearch => "direct",
        }
    }

    /// Human label of the backing service.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderSelection::AgenticSearch => "OpenAI",
            ProviderSelection::DirectSearch => "Firecrawl",
        }
    }
}

impl fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agentic" | "openai" | "a" => Ok(ProviderSelection::AgenticSearch),
            "direct" | "firecrawl" | "b" => Ok(ProviderSelection::DirectSearch),
            other => Err(Error::InvalidInput(format!(
                "unknown provider {other:?} (allowed: agentic, direct)"
            ))),
        }
    }
}

/// Failure taxonomy carried alongside display text so callers need not parse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingCredential,
    UpstreamConnectivity,
    UpstreamProtocolOrAuth,
    NoResults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Provider A result. `sources` and `search_queries` are always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
    pub search_queries: Vec<String>,
    pub web_search_calls: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl SearchAnswer {
    /// A result whose answer is an error message and whose containers are empty.
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            answer: message.into(),
            failure: Some(kind),
            ..Self::default()
        }
    }
}

/// Provider B per-result triple. Absent upstream fields stay `None` here;
/// placeholders are applied at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectHit {
    pub title: Option<String>,
    pub url: Option<String>,
    pub markdown: Option<String>,
}

/// Provider B result: final display text plus the hits it was rendered from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectAnswer {
    pub text: String,
    pub hits: Vec<DirectHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl DirectAnswer {
    pub fn failed(kind: FailureKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hits: Vec::new(),
            failure: Some(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderOutput {
    Agentic(SearchAnswer),
    Direct(DirectAnswer),
}

impl ProviderOutput {
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            ProviderOutput::Agentic(a) => a.failure,
            ProviderOutput::Direct(d) => d.failure,
        }
    }
}

/// Named-secret lookup. Implementations return `None` for absent secrets and never fail.
pub trait SecretStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads a credential for one provider call. Empty values count as absent.
///
/// Absence is logged at `warn` by name only; values are never logged.
pub fn resolve_credential(store: &dyn SecretStore, name: &str) -> Option<String> {
    let v = store
        .get(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if v.is_none() {
        tracing::warn!(secret = name, "{name} not found in configuration");
    }
    v
}

/// One interchangeable search backend.
///
/// `answer` is infallible: every failure is turned into display text at this boundary.
#[async_trait::async_trait]
pub trait AnswerProvider: Send + Sync {
    fn selection(&self) -> ProviderSelection;
    async fn answer(&self, query: &Query) -> ProviderOutput;
}
