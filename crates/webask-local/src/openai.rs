use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use webask_core::{
    resolve_credential, AnswerProvider, Error, FailureKind, ProviderOutput, ProviderSelection,
    Query, Result, SearchAnswer, SecretStore, Source, Usage, OPENAI_API_KEY,
};

use crate::ProviderConfig;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_MODEL: &str = "gpt-5";
/// Hard cap on `web_search` invocations per answer.
pub const MAX_TOOL_CALLS: u32 = 5;

pub const MISSING_KEY_MESSAGE: &str =
    "Error: API key not found. Please configure your OpenAI API key.";

pub const SYSTEM_INSTRUCTIONS: &str = "\
You are a helpful research assistant that answers questions using web search.

Your process:
1. Analyze the user's question to determine what information needs to be searched on the web
2. Use the web_search tool to find relevant and up-to-date information
3. Extract key information from the web search results
4. Synthesize the information to provide a clear, accurate, and comprehensive answer

Guidelines:
- Use web_search to find current, factual information relevant to the user's query
- Base your answer solely on the information retrieved from web search
- If the web search doesn't provide sufficient information, indicate that in your response
- Provide a well-structured answer that directly addresses the user's question
- Cite sources when relevant information is found";

#[derive(Debug, Clone)]
pub struct OpenAiResponsesClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiResponsesClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub async fn create(&self, req: &ResponsesRequest) -> Result<ResponsesResponse> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(req)
            .send()
            .await
            .map_err(crate::classify)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(match crate::upstream_error_message(&body) {
                Some(m) => format!("openai responses HTTP {status}: {m}"),
                None => format!("openai responses HTTP {status}"),
            }));
        }

        resp.json().await.map_err(crate::classify)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub tools: Vec<Tool>,
    pub tool_choice: String,
    pub max_tool_calls: u32,
    pub parallel_tool_calls: bool,
}

impl ResponsesRequest {
    /// System + user turn with a single `web_search` tool. Tool calls run one at a
    /// time so the recorded query log is reproducible.
    pub fn web_search(model: &str, system: &str, user: &str) -> Self {
        Self {
            model: model.to_string(),
            input: vec![
                InputMessage::text("system", system),
                InputMessage::text("user", user),
            ],
            tools: vec![Tool::WebSearch],
            tool_choice: "auto".to_string(),
            max_tool_calls: MAX_TOOL_CALLS,
            parallel_tool_calls: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    pub role: String,
    pub content: Vec<InputContent>,
}

impl InputMessage {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            content: vec![InputContent::InputText {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputContent {
    InputText { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    WebSearch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<ResponseUsage>,
}

/// Output items we act on; every other item type lands in `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    WebSearchCall {
        #[serde(default)]
        action: Option<WebSearchAction>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    UrlCitation {
        url: String,
        #[serde(default)]
        title: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSearchAction {
    #[serde(default)]
    pub queries: Option<Vec<String>>,
    #[serde(default)]
    pub query: Option<String>,
}

impl WebSearchAction {
    fn into_queries(self) -> Vec<String> {
        match self.queries {
            Some(qs) if !qs.is_empty() => qs,
            _ => self.query.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Walks output items in order. The last `output_text` is the answer; citations
/// and queries accumulate in emission order. No text message leaves `answer` empty.
pub fn extract_answer(resp: ResponsesResponse) -> SearchAnswer {
    let mut out = SearchAnswer::default();
    for item in resp.output {
        match item {
            OutputItem::Message { content } => {
                for part in content {
                    let ContentPart::OutputText { text, annotations } = part else {
                        continue;
                    };
                    out.answer = text;
                    for a in annotations {
                        if let Annotation::UrlCitation { url, title } = a {
                            out.sources.push(Source { url, title });
                        }
                    }
                }
            }
            OutputItem::WebSearchCall { action } => {
                out.web_search_calls += 1;
                if let Some(action) = action {
                    out.search_queries.extend(action.into_queries());
                }
            }
            OutputItem::Other => {}
        }
    }
    out.usage = resp.usage.map(|u| Usage {
        input_tokens: u.input_tokens,
        output_tokens: u.output_tokens,
        total_tokens: u.total_tokens,
    });
    out
}

/// Provider A: OpenAI Responses with the hosted `web_search` tool.
pub struct AgenticSearch {
    client: reqwest::Client,
    secrets: Arc<dyn SecretStore>,
    endpoint: String,
    model: String,
}

impl AgenticSearch {
    pub fn new(
        client: reqwest::Client,
        secrets: Arc<dyn SecretStore>,
        cfg: &ProviderConfig,
    ) -> Self {
        Self {
            client,
            secrets,
            endpoint: cfg.openai_endpoint.clone(),
            model: cfg.openai_model.clone(),
        }
    }

    pub async fn search(&self, query: &Query) -> SearchAnswer {
        let Some(api_key) = resolve_credential(self.secrets.as_ref(), OPENAI_API_KEY) else {
            return SearchAnswer::failed(FailureKind::MissingCredential, MISSING_KEY_MESSAGE);
        };
        let api = OpenAiResponsesClient::new(self.client.clone(), self.endpoint.as_str(), api_key);
        let req = ResponsesRequest::web_search(&self.model, SYSTEM_INSTRUCTIONS, query.as_str());

        let t0 = Instant::now();
        match api.create(&req).await {
            Ok(resp) => {
                let a = extract_answer(resp);
                tracing::debug!(
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    sources = a.sources.len(),
                    queries = a.search_queries.len(),
                    web_search_calls = a.web_search_calls,
                    total_tokens = a.usage.as_ref().map(|u| u.total_tokens),
                    "agentic search done"
                );
                a
            }
            Err(e) => {
                let msg = format!("Error during web search: {e}");
                tracing::error!(kind = e.kind(), "{msg}");
                SearchAnswer::failed(e.failure_kind(), msg)
            }
        }
    }
}

#[async_trait::async_trait]
impl AnswerProvider for AgenticSearch {
    fn selection(&self) -> ProviderSelection {
        ProviderSelection::AgenticSearch
    }

    async fn answer(&self, query: &Query) -> ProviderOutput {
        ProviderOutput::Agentic(self.search(query).await)
    }
}
