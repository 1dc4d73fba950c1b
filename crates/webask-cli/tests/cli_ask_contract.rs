use assert_cmd::Command;
use axum::{routing::post, Json, Router};
use predicates::prelude::*;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PROXY_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

struct Fixture {
    // Keeps the server alive for the duration of the test.
    _rt: tokio::runtime::Runtime,
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl Fixture {
    fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = hits.clone();
        let h2 = hits.clone();
        let app = Router::new()
            .route(
                "/v1/responses",
                post(move |Json(_body): Json<serde_json::Value>| {
                    let h = h1.clone();
                    async move {
                        h.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "output": [
                                { "type": "web_search_call",
                                  "action": { "type": "search", "queries": ["capital of France"] } },
                                { "type": "message", "content": [
                                    { "type": "output_text", "text": "Paris.",
                                      "annotations": [
                                        { "type": "url_citation",
                                          "url": "https://en.wikipedia.org/wiki/Paris",
                                          "title": "Paris - Wikipedia" }
                                      ] }
                                ] }
                            ]
                        }))
                    }
                }),
            )
            .route(
                "/v2/search",
                post(move |Json(_body): Json<serde_json::Value>| {
                    let h = h2.clone();
                    async move {
                        h.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "success": true,
                            "data": { "web": [
                                { "markdown": "# Paris",
                                  "metadata": { "title": "Paris - Wikipedia",
                                                "sourceURL": "https://en.wikipedia.org/wiki/Paris" } },
                                { "markdown": "Capital: Paris",
                                  "metadata": { "title": "France Facts",
                                                "url": "https://example.com/france" } }
                            ] }
                        }))
                    }
                }),
            );
        let rt = tokio::runtime::Runtime::new().expect("rt");
        let addr = rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr: SocketAddr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.expect("axum serve");
            });
            addr
        });
        Self {
            _rt: rt,
            addr,
            hits,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `webask` pointed at this fixture, with keys configured and no inherited proxy/log env.
    fn webask(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_webask"));
        cmd.env(
            "WEBASK_OPENAI_ENDPOINT",
            format!("http://{}/v1/responses", self.addr),
        )
        .env(
            "WEBASK_FIRECRAWL_SEARCH_ENDPOINT",
            format!("http://{}/v2/search", self.addr),
        )
        .env("WEBASK_OPENAI_API_KEY", "sk-test")
        .env("WEBASK_FIRECRAWL_API_KEY", "fc-test")
        .env_remove("WEBASK_ENV_FILE")
        .env_remove("RUST_LOG");
        for k in PROXY_VARS {
            cmd.env_remove(k);
        }
        cmd
    }
}

#[test]
fn ask_direct_prints_two_blocks() {
    let fx = Fixture::start();
    fx.webask()
        .args(["ask", "--provider", "direct", "capital", "of", "France"])
        .assert()
        .success()
        .stdout(
            "TITLE: Paris - Wikipedia\n\
             URL: https://en.wikipedia.org/wiki/Paris\n\
             MARKDOWN: # Paris...\n\
             \n\
             TITLE: France Facts\n\
             URL: https://example.com/france\n\
             MARKDOWN: Capital: Paris...\n",
        );
    assert_eq!(fx.hits(), 1);
}

#[test]
fn ask_agentic_json_output_contract() {
    let fx = Fixture::start();
    let out = fx
        .webask()
        .args(["ask", "--output", "json", "capital of France"])
        .output()
        .expect("run webask ask");
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["kind"].as_str(), Some("ask"));
    assert_eq!(v["ok"].as_bool(), Some(true));
    assert_eq!(v["provider"].as_str(), Some("agentic"));
    assert_eq!(
        v["text"].as_str(),
        Some(
            "Answer:\nParis.\n\n\
             Sources:\n- Paris - Wikipedia: https://en.wikipedia.org/wiki/Paris\n\
             \nSearch Queries Used: capital of France\n"
        )
    );
    assert_eq!(v["result"]["provider"].as_str(), Some("agentic"));
    assert_eq!(v["result"]["search_queries"], json!(["capital of France"]));
    assert_eq!(fx.hits(), 1);
}

#[test]
fn ask_empty_query_warns_and_makes_no_call() {
    let fx = Fixture::start();
    for args in [vec!["ask"], vec!["ask", "--provider", "direct", "   "]] {
        fx.webask()
            .args(&args)
            .assert()
            .success()
            .stdout("")
            .stderr(predicate::str::contains(
                "Please enter a query before searching.",
            ));
    }
    assert_eq!(fx.hits(), 0);
}

#[test]
fn ask_missing_key_explains_and_logs_name_only() {
    let fx = Fixture::start();
    let out = fx
        .webask()
        .env_remove("WEBASK_OPENAI_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .args(["ask", "--output", "json", "anything"])
        .output()
        .expect("run webask ask");
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["ok"].as_bool(), Some(false));
    assert_eq!(v["failure"].as_str(), Some("missing_credential"));
    assert!(v["text"]
        .as_str()
        .unwrap_or("")
        .contains("API key not found"));
    assert_eq!(v["result"]["sources"], json!([]));
    assert_eq!(v["result"]["search_queries"], json!([]));

    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("OPENAI_API_KEY"), "stderr: {err}");
    assert_eq!(fx.hits(), 0);
}

#[test]
fn ask_rejects_unknown_provider() {
    let fx = Fixture::start();
    fx.webask()
        .args(["ask", "--provider", "bing", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider"));
    assert_eq!(fx.hits(), 0);
}

#[test]
fn shell_session_runs_one_call_per_query() {
    let fx = Fixture::start();
    fx.webask()
        .args(["shell"])
        .write_stdin("capital of France\n\n/provider direct\ncapital of France\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Results will appear here"))
        .stdout(predicate::str::contains(
            "Searching using OpenAI...\nResult:\nAnswer:\nParis.\n",
        ))
        .stdout(predicate::str::contains(
            "Warning: Please enter a query before searching.",
        ))
        .stdout(predicate::str::contains("provider: direct (Firecrawl)"))
        .stdout(predicate::str::contains(
            "Searching using Firecrawl...\nResult:\nTITLE: Paris - Wikipedia\n",
        ));
    assert_eq!(fx.hits(), 2);
}
