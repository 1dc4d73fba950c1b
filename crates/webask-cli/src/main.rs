use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webask_core::session::{Interaction, Session};
use webask_core::{ProviderSelection, SecretStore, FIRECRAWL_API_KEY, OPENAI_API_KEY};
use webask_local::{EnvSecrets, LayeredSecrets, MapSecrets, ProviderConfig};

mod shell;

#[derive(Parser, Debug)]
#[command(name = "webask")]
#[command(about = "Answer a question from live web search (OpenAI agentic search or Firecrawl)", long_about = None)]
struct Cli {
    /// Optional `KEY=VALUE` secrets file (process env still wins).
    #[arg(long, global = true, env = "WEBASK_ENV_FILE")]
    env_file: Option<PathBuf>,
    /// Increase log verbosity on stderr (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question and print the answer.
    Ask(AskCmd),
    /// Interactive shell: one question per line, `/provider` to switch backends.
    Shell(ShellCmd),
    /// Diagnose configuration (no secret values are printed).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct AskCmd {
    /// Search provider. Allowed: agentic (openai), direct (firecrawl)
    #[arg(long, short, default_value = "agentic")]
    provider: ProviderSelection,
    /// Model for the agentic provider (default: gpt-5, or WEBASK_OPENAI_MODEL).
    #[arg(long)]
    model: Option<String>,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
    /// The question (words are joined with spaces).
    query: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct ShellCmd {
    /// Initial search provider. Allowed: agentic (openai), direct (firecrawl)
    #[arg(long, short, default_value = "agentic")]
    provider: ProviderSelection,
    /// Model for the agentic provider (default: gpt-5, or WEBASK_OPENAI_MODEL).
    #[arg(long)]
    model: Option<String>,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,webask=info,webask_core=info,webask_local=info",
        _ => "warn,webask=debug,webask_core=debug,webask_local=debug",
    };
    // Stdout carries results only; all diagnostics go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn secret_store(env_file: Option<&Path>) -> Result<Arc<dyn SecretStore>> {
    let mut store = LayeredSecrets::new().push(EnvSecrets);
    if let Some(p) = env_file {
        store = store.push(MapSecrets::from_env_file(p)?);
    }
    Ok(Arc::new(store))
}

fn session(
    secrets: Arc<dyn SecretStore>,
    model: Option<String>,
    selection: ProviderSelection,
) -> Result<Session> {
    let mut cfg = ProviderConfig::from_env();
    if let Some(m) = model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
        cfg.openai_model = m;
    }
    let client = webask_local::http_client()?;
    Ok(Session::new(
        webask_local::providers(client, secrets, &cfg)?,
        selection,
    ))
}

fn configured(store: &dyn SecretStore, name: &str) -> bool {
    store.get(name).is_some_and(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ask(args) => {
            let secrets = secret_store(cli.env_file.as_deref())?;
            let mut session = session(secrets, args.model, args.provider)?;
            let query = args.query.join(" ");
            match session.submit(&query).await {
                Interaction::Warning(w) => {
                    eprintln!("Warning: {w}");
                }
                Interaction::Displayed {
                    provider,
                    text,
                    output,
                } => match args.output.to_ascii_lowercase().as_str() {
                    "json" => {
                        let failure = output.failure();
                        let v = serde_json::json!({
                            "schema_version": 1,
                            "kind": "ask",
                            "ok": failure.is_none(),
                            "provider": provider.as_str(),
                            "query": query,
                            "text": text,
                            "failure": failure,
                            "result": output,
                        });
                        println!("{v}");
                    }
                    _ => println!("{text}"),
                },
            }
        }
        Commands::Shell(args) => {
            let secrets = secret_store(cli.env_file.as_deref())?;
            let mut session = session(secrets, args.model, args.provider)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell::run(&mut session, stdin, &mut stdout).await?;
        }
        Commands::Doctor(args) => {
            let t0 = std::time::Instant::now();
            let secrets = secret_store(cli.env_file.as_deref())?;
            let cfg = ProviderConfig::from_env();

            // Booleans only; never print values.
            let openai = configured(secrets.as_ref(), OPENAI_API_KEY);
            let firecrawl = configured(secrets.as_ref(), FIRECRAWL_API_KEY);

            let mut hints: Vec<&str> = Vec::new();
            if !openai {
                hints.push(
                    "Set OPENAI_API_KEY (or WEBASK_OPENAI_API_KEY) to use --provider agentic.",
                );
            }
            if !firecrawl {
                hints.push(
                    "Set FIRECRAWL_API_KEY (or WEBASK_FIRECRAWL_API_KEY) to use --provider direct.",
                );
            }

            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "ok": openai || firecrawl,
                "name": "webask",
                "version": env!("CARGO_PKG_VERSION"),
                "default_provider": ProviderSelection::default().as_str(),
                "configured": {
                    "credentials": {
                        "openai": openai,
                        "firecrawl": firecrawl,
                    },
                    "env_file": cli.env_file.as_ref().map(|p| p.display().to_string()),
                    "openai_endpoint": cfg.openai_endpoint,
                    "openai_model": cfg.openai_model,
                    "firecrawl_search_endpoint": cfg.firecrawl_search_endpoint,
                },
                "hints": hints,
                "elapsed_ms": t0.elapsed().as_millis() as u64,
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("webask {}", env!("CARGO_PKG_VERSION"));
                    println!("credentials:");
                    println!("  openai: {}", if openai { "configured" } else { "missing" });
                    println!(
                        "  firecrawl: {}",
                        if firecrawl { "configured" } else { "missing" }
                    );
                    println!("openai_model: {}", cfg.openai_model);
                    for h in &hints {
                        println!("hint: {h}");
                    }
                }
                _ => println!("{v}"),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "webask",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("webask {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{v}"),
            }
        }
    }

    Ok(())
}
