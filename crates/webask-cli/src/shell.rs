//! Line-oriented interactive shell over a `Session`.
//!
//! Each line is one trigger. The loop awaits the provider call before reading
//! the next line, so input typed meanwhile simply waits in the pipe.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use webask_core::session::{Interaction, Session};
use webask_core::ProviderSelection;

const HELP: &str = "\
Type a question and press Enter to search.
Commands:
  /provider [agentic|direct]  show or switch the search provider
  /help                       show this help
  /quit                       exit
Any other line, including one starting with '/', is searched as typed.";

fn provider_line(sel: ProviderSelection) -> String {
    format!("provider: {} ({})", sel, sel.label())
}

pub async fn run<R, W>(session: &mut Session, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "webask {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "{}", provider_line(session.selection()))?;
    writeln!(out, "{}", session.display())?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        let mut words = trimmed.split_whitespace();
        let head = words.next().unwrap_or("");
        let arg = words.next();
        let handled = match head {
            "/quit" | "/exit" | "/q" => break,
            "/help" | "/h" => {
                writeln!(out, "{HELP}")?;
                true
            }
            "/provider" | "/p" => {
                match arg.map(str::parse::<ProviderSelection>) {
                    None => writeln!(out, "{}", provider_line(session.selection()))?,
                    Some(Ok(sel)) => {
                        tracing::info!(provider = %sel, "provider switched");
                        session.select(sel);
                        writeln!(out, "{}", provider_line(sel))?;
                    }
                    Some(Err(e)) => writeln!(out, "Warning: {e}")?,
                }
                true
            }
            // Any other line, slash-prefixed or not, is a query.
            _ => false,
        };
        if handled {
            out.flush()?;
            continue;
        }

        if !trimmed.is_empty() {
            writeln!(out, "Searching using {}...", session.selection().label())?;
            out.flush()?;
        }
        match session.submit(&line).await {
            Interaction::Warning(w) => writeln!(out, "Warning: {w}")?,
            Interaction::Displayed { text, .. } => {
                writeln!(out, "Result:")?;
                writeln!(out, "{text}")?;
            }
        }
        out.flush()?;
    }
    Ok(())
}
