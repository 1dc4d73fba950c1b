//! Interaction state machine behind every user-facing surface.
//!
//! `Idle -> AwaitingResult -> Displayed`. A submit borrows the session mutably for
//! the whole provider call, so there is never more than one request in flight.

use std::sync::Arc;

use crate::normalize;
use crate::{AnswerProvider, Error, ProviderOutput, ProviderSelection, Query, Result};

pub const EMPTY_QUERY_WARNING: &str = "Please enter a query before searching.";
pub const IDLE_PLACEHOLDER: &str =
    "Results will appear here after you enter a query and run a search...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResult,
    Displayed,
}

/// What the surface should show after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// No provider was called.
    Warning(&'static str),
    Displayed {
        provider: ProviderSelection,
        text: String,
        output: ProviderOutput,
    },
}

/// One backend per selection; each slot must report the selection it serves.
#[derive(Clone)]
pub struct Providers {
    agentic: Arc<dyn AnswerProvider>,
    direct: Arc<dyn AnswerProvider>,
}

impl Providers {
    pub fn new(agentic: Arc<dyn AnswerProvider>, direct: Arc<dyn AnswerProvider>) -> Result<Self> {
        for (slot, p) in [
            (ProviderSelection::AgenticSearch, &agentic),
            (ProviderSelection::DirectSearch, &direct),
        ] {
            if p.selection() != slot {
                return Err(Error::InvalidInput(format!(
                    "{} provider registered in the {slot} slot",
                    p.selection()
                )));
            }
        }
        Ok(Self { agentic, direct })
    }

    pub fn get(&self, sel: ProviderSelection) -> &dyn AnswerProvider {
        match sel {
            ProviderSelection::AgenticSearch => self.agentic.as_ref(),
            ProviderSelection::DirectSearch => self.direct.as_ref(),
        }
    }
}

pub struct Session {
    providers: Providers,
    selection: ProviderSelection,
    state: SessionState,
    last_text: Option<String>,
}

impl Session {
    pub fn new(providers: Providers, selection: ProviderSelection) -> Self {
        Self {
            providers,
            selection,
            state: SessionState::Idle,
            last_text: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> ProviderSelection {
        self.selection
    }

    pub fn select(&mut self, sel: ProviderSelection) {
        self.selection = sel;
    }

    /// Text currently in the output area (placeholder until the first result).
    pub fn display(&self) -> &str {
        self.last_text.as_deref().unwrap_or(IDLE_PLACEHOLDER)
    }

    /// Handles one user trigger.
    ///
    /// An empty query surfaces a warning and leaves the state untouched.
    pub async fn submit(&mut self, raw: &str) -> Interaction {
        let Ok(query) = Query::new(raw) else {
            tracing::debug!("empty query; no provider call");
            return Interaction::Warning(EMPTY_QUERY_WARNING);
        };

        let sel = self.selection;
        self.state = SessionState::AwaitingResult;
        tracing::debug!(provider = %sel, "searching using {}", sel.label());
        let output = self.providers.get(sel).answer(&query).await;
        let text = normalize::render(&output);

        self.last_text = Some(text.clone());
        self.state = SessionState::Displayed;
        Interaction::Displayed {
            provider: sel,
            text,
            output,
        }
    }
}
