//! Per-run context shared by pipeline stages
//!
//! Every stage logs inside the run's span, so concurrent runs in one process
//! (tests, library callers) keep their log lines apart without any global
//! logging state.

use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::Span;

/// Context scoped to a single pipeline run
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    span: Span,
    show_progress: bool,
}

impl RunContext {
    /// Start a new run, opening its tracing span
    pub fn new(show_progress: bool) -> Self {
        let started_at = Utc::now();
        let run_id = started_at.format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let span = tracing::info_span!("run", run_id = %run_id);

        Self {
            run_id,
            started_at,
            started: Instant::now(),
            span,
            show_progress,
        }
    }

    /// Context for tests and library callers that want no progress bars
    pub fn quiet() -> Self {
        Self::new(false)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Span that scopes all logging for this run
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}
