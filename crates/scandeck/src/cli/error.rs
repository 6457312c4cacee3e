//! Helpful error types for CLI commands
//!
//! Every error says what went wrong, what was happening and how to get
//! past it.

use std::fmt;
use std::time::Duration;

/// An error with context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    // === Common error constructors ===

    /// The engine never reached Ready
    pub fn scanner_unavailable(retries: u32, last_error: Option<&str>) -> Self {
        let mut context = format!("Gave up after {} retr{}", retries, plural_y(retries));
        if let Some(last) = last_error {
            context.push_str(&format!("; last error: {}", last));
        }
        Self::new("Scanner did not come up")
            .with_context(context)
            .with_suggestion("TRY: Raise the retry budget: scandeck demo --retry-limit 5")
            .with_suggestion("TRY: Lower the injected faults: --fail-initialize / --fail-enable")
    }

    /// An expected state change did not arrive in time
    pub fn session_stalled(waiting_for: &str, waited: Duration) -> Self {
        Self::new(format!("Session did not reach {}", waiting_for))
            .with_context(format!("Waited {} ms", waited.as_millis()))
            .with_suggestion("TRY: Re-run with -v to see coordinator logs")
    }
}

fn plural_y(n: u32) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
