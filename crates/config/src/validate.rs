//! Semantic checks on a loaded configuration.
//!
//! Deserialization already rejects malformed values; this catches settings
//! that parse fine but cannot work or are likely mistakes.

use crate::schema::UpdraftConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "polling.limit"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

pub fn validate_config(config: &UpdraftConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match config.telegram_token() {
        None => result.push(
            Severity::Error,
            "telegram.token",
            "bot token is missing (set it in the config, TELEGRAM_BOT_TOKEN or --token)",
        ),
        Some(token) if token.starts_with("${") => result.push(
            Severity::Error,
            "telegram.token",
            "token still contains an unresolved ${...} placeholder",
        ),
        Some(_) => {},
    }

    if let Err(e) = config.polling.validate() {
        result.push(Severity::Error, "polling", e.to_string());
    }

    if config.polling.timeout_secs == 0 {
        result.push(
            Severity::Warning,
            "polling.timeout_secs",
            "0 disables long polling; every fetch returns immediately",
        );
    }

    if config.polling.in_flight_limit().is_none() {
        result.push(
            Severity::Warning,
            "polling.max_in_flight",
            "handler concurrency is unbounded",
        );
    }

    if config.polling.initial_offset > 0 {
        result.push(
            Severity::Info,
            "polling.initial_offset",
            format!(
                "updates below id {} will be skipped",
                config.polling.initial_offset
            ),
        );
    }

    result
}
