//! `updraft check`: config validation and token verification.
//!
//! Prints one section per check with `[ok]`, `[warn]`, `[fail]`, `[skip]` or
//! `[info]` per item, then a summary. Exits non-zero if any item failed.

use {
    anyhow::Result,
    updraft_config::{Severity, UpdraftConfig, validate_config},
    updraft_telegram::TelegramSource,
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Skip => DIM,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct Section {
    title: String,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }

    fn has_failures(&self) -> bool {
        self.items.iter().any(|(status, _)| *status == Status::Fail)
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for (status, message) in &section.items {
            let color = status.color();
            let label = status.label();
            eprintln!("  [{color}{label}{RESET}]  {message}");
            match status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

pub async fn handle_check(config: &UpdraftConfig) -> Result<()> {
    eprintln!("{BOLD}updraft check{RESET}");
    eprintln!("{BOLD}============={RESET}\n");

    let mut sections = vec![check_config(config)];
    let token = if sections[0].has_failures() {
        let mut section = Section::new("Bot API");
        section.push(Status::Skip, "config has errors, not contacting the Bot API");
        section
    } else {
        check_token(config).await
    };
    sections.push(token);

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        anyhow::bail!("check failed with {errors} error(s)");
    }
    Ok(())
}

fn check_config(config: &UpdraftConfig) -> Section {
    let label = updraft_config::find_config_file()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    let mut section = Section::new(format!("Config ({label})"));

    let result = validate_config(config);
    for d in &result.diagnostics {
        section.push(d.severity.into(), format!("{}: {}", d.path, d.message));
    }
    if result.diagnostics.is_empty() {
        section.push(Status::Ok, "no issues found");
    }

    section
}

async fn check_token(config: &UpdraftConfig) -> Section {
    let mut section = Section::new("Bot API");

    let source = crate::telegram_account(config)
        .and_then(|account| Ok(TelegramSource::new(&account, config.polling.timeout_secs)?));
    let source = match source {
        Ok(source) => source,
        Err(e) => {
            section.push(Status::Fail, format!("{e:#}"));
            return section;
        },
    };

    match source.get_me().await {
        Ok(me) => section.push(
            Status::Ok,
            format!("token accepted, bot is @{}", me.username()),
        ),
        Err(e) => section.push(Status::Fail, format!("getMe failed: {e}")),
    }

    section
}
