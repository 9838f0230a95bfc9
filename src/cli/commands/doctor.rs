//! Doctor command - verify external programs and configuration.

use crate::cli::preflight::check_program;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::FilewrightError;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks. Returns `false` when any check failed.
pub fn run_doctor(config_path: &Path, settings: &Settings) -> anyhow::Result<bool> {
    Output::header("Filewright Doctor");
    println!();
    println!("Checking external programs and configuration...\n");

    let mut checks = Vec::new();

    // Missing programs only disable the tools that need them.
    println!("{}", style("External Programs").bold());
    let programs = &settings.programs;
    let program_checks = [
        check_external("ffmpeg", &programs.ffmpeg, "audio and video conversion", install_hint_ffmpeg()),
        check_external("docling", &programs.docling, "document conversion", "Install with: pip install docling"),
        check_external("qpdf", &programs.qpdf, "PDF password protection", install_hint_qpdf()),
    ];
    for check in &program_checks {
        check.print();
    }
    checks.extend(program_checks);

    println!();

    println!("{}", style("API Configuration").bold());
    let api_check = check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref());
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = [check_config_file(config_path), check_working_dir(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running agents.",
            errors
        ));
        return Ok(false);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Filewright is ready to use.");
    }

    Ok(true)
}

/// Check an external program the tools delegate to.
fn check_external(name: &str, program: &str, purpose: &str, hint: &str) -> CheckResult {
    match check_program(program) {
        Ok(version) => {
            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };
            CheckResult::ok(name, &version_display)
        }
        Err(FilewrightError::ToolNotFound(detail)) if detail == program => {
            CheckResult::warning(name, &format!("not found (needed for {})", purpose), hint)
        }
        Err(e) => CheckResult::warning(name, &e.to_string(), hint),
    }
}

/// Check if the OpenAI API key is configured.
fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check if the config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override models, limits or programs", config_path.display()),
        )
    }
}

/// Check the configured working directory.
fn check_working_dir(settings: &Settings) -> CheckResult {
    match settings.working_dir() {
        None => CheckResult::ok("Working directory", "current directory"),
        Some(dir) if dir.is_dir() => CheckResult::ok("Working directory", &format!("{}", dir.display())),
        Some(dir) => CheckResult::error(
            "Working directory",
            &format!("{} does not exist", dir.display()),
            "Fix general.working_dir in the config file",
        ),
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

/// Platform-specific install hint for qpdf.
fn install_hint_qpdf() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install qpdf"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install qpdf (or your package manager)"
    } else {
        "Install from: https://qpdf.sourceforge.io"
    }
}
