//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    sources: CheckResult,
    token: CheckResult,
    state: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        sources: CheckResult::error("Not checked"),
        token: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.sources = check_sources(config);
        report.token = check_token(config);
        report.state = check_state(config);
    }

    // Determine overall status
    let checks = [&report.config, &report.sources, &report.token, &report.state];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_sources(config: &AppConfig) -> CheckResult {
    if config.watch.from_subscriptions {
        return CheckResult::ok(format!(
            "Sources from subscriptions, {} exclusion(s)",
            config.watch.exclude_sources.len()
        ));
    }

    if config.watch.sources.is_empty() {
        return CheckResult::error(
            "No sources configured; set [watch] sources or from_subscriptions = true",
        );
    }

    if let Some(bad) = config
        .watch
        .sources
        .iter()
        .find(|s| s.parse::<i64>().is_err())
    {
        return CheckResult::error(format!("Source is not a numeric owner id: {}", bad));
    }

    CheckResult::ok(format!(
        "Explicit sources: {}",
        config.watch.sources.join(", ")
    ))
}

fn check_token(config: &AppConfig) -> CheckResult {
    let env_var = &config.vk.access_token_env;

    if env_var.is_empty() {
        return CheckResult::error("No access token env var configured");
    }

    match std::env::var(env_var) {
        Ok(val) if !val.is_empty() => {
            CheckResult::ok(format!("Access token: {} (set)", env_var))
        }
        _ => CheckResult::warn(format!("Access token: {} (not set)", env_var)),
    }
}

fn check_state(config: &AppConfig) -> CheckResult {
    let path = &config.general.state_db_path;

    if path.exists() {
        return CheckResult::ok(format!("State database: {}", path.display()));
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            CheckResult::warn(format!(
                "State database parent directory will be created: {}",
                parent.display()
            ))
        }
        _ => CheckResult::ok(format!(
            "State database will be created: {}",
            path.display()
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("vk-wall-watch Doctor Report");
    println!("===========================");
    println!();

    print_check("Config", &report.config);
    print_check("Sources", &report.sources);
    print_check("Access Token", &report.token);
    print_check("State", &report.state);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: vk-wall-watch run --once --json");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
