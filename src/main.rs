use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use keyhound::cli::{Cli, Commands, OutputFormatter};
use keyhound::core::models::{Candidate, ValidationState};
use keyhound::core::{Config, Orchestrator};
use keyhound::reporters::{get_reporter, ReportFormat};
use keyhound::validator::ValidationClient;
use keyhound::{registry, Result};

/// Exit codes: 0 no findings, 1 findings present, 2 operational error.
const EXIT_CLEAN: i32 = 0;
const EXIT_FINDINGS: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    // Load .env file if it exists
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .init();

    OutputFormatter::print_banner();

    let code = match execute_command(cli).await {
        Ok(code) => code,
        Err(e) => {
            OutputFormatter::print_error(&format!("Error: {}", e));
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

async fn execute_command(cli: Cli) -> Result<i32> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            targets,
            validate,
            format,
            output,
            providers,
            context_lines,
        } => {
            if validate {
                config.validator.enabled = true;
            }
            if let Some(providers) = providers {
                config.scanner.provider_filter =
                    Some(providers.split(',').map(|p| p.trim().to_string()).collect());
            }
            if let Some(context_lines) = context_lines {
                config.scanner.context_lines = context_lines;
            }
            scan_command(config, targets, format.parse()?, output).await
        }
        Commands::TestKey { provider, key } => test_key_command(config, provider, key).await,
        Commands::List => list_command(),
    }
}

async fn scan_command(
    config: Config,
    targets: Vec<String>,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<i32> {
    if config.validator.enabled {
        OutputFormatter::print_ethical_warning();
    }

    if let Some(filter) = &config.scanner.provider_filter {
        for name in filter {
            if !registry().contains(name) {
                OutputFormatter::print_warning(&format!(
                    "Unknown provider in filter, ignoring: {}",
                    name
                ));
            }
        }
    }

    // Ctrl-C cancels the session; partial results are still reported.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Scanning {} target(s)...", targets.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let redaction = config.redaction.clone();
    let orchestrator = Orchestrator::new(config).with_cancellation(cancel);
    let session = orchestrator.run_session(&targets).await;

    spinner.finish_and_clear();

    let report = get_reporter(format, &redaction).generate(&session)?;
    match output {
        Some(path) => {
            fs::write(&path, report)?;
            OutputFormatter::print_success(&format!("Report written to {}", path.display()));
        }
        None => println!("{}", report),
    }

    let operational_failure = session
        .results
        .iter()
        .any(|r| r.files_scanned == 0 && !r.errors.is_empty());

    if operational_failure {
        Ok(EXIT_ERROR)
    } else if session.total_candidates() > 0 {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(EXIT_CLEAN)
    }
}

async fn test_key_command(config: Config, provider: String, key: String) -> Result<i32> {
    OutputFormatter::print_ethical_warning();

    if !registry().contains(&provider) {
        OutputFormatter::print_error(&format!(
            "Unknown provider: {} (see `keyhound list`)",
            provider
        ));
        return Ok(EXIT_ERROR);
    }

    OutputFormatter::print_info(&format!("Probing {} key...", provider.bright_yellow()));

    let column_end = key.chars().count() + 1;
    let entropy = keyhound::utils::shannon_entropy(&key);
    let candidate = Candidate {
        id: Uuid::new_v4(),
        provider,
        pattern_name: "manual".to_string(),
        secret_value: key,
        file_path: "<cli>".to_string(),
        line_number: 1,
        column_start: 1,
        column_end,
        line_content: String::new(),
        context_before: String::new(),
        context_after: String::new(),
        variable_name: None,
        entropy,
        validation: ValidationState::NotAttempted,
        validated_at: None,
    };

    let client = ValidationClient::new(&config.validator);
    let candidate = client.validate_one(candidate).await;
    OutputFormatter::print_probe_outcome(&candidate.validation);

    Ok(if candidate.validation.is_valid() {
        EXIT_FINDINGS
    } else {
        EXIT_CLEAN
    })
}

fn list_command() -> Result<i32> {
    println!("{}", "Registered providers:".bright_cyan().bold());
    for provider in registry().all() {
        println!(
            "  {} {} ({})",
            "-".bright_yellow(),
            provider.name().bright_white(),
            provider.display_name()
        );
        for pattern in provider.patterns() {
            println!("      pattern: {}", pattern.name);
        }
        println!("      probe:   {}", provider.validation_endpoint());
    }
    Ok(EXIT_CLEAN)
}
