use colored::Colorize;

use crate::core::models::ValidationState;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Print the startup banner
    pub fn print_banner() {
        println!("{}", "=".repeat(70).bright_cyan());
        println!(
            "{}",
            "  Keyhound - AI Credential Leak Scanner".bright_cyan().bold()
        );
        println!("{}", "=".repeat(70).bright_cyan());
        println!();
    }

    pub fn print_ethical_warning() {
        println!("{}", "ETHICAL USE ONLY".yellow().bold());
        println!("Probe only credentials you are authorized to test.");
        println!("Report confirmed leaks to their owners for rotation.");
        println!();
    }

    pub fn print_info(message: &str) {
        println!("{} {}", "i".bright_blue(), message);
    }

    pub fn print_success(message: &str) {
        println!("{} {}", "+".bright_green(), message);
    }

    pub fn print_warning(message: &str) {
        println!("{} {}", "!".yellow(), message);
    }

    pub fn print_error(message: &str) {
        eprintln!("{} {}", "x".bright_red().bold(), message);
    }

    /// Print the outcome of a single-key probe.
    pub fn print_probe_outcome(state: &ValidationState) {
        match state {
            ValidationState::Valid(outcome) => {
                println!("    {} LIVE: {}", "+".bright_green().bold(), outcome.message);
                for (key, value) in &outcome.metadata {
                    println!("      {}: {}", key.bright_cyan(), value.bright_white());
                }
            }
            ValidationState::Invalid(outcome) => {
                println!("    {} invalid: {}", "x".bright_black(), outcome.message);
            }
            other => {
                let message = other
                    .outcome()
                    .map(|o| o.message.clone())
                    .unwrap_or_default();
                println!("    {} {}: {}", "!".yellow(), other.label(), message);
            }
        }
    }
}
