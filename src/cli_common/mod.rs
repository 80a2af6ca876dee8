//! Общее для бинарника `katalon-analyzer`: логирование в stderr,
//! цветные сообщения, аргументы, вывод и спиннер.

use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::core::ParseError;

pub mod args;
pub mod output;
pub mod progress;

pub use args::{CommonArgs, OutputArgs, ProjectArgs};
pub use output::{OutputFormat, OutputWriter};
pub use progress::Spinner;

/// Ошибки разбора, печатаемые без `--verbose`
pub const MAX_PRINTED_PARSE_ERRORS: usize = 20;

/// Логи идут в stderr, stdout остается за отчетом.
/// `RUST_LOG` дополняет уровень из флагов (`RUST_LOG=katalon_analyzer::parser=trace`).
pub fn init_logging(level: tracing::Level) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Logger already set up: {}", e))
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", "✔".green().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✘".red().bold(), message.red());
}

/// Файлы, пропущенные анализом; без `verbose` не больше
/// [`MAX_PRINTED_PARSE_ERRORS`] строк
pub fn print_parse_errors(errors: &[ParseError], verbose: bool) {
    if errors.is_empty() {
        return;
    }

    print_warning(&format!("{} files skipped:", errors.len()));
    for error in skipped_lines(errors, verbose) {
        eprintln!("    {}", error);
    }
}

fn skipped_lines(errors: &[ParseError], verbose: bool) -> Vec<String> {
    let limit = if verbose {
        errors.len()
    } else {
        MAX_PRINTED_PARSE_ERRORS
    };

    let mut lines: Vec<String> = errors.iter().take(limit).map(ToString::to_string).collect();
    if errors.len() > limit {
        lines.push(format!(
            "... and {} more (--verbose lists all)",
            errors.len() - limit
        ));
    }
    lines
}
