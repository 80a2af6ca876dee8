//! Общие аргументы командной строки

use clap::Args;
use std::path::PathBuf;

/// Флаги, общие для всех подкоманд
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors and hide the spinner
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CommonArgs {
    /// Уровень логирования по флагам
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    pub fn should_print(&self) -> bool {
        !self.quiet
    }
}

/// Проект и его конфигурация
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Katalon project root
    pub path: PathBuf,

    /// Analyzer config (TOML or YAML); defaults to katalon-analyzer.toml in the project
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    pub threads: Option<usize>,
}

/// Куда и как писать результат
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(long)]
    pub pretty: bool,
}
