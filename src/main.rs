/*!
# Katalon Analyzer CLI

Command-line interface for the Katalon project analyzer.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;

use katalon_analyzer::cli_common::{
    self, CommonArgs, OutputArgs, OutputFormat, OutputWriter, ProjectArgs, Spinner,
};
use katalon_analyzer::{
    AnalyzerConfig, ArtifactKind, ProjectAnalysis, ProjectAnalyzer, ReportFormat, TextReporter,
};

#[derive(Parser)]
#[command(
    name = "katalon-analyzer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Cross-reference analyzer for Katalon Studio test projects"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and print the statistics report
    Analyze {
        #[command(flatten)]
        project: ProjectArgs,

        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Length of most-used rankings
        #[arg(long)]
        top: Option<usize>,

        /// Skip per-folder counts and unused lists
        #[arg(long)]
        brief: bool,
    },

    /// Search entities of one kind by name or description
    Search {
        #[command(flatten)]
        project: ProjectArgs,

        /// Entity kind (test-case, test-suite, keyword-file, keyword, object, profile, script)
        #[arg(short, long)]
        kind: String,

        /// Case-insensitive substring to look for
        query: String,

        /// Output format (text, table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List all entities of one kind
    List {
        #[command(flatten)]
        project: ProjectArgs,

        /// Entity kind (test-case, test-suite, keyword-file, keyword, object, profile, script)
        #[arg(short, long)]
        kind: String,

        /// Output format (text, table, csv, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show unused keywords, test objects and test cases not in any suite
    Unused {
        #[command(flatten)]
        project: ProjectArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Export every entity, usage and statistics as JSON
    Export {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        cli_common::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    cli_common::init_logging(cli.common.log_level())?;

    match cli.command {
        Commands::Analyze {
            project,
            format,
            output,
            top,
            brief,
        } => analyze_command(&cli.common, &project, &format, output, top, brief),
        Commands::Search {
            project,
            kind,
            query,
            format,
        } => search_command(&cli.common, &project, &kind, &query, &format),
        Commands::List {
            project,
            kind,
            format,
        } => list_command(&cli.common, &project, &kind, &format),
        Commands::Unused { project, format } => unused_command(&cli.common, &project, &format),
        Commands::Export { project, output } => export_command(&cli.common, &project, &output),
    }
}

/// Конфигурация: `--config`, иначе katalon-analyzer.toml в корне проекта
fn load_config(project: &ProjectArgs, top: Option<usize>) -> Result<AnalyzerConfig> {
    let mut config = match &project.config {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyzerConfig::discover(&project.path)?,
    };

    if let Some(threads) = project.threads {
        config.threads = threads;
    }
    if let Some(top) = top {
        config.top_n = top;
    }
    Ok(config)
}

fn run_analysis(
    common: &CommonArgs,
    project: &ProjectArgs,
    top: Option<usize>,
) -> Result<ProjectAnalysis> {
    let analyzer = ProjectAnalyzer::new(load_config(project, top)?)?;

    let spinner = Spinner::new(common.should_print())?;
    spinner.set_message(format!("Analyzing {}...", project.path.display()));

    let started = Instant::now();
    let analysis = analyzer
        .analyze(&project.path)
        .with_context(|| format!("Failed to analyze {}", project.path.display()))?;
    spinner.finish();

    let model = analysis.model();
    tracing::debug!(
        "Parsed {} files in {:.2?}",
        ArtifactKind::MAPPED
            .iter()
            .map(|kind| model.file_count(*kind))
            .sum::<usize>(),
        started.elapsed()
    );

    if common.should_print() {
        cli_common::print_parse_errors(analysis.parse_errors(), common.verbose);
    }
    Ok(analysis)
}

fn analyze_command(
    common: &CommonArgs,
    project: &ProjectArgs,
    format: &str,
    output: Option<PathBuf>,
    top: Option<usize>,
    brief: bool,
) -> Result<()> {
    let format: ReportFormat = format.parse()?;
    let analysis = run_analysis(common, project, top)?;
    let snapshot = analysis.get_statistics();

    let report = match format {
        ReportFormat::Text => {
            let reporter = if output.is_some() {
                TextReporter::with_config(false, !brief)
            } else if brief {
                TextReporter::brief()
            } else {
                TextReporter::new()
            };
            reporter.render(snapshot)
        }
        ReportFormat::Json => serde_json::to_string_pretty(snapshot)?,
    };

    let mut writer = OutputWriter::create(output.as_deref(), OutputFormat::Text)?;
    writer.write_line(&report)?;
    writer.flush()?;

    if let Some(path) = output {
        if common.should_print() {
            cli_common::print_success(&format!("Report written to {}", path.display()));
        }
    }
    Ok(())
}

fn search_command(
    common: &CommonArgs,
    project: &ProjectArgs,
    kind: &str,
    query: &str,
    format: &str,
) -> Result<()> {
    let kind: ArtifactKind = kind.parse()?;
    let format: OutputFormat = format.parse()?;
    let analysis = run_analysis(common, project, None)?;
    let matches = analysis.search(kind, query)?;

    let mut writer = OutputWriter::stdout(format);
    if format == OutputFormat::Json {
        writer = writer.with_pretty(true);
        writer.write_json(&matches)?;
    } else if matches.is_empty() {
        if common.should_print() {
            cli_common::print_warning(&format!("No {} matches '{}'", kind, query));
        }
    } else {
        let rows: Vec<Vec<String>> = matches
            .iter()
            .map(|found| {
                vec![
                    found.key.clone(),
                    found.name.clone(),
                    found.matched_fields.join(" "),
                ]
            })
            .collect();
        writer.write_table(&["key", "name", "matched"], &rows)?;
    }
    writer.flush()
}

fn list_command(common: &CommonArgs, project: &ProjectArgs, kind: &str, format: &str) -> Result<()> {
    let kind: ArtifactKind = kind.parse()?;
    let format: OutputFormat = format.parse()?;
    let analysis = run_analysis(common, project, None)?;
    let entities = analysis.get_entities(kind);

    let mut writer = OutputWriter::stdout(format);
    match format {
        OutputFormat::Json => {
            writer = writer.with_pretty(true);
            writer.write_json(&entities)?;
        }
        OutputFormat::Text => {
            writer.write_header(&format!("{} ({})", kind, entities.len()))?;
            for (key, name) in entities.names() {
                writer.write_list_item(&format!("{}  {}", name, key))?;
            }
        }
        OutputFormat::Table | OutputFormat::Csv => {
            let rows: Vec<Vec<String>> = entities
                .names()
                .into_iter()
                .map(|(key, name)| vec![key, name])
                .collect();
            writer.write_table(&["key", "name"], &rows)?;
        }
    }
    writer.flush()
}

fn unused_command(common: &CommonArgs, project: &ProjectArgs, format: &str) -> Result<()> {
    let format: ReportFormat = format.parse()?;
    let analysis = run_analysis(common, project, None)?;
    let snapshot = analysis.get_statistics();

    let sections: [(&str, &[String]); 3] = [
        ("Unused keywords", snapshot.keyword_usage.unused_names.as_slice()),
        ("Unused test objects", snapshot.object_usage.unused_names.as_slice()),
        (
            "Test cases not in any suite",
            snapshot.test_case_coverage.unused_test_cases.as_slice(),
        ),
    ];

    match format {
        ReportFormat::Json => {
            let mut writer = OutputWriter::stdout(OutputFormat::Json).with_pretty(true);
            writer.write_json(&json!({
                "keywords": sections[0].1,
                "objects": sections[1].1,
                "test_cases": sections[2].1,
            }))?;
            writer.flush()
        }
        ReportFormat::Text => {
            let mut writer = OutputWriter::stdout(OutputFormat::Text);
            for (title, names) in sections {
                writer.write_header(&format!("{} ({})", title, names.len()))?;
                for name in names {
                    writer.write_list_item(name)?;
                }
            }
            writer.flush()
        }
    }
}

fn export_command(common: &CommonArgs, project: &ProjectArgs, output: &OutputArgs) -> Result<()> {
    let analysis = run_analysis(common, project, None)?;
    let document = analysis.export()?;

    let mut writer = OutputWriter::create(output.output.as_deref(), OutputFormat::Json)?
        .with_pretty(output.pretty);
    writer.write_json(&document)?;
    writer.flush()?;

    if let Some(path) = &output.output {
        if common.should_print() {
            cli_common::print_success(&format!("Export written to {}", path.display()));
        }
    }
    Ok(())
}
