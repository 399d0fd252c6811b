// PacketSleuth - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (platform default or --config)
// 3. Logging initialisation (debug mode support)
// 4. One pipeline run, results to stdout, summary to stderr

use clap::Parser;
use packetsleuth::app::pipeline::{self, PipelineConfig};
use packetsleuth::core::export::{self, OutputFormat};
use packetsleuth::core::filter::{CriteriaInput, FilterCriteria};
use packetsleuth::core::model::RunReport;
use packetsleuth::platform::config::{self, PlatformPaths};
use packetsleuth::util::constants;
use packetsleuth::util::error::PacketError;
use packetsleuth::util::logging;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

/// PacketSleuth - pull log records out of a Mattermost support packet.
///
/// Every log file in the packet is scanned and the lines matching all given
/// criteria are printed in archive order.
#[derive(Parser, Debug)]
#[command(name = "packetsleuth", version, about)]
struct Cli {
    /// Support packet (ZIP archive) to search.
    packet: PathBuf,

    /// Literal, case-sensitive text the line must contain.
    #[arg(short = 's', long)]
    search: Option<String>,

    /// Regular expression the line must match.
    #[arg(short = 'r', long)]
    regex: Option<String>,

    /// Exact level token (e.g. ERROR, info).
    #[arg(short = 'l', long)]
    level: Option<String>,

    /// Exact user token.
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Earliest timestamp to include (RFC 3339, "YYYY-MM-DD HH:MM:SS" or a date).
    #[arg(long)]
    start: Option<String>,

    /// Latest timestamp to include.
    #[arg(long)]
    end: Option<String>,

    /// Output format: text, json or csv. Overrides config.toml.
    #[arg(short = 'f', long)]
    format: Option<OutputFormat>,

    /// Config file to use instead of the platform default.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut startup_warnings = Vec::new();
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => {
            let (paths, warning) = PlatformPaths::resolve();
            startup_warnings.extend(warning);
            paths.config_file()
        }
    };
    let (app_config, config_warnings) = config::load_config(&config_path);
    startup_warnings.extend(config_warnings);

    logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        config = %config_path.display(),
        "{} starting",
        constants::APP_NAME
    );
    for warning in &startup_warnings {
        tracing::warn!(config = %config_path.display(), "{warning}");
    }

    let format = cli.format.unwrap_or(app_config.output_format);
    let pipeline_config = app_config.pipeline_config();

    match run(&cli, format, &pipeline_config) {
        Ok(report) => {
            eprintln!("{}", summary_line(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    cli: &Cli,
    format: OutputFormat,
    pipeline_config: &PipelineConfig,
) -> Result<RunReport, PacketError> {
    let input = CriteriaInput {
        search: cli.search.clone(),
        regex: cli.regex.clone(),
        level: cli.level.clone(),
        user: cli.user.clone(),
        start: cli.start.clone(),
        end: cli.end.clone(),
    };
    let criteria = FilterCriteria::from_input(&input)?;

    let report = pipeline::run(&cli.packet, &criteria, pipeline_config)?;

    let stdout = io::stdout();
    export::export(&report.entries, format, BufWriter::new(stdout.lock()))?;

    Ok(report)
}

fn summary_line(report: &RunReport) -> String {
    let warnings = report.warnings.len() + report.warnings_dropped;
    let mut line = format!(
        "{} matching entries from {} of {} log files in {:.2?}",
        report.entries.len(),
        report.files.len(),
        report.selected_entries,
        report.duration
    );
    if warnings > 0 {
        line.push_str(&format!(", {warnings} warnings"));
    }
    if report.truncated {
        line.push_str(" (result limit reached, output truncated)");
    }
    line
}
