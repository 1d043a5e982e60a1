//! Symbiome CLI - Command-line interface for Symbiome Core
//!
//! Commands:
//! - complete: Turn a batch of readings into a session record
//! - score: Score a session history
//! - weekly: Print the weekly SRI chart for a session history
//! - validate: Check readings against the dashboard signal scale
//! - doctor: Diagnose configuration and state files
//! - tabs: List dashboard panels in navigation order
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use symbiome_core::readings::{RangeIssue, ReadingParser};
use symbiome_core::score::ScoreReport;
use symbiome_core::{
    AggregatorConfig, BiometricReading, ResilienceAggregator, SessionData, Tab, CORE_VERSION,
    PRODUCER_NAME,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Symbiome - On-device resilience scoring for the Symbiome dashboard
#[derive(Parser)]
#[command(name = "symbiome")]
#[command(author = "Symbiome Labs")]
#[command(version = CORE_VERSION)]
#[command(about = "Score biofeedback sessions and resilience history", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a session from a batch of readings
    Complete {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Aggregator configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Outcome policy seed (overrides the configuration file)
        #[arg(long)]
        seed: Option<u64>,

        /// Load store state from file
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save store state to file after completing
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Pretty-print the session record
        #[arg(long)]
        pretty: bool,
    },

    /// Score a session history
    Score {
        #[command(flatten)]
        history: HistorySource,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Print the weekly SRI chart for a session history
    Weekly {
        #[command(flatten)]
        history: HistorySource,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check readings against the 0-100 dashboard scale
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and state files
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List dashboard panels in navigation order
    Tabs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(clap::Args)]
struct HistorySource {
    /// State file written by `complete --save-state`
    #[arg(long, conflicts_with = "history")]
    state: Option<PathBuf>,

    /// JSON array of session records
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of readings
    Json,
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Biometric reading
    Input,
    /// Session record
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cli_error = CliError::from(e);
            tracing::debug!(code = %cli_error.code, "command failed");
            eprintln!(
                "{}",
                serde_json::to_string(&cli_error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "symbiome_core=debug,symbiome=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), SymbiomeCliError> {
    match cli.command {
        Commands::Complete {
            input,
            input_format,
            config,
            seed,
            load_state,
            save_state,
            pretty,
        } => cmd_complete(
            &input,
            input_format,
            config.as_deref(),
            seed,
            load_state.as_deref(),
            save_state.as_deref(),
            pretty,
        ),

        Commands::Score { history, pretty } => cmd_score(&history, pretty),

        Commands::Weekly { history, json } => cmd_weekly(&history, json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor {
            config,
            state,
            json,
        } => cmd_doctor(config.as_deref(), state.as_deref(), json),

        Commands::Tabs { json } => cmd_tabs(json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_complete(
    input: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
    seed: Option<u64>,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
    pretty: bool,
) -> Result<(), SymbiomeCliError> {
    let readings = read_readings(input, &input_format)?;

    let mut aggregator_config = match config {
        Some(path) => AggregatorConfig::from_json(&fs::read_to_string(path)?)?,
        None => AggregatorConfig::default(),
    };
    if seed.is_some() {
        aggregator_config.seed = seed;
    }

    let mut aggregator = ResilienceAggregator::with_config(aggregator_config);

    if let Some(state_path) = load_state {
        let state_json = fs::read_to_string(state_path)?;
        aggregator.load_state(&state_json)?;
    }

    let session = aggregator.complete_session(&readings);
    if session.is_none() {
        tracing::warn!("no readings in input; history unchanged");
    }

    if let Some(state_path) = save_state {
        fs::write(state_path, aggregator.save_state()?)?;
    }

    let output = if pretty {
        serde_json::to_string_pretty(&session)?
    } else {
        serde_json::to_string(&session)?
    };
    println!("{}", output);

    Ok(())
}

fn cmd_score(source: &HistorySource, pretty: bool) -> Result<(), SymbiomeCliError> {
    let history = read_history(source)?;
    let report = ScoreReport::from_history(&history);

    let output = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);

    Ok(())
}

fn cmd_weekly(source: &HistorySource, json: bool) -> Result<(), SymbiomeCliError> {
    let history = read_history(source)?;
    let report = ScoreReport::from_history(&history);

    if json {
        println!("{}", serde_json::to_string_pretty(&report.weekly)?);
    } else {
        println!("Weekly SRI");
        println!("==========");
        for point in &report.weekly {
            println!("  {}  {:>5.1}", point.day, point.sri);
        }
        println!();
        println!(
            "Overall: {:.1} ({})",
            report.score.overall, report.tier_label
        );
    }

    Ok(())
}

fn cmd_tabs(json: bool) -> Result<(), SymbiomeCliError> {
    let entries: Vec<TabEntry> = Tab::ALL
        .iter()
        .map(|tab| TabEntry {
            id: tab.as_str(),
            label: tab.label(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("  {:<20} {}", entry.id, entry.label);
        }
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SymbiomeCliError> {
    let readings = read_readings(input, &input_format)?;
    let issues = ReadingParser::out_of_scale(&readings);

    let report = ValidationReport {
        total_readings: readings.len(),
        issues,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total readings: {}", report.total_readings);
        println!("Out of scale:   {}", report.issues.len());

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                println!(
                    "  - Reading {}: {} = {} (expected 0-100)",
                    issue.index, issue.signal, issue.value
                );
            }
        }
    }

    if report.issues.is_empty() {
        Ok(())
    } else {
        Err(SymbiomeCliError::ValidationFailed(report.issues.len()))
    }
}

fn cmd_doctor(
    config: Option<&Path>,
    state: Option<&Path>,
    json: bool,
) -> Result<(), SymbiomeCliError> {
    let mut checks: Vec<DoctorCheck> = vec![DoctorCheck {
        name: "core_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Symbiome Core version {}", CORE_VERSION),
    }];

    if let Some(path) = config {
        checks.push(check_file(path, "config", |content| {
            AggregatorConfig::from_json(content).map(|c| match c.seed {
                Some(seed) => format!("Configuration valid (seed {})", seed),
                None => "Configuration valid (unseeded)".to_string(),
            })
        }));
    }

    if let Some(path) = state {
        checks.push(check_file(path, "state", |content| {
            let mut aggregator = ResilienceAggregator::new();
            aggregator.load_state(content)?;
            Ok(format!(
                "State file valid ({} sessions, overall {:.1})",
                aggregator.sessions().len(),
                aggregator.score().overall
            ))
        }));
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (readings can be piped with --input -)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: CORE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Symbiome Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SymbiomeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), SymbiomeCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input: BiometricReading");
            println!();
            println!("- hrv: number  (heart-rate-variability proxy, 0-100)");
            println!("- gsr: number  (galvanic-skin-response proxy, 0-100; higher = more aroused)");
            println!("- facialCalm: number  (facial calmness, 0-100)");
            println!();
            println!("Values outside 0-100 are accepted; use `symbiome validate` to flag them.");
        }
        SchemaType::Output => {
            println!("Output: SessionData");
            println!();
            println!("- id: string  (session-<epoch ms>)");
            println!("- date: integer  (epoch ms)");
            println!("- duration: integer  (number of readings)");
            println!("- avgHRV, avgGSR, avgFacialCalm: number");
            println!("- sri: number  (avgHRV*0.35 + (100-avgGSR)*0.30 + avgFacialCalm*0.35)");
            println!("- recoveryTime: integer  (seconds)");
            println!("- stressEvents: integer");
            println!("- type: stress | training | passive | custom");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SymbiomeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_readings(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<BiometricReading>, SymbiomeCliError> {
    let data = read_input(input)?;
    let readings = match input_format {
        InputFormat::Json => ReadingParser::parse_array(&data)?,
        InputFormat::Ndjson => ReadingParser::parse_ndjson(&data)?,
    };
    tracing::debug!(count = readings.len(), "readings parsed");
    Ok(readings)
}

fn read_history(source: &HistorySource) -> Result<Vec<SessionData>, SymbiomeCliError> {
    if let Some(path) = &source.state {
        let mut aggregator = ResilienceAggregator::new();
        aggregator.load_state(&fs::read_to_string(path)?)?;
        return Ok(aggregator.sessions().to_vec());
    }
    if let Some(path) = &source.history {
        let history: Vec<SessionData> = serde_json::from_str(&read_input(path)?)?;
        return Ok(history);
    }
    Err(SymbiomeCliError::NoHistory)
}

fn check_file<F>(path: &Path, name: &str, check: F) -> DoctorCheck
where
    F: FnOnce(&str) -> Result<String, symbiome_core::ComputeError>,
{
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} file does not exist", name),
        };
    }

    let (status, message) = match fs::read_to_string(path) {
        Ok(content) => match check(&content) {
            Ok(message) => (CheckStatus::Ok, message),
            Err(e) => (CheckStatus::Error, e.to_string()),
        },
        Err(e) => (CheckStatus::Error, format!("Cannot read {} file: {}", name, e)),
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

// Error types

#[derive(Debug)]
enum SymbiomeCliError {
    Io(io::Error),
    Compute(symbiome_core::ComputeError),
    Json(serde_json::Error),
    NoHistory,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for SymbiomeCliError {
    fn from(e: io::Error) -> Self {
        SymbiomeCliError::Io(e)
    }
}

impl From<symbiome_core::ComputeError> for SymbiomeCliError {
    fn from(e: symbiome_core::ComputeError) -> Self {
        SymbiomeCliError::Compute(e)
    }
}

impl From<serde_json::Error> for SymbiomeCliError {
    fn from(e: serde_json::Error) -> Self {
        SymbiomeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SymbiomeCliError> for CliError {
    fn from(e: SymbiomeCliError) -> Self {
        match e {
            SymbiomeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SymbiomeCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'symbiome schema input' for the expected shape".to_string()),
            },
            SymbiomeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SymbiomeCliError::NoHistory => CliError {
                code: "NO_HISTORY".to_string(),
                message: "No session history given".to_string(),
                hint: Some("Pass --state or --history".to_string()),
            },
            SymbiomeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} signal values outside the 0-100 scale", count),
                hint: Some("Rescale inputs or ignore if the scale is intentional".to_string()),
            },
            SymbiomeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_readings: usize,
    issues: Vec<RangeIssue>,
}

#[derive(serde::Serialize)]
struct TabEntry {
    id: &'static str,
    label: &'static str,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
