// crates/fundamentals-cli/src/main.rs
// ============================================================================
// Module: Fundamentals CLI Entry Point
// Description: Command dispatcher for recording and inspecting fundamentals.
// Purpose: Thin caller over the ledger, the SQLite store, and config loading.
// Dependencies: clap, fundamentals-config, fundamentals-core,
//               fundamentals-store-sqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The `fundamentals` binary records one metric observation per invocation
//! into the configured ledger relation, prints relations back, and manages
//! store files. Every command loads `fundamentals.toml` first so store,
//! ledger, and audit settings stay consistent across invocations.
//!
//! Security posture: arguments and config files are untrusted; identifiers,
//! paths, and dates are validated by the library crates before use.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use fundamentals_config::FundamentalsConfig;
use fundamentals_config::config_toml_example;
use fundamentals_core::AuditSink;
use fundamentals_core::ColumnSpec;
use fundamentals_core::FixedDate;
use fundamentals_core::Ledger;
use fundamentals_core::Metric;
use fundamentals_core::ObservationDate;
use fundamentals_core::RelationStore;
use fundamentals_core::Scalar;
use fundamentals_core::StoreAction;
use fundamentals_core::StoreAuditEvent;
use fundamentals_core::TrackedMetric;
use fundamentals_core::UpsertEngine;
use fundamentals_core::UpsertOutcome;
use fundamentals_core::UpsertReport;
use fundamentals_core::metrics::DebtToEquity;
use fundamentals_core::metrics::DividendPayout;
use fundamentals_core::metrics::DividendYield;
use fundamentals_core::metrics::EarningsPerShare;
use fundamentals_core::metrics::FreeCashflow;
use fundamentals_core::metrics::PriceToBook;
use fundamentals_core::metrics::PriceToEarnings;
use fundamentals_core::metrics::PriceToEarningsGrowth;
use fundamentals_core::metrics::PriceToSales;
use fundamentals_core::metrics::ReturnOnEquity;
use fundamentals_store_sqlite::SqliteStore;
use fundamentals_store_sqlite::SqliteStoreError;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "fundamentals", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (overrides `FUNDAMENTALS_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a metric and record today's observation in the ledger.
    Record(RecordCommand),
    /// Print every row of a relation.
    Show(ShowCommand),
    /// List relations in the store.
    Relations(RelationsCommand),
    /// Drop a relation from the store.
    DropRelation(DropRelationCommand),
    /// Store file administration.
    Store {
        /// Selected store subcommand.
        #[command(subcommand)]
        command: StoreCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Output formats for structured CLI commands.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

/// Arguments for `record`.
#[derive(Args, Debug)]
struct RecordCommand {
    /// Observation date; defaults to the local date.
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date, global = true)]
    date: Option<ObservationDate>,
    /// Relation to record into; defaults to `ledger.relation`.
    #[arg(long, value_name = "NAME", global = true)]
    relation: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    /// Metric to compute.
    #[command(subcommand)]
    metric: MetricCommand,
}

/// Metric selection with raw inputs.
#[derive(Subcommand, Debug, Clone, Copy)]
enum MetricCommand {
    /// Price to earnings ratio (forward vs trailing P/E).
    #[command(name = "pe")]
    PriceToEarnings(PriceToEarningsArgs),
    /// Price to earnings growth (PEG vs trailing PEG).
    #[command(name = "peg")]
    PriceToEarningsGrowth(PriceToEarningsGrowthArgs),
    /// Earnings per share (forward vs trailing EPS).
    #[command(name = "eps")]
    EarningsPerShare(EarningsPerShareArgs),
    /// Free cashflow yield against market cap.
    #[command(name = "free-cashflow")]
    FreeCashflow(FreeCashflowArgs),
    /// Price to book.
    #[command(name = "pb")]
    PriceToBook(SingleInputArgs),
    /// Return on equity.
    #[command(name = "roe")]
    ReturnOnEquity(SingleInputArgs),
    /// Dividend payout ratio.
    #[command(name = "dividend-payout")]
    DividendPayout(SingleInputArgs),
    /// Price to sales.
    #[command(name = "ps")]
    PriceToSales(SingleInputArgs),
    /// Dividend yield.
    #[command(name = "dividend-yield")]
    DividendYield(SingleInputArgs),
    /// Debt to equity.
    #[command(name = "debt-to-equity")]
    DebtToEquity(SingleInputArgs),
}

/// Inputs for `record pe`.
#[derive(Args, Debug, Clone, Copy)]
struct PriceToEarningsArgs {
    /// Forward P/E.
    #[arg(long, allow_negative_numbers = true)]
    forward_pe: Option<f64>,
    /// Trailing P/E.
    #[arg(long, allow_negative_numbers = true)]
    trailing_pe: Option<f64>,
}

/// Inputs for `record peg`.
#[derive(Args, Debug, Clone, Copy)]
struct PriceToEarningsGrowthArgs {
    /// Current PEG.
    #[arg(long, allow_negative_numbers = true)]
    peg: Option<f64>,
    /// Trailing PEG.
    #[arg(long, allow_negative_numbers = true)]
    trailing_peg: Option<f64>,
}

/// Inputs for `record eps`.
#[derive(Args, Debug, Clone, Copy)]
struct EarningsPerShareArgs {
    /// Forward EPS.
    #[arg(long, allow_negative_numbers = true)]
    forward_eps: Option<f64>,
    /// Trailing EPS.
    #[arg(long, allow_negative_numbers = true)]
    trailing_eps: Option<f64>,
}

/// Inputs for `record free-cashflow`.
#[derive(Args, Debug, Clone, Copy)]
struct FreeCashflowArgs {
    /// Free cashflow.
    #[arg(long, allow_negative_numbers = true)]
    free_cashflow: Option<f64>,
    /// Market capitalization.
    #[arg(long, allow_negative_numbers = true)]
    market_cap: Option<f64>,
}

/// Inputs for single-value metrics.
#[derive(Args, Debug, Clone, Copy)]
struct SingleInputArgs {
    /// Metric input; omitted inputs are recorded as null.
    #[arg(value_name = "VALUE", allow_negative_numbers = true)]
    value: Option<f64>,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
struct ShowCommand {
    /// Relation to print; defaults to `ledger.relation`.
    #[arg(long, value_name = "NAME")]
    relation: Option<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `relations`.
#[derive(Args, Debug)]
struct RelationsCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `drop-relation`.
#[derive(Args, Debug)]
struct DropRelationCommand {
    /// Relation name.
    #[arg(value_name = "NAME")]
    name: String,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Create an empty store file.
    Create(StorePathArgs),
    /// Delete a store file and its journal sidecars.
    Delete(StorePathArgs),
}

/// Store file path argument.
#[derive(Args, Debug)]
struct StorePathArgs {
    /// Store path ending in `.db`.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the resolved configuration.
    Validate,
    /// Print a canonical example configuration.
    Example,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Result of `record`.
#[derive(Debug, Serialize)]
struct RecordOutput {
    /// Metric display name.
    metric: &'static str,
    /// Rendered `"<name>: <percent>%"` line.
    summary: String,
    /// Derived percent, absent when an input was missing.
    percent: Option<f64>,
    /// Upsert report for the persisted observation.
    report: Option<UpsertReport>,
}

/// Result of `show`.
#[derive(Debug, Serialize)]
struct ShowOutput {
    /// Relation name.
    relation: String,
    /// Column schema in storage order.
    columns: Vec<ColumnSpec>,
    /// Rows in storage order.
    rows: Vec<Vec<Scalar>>,
}

/// Entry of `relations`.
#[derive(Debug, Serialize)]
struct RelationSummary {
    /// Relation name.
    name: String,
    /// Column schema.
    columns: Vec<ColumnSpec>,
    /// Row count.
    rows: usize,
}

/// Result of `relations`.
#[derive(Debug, Serialize)]
struct RelationsOutput {
    /// Relations ordered by name.
    relations: Vec<RelationSummary>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing failures.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Creates a new CLI error with the provided message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result type for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("fundamentals {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    let config_path = cli.config.as_deref();

    match command {
        Commands::Record(command) => command_record(config_path, &command),
        Commands::Show(command) => command_show(config_path, &command),
        Commands::Relations(command) => command_relations(config_path, &command),
        Commands::DropRelation(command) => command_drop_relation(config_path, &command),
        Commands::Store {
            command,
        } => command_store(config_path, &command),
        Commands::Config {
            command,
        } => command_config(config_path, &command),
    }
}

/// Prints CLI help text to stdout.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// Executes `record`.
fn command_record(config_path: Option<&Path>, command: &RecordCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let output = execute_record(&config, command)?;
    let text = render_record_text(&output);
    emit_structured_output(&output, command.format, text)?;
    Ok(ExitCode::SUCCESS)
}

/// Opens the ledger described by `config` and records the selected metric.
fn execute_record(config: &FundamentalsConfig, command: &RecordCommand) -> CliResult<RecordOutput> {
    let audit = build_audit_sink(config)?;
    let store = open_store(config, Arc::clone(&audit))?;
    let relation = command.relation.clone().unwrap_or_else(|| config.ledger.relation.clone());
    let engine =
        UpsertEngine::with_config(&store as &dyn RelationStore, config.ledger.upsert_config())
            .with_audit(audit);
    let mut ledger = Ledger::new(engine).with_relation(relation);
    if let Some(date) = command.date {
        ledger = ledger.with_date_source(FixedDate(date));
    }
    command.metric.record(&ledger)
}

impl MetricCommand {
    /// Builds the selected metric and records it into `ledger`.
    fn record(self, ledger: &Ledger<'_>) -> CliResult<RecordOutput> {
        match self {
            Self::PriceToEarnings(args) => record_metric(
                ledger,
                PriceToEarnings {
                    forward_pe: args.forward_pe,
                    trailing_pe: args.trailing_pe,
                },
            ),
            Self::PriceToEarningsGrowth(args) => record_metric(
                ledger,
                PriceToEarningsGrowth {
                    peg: args.peg,
                    trailing_peg: args.trailing_peg,
                },
            ),
            Self::EarningsPerShare(args) => record_metric(
                ledger,
                EarningsPerShare {
                    forward_eps: args.forward_eps,
                    trailing_eps: args.trailing_eps,
                },
            ),
            Self::FreeCashflow(args) => record_metric(
                ledger,
                FreeCashflow {
                    free_cashflow: args.free_cashflow,
                    market_cap: args.market_cap,
                },
            ),
            Self::PriceToBook(args) => record_metric(
                ledger,
                PriceToBook {
                    pb: args.value,
                },
            ),
            Self::ReturnOnEquity(args) => record_metric(
                ledger,
                ReturnOnEquity {
                    roe: args.value,
                },
            ),
            Self::DividendPayout(args) => record_metric(
                ledger,
                DividendPayout {
                    dp: args.value,
                },
            ),
            Self::PriceToSales(args) => record_metric(
                ledger,
                PriceToSales {
                    ps: args.value,
                },
            ),
            Self::DividendYield(args) => record_metric(
                ledger,
                DividendYield {
                    dy: args.value,
                },
            ),
            Self::DebtToEquity(args) => record_metric(
                ledger,
                DebtToEquity {
                    de: args.value,
                },
            ),
        }
    }
}

/// Tracks `metric` against `ledger`, persisting one observation.
fn record_metric<M: Metric>(ledger: &Ledger<'_>, metric: M) -> CliResult<RecordOutput> {
    let tracked = TrackedMetric::new(metric, Some(ledger))
        .map_err(|err| CliError::new(format!("failed to record metric: {err}")))?;
    Ok(RecordOutput {
        metric: tracked.name(),
        summary: tracked.to_string(),
        percent: tracked.percent(),
        report: tracked.last_report().cloned(),
    })
}

/// Renders `record` output in text form.
fn render_record_text(output: &RecordOutput) -> String {
    let mut buffer = output.summary.clone();
    buffer.push('\n');
    if let Some(report) = &output.report {
        buffer.push_str(&format!(
            "{} {} in {}\n",
            outcome_label(report.outcome),
            report.key,
            report.relation
        ));
        if !report.columns_added.is_empty() {
            buffer.push_str(&format!("added columns: {}\n", report.columns_added.join(", ")));
        }
    }
    buffer
}

/// Returns the text label for an upsert outcome.
const fn outcome_label(outcome: UpsertOutcome) -> &'static str {
    match outcome {
        UpsertOutcome::Appended => "appended",
        UpsertOutcome::Overwritten => "overwrote",
        UpsertOutcome::Merged => "merged",
    }
}

/// Parses an observation date argument.
fn parse_date(value: &str) -> Result<ObservationDate, String> {
    ObservationDate::parse(value).map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Relation Inspection
// ============================================================================

/// Executes `show`.
fn command_show(config_path: Option<&Path>, command: &ShowCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let output = execute_show(&config, command.relation.as_deref())?;
    let text = render_show_text(&output);
    emit_structured_output(&output, command.format, text)?;
    Ok(ExitCode::SUCCESS)
}

/// Reads a relation, defaulting to the configured ledger relation.
fn execute_show(config: &FundamentalsConfig, relation: Option<&str>) -> CliResult<ShowOutput> {
    let store = open_store(config, build_audit_sink(config)?)?;
    let name = relation.unwrap_or(&config.ledger.relation);
    let read_error =
        |err: SqliteStoreError| CliError::new(format!("failed to read relation {name}: {err}"));
    let snapshot = store.relation(name).map_err(read_error)?.read_all().map_err(read_error)?;
    let rows = snapshot.rows().map(|row| row.into_iter().cloned().collect()).collect();
    Ok(ShowOutput {
        relation: name.to_string(),
        columns: snapshot.column_specs(),
        rows,
    })
}

/// Renders `show` output as tab-separated text.
fn render_show_text(output: &ShowOutput) -> String {
    let header: Vec<&str> = output.columns.iter().map(|column| column.name.as_str()).collect();
    let mut buffer = header.join("\t");
    buffer.push('\n');
    for row in &output.rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        buffer.push_str(&cells.join("\t"));
        buffer.push('\n');
    }
    buffer
}

/// Executes `relations`.
fn command_relations(
    config_path: Option<&Path>,
    command: &RelationsCommand,
) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let output = execute_relations(&config)?;
    let text = render_relations_text(&output);
    emit_structured_output(&output, command.format, text)?;
    Ok(ExitCode::SUCCESS)
}

/// Summarizes every relation in the configured store.
fn execute_relations(config: &FundamentalsConfig) -> CliResult<RelationsOutput> {
    let store = open_store(config, build_audit_sink(config)?)?;
    let list_error =
        |err: SqliteStoreError| CliError::new(format!("failed to list relations: {err}"));
    let mut relations = Vec::new();
    for relation in store.relations().map_err(list_error)? {
        relations.push(RelationSummary {
            name: relation.name().to_string(),
            columns: relation.columns().map_err(list_error)?,
            rows: relation.read_all().map_err(list_error)?.row_count(),
        });
    }
    Ok(RelationsOutput {
        relations,
    })
}

/// Renders `relations` output in text form.
fn render_relations_text(output: &RelationsOutput) -> String {
    if output.relations.is_empty() {
        return String::from("no relations\n");
    }
    let mut buffer = String::new();
    for relation in &output.relations {
        let columns: Vec<String> = relation
            .columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.scalar_type))
            .collect();
        buffer.push_str(&format!(
            "{} ({} rows): {}\n",
            relation.name,
            relation.rows,
            columns.join(", ")
        ));
    }
    buffer
}

/// Executes `drop-relation`.
fn command_drop_relation(
    config_path: Option<&Path>,
    command: &DropRelationCommand,
) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config, build_audit_sink(&config)?)?;
    store
        .drop_relation(&command.name)
        .map_err(|err| CliError::new(format!("failed to drop relation: {err}")))?;
    write_stdout_line(&format!("dropped relation {}", command.name))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Dispatches store subcommands.
fn command_store(config_path: Option<&Path>, command: &StoreCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let audit = build_audit_sink(&config)?;
    let message = match command {
        StoreCommand::Create(args) => {
            store_create(&args.path, audit.as_ref())?;
            format!("created store {}", args.path.display())
        }
        StoreCommand::Delete(args) => {
            store_delete(&args.path, audit.as_ref())?;
            format!("deleted store {}", args.path.display())
        }
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Creates a store file and records the action.
fn store_create(path: &Path, audit: &dyn AuditSink) -> CliResult<()> {
    SqliteStore::create(path)
        .map_err(|err| CliError::new(format!("failed to create store: {err}")))?;
    audit.record_store(&StoreAuditEvent::new(StoreAction::CreateStore, path.display().to_string()));
    Ok(())
}

/// Deletes a store file and records the action.
fn store_delete(path: &Path, audit: &dyn AuditSink) -> CliResult<()> {
    SqliteStore::delete(path)
        .map_err(|err| CliError::new(format!("failed to delete store: {err}")))?;
    audit.record_store(&StoreAuditEvent::new(StoreAction::DeleteStore, path.display().to_string()));
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(config_path: Option<&Path>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            load_config(config_path)?;
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<FundamentalsConfig> {
    FundamentalsConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds the configured audit sink.
fn build_audit_sink(config: &FundamentalsConfig) -> CliResult<Arc<dyn AuditSink>> {
    config
        .audit
        .build_sink()
        .map_err(|err| CliError::new(format!("failed to open audit sink: {err}")))
}

/// Opens the configured store with the audit sink attached.
fn open_store(config: &FundamentalsConfig, audit: Arc<dyn AuditSink>) -> CliResult<SqliteStore> {
    SqliteStore::open(config.store.clone())
        .map(|store| store.with_audit(audit))
        .map_err(|err| CliError::new(format!("failed to open store: {err}")))
}

/// Writes structured output as JSON or text.
fn emit_structured_output<T: Serialize>(
    value: &T,
    format: OutputFormat,
    text: String,
) -> CliResult<()> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?,
        OutputFormat::Text => text,
    };
    write_stdout_line(output.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
