// crates/decision-query-cli/src/main.rs
// ============================================================================
// Module: Decision Query CLI Entry Point
// Description: Flag parsing, logging and exit-code mapping for decision queries.
// Purpose: Query a remote decision service from a build pipeline step.
// Dependencies: clap, decision-query-core, tokio, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `decision-query` reads JSON or YAML input, sends it to a decision service
//! as `{"input": ...}`, prints the `result` and exits non-zero when the
//! `--fail-defined` / `--fail-undefined` policy asks for it.
//!
//! Exit codes: `0` on success, `1` on a policy-requested failure or any
//! pipeline error, `2` on flag parsing errors. Logs go to stderr; stdout is
//! reserved for the query result.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;
use std::time::Duration;

use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use decision_query_core::ExitDecision;
use decision_query_core::HttpTransport;
use decision_query_core::QueryConfig;
use decision_query_core::QueryContext;
use decision_query_core::QueryError;
use decision_query_core::QueryPipeline;
use decision_query_core::QueryResult;
use decision_query_core::config::DEFAULT_METADATA_FIELD;
use decision_query_core::config::STDIO_PATH;
use tracing::debug;
use tracing::error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable supplying `--url`.
const URL_ENV: &str = "DECISION_QUERY_URL";
/// Environment variable supplying `--http-header`.
const HEADER_ENV: &str = "DECISION_QUERY_HEADER";
/// Environment variable supplying `--timeout`.
const TIMEOUT_ENV: &str = "DECISION_QUERY_TIMEOUT";
/// Default input format label.
const DEFAULT_FORMAT: &str = "json";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "decision-query", version, about = "Query a remote decision service")]
struct Cli {
    /// Query URL of the decision service.
    #[arg(short = 'u', long, env = URL_ENV, value_name = "URL")]
    url: Option<String>,
    /// Input file; `-` reads stdin.
    #[arg(short = 'i', long, value_name = "PATH", default_value = STDIO_PATH)]
    input: String,
    /// Output file; `-` writes stdout.
    #[arg(short = 'o', long, value_name = "PATH", default_value = STDIO_PATH)]
    output: String,
    /// Input format: `json` or `yaml`.
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = DEFAULT_FORMAT)]
    format: String,
    /// Custom request header `Name: value` (repeatable).
    #[arg(
        short = 'H',
        long = "http-header",
        env = HEADER_ENV,
        value_name = "HEADER",
        action = ArgAction::Append
    )]
    http_headers: Vec<String>,
    /// Metadata entry `key=value` (repeatable).
    #[arg(short = 'm', long = "metadata", value_name = "KEY=VALUE", action = ArgAction::Append)]
    metadata: Vec<String>,
    /// Key under which metadata is injected.
    #[arg(long, value_name = "FIELD", default_value = DEFAULT_METADATA_FIELD)]
    metadata_field: String,
    /// Nest the decoded input under this key.
    #[arg(long, value_name = "FIELD")]
    data_field: Option<String>,
    /// Exit non-zero when the result is defined.
    #[arg(long, action = ArgAction::SetTrue)]
    fail_defined: bool,
    /// Exit non-zero when the result is undefined.
    #[arg(long, action = ArgAction::SetTrue)]
    fail_undefined: bool,
    /// Deadline in seconds for the HTTP exchange.
    #[arg(
        short = 't',
        long,
        env = TIMEOUT_ENV,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,
    /// Logging level; `RUST_LOG` overrides it when set.
    #[arg(short = 'l', long, value_enum, value_name = "LEVEL", default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

impl Cli {
    /// Collects the raw flag values handed to the core validator.
    fn query_config(&self) -> QueryConfig {
        QueryConfig {
            url: self.url.clone().unwrap_or_default(),
            format: self.format.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            headers: self.http_headers.clone(),
            metadata: self.metadata.clone(),
            metadata_field: self.metadata_field.clone(),
            data_field: self.data_field.clone().unwrap_or_default(),
            fail_on_defined: self.fail_defined,
            fail_on_undefined: self.fail_undefined,
        }
    }

    /// Builds the invocation context from `--timeout`.
    fn query_context(&self, ctx: QueryContext) -> QueryContext {
        match self.timeout {
            Some(seconds) => ctx.with_timeout(Duration::from_secs(seconds)),
            None => ctx,
        }
    }
}

/// Logging levels accepted by `--log-level`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    /// Pipeline progress and request details.
    Debug,
    /// Default level.
    Info,
    /// Warnings such as interrupts.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for the level.
    const fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    exit_code(run(&cli).await)
}

/// Runs one query with interrupt and deadline handling.
async fn run(cli: &Cli) -> QueryResult<ExitDecision> {
    let (ctx, cancel) = QueryContext::cancellable();
    let ctx = cli.query_context(ctx);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, canceling query");
            cancel.cancel();
        }
    });

    let config = cli.query_config();
    let outcome = match HttpTransport::new() {
        Ok(transport) => QueryPipeline::new(transport).run(&config, &ctx).await,
        Err(err) => Err(err.into()),
    };
    interrupt.abort();
    outcome
}

/// Maps the pipeline outcome to a process exit code.
fn exit_code(outcome: QueryResult<ExitDecision>) -> ExitCode {
    match outcome {
        Ok(ExitDecision::Proceed) => ExitCode::SUCCESS,
        Ok(ExitDecision::NonZeroExit) => {
            debug!("exit policy requested a non-zero exit");
            ExitCode::FAILURE
        }
        Err(err) => emit_error(&err),
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Installs the stderr subscriber; `RUST_LOG` wins over `--log-level`.
fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    if let Err(err) =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init()
    {
        // Only one global subscriber may exist; events keep flowing to it.
        debug!(error = %err, "logging subscriber already installed");
    }
}

/// Renders error context fields as `key=value` pairs.
fn render_fields(err: &QueryError) -> String {
    err.fields().iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join(" ")
}

/// Logs a pipeline failure once and returns a failure exit code.
fn emit_error(err: &QueryError) -> ExitCode {
    error!(kind = %err.kind(), context = %render_fields(err), "{err}");
    ExitCode::FAILURE
}
