// crates/decision-query-core/src/pipeline.rs
// ============================================================================
// Module: Decision Query Pipeline
// Description: Runs validation, decoding, composition, query, output and exit.
// Purpose: Provide the single entry point the CLI drives per invocation.
// Dependencies: serde_json, tracing
// ============================================================================

//! ## Overview
//! [`QueryPipeline::run`] executes the stages strictly in order. The first
//! failure aborts the run; nothing is retried. Standard streams are injected
//! so tests can drive the pipeline without touching the process stdio.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;

use serde_json::Value;
use tracing::debug;

use crate::client::QueryClient;
use crate::compose::compose;
use crate::config::QueryConfig;
use crate::context::QueryContext;
use crate::error::QueryResult;
use crate::exit::ExitDecision;
use crate::exit::decide;
use crate::input::read_input;
use crate::output::write_output;
use crate::transport::Transport;

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// One query invocation's collaborators.
pub struct QueryPipeline<T> {
    /// Envelope client over the configured transport.
    client: QueryClient<T>,
    /// Stream read when the input path is `-`.
    stdin: Box<dyn Read + Send>,
    /// Stream written when the output path is `-`.
    stdout: Box<dyn Write + Send>,
}

impl<T: Transport> QueryPipeline<T> {
    /// Creates a pipeline bound to the process stdin and stdout.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            client: QueryClient::new(transport),
            stdin: Box::new(std::io::stdin()),
            stdout: Box::new(std::io::stdout()),
        }
    }

    /// Replaces the stdin stream.
    #[must_use]
    pub fn with_stdin(self, stdin: impl Read + Send + 'static) -> Self {
        Self {
            stdin: Box::new(stdin),
            ..self
        }
    }

    /// Replaces the stdout stream.
    #[must_use]
    pub fn with_stdout(self, stdout: impl Write + Send + 'static) -> Self {
        Self {
            stdout: Box::new(stdout),
            ..self
        }
    }

    /// Returns the envelope client.
    #[must_use]
    pub const fn client(&self) -> &QueryClient<T> {
        &self.client
    }

    /// Runs every stage and returns the exit decision.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::QueryError`] raised by any stage.
    pub async fn run(&mut self, config: &QueryConfig, ctx: &QueryContext) -> QueryResult<ExitDecision> {
        let config = config.validate()?;
        debug!(config = ?config, "starting query");

        let decoded = read_input(&config.input, config.format, &mut self.stdin)?;
        let payload = compose(
            decoded,
            config.metadata.as_ref(),
            &config.metadata_field,
            config.data_field.as_deref(),
        )?;

        let result: Value = self.client.query(&config.url, &payload, &config.headers, ctx).await?;
        write_output(&result, &config.output, &mut self.stdout)?;

        let decision = decide(&result, config.fail_on_defined, config.fail_on_undefined);
        debug!(decision = ?decision, "exiting query");
        Ok(decision)
    }
}
