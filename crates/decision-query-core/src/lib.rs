// crates/decision-query-core/src/lib.rs
// ============================================================================
// Module: Decision Query Core Library
// Description: Query construction and exit-decision pipeline.
// Purpose: Turn structured input into a decision-service query and a CI signal.
// Dependencies: async-trait, regex, reqwest, serde, serde_json, serde_yaml, tokio, tracing, url
// ============================================================================

//! ## Overview
//! Decision Query sends structured input to a remote decision service over
//! HTTP and maps the answer to a success/failure signal for build pipelines.
//! Rule evaluation happens entirely on the service; this crate owns the
//! configuration checks, input decoding, payload composition, envelope
//! protocol, output encoding and exit policy.
//!
//! Values are modelled as [`serde_json::Value`] throughout, so YAML and JSON
//! input share one closed value tree.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod compose;
pub mod config;
pub mod context;
pub mod error;
pub mod exit;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod transport;

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::QueryClient;
pub use compose::compose;
pub use config::HeaderEntry;
pub use config::InputFormat;
pub use config::IoPath;
pub use config::Metadata;
pub use config::QueryConfig;
pub use config::ValidatedConfig;
pub use context::CancelHandle;
pub use context::QueryContext;
pub use error::ErrorKind;
pub use error::QueryError;
pub use error::QueryResult;
pub use error::RequestFailure;
pub use exit::ExitDecision;
pub use exit::decide;
pub use exit::is_undefined;
pub use input::decode;
pub use input::read_input;
pub use output::write_output;
pub use pipeline::QueryPipeline;
pub use serde_json::Value;
pub use transport::HttpTransport;
pub use transport::Transport;
pub use transport::TransportRequest;
pub use transport::TransportResponse;
