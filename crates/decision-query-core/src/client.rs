// crates/decision-query-core/src/client.rs
// ============================================================================
// Module: Decision Query Client
// Description: Request/response envelope protocol for the decision service.
// Purpose: Send `{"input": ...}` and extract `result` as a typed value.
// Dependencies: reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! The client wraps the payload in `{"input": <payload>}`, POSTs it through a
//! [`Transport`], and requires a 200 response whose body is
//! `{"result": <any>}`. A missing `result` is `null`, i.e. undefined.
//!
//! The extracted result is serialized again and deserialized into the
//! caller's type, so shape mismatches surface as
//! [`QueryError::UnexpectedResponse`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::HeaderEntry;
use crate::context::QueryContext;
use crate::error::QueryError;
use crate::error::QueryResult;
use crate::error::RequestFailure;
use crate::transport::Transport;
use crate::transport::TransportRequest;
use crate::transport::TransportResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Only status accepted from the decision service.
const STATUS_OK: u16 = 200;
/// Content type of the request envelope.
const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Request envelope sent to the decision service.
#[derive(Serialize)]
struct RequestEnvelope<'a, P: ?Sized> {
    /// Composed payload.
    input: &'a P,
}

/// Response envelope returned by the decision service.
#[derive(Default, Deserialize)]
struct ResponseEnvelope {
    /// Decision result; absent means undefined.
    #[serde(default)]
    result: Value,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Client for the decision service envelope protocol.
#[derive(Debug, Clone)]
pub struct QueryClient<T> {
    /// Transport performing the HTTP exchange.
    transport: T,
}

impl<T: Transport> QueryClient<T> {
    /// Creates a client over the given transport.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Queries the decision service and returns the typed result.
    ///
    /// Custom headers are sent first, then `Content-Type: application/json`
    /// is appended; a custom header with the same name is kept.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidInput`] when the payload cannot be serialized.
    /// - [`QueryError::RequestFailed`] on transport failure, cancellation,
    ///   deadline expiry or a non-200 status.
    /// - [`QueryError::UnexpectedResponse`] when the body cannot be read or
    ///   decoded into `R`.
    pub async fn query<P, R>(
        &self,
        url: &Url,
        payload: &P,
        headers: &[HeaderEntry],
        ctx: &QueryContext,
    ) -> QueryResult<R>
    where
        P: Serialize + fmt::Debug + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode_request(payload)?;
        let mut header_map = HeaderMap::new();
        for header in headers {
            header_map.append(header.name.clone(), header.value.clone());
        }
        header_map.append(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        debug!(url = %url, headers = headers.len(), bytes = body.len(), "sending query");
        let request = TransportRequest {
            url: url.clone(),
            headers: header_map,
            body,
        };
        let response = ctx.run(self.transport.post(request)).await?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        decode_response(response)
    }
}

// ============================================================================
// SECTION: Envelope Helpers
// ============================================================================

/// Serializes `{"input": payload}`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidInput`] carrying the payload rendering.
pub fn encode_request<P>(payload: &P) -> QueryResult<Vec<u8>>
where
    P: Serialize + fmt::Debug + ?Sized,
{
    serde_json::to_vec(&RequestEnvelope {
        input: payload,
    })
    .map_err(|err| QueryError::InvalidInput {
        reason: format!("failed to serialize query input: {err}"),
        payload: render_payload(payload),
    })
}

/// Applies the status and envelope rules to a completed exchange.
///
/// # Errors
///
/// Returns [`QueryError::RequestFailed`] for non-200 statuses and
/// [`QueryError::UnexpectedResponse`] for unreadable or malformed bodies.
pub fn decode_response<R: DeserializeOwned>(response: TransportResponse) -> QueryResult<R> {
    let TransportResponse {
        status,
        body,
        body_error,
    } = response;
    if status != STATUS_OK {
        return Err(RequestFailure::Status {
            code: status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
        .into());
    }
    if let Some(error) = body_error {
        return Err(unexpected(format!("failed to read response body: {error}"), &body));
    }

    // A `null` body carries no result, same as an empty envelope.
    let envelope = serde_json::from_slice::<Option<ResponseEnvelope>>(&body)
        .map_err(|err| unexpected(format!("invalid response envelope: {err}"), &body))?
        .unwrap_or_default();
    let result = serde_json::to_vec(&envelope.result)
        .map_err(|err| unexpected(format!("failed to re-encode result: {err}"), &body))?;
    serde_json::from_slice(&result)
        .map_err(|err| unexpected(format!("result does not match expected shape: {err}"), &body))
}

/// Builds an [`QueryError::UnexpectedResponse`] carrying the raw body.
fn unexpected(reason: String, body: &[u8]) -> QueryError {
    QueryError::UnexpectedResponse {
        reason,
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

/// Renders a payload for error context.
#[allow(clippy::use_debug, reason = "The payload failed to serialize, so Debug is all that is left.")]
fn render_payload<P: fmt::Debug + ?Sized>(payload: &P) -> String {
    format!("{payload:?}")
}
