// crates/decision-query-core/src/transport.rs
// ============================================================================
// Module: Decision Query Transport
// Description: HTTP exchange seam and its reqwest implementation.
// Purpose: Isolate the network call so the envelope protocol can be tested.
// Dependencies: async-trait, reqwest, url
// ============================================================================

//! ## Overview
//! A [`Transport`] performs one HTTP POST and reports the status code and the
//! response body. The body is read to the end; a failure while reading is
//! returned alongside the bytes obtained so far so the caller can decide how
//! it matters for the status at hand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use url::Url;

use crate::error::RequestFailure;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A fully built POST request.
#[derive(Clone)]
pub struct TransportRequest {
    /// Target URL.
    pub url: Url,
    /// Request headers; names may repeat.
    pub headers: HeaderMap,
    /// Request body bytes.
    pub body: Vec<u8>,
}

/// Status and body of a completed exchange.
///
/// # Invariants
/// - `body` holds every byte read before `body_error` occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
    /// Error raised while reading the body, if any.
    pub body_error: Option<String>,
}

impl TransportResponse {
    /// Builds a fully read response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            body_error: None,
        }
    }
}

// ============================================================================
// SECTION: Transport Trait
// ============================================================================

/// Performs the HTTP exchange with the decision service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and reads the response body.
    ///
    /// # Errors
    ///
    /// Returns [`RequestFailure::Transport`] when no response was received.
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, RequestFailure>;
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// [`Transport`] backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Reqwest client instance.
    client: Client,
}

impl HttpTransport {
    /// Builds a transport with a default client.
    ///
    /// # Errors
    ///
    /// Returns [`RequestFailure::Transport`] when the client cannot be built.
    pub fn new() -> Result<Self, RequestFailure> {
        let client = Client::builder()
            .build()
            .map_err(|err| RequestFailure::Transport(err.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, RequestFailure> {
        let response = self
            .client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|err| RequestFailure::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let (body, body_error) = read_body(response).await;
        Ok(TransportResponse {
            status,
            body,
            body_error,
        })
    }
}

/// Reads the body to the end, keeping partial bytes on failure.
async fn read_body(mut response: reqwest::Response) -> (Vec<u8>, Option<String>) {
    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => return (body, None),
            Err(err) => return (body, Some(err.to_string())),
        }
    }
}
