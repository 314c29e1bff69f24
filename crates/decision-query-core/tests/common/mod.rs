// crates/decision-query-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared HTTP test server and stub transports for core tests.
// Purpose: Stand in for the decision service without external processes.
// Dependencies: async-trait, bytes, decision-query-core, http-body-util, hyper, tokio
// ============================================================================

//! ## Overview
//! [`FakeDecisionService`] is a hyper-backed stand-in for the decision service:
//! it records every request and answers through a caller-supplied responder.
//! [`StubTransport`] and [`HangingTransport`] replace the network entirely.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]
#![allow(dead_code, reason = "Each test crate uses a different subset of the helpers.")]

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use decision_query_core::RequestFailure;
use decision_query_core::Transport;
use decision_query_core::TransportRequest;
use decision_query_core::TransportResponse;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Received Requests
// ============================================================================

/// Request as seen by the decision service double.
#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    /// Request method.
    pub method: hyper::Method,
    /// Request path and query.
    pub path: String,
    /// Request headers.
    pub headers: hyper::HeaderMap,
    /// Raw request body bytes.
    pub body: Bytes,
}

impl ReceivedRequest {
    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is json")
    }

    /// Returns every value sent for a header name, in order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|value| value.to_str().expect("ascii header").to_string())
            .collect()
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Reply the double sends back.
#[derive(Clone, Debug)]
pub struct ServiceReply {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response body bytes.
    pub body: Bytes,
}

impl ServiceReply {
    /// Builds a 200 response carrying `{"result": result}`.
    pub fn result(result: &Value) -> Self {
        Self::json(&serde_json::json!({ "result": result }))
    }

    /// Builds a 200 response with a JSON body.
    pub fn json(value: &Value) -> Self {
        let body = serde_json::to_vec(value).expect("serialize json response");
        Self {
            status: StatusCode::OK,
            body: Bytes::from(body),
        }
    }

    /// Builds a raw response with a custom status.
    pub fn raw(status: StatusCode, body: &'static [u8]) -> Self {
        Self {
            status,
            body: Bytes::from_static(body),
        }
    }
}

impl From<ServiceReply> for Response<Full<Bytes>> {
    fn from(value: ServiceReply) -> Self {
        let mut response = Response::new(Full::new(value.body));
        *response.status_mut() = value.status;
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

// ============================================================================
// SECTION: Decision Service Double
// ============================================================================

/// Computes the reply for one received request.
type Responder = dyn Fn(&ReceivedRequest) -> ServiceReply + Send + Sync;

/// Local decision service that records requests and answers via a responder.
///
/// Dropping the double stops accepting connections.
pub struct FakeDecisionService {
    /// Bound listener address.
    addr: SocketAddr,
    /// Requests in arrival order.
    received: std::sync::Mutex<mpsc::UnboundedReceiver<ReceivedRequest>>,
    /// Task accepting connections.
    accept_loop: JoinHandle<()>,
}

impl FakeDecisionService {
    /// Binds a loopback port and answers every request with `responder`.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&ReceivedRequest) -> ServiceReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let responder: Arc<Responder> = Arc::new(responder);
        let (sender, received) = mpsc::unbounded_channel();
        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(stream, Arc::clone(&responder), sender.clone()));
            }
        });
        Self {
            addr,
            received: std::sync::Mutex::new(received),
            accept_loop,
        }
    }

    /// Starts a service that always answers `{"result": result}`.
    pub async fn answering(result: Value) -> Self {
        Self::start(move |_| ServiceReply::result(&result)).await
    }

    /// Returns the URL for a path on the service.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Returns the single request received so far.
    pub fn only_request(&self) -> ReceivedRequest {
        let mut received = self.received.lock().expect("received lock");
        let request = received.try_recv().expect("one request");
        assert!(received.try_recv().is_err(), "expected exactly one request");
        request
    }
}

impl Drop for FakeDecisionService {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

/// Serves HTTP/1 requests on one accepted connection.
async fn serve_connection(
    stream: TcpStream,
    responder: Arc<Responder>,
    sender: mpsc::UnboundedSender<ReceivedRequest>,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let responder = Arc::clone(&responder);
        let sender = sender.clone();
        async move {
            let (parts, body) = request.into_parts();
            let received = ReceivedRequest {
                method: parts.method,
                path: parts.uri.path_and_query().map_or_else(String::new, ToString::to_string),
                headers: parts.headers,
                body: body.collect().await?.to_bytes(),
            };
            let response: Response<Full<Bytes>> = responder(&received).into();
            // The receiver outlives every request the test waits on.
            sender.send(received).ok();
            Ok::<_, hyper::Error>(response)
        }
    });
    if let Err(err) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
        eprintln!("decision service double: connection error: {err}");
    }
}

// ============================================================================
// SECTION: Stub Transport
// ============================================================================

/// Transport that records requests and replays a fixed outcome.
pub struct StubTransport {
    /// Outcome returned for every request.
    outcome: Result<TransportResponse, RequestFailure>,
    /// Requests received so far.
    requests: std::sync::Mutex<Vec<TransportRequest>>,
}

impl StubTransport {
    /// Replays the given response.
    pub fn responding(response: TransportResponse) -> Self {
        Self {
            outcome: Ok(response),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Replays the given transport failure.
    pub fn failing(failure: RequestFailure) -> Self {
        Self {
            outcome: Err(failure),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, RequestFailure> {
        self.requests.lock().expect("requests lock").push(request);
        self.outcome.clone()
    }
}

/// Transport that never completes.
pub struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn post(&self, _request: TransportRequest) -> Result<TransportResponse, RequestFailure> {
        std::future::pending().await
    }
}

// ============================================================================
// SECTION: Captured Output
// ============================================================================

/// Cloneable in-memory writer used as the pipeline stdout.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    /// Bytes written so far.
    bytes: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Returns everything written so far as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8(self.bytes.lock().expect("buffer lock").clone()).expect("utf-8 output")
    }
}

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
