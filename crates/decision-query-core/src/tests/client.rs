// crates/decision-query-core/src/tests/client.rs
// ============================================================================
// Module: Envelope Helper Tests
// Description: Unit tests for request encoding and response decoding.
// Purpose: Pin the envelope protocol independently of any transport.
// Dependencies: decision-query-core client, serde, serde_json
// ============================================================================

//! ## Overview
//! Covers status handling, body read failures and result extraction.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::client::decode_response;
use crate::client::encode_request;
use crate::error::ErrorKind;
use crate::error::QueryError;
use crate::error::RequestFailure;
use crate::transport::TransportResponse;

/// Typed decision result.
#[derive(Debug, Deserialize)]
struct Allow {
    /// Whether the action is allowed.
    allow: bool,
}

#[test]
fn request_wraps_payload_in_input() {
    let body = encode_request(&json!({"user": "blue"})).unwrap();
    let sent: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(sent, json!({"input": {"user": "blue"}}));
}

#[test]
fn unserializable_payload_is_invalid_input() {
    let payload = BTreeMap::from([(vec![1_u8, 2], 3_u8)]);
    let err = encode_request(&payload).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let fields = err.fields();
    assert_eq!(fields[0].0, "payload");
    assert!(fields[0].1.contains("[1, 2]"));
}

#[test]
fn ok_response_yields_typed_result() {
    let response = TransportResponse::new(200, r#"{"result":{"allow":true}}"#);
    let result: Allow = decode_response(response).unwrap();
    assert!(result.allow);
}

#[test]
fn missing_result_is_null() {
    let response = TransportResponse::new(200, r#"{"decision_id":"abc"}"#);
    let result: Value = decode_response(response).unwrap();
    assert_eq!(result, Value::Null);
}

#[test]
fn null_body_is_undefined_result() {
    let response = TransportResponse::new(200, "null");
    let result: Value = decode_response(response).unwrap();
    assert_eq!(result, Value::Null);
}

#[test]
fn empty_body_is_unexpected_response() {
    let response = TransportResponse::new(200, "");
    let err = decode_response::<Value>(response).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);
}

#[test]
fn non_ok_status_is_request_failure_with_body() {
    let response = TransportResponse::new(500, "boom");
    let err = decode_response::<Value>(response).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestFailed);
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.fields(), vec![("code", "500".to_string()), ("body", "boom".to_string())]);
}

#[test]
fn status_wins_over_body_read_failure() {
    let response = TransportResponse {
        status: 404,
        body: b"partial".to_vec(),
        body_error: Some("connection reset".to_string()),
    };
    let err = decode_response::<Value>(response).unwrap_err();
    assert!(matches!(
        err,
        QueryError::RequestFailed(RequestFailure::Status { code: 404, .. })
    ));
}

#[test]
fn body_read_failure_on_ok_is_unexpected_response() {
    let response = TransportResponse {
        status: 200,
        body: b"{\"res".to_vec(),
        body_error: Some("connection reset".to_string()),
    };
    let err = decode_response::<Value>(response).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);
    assert_eq!(err.fields(), vec![("body", "{\"res".to_string())]);
}

#[test]
fn malformed_envelope_is_unexpected_response() {
    let response = TransportResponse::new(200, "not json");
    let err = decode_response::<Value>(response).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);
}

#[test]
fn result_shape_mismatch_is_unexpected_response() {
    let response = TransportResponse::new(200, r#"{"result":["deny"]}"#);
    let err = decode_response::<Allow>(response).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);
    assert_eq!(err.fields(), vec![("body", r#"{"result":["deny"]}"#.to_string())]);
}
