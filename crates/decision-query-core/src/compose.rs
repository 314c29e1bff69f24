// crates/decision-query-core/src/compose.rs
// ============================================================================
// Module: Decision Query Payload Composer
// Description: Merges decoded input with metadata and optional nesting.
// Purpose: Build the exact payload sent as the query input.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! | data field | metadata | payload |
//! |---|---|---|
//! | no | no | decoded value unchanged |
//! | no | yes | decoded object with `metadata_field` set; non-objects are rejected |
//! | yes | no | `{ data_field: decoded }` |
//! | yes | yes | `{ data_field: decoded, metadata_field: metadata }` |

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::config::Metadata;
use crate::error::QueryError;
use crate::error::QueryResult;

// ============================================================================
// SECTION: Composition
// ============================================================================

/// Composes the query payload from the decoded input.
///
/// An existing `metadata_field` key in the decoded object is overwritten.
///
/// # Errors
///
/// Returns [`QueryError::InvalidConfiguration`] when metadata is given without
/// a data field and the decoded value is not an object.
pub fn compose(
    decoded: Value,
    metadata: Option<&Metadata>,
    metadata_field: &str,
    data_field: Option<&str>,
) -> QueryResult<Value> {
    match (data_field, metadata) {
        (None, None) => Ok(decoded),
        (None, Some(metadata)) => {
            let Value::Object(mut root) = decoded else {
                return Err(QueryError::invalid_configuration(
                    "--metadata",
                    "metadata can be injected only into object-type data",
                ));
            };
            root.insert(metadata_field.to_string(), metadata_value(metadata));
            Ok(Value::Object(root))
        }
        (Some(data_field), metadata) => {
            let mut root = Map::new();
            root.insert(data_field.to_string(), decoded);
            if let Some(metadata) = metadata {
                root.insert(metadata_field.to_string(), metadata_value(metadata));
            }
            Ok(Value::Object(root))
        }
    }
}

/// Converts the metadata mapping into a JSON object of strings.
fn metadata_value(metadata: &Metadata) -> Value {
    Value::Object(
        metadata.iter().map(|(key, value)| (key.clone(), Value::String(value.clone()))).collect(),
    )
}
