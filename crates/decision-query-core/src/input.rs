// crates/decision-query-core/src/input.rs
// ============================================================================
// Module: Decision Query Input Decoder
// Description: Reads and decodes JSON or YAML document streams.
// Purpose: Turn the raw input into one normalized structured value.
// Dependencies: serde, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! The decoder reads every top-level document from a file or the injected
//! stdin and normalizes it into a [`serde_json::Value`]. YAML mappings with
//! non-string keys are rewritten with string keys so a YAML document is
//! interchangeable with its JSON spelling.
//!
//! Invariants:
//! - Exactly one document collapses to that document.
//! - Zero or several documents become an array in stream order.
//! - A file handle never outlives [`read_input`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::BufReader;
use std::io::Read;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::config::InputFormat;
use crate::config::IoPath;
use crate::error::QueryError;
use crate::error::QueryResult;

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Reads the input location and decodes it in the given format.
///
/// `stdin` is only touched when `path` is [`IoPath::Std`].
///
/// # Errors
///
/// Returns [`QueryError::Io`] when the file cannot be opened or read and
/// [`QueryError::Decode`] when a document is malformed.
pub fn read_input(path: &IoPath, format: InputFormat, stdin: &mut dyn Read) -> QueryResult<Value> {
    let label = path.label();
    match path {
        IoPath::Std => decode(stdin, format, &label),
        IoPath::File(file_path) => {
            let file = File::open(file_path).map_err(|err| QueryError::io(&label, &err))?;
            decode(BufReader::new(file), format, &label)
        }
    }
}

/// Decodes every document in `reader` and applies the collapse rule.
///
/// `path` is only used for error context.
///
/// # Errors
///
/// Returns [`QueryError::Decode`] for malformed documents and
/// [`QueryError::Io`] when the reader fails.
pub fn decode<R: Read>(reader: R, format: InputFormat, path: &str) -> QueryResult<Value> {
    let documents = match format {
        InputFormat::Json => decode_json_stream(reader, path)?,
        InputFormat::Yaml => decode_yaml_stream(reader, path)?,
    };
    Ok(collapse(documents))
}

/// Collapses a single document to itself; anything else becomes an array.
#[must_use]
pub fn collapse(mut documents: Vec<Value>) -> Value {
    if documents.len() == 1
        && let Some(document) = documents.pop()
    {
        return document;
    }
    Value::Array(documents)
}

/// Converts a YAML value into a JSON value with string-keyed mappings.
///
/// Non-string keys take their scalar spelling (`1`, `true`, `null`); sequence
/// or mapping keys take the compact JSON of their normalized form. Tags are
/// dropped.
///
/// # Errors
///
/// Returns a message when a number has no JSON representation.
pub fn normalize_yaml(value: serde_yaml::Value) -> Result<Value, String> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(flag) => Ok(Value::Bool(flag)),
        serde_yaml::Value::Number(number) => yaml_number(&number),
        serde_yaml::Value::String(text) => Ok(Value::String(text)),
        serde_yaml::Value::Sequence(items) => {
            let items = items.into_iter().map(normalize_yaml).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, normalize_yaml(value)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => normalize_yaml(tagged.value),
    }
}

// ============================================================================
// SECTION: Format Decoders
// ============================================================================

/// Decodes consecutive whitespace-separated JSON values.
fn decode_json_stream<R: Read>(reader: R, path: &str) -> QueryResult<Vec<Value>> {
    let mut documents = Vec::new();
    for document in serde_json::Deserializer::from_reader(reader).into_iter::<Value>() {
        let document = document.map_err(|err| {
            if err.is_io() {
                QueryError::Io {
                    path: path.to_string(),
                    reason: err.to_string(),
                }
            } else {
                decode_error(path, InputFormat::Json, &err)
            }
        })?;
        documents.push(document);
    }
    Ok(documents)
}

/// Decodes `---` separated YAML documents.
///
/// A stream with nothing but blank lines and comments holds no document; an
/// explicit `---` with no content is a null document.
fn decode_yaml_stream<R: Read>(mut reader: R, path: &str) -> QueryResult<Vec<Value>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|err| QueryError::io(path, &err))?;
    let text = String::from_utf8(bytes).map_err(|err| decode_error(path, InputFormat::Yaml, &err))?;
    if !has_yaml_content(&text) {
        return Ok(Vec::new());
    }
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&text) {
        let raw = serde_yaml::Value::deserialize(document)
            .map_err(|err| decode_error(path, InputFormat::Yaml, &err))?;
        let normalized =
            normalize_yaml(raw).map_err(|reason| decode_error(path, InputFormat::Yaml, &reason))?;
        documents.push(normalized);
    }
    Ok(documents)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when any line carries more than whitespace or a comment.
fn has_yaml_content(text: &str) -> bool {
    text.lines().map(str::trim).any(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Converts a YAML number, preferring integer representations.
fn yaml_number(number: &serde_yaml::Number) -> Result<Value, String> {
    if let Some(unsigned) = number.as_u64() {
        return Ok(Value::from(unsigned));
    }
    if let Some(signed) = number.as_i64() {
        return Ok(Value::from(signed));
    }
    number
        .as_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("number {number} has no JSON representation"))
}

/// Renders a YAML mapping key as a string.
fn yaml_key(key: serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(text) => Ok(text),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Bool(flag) => Ok(flag.to_string()),
        serde_yaml::Value::Number(number) => Ok(number.to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        complex @ (serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_)) => {
            let normalized = normalize_yaml(complex)?;
            serde_json::to_string(&normalized).map_err(|err| err.to_string())
        }
    }
}

/// Builds a decode error for the given path and format.
fn decode_error(path: &str, format: InputFormat, error: &impl ToString) -> QueryError {
    QueryError::Decode {
        path: path.to_string(),
        format: format.as_str(),
        reason: error.to_string(),
    }
}
