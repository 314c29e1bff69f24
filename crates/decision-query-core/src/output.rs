// crates/decision-query-core/src/output.rs
// ============================================================================
// Module: Decision Query Output Encoder
// Description: Writes the query result as pretty JSON.
// Purpose: Emit the service answer to a file or the injected stdout.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Output is always a single JSON document, indented with two spaces and
//! terminated by a newline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;

use serde::Serialize;

use crate::config::IoPath;
use crate::error::QueryError;
use crate::error::QueryResult;

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Writes `result` to the output location.
///
/// Files are created or truncated; `stdout` is only touched when `path` is
/// [`IoPath::Std`].
///
/// # Errors
///
/// Returns [`QueryError::Io`] when the destination cannot be created or written.
pub fn write_output<T: Serialize>(
    result: &T,
    path: &IoPath,
    stdout: &mut dyn Write,
) -> QueryResult<()> {
    let label = path.label();
    match path {
        IoPath::Std => encode(result, stdout, &label),
        IoPath::File(file_path) => {
            let file = File::create(file_path).map_err(|err| QueryError::io(&label, &err))?;
            let mut writer = BufWriter::new(file);
            encode(result, &mut writer, &label)?;
            let file = writer.into_inner().map_err(|err| QueryError::io(&label, err.error()))?;
            file.sync_all().map_err(|err| QueryError::io(&label, &err))
        }
    }
}

/// Encodes `result` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns [`QueryError::Io`] when serialization or the write fails.
pub fn encode<T: Serialize, W: Write>(result: &T, mut writer: W, label: &str) -> QueryResult<()> {
    let mut bytes = serde_json::to_vec_pretty(result).map_err(|err| QueryError::Io {
        path: label.to_string(),
        reason: err.to_string(),
    })?;
    bytes.push(b'\n');
    writer.write_all(&bytes).map_err(|err| QueryError::io(label, &err))?;
    writer.flush().map_err(|err| QueryError::io(label, &err))
}
