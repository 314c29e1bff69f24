// crates/decision-query-core/src/config.rs
// ============================================================================
// Module: Decision Query Configuration
// Description: Caller-supplied configuration and its validation.
// Purpose: Reject malformed URL, format, header and metadata values before I/O.
// Dependencies: regex, reqwest, url
// ============================================================================

//! ## Overview
//! [`QueryConfig`] holds the raw values handed over by the flag parser.
//! [`QueryConfig::validate`] checks every rule and returns a typed
//! [`ValidatedConfig`] that the rest of the pipeline consumes. No network or
//! file I/O happens here.
//!
//! Header values may carry credentials; `Debug` output redacts them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use url::Url;

use crate::error::QueryError;
use crate::error::QueryResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path value selecting a standard stream instead of a file.
pub const STDIO_PATH: &str = "-";
/// Default key under which metadata is injected.
pub const DEFAULT_METADATA_FIELD: &str = "metadata";
/// Flag name reported for URL failures.
const URL_FLAG: &str = "--url";
/// Flag name reported for format failures.
const FORMAT_FLAG: &str = "--format";
/// Flag name reported for header failures.
const HEADER_FLAG: &str = "--http-header";
/// Flag name reported for metadata entry failures.
const METADATA_FLAG: &str = "--metadata";
/// Flag name reported for metadata field failures.
const METADATA_FIELD_FLAG: &str = "--metadata-field";

/// `Name: value` with an ASCII word/hyphen token before the colon.
static HEADER_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+:.+$"));
/// `key=value` with an ASCII word/hyphen/underscore key.
static METADATA_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+=.+$"));

// ============================================================================
// SECTION: Raw Configuration
// ============================================================================

/// Raw configuration as supplied by the flag parser.
///
/// # Invariants
/// - Values are untrusted until [`QueryConfig::validate`] succeeds.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Absolute query URL of the decision service.
    pub url: String,
    /// Input format label (`json` or `yaml`).
    pub format: String,
    /// Input path, `-` for stdin.
    pub input: String,
    /// Output path, `-` for stdout.
    pub output: String,
    /// Raw `Name: value` header strings, in order.
    pub headers: Vec<String>,
    /// Raw `key=value` metadata strings, in order.
    pub metadata: Vec<String>,
    /// Key under which metadata is injected.
    pub metadata_field: String,
    /// Key under which decoded data is nested; empty disables nesting.
    pub data_field: String,
    /// Request a non-zero exit when the result is defined.
    pub fail_on_defined: bool,
    /// Request a non-zero exit when the result is undefined.
    pub fail_on_undefined: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            format: InputFormat::Json.as_str().to_string(),
            input: STDIO_PATH.to_string(),
            output: STDIO_PATH.to_string(),
            headers: Vec::new(),
            metadata: Vec::new(),
            metadata_field: DEFAULT_METADATA_FIELD.to_string(),
            data_field: String::new(),
            fail_on_defined: false,
            fail_on_undefined: false,
        }
    }
}

impl fmt::Debug for QueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<String> = self.headers.iter().map(|raw| redact_raw_header(raw)).collect();
        f.debug_struct("QueryConfig")
            .field("url", &self.url)
            .field("format", &self.format)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("headers", &headers)
            .field("metadata", &self.metadata)
            .field("metadata_field", &self.metadata_field)
            .field("data_field", &self.data_field)
            .field("fail_on_defined", &self.fail_on_defined)
            .field("fail_on_undefined", &self.fail_on_undefined)
            .finish()
    }
}

impl QueryConfig {
    /// Validates the configuration and returns its typed form.
    ///
    /// Rules are checked in order and the first violation is returned.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidConfiguration`] naming the offending flag.
    pub fn validate(&self) -> QueryResult<ValidatedConfig> {
        let url = parse_url(&self.url)?;
        let format = InputFormat::parse(&self.format).ok_or_else(|| {
            QueryError::invalid_configuration(
                FORMAT_FLAG,
                format!("format must be one of json, yaml (got {:?})", self.format),
            )
        })?;

        let mut headers = Vec::with_capacity(self.headers.len());
        for raw in &self.headers {
            headers.push(HeaderEntry::parse(raw)?);
        }

        let metadata = if self.metadata.is_empty() {
            None
        } else {
            if self.metadata_field.is_empty() {
                return Err(QueryError::invalid_configuration(
                    METADATA_FIELD_FLAG,
                    "metadata field name is required when metadata is given",
                ));
            }
            Some(parse_metadata(&self.metadata)?)
        };

        let data_field = if self.data_field.is_empty() { None } else { Some(self.data_field.clone()) };

        Ok(ValidatedConfig {
            url,
            format,
            input: IoPath::parse(&self.input),
            output: IoPath::parse(&self.output),
            headers,
            metadata,
            metadata_field: self.metadata_field.clone(),
            data_field,
            fail_on_defined: self.fail_on_defined,
            fail_on_undefined: self.fail_on_undefined,
        })
    }
}

// ============================================================================
// SECTION: Validated Configuration
// ============================================================================

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Concatenated JSON values.
    Json,
    /// `---` separated YAML documents.
    Yaml,
}

impl InputFormat {
    /// Returns the canonical format label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Parses an exact format label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(Self::Json),
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Input or output location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoPath {
    /// The injected standard stream.
    Std,
    /// A file on disk.
    File(PathBuf),
}

impl IoPath {
    /// Maps `-` to [`IoPath::Std`] and anything else to a file path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == STDIO_PATH { Self::Std } else { Self::File(PathBuf::from(value)) }
    }

    /// Returns the label used in error context.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Std => STDIO_PATH.to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// A parsed custom request header.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Header name.
    pub name: HeaderName,
    /// Header value.
    pub value: HeaderValue,
}

impl HeaderEntry {
    /// Parses a `Name: value` string, trimming both parts.
    ///
    /// The value is everything after the first colon.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidConfiguration`] naming `--http-header`.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let pattern = compiled(&HEADER_PATTERN, HEADER_FLAG)?;
        if !pattern.is_match(raw) {
            return Err(QueryError::invalid_configuration(
                HEADER_FLAG,
                format!("header must match `Name: value` (got {:?})", redact_raw_header(raw)),
            ));
        }
        let Some((name, value)) = raw.split_once(':') else {
            return Err(QueryError::invalid_configuration(HEADER_FLAG, "header is missing `:`"));
        };
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|err| {
            QueryError::invalid_configuration(HEADER_FLAG, format!("invalid header name: {err}"))
        })?;
        let value = HeaderValue::from_str(value.trim()).map_err(|_| {
            QueryError::invalid_configuration(HEADER_FLAG, format!("invalid value for header {name}"))
        })?;
        Ok(Self {
            name,
            value,
        })
    }
}

impl fmt::Debug for HeaderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderEntry")
            .field("name", &self.name.as_str())
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Metadata key/value mapping injected into the payload.
pub type Metadata = BTreeMap<String, String>;

/// Configuration after validation.
///
/// # Invariants
/// - `url` is absolute and has a host.
/// - `metadata` is `Some` only when at least one entry was given, and then
///   `metadata_field` is non-empty.
/// - `data_field` is `None` when nesting is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Query URL.
    pub url: Url,
    /// Input format.
    pub format: InputFormat,
    /// Input location.
    pub input: IoPath,
    /// Output location.
    pub output: IoPath,
    /// Custom request headers, in order.
    pub headers: Vec<HeaderEntry>,
    /// Metadata mapping, last duplicate key wins.
    pub metadata: Option<Metadata>,
    /// Key under which metadata is injected.
    pub metadata_field: String,
    /// Key under which decoded data is nested.
    pub data_field: Option<String>,
    /// Request a non-zero exit when the result is defined.
    pub fail_on_defined: bool,
    /// Request a non-zero exit when the result is undefined.
    pub fail_on_undefined: bool,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses the query URL and requires a scheme and host.
fn parse_url(raw: &str) -> QueryResult<Url> {
    if raw.is_empty() {
        return Err(QueryError::invalid_configuration(URL_FLAG, "url is required"));
    }
    let url = Url::parse(raw).map_err(|err| {
        QueryError::invalid_configuration(URL_FLAG, format!("invalid url {raw:?}: {err}"))
    })?;
    if !url.has_host() {
        return Err(QueryError::invalid_configuration(
            URL_FLAG,
            format!("url must be absolute with a host (got {raw:?})"),
        ));
    }
    Ok(url)
}

/// Parses `key=value` entries; the value is everything after the first `=`.
fn parse_metadata(entries: &[String]) -> QueryResult<Metadata> {
    let pattern = compiled(&METADATA_PATTERN, METADATA_FLAG)?;
    let mut metadata = Metadata::new();
    for entry in entries {
        let parsed = if pattern.is_match(entry) { entry.split_once('=') } else { None };
        let Some((key, value)) = parsed else {
            return Err(QueryError::invalid_configuration(
                METADATA_FLAG,
                format!("metadata must match `key=value` (got {entry:?})"),
            ));
        };
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}

/// Returns a compiled pattern or a configuration error for the flag.
fn compiled<'a>(
    pattern: &'a LazyLock<Result<Regex, regex::Error>>,
    target: &str,
) -> QueryResult<&'a Regex> {
    match &**pattern {
        Ok(regex) => Ok(regex),
        Err(err) => {
            Err(QueryError::invalid_configuration(target, format!("pattern error: {err}")))
        }
    }
}

/// Hides the value part of a raw header string.
fn redact_raw_header(raw: &str) -> String {
    match raw.split_once(':') {
        Some((name, _)) => format!("{name}: <redacted>"),
        None => "<redacted>".to_string(),
    }
}
