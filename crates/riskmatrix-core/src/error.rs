use std::path::PathBuf;

use thiserror::Error;

/// Validation and contract errors exposed by `riskmatrix-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid frequency '{value}', expected one of daily, weekly, monthly")]
    InvalidFrequency { value: String },
    #[error("invalid source '{value}', expected one of fred, yahoo, derived")]
    InvalidSource { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("observation dates must be strictly increasing: {previous} then {next}")]
    UnorderedObservations { previous: String, next: String },

    #[error("derived series '{symbol}' cannot reference itself")]
    SelfReferentialDerivation { symbol: String },

    #[error("indicator key '{key}' is defined more than once")]
    DuplicateIndicatorKey { key: String },
    #[error("indicator key must be non-empty snake_case: '{key}'")]
    InvalidIndicatorKey { key: String },
}

/// Malformed bucket tables. Raised once when a table is built, never while evaluating.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdTableError {
    #[error("threshold table must contain at least one bounded bucket before the catch-all")]
    NoRules,
    #[error("bound {bound} at rule {index} is not finite")]
    NonFiniteBound { index: usize, bound: f64 },
    #[error("rule {index} uses operator '{operator}' which does not match the {orientation} orientation")]
    OperatorMismatch {
        index: usize,
        operator: &'static str,
        orientation: &'static str,
    },
    #[error("rule {index} bound {bound} must be strictly {direction} than the previous bound {previous}")]
    UnorderedBounds {
        index: usize,
        bound: f64,
        previous: f64,
        direction: &'static str,
    },
    #[error("bucket {index} has an empty label")]
    EmptyLabel { index: usize },
    #[error("narrative field '{field}' collides with a reserved report key")]
    ReservedNarrativeField { field: String },
}

/// Catalog persistence failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write catalog '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog '{path}' is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize catalog for '{path}': {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog entry '{symbol}' is not defined")]
    UnknownEntry { symbol: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Snapshot file failures.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Upload failures for a single object.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy to '{path}': {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },
    #[error("upload of '{key}' rejected with status {status}")]
    Rejected { key: String, status: u16 },
    #[error("publisher is not configured: {0}")]
    NotConfigured(String),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ThresholdTable(#[from] ThresholdTableError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
