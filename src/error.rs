//! Error types for model construction, snapshot loading and configuration
//!
//! The scan and locate passes never fail; every problem they meet degrades
//! to a partial result instead.

use thiserror::Error;

/// Result type for asset-refs operations
pub type Result<T> = std::result::Result<T, FinderError>;

/// Errors raised while building or loading the object model
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Type already registered: {0}")]
    DuplicateType(String),

    #[error("Base type cycle through {0}")]
    TypeCycle(String),

    #[error("Invalid type token: {0:?}")]
    InvalidTypeToken(String),

    #[error("Wrapped asset {name} must wrap a raw asset, got {wraps}")]
    InvalidWrap { name: String, wraps: String },

    #[error("Type {ty} has no field {field}")]
    UnknownField { ty: String, field: String },

    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Object already exists: {0}")]
    DuplicateObject(u64),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
