//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::StationId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("station {0} not found")]
    UnknownStation(StationId),

    #[error("invalid station table: {0}")]
    InvalidStationTable(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `ems-core`.
pub type CoreResult<T> = Result<T, CoreError>;
