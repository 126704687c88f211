use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("travel table parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
