use thiserror::Error;

pub type SafeshareResult<T> = Result<T, SafeshareError>;

#[derive(Debug, Error)]
pub enum SafeshareError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
