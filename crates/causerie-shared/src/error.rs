use thiserror::Error;

#[derive(Error, Debug)]
pub enum CauserieError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Fallback image index out of range: {0}")]
    InvalidFallback(usize),
}
