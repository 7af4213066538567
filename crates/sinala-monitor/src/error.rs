#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(String),

    #[error("not a ppm reading: {0:?}")]
    InvalidReading(String),

    #[error(transparent)]
    Core(#[from] sinala_core::Error),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
