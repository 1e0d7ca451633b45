use chrono::NaiveDate;
use thiserror::Error;

// Upstream failures never land here; they degrade the affected source.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid date window {start} to {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("a {days}-day window ending before {today} is out of range")]
    WindowOutOfRange { days: i64, today: NaiveDate },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read fixture {path}: {source}")]
    Fixture {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
