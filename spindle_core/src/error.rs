use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SpinError {
    /// Programming-level defect: an internally generated value violated a
    /// domain constraint (e.g. negative RCF into a conversion).
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Operation refused in the current run state; recovered locally.
    #[error("rejected: {0}")]
    Rejected(&'static str),
    #[error("hardware error: {0}")]
    Hardware(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motor driver")]
    MissingMotor,
    #[error("missing panel")]
    MissingPanel,
    #[error("missing buzzer")]
    MissingBuzzer,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
