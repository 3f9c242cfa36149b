use thiserror::Error;

use crate::data::Period;

/// Invalid run parameters. Raised before any model is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capacity: instructor capacity must be a positive integer")]
    Capacity,

    #[error("maxSpread: spread ceiling must be non-negative, got {0}")]
    MaxSpread(i64),

    #[error("timeLimitSecs: solver time limit must be a positive number of seconds")]
    TimeLimit,

    #[error("price: instructor price must be positive")]
    Price,

    #[error("poolSize: candidate pool must hold at least one instructor per skill")]
    PoolSize,
}

/// Inconsistent planning horizon or dates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("planning horizon has no periods")]
    EmptyHorizon,

    #[error("excluded period {period} is outside the horizon of {len} periods")]
    ExcludedOutOfRange { period: Period, len: usize },

    #[error("unknown period label: {0}")]
    UnknownLabel(String),

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("date {0} is outside the planning horizon")]
    DateOutsideHorizon(String),

    #[error("no valid start window between periods {first} and {last} for a {duration}-period course")]
    EmptyStartWindow {
        first: Period,
        last: Period,
        duration: u32,
    },
}

/// Fatal errors of an allocation run. Infeasibility is not one of them.
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("invalid parameter {0}")]
    Config(#[from] ConfigError),

    #[error("invalid calendar: {0}")]
    Calendar(#[from] CalendarError),

    #[error("solver backend failed: {0}")]
    Backend(String),
}
