//! Structured error types for timer validation and scheduler operation.

/// Raised by [`crate::timer::TimerSpec::validate`] — a configuration error
/// per spec §7 class 1, surfaced to the caller before a timer ever reaches
/// the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerSpecError {
    #[error("end_date must be strictly after start_date")]
    EndDateNotAfterStart,
    #[error("start_time/end_time must fall within (0, 24h)")]
    TimeOfDayOutOfRange,
    #[error("end_time must be >= start_time")]
    EndTimeBeforeStart,
    #[error("repeat_num must be at least 1")]
    RepeatNumZero,
    #[error("duration must be strictly positive")]
    NonPositiveDuration,
}

/// Raised by [`crate::scheduler::Scheduler`] operations — configuration and
/// resource-exhaustion errors per spec §7 classes 1 and 4.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid timer specification: {0}")]
    InvalidSpec(#[from] TimerSpecError),
    #[error("timer id space exhausted")]
    IdSpaceExhausted,
    #[error("failed to build worker pool: {0}")]
    PoolInit(String),
}
