//! Timer specifications: what to run, when, how often, and within what
//! daily window.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use trading_core::domain::{Datetime, TimeDelta};

use crate::error::TimerSpecError;

/// A type-erased, zero-argument callback. Arguments the caller wants to pass
/// through are expected to be bound into the closure at submission time.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Sentinel `repeat_num` meaning "repeat forever".
pub const INFINITE: u32 = u32::MAX;

/// `{start_date, end_date, start_time, end_time, repeat_num, duration,
/// callback}` — a fully-specified timer, validated once at submission
/// (§4.2.1) and never mutated afterward.
#[derive(Clone)]
pub struct TimerSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: TimeDelta,
    pub end_time: TimeDelta,
    pub repeat_num: u32,
    pub duration: TimeDelta,
    pub callback: Callback,
}

impl fmt::Debug for TimerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSpec")
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("repeat_num", &self.repeat_num)
            .field("duration", &self.duration)
            .field("callback", &"<callback>")
            .finish()
    }
}

impl TimerSpec {
    /// Whether this timer's window restricts firing to a daily
    /// `[start_time, end_time]` band, per §4.2.2 step 6 ("if a daily window
    /// applies"). A timer built with no window (`start_time == end_time`)
    /// fires freely across the day.
    pub fn has_daily_window(&self) -> bool {
        self.start_time != self.end_time
    }

    /// The instant at which this timer's overall lifetime ends.
    pub fn end_instant(&self) -> Datetime {
        trading_core::domain::datetime_from_date_and_time(self.end_date, self.end_time)
    }

    /// Enforce the validation rules of §4.2.1. Called once at submission
    /// (`Scheduler::add_func`), never again.
    pub fn validate(&self) -> Result<(), TimerSpecError> {
        if self.end_date <= self.start_date {
            return Err(TimerSpecError::EndDateNotAfterStart);
        }
        if !is_open_time_of_day(self.start_time) || !is_open_time_of_day(self.end_time) {
            return Err(TimerSpecError::TimeOfDayOutOfRange);
        }
        if self.end_time < self.start_time {
            return Err(TimerSpecError::EndTimeBeforeStart);
        }
        if self.repeat_num == 0 {
            return Err(TimerSpecError::RepeatNumZero);
        }
        if !self.duration.is_positive() {
            return Err(TimerSpecError::NonPositiveDuration);
        }
        Ok(())
    }

    /// One-shot, firing at a specific instant.
    pub fn once_at(instant: Datetime, callback: Callback) -> Self {
        let time = nonzero_time_of_day(instant);
        TimerSpec {
            start_date: instant.date(),
            end_date: instant.date() + chrono::Days::new(1),
            start_time: time,
            end_time: time,
            repeat_num: 1,
            duration: TimeDelta::one_day(),
            callback,
        }
    }

    /// One-shot, firing `delay` after `now`.
    pub fn once_after(now: Datetime, delay: TimeDelta, callback: Callback) -> Self {
        Self::once_at(now + delay, callback)
    }

    /// Fires every `duration` starting from `start`, `repeat_num` times
    /// (use [`INFINITE`] for unbounded repetition), with no daily window.
    pub fn repeating(start: Datetime, duration: TimeDelta, repeat_num: u32, callback: Callback) -> Self {
        let time = nonzero_time_of_day(start);
        let end_date = if repeat_num == INFINITE {
            Datetime::max_value().date()
        } else {
            let day_ticks = TimeDelta::one_day().ticks();
            let span_ticks = duration.ticks().max(1).saturating_mul(i64::from(repeat_num));
            let span_days = span_ticks / day_ticks + 2;
            start.date() + chrono::Days::new(span_days.max(1) as u64)
        };
        TimerSpec {
            start_date: start.date(),
            end_date,
            start_time: time,
            end_time: time,
            repeat_num,
            duration,
            callback,
        }
    }

    /// Fires every `duration` within a daily `[start_time, end_time]`
    /// window, between `start_date` and `end_date`, `repeat_num` times.
    pub fn daily_window(
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: TimeDelta,
        end_time: TimeDelta,
        duration: TimeDelta,
        repeat_num: u32,
        callback: Callback,
    ) -> Self {
        TimerSpec { start_date, end_date, start_time, end_time, repeat_num, duration, callback }
    }
}

fn is_open_time_of_day(t: TimeDelta) -> bool {
    t.ticks() > 0 && t.ticks() < TimeDelta::one_day().ticks()
}

/// `Datetime::time_of_day` can land exactly on midnight, which the open
/// interval `(0, 24h)` rejects; nudge forward by a microsecond so the
/// convenience constructors never hand `validate` an instant they can't
/// themselves satisfy.
fn nonzero_time_of_day(dt: Datetime) -> TimeDelta {
    let t = dt.time_of_day();
    if t.ticks() == 0 {
        TimeDelta::from_micros(1)
    } else {
        t
    }
}
