//! Sleep timer state machine
//!
//! The playback service owns the countdown. This side only records what was
//! requested and mirrors the remaining time the service reports back, so
//! there is never a second clock to drift against the first one.
//!
//! After `arm` the timer waits for the service to echo the armed duration.
//! Ticks that arrive before that echo belong to a countdown this screen has
//! already stopped and are dropped.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Fixed picker durations, in seconds
pub const SLEEP_TIMER_PRESETS: [i64; 5] = [5 * 60, 10 * 60, 20 * 60, 30 * 60, 60 * 60];

/// Picker value that opens the custom duration prompt
pub const CUSTOM_SLEEP_TIMER: i64 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepTimerState {
    Disabled,
    Armed {
        remaining_seconds: u32,
        deadline: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SleepTimerError {
    #[error("sleep timer duration must be positive, got {0}s")]
    InvalidDuration(i64),
    #[error("sleep timer is already armed")]
    AlreadyArmed,
    #[error("sleep timer is not armed")]
    NotArmed,
}

/// Outcome of a remaining-time notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepTick {
    Remaining(u32),
    Finished,
    /// Not for the countdown this timer is following
    Ignored,
}

#[derive(Clone, Debug)]
pub struct SleepTimer {
    state: SleepTimerState,
    confirmed: bool,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self {
            state: SleepTimerState::Disabled,
            confirmed: false,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SleepTimerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, SleepTimerState::Armed { .. })
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        match self.state {
            SleepTimerState::Armed {
                remaining_seconds, ..
            } => Some(remaining_seconds),
            SleepTimerState::Disabled => None,
        }
    }

    /// Arms the timer and returns the accepted duration in seconds
    pub fn arm(&mut self, duration_seconds: i64, now: DateTime<Utc>) -> Result<u32, SleepTimerError> {
        if self.is_armed() {
            return Err(SleepTimerError::AlreadyArmed);
        }
        let seconds = u32::try_from(duration_seconds)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(SleepTimerError::InvalidDuration(duration_seconds))?;

        self.state = SleepTimerState::Armed {
            remaining_seconds: seconds,
            deadline: now + Duration::seconds(i64::from(seconds)),
        };
        self.confirmed = false;
        Ok(seconds)
    }

    /// Follows a countdown that is already running in the service, such as
    /// one armed by an earlier screen. Only valid from `Disabled`.
    pub fn adopt(&mut self, remaining_seconds: u32, now: DateTime<Utc>) -> Result<(), SleepTimerError> {
        if self.is_armed() {
            return Err(SleepTimerError::AlreadyArmed);
        }
        if remaining_seconds == 0 {
            return Err(SleepTimerError::InvalidDuration(0));
        }
        self.state = SleepTimerState::Armed {
            remaining_seconds,
            deadline: now + Duration::seconds(i64::from(remaining_seconds)),
        };
        self.confirmed = true;
        Ok(())
    }

    pub fn remaining_seconds_changed(&mut self, seconds: u32, now: DateTime<Utc>) -> SleepTick {
        let SleepTimerState::Armed {
            remaining_seconds, ..
        } = self.state
        else {
            return SleepTick::Ignored;
        };

        if !self.confirmed {
            if seconds != remaining_seconds {
                return SleepTick::Ignored;
            }
            self.confirmed = true;
        }

        if seconds == 0 {
            self.state = SleepTimerState::Disabled;
            self.confirmed = false;
            return SleepTick::Finished;
        }

        self.state = SleepTimerState::Armed {
            remaining_seconds: seconds,
            deadline: now + Duration::seconds(i64::from(seconds)),
        };
        SleepTick::Remaining(seconds)
    }

    pub fn cancel(&mut self) -> Result<(), SleepTimerError> {
        if !self.is_armed() {
            return Err(SleepTimerError::NotArmed);
        }
        self.state = SleepTimerState::Disabled;
        self.confirmed = false;
        Ok(())
    }
}

impl Default for SleepTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// An entry of the sleep timer picker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SleepOption {
    pub seconds: i64,
    pub label: String,
}

impl SleepOption {
    fn new(seconds: i64) -> Self {
        Self {
            seconds,
            label: sleep_option_label(seconds),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.seconds == CUSTOM_SLEEP_TIMER
    }
}

/// Picker entries: the presets plus the last used duration when it isn't one
/// of them, ascending, followed by the custom entry.
pub fn sleep_timer_options(last_used_seconds: i64) -> Vec<SleepOption> {
    let mut options: Vec<SleepOption> = SLEEP_TIMER_PRESETS.iter().map(|s| SleepOption::new(*s)).collect();

    if last_used_seconds > 0 && !SLEEP_TIMER_PRESETS.contains(&last_used_seconds) {
        options.push(SleepOption::new(last_used_seconds));
    }

    options.sort_by_key(|o| o.seconds);
    options.push(SleepOption::new(CUSTOM_SLEEP_TIMER));
    options
}

fn sleep_option_label(seconds: i64) -> String {
    if seconds == CUSTOM_SLEEP_TIMER {
        return "Custom".to_string();
    }
    if seconds > 0 && seconds % 3600 == 0 {
        let hours = seconds / 3600;
        return if hours == 1 { "1 hour".to_string() } else { format!("{hours} hours") };
    }
    let minutes = seconds / 60;
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}
