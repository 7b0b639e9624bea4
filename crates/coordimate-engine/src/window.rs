//! Daily availability windows for random-coffee matching.
//!
//! A window is a recurring local time range plus the user's fixed UTC offset.
//! Before two windows are compared they are moved onto a shared UTC minute
//! axis biased by one day, so that a negative offset never takes a value
//! below zero.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::MINUTES_PER_DAY;

/// Largest accepted absolute UTC offset, in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 1440;

/// A user's opt-in for random-coffee meetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Whether the user takes part in matching at all.
    pub enabled: bool,
    /// Local minute of day the window opens (`0..=1439`).
    pub start_minute: u16,
    /// Local minute of day the window closes (`0..=1439`). A value below
    /// `start_minute` means the window runs past local midnight.
    pub end_minute: u16,
    /// Minutes to add to local time to get UTC (UTC+02:00 is `-120`).
    pub timezone_offset_minutes: i32,
    /// When the user last received a match invite.
    pub last_invite: Option<DateTime<Utc>>,
}

/// A window placed on the biased UTC minute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiasedSpan {
    pub start: i64,
    pub end: i64,
}

impl AvailabilityWindow {
    /// An enabled window with no invite history.
    pub fn new(start_minute: u16, end_minute: u16, timezone_offset_minutes: i32) -> Self {
        Self {
            enabled: true,
            start_minute,
            end_minute,
            timezone_offset_minutes,
            last_invite: None,
        }
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_hours(self, start_minute: u16, end_minute: u16) -> Self {
        Self {
            start_minute,
            end_minute,
            ..self
        }
    }

    pub fn with_timezone_offset(self, timezone_offset_minutes: i32) -> Self {
        Self {
            timezone_offset_minutes,
            ..self
        }
    }

    pub fn with_last_invite(self, last_invite: DateTime<Utc>) -> Self {
        Self {
            last_invite: Some(last_invite),
            ..self
        }
    }

    /// Check minute-of-day and offset bounds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedWindow`] when a minute is outside
    /// `0..=1439`, the offset exceeds ±1440 minutes, or the window is empty.
    pub fn validate(&self) -> Result<()> {
        for (name, minute) in [("start", self.start_minute), ("end", self.end_minute)] {
            if i64::from(minute) >= MINUTES_PER_DAY {
                return Err(EngineError::MalformedWindow(format!(
                    "{name} minute {minute} is outside 0..=1439"
                )));
            }
        }
        if self.timezone_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(EngineError::MalformedWindow(format!(
                "timezone offset {} exceeds ±{MAX_OFFSET_MINUTES} minutes",
                self.timezone_offset_minutes
            )));
        }
        if self.start_minute == self.end_minute {
            return Err(EngineError::MalformedWindow(format!(
                "window opens and closes at minute {}",
                self.start_minute
            )));
        }
        Ok(())
    }

    /// Whether the last invite happened less than `cooldown` before `now`.
    pub fn is_cooling_down(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        self.last_invite
            .is_some_and(|last_invite| now - last_invite < cooldown)
    }

    /// Place the window on the UTC axis, shifted by one full day.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedWindow`] if [`validate`](Self::validate)
    /// fails.
    pub fn biased_span(&self) -> Result<BiasedSpan> {
        self.validate()?;
        let bias = MINUTES_PER_DAY + i64::from(self.timezone_offset_minutes);
        let start = i64::from(self.start_minute) + bias;
        let mut end = i64::from(self.end_minute) + bias;
        if self.end_minute < self.start_minute {
            end += MINUTES_PER_DAY;
        }
        Ok(BiasedSpan { start, end })
    }
}
