//! Records exchanged with storage and API collaborators.
//!
//! These mirror the loosely typed documents the backend stores. Converting
//! them into [`Slot`] and [`AvailabilityWindow`] is where string timestamps
//! get parsed; everything past this module works on validated core types.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::{GroupSchedule, Schedule, ScheduledSlot, Slot, TimeInterval};
use crate::window::AvailabilityWindow;

// ── IntervalRecord ──────────────────────────────────────────────────────────

/// The plain JSON shape of an interval: hours as floats plus a meeting flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub day: u8,
    pub start: f64,
    pub length: f64,
    #[serde(default)]
    pub is_meeting: bool,
}

impl From<&IntervalRecord> for Slot {
    fn from(record: &IntervalRecord) -> Self {
        let interval = TimeInterval::new(record.day, record.start, record.length);
        if record.is_meeting {
            Slot::Meeting(interval)
        } else {
            Slot::Busy(interval)
        }
    }
}

impl From<&ScheduledSlot> for IntervalRecord {
    fn from(scheduled: &ScheduledSlot) -> Self {
        let interval = scheduled.slot.interval();
        Self {
            id: Some(scheduled.id.clone()),
            day: interval.day,
            start: interval.start,
            length: interval.length,
            is_meeting: scheduled.slot.is_meeting(),
        }
    }
}

impl GroupSchedule {
    /// The schedule as boundary records, identifiers included.
    pub fn to_records(&self) -> Vec<IntervalRecord> {
        self.slots().iter().map(IntervalRecord::from).collect()
    }
}

impl Schedule {
    /// Build a schedule from boundary records, ignoring their identifiers.
    pub fn from_records(records: &[IntervalRecord]) -> Self {
        records.iter().map(Slot::from).collect()
    }
}

// ── TimeSlotRecord ──────────────────────────────────────────────────────────

/// A stored busy slot or meeting: an ISO-8601 start and a length in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub day: u8,
    /// Start timestamp; only its wall-clock time of day is used.
    pub start: String,
    /// Length in minutes.
    pub length: i64,
    #[serde(default)]
    pub is_meeting: bool,
}

impl TimeSlotRecord {
    /// Convert into a validated slot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRecord`] if `start` is not a timestamp,
    /// or [`EngineError::InvalidInterval`] if the resulting interval is out of
    /// bounds.
    pub fn to_slot(&self) -> Result<Slot> {
        let time = parse_timestamp(&self.start)?.time();
        let start = f64::from(time.num_seconds_from_midnight()) / 3600.0;
        let interval = TimeInterval::new(self.day, start, self.length as f64 / 60.0);
        interval.validate()?;
        Ok(if self.is_meeting {
            Slot::Meeting(interval)
        } else {
            Slot::Busy(interval)
        })
    }
}

/// Convert stored slots into a schedule, failing on the first bad record.
pub fn schedule_from_time_slots(records: &[TimeSlotRecord]) -> Result<Schedule> {
    records.iter().map(TimeSlotRecord::to_slot).collect()
}

// ── RandomCoffeeRecord ──────────────────────────────────────────────────────

/// A user's stored random-coffee preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomCoffeeRecord {
    #[serde(default)]
    pub is_enabled: bool,
    /// Local opening time, `"HH:MM"`.
    pub start_time: Option<String>,
    /// Local closing time, `"HH:MM"`.
    pub end_time: Option<String>,
    /// UTC offset in minutes, as a string (`"-120"`).
    pub timezone: Option<String>,
    /// RFC 3339 instant of the last invite.
    #[serde(default)]
    pub last_invite_time: Option<String>,
}

impl RandomCoffeeRecord {
    /// Convert into an availability window.
    ///
    /// A disabled record with missing fields becomes a disabled, empty window.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRecord`] when an enabled record lacks a
    /// field or a field cannot be parsed.
    pub fn to_window(&self) -> Result<AvailabilityWindow> {
        let last_invite = self
            .last_invite_time
            .as_deref()
            .map(parse_instant)
            .transpose()?;

        let fields = (
            self.start_time.as_deref(),
            self.end_time.as_deref(),
            self.timezone.as_deref(),
        );
        let (start, end, timezone) = match fields {
            (Some(start), Some(end), Some(timezone)) => (start, end, timezone),
            _ if !self.is_enabled => {
                return Ok(AvailabilityWindow {
                    enabled: false,
                    start_minute: 0,
                    end_minute: 0,
                    timezone_offset_minutes: 0,
                    last_invite,
                });
            }
            _ => {
                return Err(EngineError::InvalidRecord(
                    "enabled random coffee needs start_time, end_time and timezone".to_string(),
                ));
            }
        };

        Ok(AvailabilityWindow {
            enabled: self.is_enabled,
            start_minute: parse_minute_of_day(start)?,
            end_minute: parse_minute_of_day(end)?,
            timezone_offset_minutes: timezone.trim().parse().map_err(|_| {
                EngineError::InvalidRecord(format!("timezone offset '{timezone}' is not an integer"))
            })?,
            last_invite,
        })
    }
}

impl From<&AvailabilityWindow> for RandomCoffeeRecord {
    fn from(window: &AvailabilityWindow) -> Self {
        let format_minute = |m: u16| format!("{:02}:{:02}", m / 60, m % 60);
        Self {
            is_enabled: window.enabled,
            start_time: Some(format_minute(window.start_minute)),
            end_time: Some(format_minute(window.end_minute)),
            timezone: Some(window.timezone_offset_minutes.to_string()),
            last_invite_time: window.last_invite.map(|t| t.to_rfc3339()),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, or an ISO-8601 one without offset.
fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| EngineError::InvalidRecord(format!("'{s}': {e}")))
}

/// Parse an instant; timestamps without offset are taken as UTC.
fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_timestamp(s).map(|naive| naive.and_utc())
}

/// Parse `"HH:MM"` or `"HH:MM:SS"` into a minute of day.
fn parse_minute_of_day(s: &str) -> Result<u16> {
    let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| EngineError::InvalidRecord(format!("time of day '{s}': {e}")))?;
    Ok((time.hour() * 60 + time.minute()) as u16)
}
