//! Recurring weekly time intervals and the schedules built from them.
//!
//! A [`TimeInterval`] is expressed the way collaborators store it: a weekday
//! (`0` = Monday), a fractional start hour and a fractional length in hours.
//! All arithmetic happens on the linear week-minute axis (`0..10080`) in whole
//! minutes, so merged results are exact and repeatable.
//!
//! Busy and meeting intervals are separate variants of [`Slot`]. Only the
//! busy variant ever reaches the merge sweep in [`crate::aggregation`].

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Minutes in one day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minutes in one week; the length of the linear week axis.
pub const MINUTES_PER_WEEK: i64 = 7 * MINUTES_PER_DAY;

/// No interval may reach past this hour of its start day.
pub const MAX_END_HOUR: f64 = 48.0;

/// Number of days in the recurring week.
pub const DAYS_PER_WEEK: u8 = 7;

// ── TimeInterval ────────────────────────────────────────────────────────────

/// A recurring weekly time range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Day of week, `0` = Monday through `6` = Sunday.
    pub day: u8,
    /// Fractional hour of day the interval starts at (`8.5` = 08:30).
    pub start: f64,
    /// Fractional length in hours. May run past midnight into the next day.
    pub length: f64,
}

impl TimeInterval {
    pub fn new(day: u8, start: f64, length: f64) -> Self {
        Self { day, start, length }
    }

    /// Build an interval from whole minutes relative to the start of `day`.
    pub(crate) fn from_minutes(day: i64, start_minute: i64, length_minutes: i64) -> Self {
        Self {
            day: day as u8,
            start: start_minute as f64 / 60.0,
            length: length_minutes as f64 / 60.0,
        }
    }

    /// Fractional hour at which the interval ends, relative to its start day.
    pub fn end(&self) -> f64 {
        self.start + self.length
    }

    /// Check the interval against the model's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInterval`] when the day is outside `0..=6`,
    /// the start is outside `[0, 24)`, the length is not positive (or rounds
    /// to zero minutes), or the interval reaches past hour 48 of its start day.
    pub fn validate(&self) -> Result<()> {
        if self.day >= DAYS_PER_WEEK {
            return Err(EngineError::InvalidInterval(format!(
                "day {} is outside 0..=6",
                self.day
            )));
        }
        if !self.start.is_finite() || !(0.0..24.0).contains(&self.start) {
            return Err(EngineError::InvalidInterval(format!(
                "start hour {} is outside [0, 24)",
                self.start
            )));
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(EngineError::InvalidInterval(format!(
                "length {} must be positive",
                self.length
            )));
        }
        if hours_to_minutes(self.length) == 0 {
            return Err(EngineError::InvalidInterval(format!(
                "length {} is shorter than one minute",
                self.length
            )));
        }
        if self.end() > MAX_END_HOUR {
            return Err(EngineError::InvalidInterval(format!(
                "interval starting at hour {} with length {} ends past hour {}",
                self.start, self.length, MAX_END_HOUR
            )));
        }
        Ok(())
    }

    /// The interval's `[start, end)` range on the week axis, in minutes.
    ///
    /// `end` may exceed [`MINUTES_PER_WEEK`] for a Sunday interval that runs
    /// into the following Monday.
    pub(crate) fn week_range(&self) -> WeekRange {
        let start = i64::from(self.day) * MINUTES_PER_DAY + hours_to_minutes(self.start);
        WeekRange {
            start,
            end: start + hours_to_minutes(self.length),
        }
    }
}

/// Round fractional hours to the nearest whole minute.
pub(crate) fn hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}

// ── WeekRange ───────────────────────────────────────────────────────────────

/// A half-open `[start, end)` range on the linear week-minute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct WeekRange {
    pub start: i64,
    pub end: i64,
}

impl WeekRange {
    /// Fold a range that runs past the end of the week back onto its start.
    ///
    /// Yields one range, or two when the range straddles the Sunday/Monday
    /// seam.
    pub fn wrapped(self) -> impl Iterator<Item = WeekRange> {
        let (head, tail) = if self.end > MINUTES_PER_WEEK {
            (
                WeekRange {
                    start: self.start,
                    end: MINUTES_PER_WEEK,
                },
                Some(WeekRange {
                    start: 0,
                    end: self.end - MINUTES_PER_WEEK,
                }),
            )
        } else {
            (self, None)
        };
        std::iter::once(head).chain(tail)
    }

    /// Cut the range at every midnight it crosses.
    ///
    /// Assumes the range has already been wrapped into the week.
    pub fn split_by_day(self) -> Vec<TimeInterval> {
        let mut pieces = Vec::new();
        let mut cursor = self.start;
        while cursor < self.end {
            let day = cursor / MINUTES_PER_DAY;
            let day_start = day * MINUTES_PER_DAY;
            let piece_end = self.end.min(day_start + MINUTES_PER_DAY);
            pieces.push(TimeInterval::from_minutes(
                day,
                cursor - day_start,
                piece_end - cursor,
            ));
            cursor = piece_end;
        }
        pieces
    }
}

// ── Slot ────────────────────────────────────────────────────────────────────

/// One entry of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    /// Recurring unavailability, merged during aggregation.
    Busy(TimeInterval),
    /// An already scheduled meeting, carried through aggregation untouched.
    Meeting(TimeInterval),
}

impl Slot {
    pub fn busy(day: u8, start: f64, length: f64) -> Self {
        Slot::Busy(TimeInterval::new(day, start, length))
    }

    pub fn meeting(day: u8, start: f64, length: f64) -> Self {
        Slot::Meeting(TimeInterval::new(day, start, length))
    }

    pub fn interval(&self) -> &TimeInterval {
        match self {
            Slot::Busy(interval) | Slot::Meeting(interval) => interval,
        }
    }

    pub fn is_meeting(&self) -> bool {
        matches!(self, Slot::Meeting(_))
    }
}

// ── Schedule ────────────────────────────────────────────────────────────────

/// The busy and meeting slots of one user or one group.
///
/// Order carries no meaning. A schedule is an immutable value; use
/// [`Schedule::with_slot`] to derive an extended copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    slots: Vec<Slot>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// A copy of this schedule with `slot` added.
    pub fn with_slot(&self, slot: Slot) -> Self {
        let mut slots = self.slots.clone();
        slots.push(slot);
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Intervals of the busy slots, in schedule order.
    pub fn busy(&self) -> impl Iterator<Item = &TimeInterval> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Busy(interval) => Some(interval),
            Slot::Meeting(_) => None,
        })
    }

    /// Intervals of the meeting slots, in schedule order.
    pub fn meetings(&self) -> impl Iterator<Item = &TimeInterval> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Meeting(interval) => Some(interval),
            Slot::Busy(_) => None,
        })
    }

    /// Validate every slot, stopping at the first invalid one.
    pub fn validate(&self) -> Result<()> {
        self.slots.iter().try_for_each(|slot| slot.interval().validate())
    }
}

impl FromIterator<Slot> for Schedule {
    fn from_iter<I: IntoIterator<Item = Slot>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

// ── GroupSchedule ───────────────────────────────────────────────────────────

/// A slot of a computed group schedule together with its display identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    /// Opaque identifier, unique within one computed schedule only.
    pub id: String,
    pub slot: Slot,
}

/// The canonical schedule of a group.
///
/// Busy slots come first, ordered along the week and maximally merged;
/// meeting slots follow in the order their members contributed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupSchedule {
    slots: Vec<ScheduledSlot>,
}

impl GroupSchedule {
    /// Assemble a group schedule and number its slots.
    pub(crate) fn from_parts(busy: Vec<TimeInterval>, meetings: Vec<TimeInterval>) -> Self {
        let slots = busy
            .into_iter()
            .map(Slot::Busy)
            .chain(meetings.into_iter().map(Slot::Meeting))
            .enumerate()
            .map(|(i, slot)| ScheduledSlot {
                id: i.to_string(),
                slot,
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[ScheduledSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn busy(&self) -> impl Iterator<Item = &TimeInterval> + '_ {
        self.slots.iter().filter_map(|s| match &s.slot {
            Slot::Busy(interval) => Some(interval),
            Slot::Meeting(_) => None,
        })
    }

    pub fn meetings(&self) -> impl Iterator<Item = &TimeInterval> + '_ {
        self.slots.iter().filter_map(|s| match &s.slot {
            Slot::Meeting(interval) => Some(interval),
            Slot::Busy(_) => None,
        })
    }

    /// Find a slot by its display identifier.
    pub fn get(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id).map(|s| &s.slot)
    }

    /// Drop the identifiers, e.g. to feed the result back in as a member.
    pub fn into_schedule(self) -> Schedule {
        self.slots.into_iter().map(|s| s.slot).collect()
    }

    /// Free time of the whole group: the week minus every busy and meeting
    /// slot, cut at midnights.
    pub fn free(&self) -> Vec<TimeInterval> {
        let mut occupied: Vec<WeekRange> = self
            .slots
            .iter()
            .flat_map(|s| s.slot.interval().week_range().wrapped())
            .collect();
        occupied.sort();

        let mut free = Vec::new();
        let mut cursor = 0;
        for range in occupied {
            if range.start > cursor {
                free.push(WeekRange {
                    start: cursor,
                    end: range.start,
                });
            }
            cursor = cursor.max(range.end);
        }
        if cursor < MINUTES_PER_WEEK {
            free.push(WeekRange {
                start: cursor,
                end: MINUTES_PER_WEEK,
            });
        }
        free.into_iter().flat_map(WeekRange::split_by_day).collect()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
