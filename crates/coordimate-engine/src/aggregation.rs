//! Merge member schedules into one canonical group schedule.
//!
//! Busy slots of all members are unioned with a sort-and-sweep over the
//! linear week-minute axis and then cut back into per-day intervals. Meeting
//! slots are never merged; they are appended after the busy portion exactly
//! as the members supplied them.
//!
//! Union is associative, so a group schedule can be extended one member at a
//! time with [`add_member`] and still equal a full recomputation with
//! [`compute_group_schedule`].

use tracing::trace;

use crate::error::Result;
use crate::interval::{GroupSchedule, Schedule, TimeInterval, WeekRange};

/// Compute the group schedule of `member_schedules`.
///
/// Every slot of every member is validated before anything is merged.
/// Busy output is quantized to whole minutes: starts and lengths are rounded
/// to the nearest minute before merging, so sub-minute parts of the input do
/// not survive. Meetings are passed through untouched.
///
/// # Errors
///
/// Returns [`crate::EngineError::InvalidInterval`] for the first invalid slot
/// found. No partial schedule is produced.
///
/// # Examples
///
/// ```
/// use coordimate_engine::{compute_group_schedule, Schedule, Slot, TimeInterval};
///
/// let alice = Schedule::from_slots(vec![Slot::busy(1, 1.0, 2.0)]);
/// let bob = Schedule::from_slots(vec![Slot::busy(1, 2.0, 3.0)]);
/// let carol = Schedule::from_slots(vec![Slot::busy(1, 0.0, 1.0)]);
///
/// let group = compute_group_schedule(&[alice, bob, carol]).unwrap();
/// let busy: Vec<_> = group.busy().copied().collect();
/// assert_eq!(busy, vec![TimeInterval::new(1, 0.0, 5.0)]);
/// ```
pub fn compute_group_schedule(member_schedules: &[Schedule]) -> Result<GroupSchedule> {
    for schedule in member_schedules {
        schedule.validate()?;
    }

    let busy = merge_busy(member_schedules.iter().flat_map(Schedule::busy));
    let meetings = member_schedules
        .iter()
        .flat_map(Schedule::meetings)
        .copied()
        .collect();

    Ok(GroupSchedule::from_parts(busy, meetings))
}

/// Extend an already computed group schedule with one new member.
///
/// The busy portion of `existing` acts as a single virtual member and is
/// merged with the busy slots of `new_member`. Meetings of `existing` are
/// kept in place and the new member's meetings are appended after them.
///
/// The result equals [`compute_group_schedule`] over the original members
/// followed by `new_member`.
///
/// # Errors
///
/// Returns [`crate::EngineError::InvalidInterval`] if any slot of
/// `new_member` or `existing` is invalid.
pub fn add_member(existing: &GroupSchedule, new_member: &Schedule) -> Result<GroupSchedule> {
    new_member.validate()?;
    for scheduled in existing.slots() {
        scheduled.slot.interval().validate()?;
    }

    let busy = merge_busy(existing.busy().chain(new_member.busy()));
    let meetings = existing
        .meetings()
        .chain(new_member.meetings())
        .copied()
        .collect();

    Ok(GroupSchedule::from_parts(busy, meetings))
}

/// Union busy intervals into maximal, non-touching per-day intervals.
fn merge_busy<'a>(intervals: impl Iterator<Item = &'a TimeInterval>) -> Vec<TimeInterval> {
    let mut ranges: Vec<WeekRange> = intervals
        .flat_map(|interval| interval.week_range().wrapped())
        .collect();
    // Stable: equal starts keep the order they were contributed in.
    ranges.sort_by_key(|range| range.start);

    let merged = sweep(&ranges);
    trace!(input = ranges.len(), merged = merged.len(), "merged busy ranges");

    merged.into_iter().flat_map(WeekRange::split_by_day).collect()
}

/// Linear union sweep over ranges sorted by start.
///
/// A range starting at or before the running end extends the current run, so
/// touching ranges are joined too.
fn sweep(sorted: &[WeekRange]) -> Vec<WeekRange> {
    let mut merged: Vec<WeekRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(current) if range.start <= current.end => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(*range),
        }
    }
    merged
}

// ── Tests ───────────────────────────────────────────────────────────────────
