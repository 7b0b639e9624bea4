//! Property tests for group schedule aggregation.

use coordimate_engine::{add_member, compute_group_schedule, Schedule, Slot, TimeInterval};
use proptest::prelude::*;

const WEEK: usize = 7 * 24 * 60;

/// Intervals on a quarter-hour grid that never reach past hour 48.
fn interval() -> impl Strategy<Value = TimeInterval> {
    (0u8..7, 0u32..96).prop_flat_map(|(day, start_q)| {
        (1u32..=(192 - start_q)).prop_map(move |length_q| {
            TimeInterval::new(day, f64::from(start_q) / 4.0, f64::from(length_q) / 4.0)
        })
    })
}

fn slot() -> impl Strategy<Value = Slot> {
    (interval(), prop::bool::weighted(0.2)).prop_map(|(interval, meeting)| {
        if meeting {
            Slot::Meeting(interval)
        } else {
            Slot::Busy(interval)
        }
    })
}

fn schedule() -> impl Strategy<Value = Schedule> {
    prop::collection::vec(slot(), 0..6).prop_map(Schedule::from_slots)
}

fn members() -> impl Strategy<Value = Vec<Schedule>> {
    prop::collection::vec(schedule(), 0..5)
}

fn minutes(hours: f64) -> usize {
    (hours * 60.0).round() as usize
}

/// Which minutes of the week are covered by the given busy intervals.
fn coverage<'a>(busy: impl Iterator<Item = &'a TimeInterval>) -> Vec<bool> {
    let mut covered = vec![false; WEEK];
    for interval in busy {
        let start = usize::from(interval.day) * 24 * 60 + minutes(interval.start);
        for minute in start..start + minutes(interval.length) {
            covered[minute % WEEK] = true;
        }
    }
    covered
}

fn busy_of(schedules: &[Schedule]) -> Vec<TimeInterval> {
    schedules.iter().flat_map(Schedule::busy).copied().collect()
}

proptest! {
    #[test]
    fn group_covers_exactly_the_members_busy_time(members in members()) {
        let group = compute_group_schedule(&members).unwrap();
        prop_assert_eq!(coverage(group.busy()), coverage(busy_of(&members).iter()));
    }

    #[test]
    fn busy_output_never_overlaps_or_touches(members in members()) {
        let group = compute_group_schedule(&members).unwrap();
        let ranges: Vec<(usize, usize)> = group
            .busy()
            .map(|i| {
                let start = usize::from(i.day) * 24 * 60 + minutes(i.start);
                (start, start + minutes(i.length))
            })
            .collect();

        for (start, end) in &ranges {
            prop_assert!(start < end);
            // Every piece stays within one day.
            prop_assert!(end - start <= 24 * 60);
            prop_assert!(start / (24 * 60) == (end - 1) / (24 * 60));
        }
        for pair in ranges.windows(2) {
            let (_, prev_end) = pair[0];
            let (next_start, _) = pair[1];
            // Adjacent pieces may only touch at a midnight.
            prop_assert!(
                next_start > prev_end || next_start % (24 * 60) == 0,
                "{:?} and {:?} should have been merged", pair[0], pair[1]
            );
        }
    }

    #[test]
    fn recomputing_own_output_is_idempotent(members in members()) {
        let group = compute_group_schedule(&members).unwrap();
        let again = compute_group_schedule(&[group.clone().into_schedule()]).unwrap();
        prop_assert_eq!(group, again);
    }

    #[test]
    fn member_order_does_not_change_busy_time(
        (members, shuffled) in members().prop_flat_map(|m| (Just(m.clone()), Just(m).prop_shuffle()))
    ) {
        let a = compute_group_schedule(&members).unwrap();
        let b = compute_group_schedule(&shuffled).unwrap();
        let busy_a: Vec<_> = a.busy().copied().collect();
        let busy_b: Vec<_> = b.busy().copied().collect();
        prop_assert_eq!(busy_a, busy_b);
    }

    #[test]
    fn meetings_are_preserved_verbatim(members in members()) {
        let group = compute_group_schedule(&members).unwrap();
        let expected: Vec<_> = members.iter().flat_map(Schedule::meetings).copied().collect();
        let actual: Vec<_> = group.meetings().copied().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn add_member_equals_full_recomputation(members in members(), newcomer in schedule()) {
        let existing = compute_group_schedule(&members).unwrap();
        let incremental = add_member(&existing, &newcomer).unwrap();

        let mut all = members.clone();
        all.push(newcomer);
        prop_assert_eq!(incremental, compute_group_schedule(&all).unwrap());
    }
}
