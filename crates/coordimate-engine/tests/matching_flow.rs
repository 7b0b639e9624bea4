//! End-to-end matching: stored preferences in, invite bookkeeping out.

use chrono::{DateTime, Duration, TimeZone, Utc};
use coordimate_engine::{
    collect_candidates, find_match, GroupRoster, MatchOptions, Participant, RandomCoffeeRecord,
    SeededRandom,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 7, 45, 0).unwrap()
}

fn participant(id: &str, start: &str, end: &str, timezone: &str, last: Option<&str>) -> Participant {
    let record = RandomCoffeeRecord {
        is_enabled: true,
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        timezone: Some(timezone.to_string()),
        last_invite_time: last.map(str::to_string),
    };
    Participant {
        user_id: id.to_string(),
        window: record.to_window().unwrap(),
    }
}

fn rosters() -> Vec<GroupRoster> {
    let seed = participant("seed", "09:00", "17:00", "0", None);
    vec![
        GroupRoster {
            group_id: "climbing".to_string(),
            members: vec![
                seed.clone(),
                participant("late", "20:00", "23:00", "0", None),
                participant("berlin", "17:30", "19:00", "-60", None),
            ],
        },
        GroupRoster {
            group_id: "chess".to_string(),
            members: vec![
                participant("berlin", "17:30", "19:00", "-60", None),
                participant("tired", "09:00", "17:00", "0", Some("2026-03-15T09:00:00Z")),
                seed,
            ],
        },
    ]
}

#[test]
fn matches_the_only_overlapping_mate() {
    let groups = rosters();
    let seed = groups[0].members[0].clone();
    let candidates = collect_candidates(&seed.user_id, &groups);
    assert_eq!(candidates.len(), 3);

    let found = find_match(
        &seed,
        &candidates,
        now(),
        &MatchOptions::default(),
        &mut SeededRandom::new(42),
    )
    .unwrap();

    // 17:30-19:00 at UTC+01:00 is 16:30-18:00 UTC.
    assert_eq!(found.mate_id, "berlin");
    assert_eq!(found.group_id, "climbing");
    assert_eq!(found.overlap.start_minute, 16 * 60 + 30);
    assert_eq!(found.overlap.length_minutes, 30);
    assert_eq!(
        found.meeting_start,
        Utc.with_ymd_and_hms(2026, 3, 18, 16, 30, 0).unwrap()
    );

    // After bookkeeping, the seed cannot be matched again right away.
    let seed_after = Participant {
        window: found.mark_invited(seed.window),
        ..seed
    };
    assert!(find_match(
        &seed_after,
        &candidates,
        now() + Duration::hours(1),
        &MatchOptions::default(),
        &mut SeededRandom::new(42),
    )
    .is_none());
}

#[test]
fn seed_invited_yesterday_is_not_matched() {
    let seed = participant("seed", "09:00", "17:00", "0", Some("2026-03-15T07:45:00Z"));
    let mut groups = rosters();
    groups[0].members[0] = seed.clone();
    let candidates = collect_candidates("seed", &groups);
    assert!(find_match(
        &seed,
        &candidates,
        now(),
        &MatchOptions::default(),
        &mut SeededRandom::new(1),
    )
    .is_none());
}

#[test]
fn selection_is_spread_over_all_qualifying_mates() {
    let seed = participant("seed", "08:00", "18:00", "0", None);
    let mates: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|id| participant(id, "10:00", "11:00", "0", None))
        .collect();
    let groups = vec![GroupRoster {
        group_id: "g".to_string(),
        members: std::iter::once(seed.clone()).chain(mates).collect(),
    }];
    let candidates = collect_candidates("seed", &groups);

    let mut rng = SeededRandom::new(2026);
    let mut counts = std::collections::HashMap::new();
    for _ in 0..300 {
        let found =
            find_match(&seed, &candidates, now(), &MatchOptions::default(), &mut rng).unwrap();
        *counts.entry(found.mate_id).or_insert(0) += 1;
    }
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&n| n > 50), "{counts:?}");
}
