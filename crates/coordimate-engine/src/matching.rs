//! Random-coffee matching: pair a seed user with a group-mate whose daily
//! availability window overlaps their own.
//!
//! [`find_match`] is a pure function of its inputs. The current instant and
//! the random source are both supplied by the caller, and nothing is written
//! back: persisting the meeting and the new invite timestamps is up to the
//! caller (see [`MatchResult::mark_invited`]).
//!
//! # Pipeline
//!
//! 1. Fast exit when the seed is disabled, malformed, or cooling down.
//! 2. Deduplicate candidates by user id and drop the seed itself.
//! 3. Skip mates that are disabled, cooling down, or malformed. A malformed
//!    mate is logged and skipped; it never aborts the run.
//! 4. Compute the overlap of both windows on the biased UTC axis.
//! 5. Pick one qualifying mate uniformly at random.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::interval::MINUTES_PER_DAY;
use crate::random::RandomSource;
use crate::window::{AvailabilityWindow, BiasedSpan};

// ── Configuration ───────────────────────────────────────────────────────────

/// Tunables for [`find_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Minimum hours between two invites of the same user.
    pub cooldown_hours: i64,
    /// How many days after `now` the proposed meeting takes place.
    pub lead_days: i64,
    /// Overlaps shorter than this are not considered.
    pub min_overlap_minutes: i64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            cooldown_hours: 72,
            lead_days: 2,
            min_overlap_minutes: 1,
        }
    }
}

/// Longest accepted cooldown: one year.
pub const MAX_COOLDOWN_HOURS: i64 = 24 * 366;
/// Furthest accepted meeting lead: one year.
pub const MAX_LEAD_DAYS: i64 = 366;

impl MatchOptions {
    /// Check every field against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOptions`] for a negative or oversized
    /// cooldown or lead, or a minimum overlap outside `1..=1440` minutes.
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_COOLDOWN_HOURS).contains(&self.cooldown_hours) {
            return Err(EngineError::InvalidOptions(format!(
                "cooldown_hours must be in 0..={MAX_COOLDOWN_HOURS}, got {}",
                self.cooldown_hours
            )));
        }
        if !(0..=MAX_LEAD_DAYS).contains(&self.lead_days) {
            return Err(EngineError::InvalidOptions(format!(
                "lead_days must be in 0..={MAX_LEAD_DAYS}, got {}",
                self.lead_days
            )));
        }
        if !(1..=MINUTES_PER_DAY).contains(&self.min_overlap_minutes) {
            return Err(EngineError::InvalidOptions(format!(
                "min_overlap_minutes must be in 1..={MINUTES_PER_DAY}, got {}",
                self.min_overlap_minutes
            )));
        }
        Ok(())
    }

    /// The cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Result<Duration> {
        Duration::try_hours(self.cooldown_hours).ok_or_else(|| {
            EngineError::InvalidOptions(format!(
                "cooldown_hours out of range: {}",
                self.cooldown_hours
            ))
        })
    }
}

// ── Inputs ──────────────────────────────────────────────────────────────────

/// A user taking part in matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    pub window: AvailabilityWindow,
}

/// A group and the participants in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRoster {
    pub group_id: String,
    pub members: Vec<Participant>,
}

/// A potential mate, tagged with a group shared with the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub user_id: String,
    pub group_id: String,
    pub window: AvailabilityWindow,
}

/// Flatten the rosters of every group `seed_id` belongs to into candidates.
///
/// Each mate appears once, tagged with the first shared group it was found
/// in. Groups without the seed are ignored.
pub fn collect_candidates(seed_id: &str, groups: &[GroupRoster]) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .filter(|group| group.members.iter().any(|m| m.user_id == seed_id))
        .flat_map(|group| {
            group.members.iter().map(move |member| Candidate {
                user_id: member.user_id.clone(),
                group_id: group.group_id.clone(),
                window: member.window,
            })
        })
        .filter(|candidate| candidate.user_id != seed_id)
        .filter(|candidate| seen.insert(candidate.user_id.clone()))
        .collect()
}

// ── Output ──────────────────────────────────────────────────────────────────

/// Where two availability windows overlap, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapWindow {
    /// UTC minute of day the overlap begins (`0..=1439`).
    pub start_minute: i64,
    pub length_minutes: i64,
}

/// A proposed random-coffee meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub seed_id: String,
    pub mate_id: String,
    /// A group both users belong to.
    pub group_id: String,
    pub overlap: OverlapWindow,
    pub meeting_start: DateTime<Utc>,
    /// The `now` the match was computed for.
    pub matched_at: DateTime<Utc>,
}

impl MatchResult {
    /// Length of the proposed meeting.
    pub fn meeting_length(&self) -> Duration {
        Duration::minutes(self.overlap.length_minutes)
    }

    /// The window of either participant after this invite went out.
    pub fn mark_invited(&self, window: AvailabilityWindow) -> AvailabilityWindow {
        window.with_last_invite(self.matched_at)
    }
}

// ── find_match ──────────────────────────────────────────────────────────────

/// Try to pair `seed` with one of `candidates`.
///
/// Returns `None` when no mate qualifies; that is an ordinary outcome, not an
/// error. Options failing [`MatchOptions::validate`] also give `None`, with a
/// warning.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use coordimate_engine::{
///     find_match, AvailabilityWindow, Candidate, FixedIndex, MatchOptions, Participant,
/// };
///
/// let seed = Participant {
///     user_id: "ann".into(),
///     window: AvailabilityWindow::new(9 * 60, 17 * 60, 0),
/// };
/// let mate = Candidate {
///     user_id: "ben".into(),
///     group_id: "book-club".into(),
///     window: AvailabilityWindow::new(16 * 60, 20 * 60, 0),
/// };
/// let now = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
///
/// let found = find_match(&seed, &[mate], now, &MatchOptions::default(), &mut FixedIndex(0))
///     .unwrap();
/// assert_eq!(found.overlap.start_minute, 16 * 60);
/// assert_eq!(found.overlap.length_minutes, 60);
/// ```
pub fn find_match<R: RandomSource + ?Sized>(
    seed: &Participant,
    candidates: &[Candidate],
    now: DateTime<Utc>,
    options: &MatchOptions,
    rng: &mut R,
) -> Option<MatchResult> {
    let cooldown = match options.validate().and_then(|()| options.cooldown()) {
        Ok(cooldown) => cooldown,
        Err(err) => {
            warn!(seed = %seed.user_id, error = %err, "refusing to match with invalid options");
            return None;
        }
    };

    if !seed.window.enabled {
        debug!(seed = %seed.user_id, "seed has matching disabled");
        return None;
    }
    if seed.window.is_cooling_down(now, cooldown) {
        debug!(seed = %seed.user_id, "seed is cooling down");
        return None;
    }
    let seed_span = match seed.window.biased_span() {
        Ok(span) => span,
        Err(err) => {
            warn!(seed = %seed.user_id, error = %err, "skipping malformed seed window");
            return None;
        }
    };

    let mut seen = HashSet::new();
    let qualifying: Vec<(&Candidate, OverlapWindow)> = candidates
        .iter()
        .filter(|mate| mate.user_id != seed.user_id)
        .filter(|mate| seen.insert(mate.user_id.clone()))
        .filter(|mate| mate.window.enabled && !mate.window.is_cooling_down(now, cooldown))
        .filter_map(|mate| match mate.window.biased_span() {
            Ok(span) => Some((mate, span)),
            Err(err) => {
                warn!(mate = %mate.user_id, error = %err, "skipping malformed mate window");
                None
            }
        })
        .filter_map(|(mate, span)| {
            overlap(seed_span, span, options.min_overlap_minutes).map(|window| (mate, window))
        })
        .collect();

    if qualifying.is_empty() {
        debug!(seed = %seed.user_id, "no overlapping mate");
        return None;
    }

    let index = rng.pick_index(qualifying.len()).min(qualifying.len() - 1);
    let (mate, window) = qualifying[index];
    let Some(meeting_start) = meeting_start(now, options.lead_days, window.start_minute) else {
        warn!(seed = %seed.user_id, %now, "meeting start out of range");
        return None;
    };
    debug!(
        seed = %seed.user_id,
        mate = %mate.user_id,
        group = %mate.group_id,
        candidates = qualifying.len(),
        %meeting_start,
        "matched"
    );

    Some(MatchResult {
        seed_id: seed.user_id.clone(),
        mate_id: mate.user_id.clone(),
        group_id: mate.group_id.clone(),
        overlap: window,
        meeting_start,
        matched_at: now,
    })
}

/// Longest overlap of two windows on the biased axis that lasts at least
/// `min_minutes`.
///
/// The mate's window is also tried one day earlier and later so that windows
/// straddling UTC midnight still meet. On equal lengths the unshifted overlap
/// wins.
fn overlap(user: BiasedSpan, mate: BiasedSpan, min_minutes: i64) -> Option<OverlapWindow> {
    [0, -MINUTES_PER_DAY, MINUTES_PER_DAY]
        .into_iter()
        .filter_map(|shift| {
            overlap_on_axis(
                user,
                BiasedSpan {
                    start: mate.start + shift,
                    end: mate.end + shift,
                },
            )
        })
        .filter(|&(_, length)| length >= min_minutes)
        .min_by_key(|&(_, length)| Reverse(length))
        .map(|(start, length)| OverlapWindow {
            start_minute: (start - MINUTES_PER_DAY).rem_euclid(MINUTES_PER_DAY),
            length_minutes: length,
        })
}

/// `(biased start, length)` of the overlap, if the spans share any minute.
fn overlap_on_axis(user: BiasedSpan, mate: BiasedSpan) -> Option<(i64, i64)> {
    if mate.start <= user.start && user.start < mate.end {
        Some((user.start, mate.end.min(user.end) - user.start))
    } else if mate.start < user.end && user.end <= mate.end {
        Some((mate.start, user.end - mate.start.max(user.start)))
    } else if user.start < mate.start && mate.end < user.end {
        Some((mate.start, mate.end - mate.start))
    } else {
        None
    }
}

/// UTC midnight `lead_days` after `now`, plus `start_minute`. `None` past the
/// end of chrono's calendar.
fn meeting_start(now: DateTime<Utc>, lead_days: i64, start_minute: i64) -> Option<DateTime<Utc>> {
    let day = now
        .date_naive()
        .checked_add_signed(Duration::try_days(lead_days)?)?;
    day.and_time(NaiveTime::MIN)
        .and_utc()
        .checked_add_signed(Duration::try_minutes(start_minute)?)
}

// ── Tests ───────────────────────────────────────────────────────────────────
