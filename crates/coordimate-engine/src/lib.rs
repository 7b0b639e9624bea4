//! # coordimate-engine
//!
//! Deterministic scheduling core of a group-meeting coordination backend.
//!
//! The engine merges the busy time of group members into one canonical group
//! schedule and pairs group-mates for ad-hoc "random coffee" meetings based on
//! their daily availability windows. It performs no I/O: callers supply
//! schedules, windows, the current instant and a random source, and persist
//! whatever comes back.
//!
//! ## Modules
//!
//! - [`interval`] — Weekly time intervals, busy/meeting slots, schedules
//! - [`aggregation`] — Merge member schedules into a group schedule, incrementally or in full
//! - [`window`] — Daily availability windows with timezone offset and cooldown
//! - [`matching`] — Find an overlapping group-mate and propose a meeting
//! - [`random`] — Injectable random sources
//! - [`record`] — Storage/API record shapes and their conversion into core types
//! - [`error`] — Error types

pub mod aggregation;
pub mod error;
pub mod interval;
pub mod matching;
pub mod random;
pub mod record;
pub mod window;

pub use aggregation::{add_member, compute_group_schedule};
pub use error::EngineError;
pub use interval::{GroupSchedule, Schedule, ScheduledSlot, Slot, TimeInterval};
pub use matching::{
    collect_candidates, find_match, Candidate, GroupRoster, MatchOptions, MatchResult,
    OverlapWindow, Participant,
};
pub use random::{FixedIndex, RandomSource, SeededRandom, ThreadRandom};
pub use record::{schedule_from_time_slots, IntervalRecord, RandomCoffeeRecord, TimeSlotRecord};
pub use window::AvailabilityWindow;
