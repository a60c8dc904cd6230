//! Deterministic time-slot batch generation.
//!
//! Produces the cartesian product of eligible dates, instructors, and
//! fixed-duration slots inside a daily window, minus break-window overlaps,
//! blackout dates, and instructor double-bookings against already-persisted
//! sessions. Every candidate in one invocation shares a freshly minted
//! [`BatchId`] so the whole batch can later be bulk-opened or bulk-deleted.
//!
//! The generator is pure and bounded: complexity is date-range length times
//! instructor count times slots per day, with the range capped at
//! [`MAX_RANGE_DAYS`].

use crate::ids::{BatchId, InstructorId, SessionId};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use std::collections::HashSet;
use thiserror::Error;

/// Upper bound on the date range, keeping one invocation's output finite
/// even on a malformed request.
pub const MAX_RANGE_DAYS: i64 = 366;

/// A window within the day during which no slots are generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakWindow {
    /// Break start (local pool time, treated as UTC).
    pub start: NaiveTime,
    /// Break end.
    pub end: NaiveTime,
}

/// Input to one generation run.
#[derive(Clone, Debug)]
pub struct SlotPlan {
    /// First date to consider.
    pub start_date: NaiveDate,
    /// Last date to consider (inclusive).
    pub end_date: NaiveDate,
    /// Weekdays on which slots are generated.
    pub weekdays: Vec<Weekday>,
    /// Daily window start.
    pub day_start: NaiveTime,
    /// Daily window end.
    pub day_end: NaiveTime,
    /// Slot length in minutes.
    pub slot_minutes: u32,
    /// Windows to skip inside each day.
    pub breaks: Vec<BreakWindow>,
    /// Dates excluded entirely.
    pub blackout_dates: HashSet<NaiveDate>,
    /// Instructors to generate slots for.
    pub instructors: Vec<InstructorId>,
}

/// An already-persisted session considered for conflicts.
#[derive(Clone, Copy, Debug)]
pub struct ExistingSlot {
    /// The persisted session.
    pub session_id: SessionId,
    /// Its instructor.
    pub instructor_id: InstructorId,
    /// Its start.
    pub start_time: DateTime<Utc>,
    /// Its end.
    pub end_time: DateTime<Utc>,
}

/// A generated, non-conflicting candidate session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateSession {
    /// Instructor for the slot.
    pub instructor_id: InstructorId,
    /// Slot start.
    pub start_time: DateTime<Utc>,
    /// Slot end.
    pub end_time: DateTime<Utc>,
}

/// A candidate skipped because the instructor is already booked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotConflict {
    /// Instructor for the skipped slot.
    pub instructor_id: InstructorId,
    /// Skipped slot start.
    pub start_time: DateTime<Utc>,
    /// Skipped slot end.
    pub end_time: DateTime<Utc>,
    /// The persisted session it collided with.
    pub conflicting_session: SessionId,
}

/// Output of one generation run.
#[derive(Clone, Debug)]
pub struct GeneratedBatch {
    /// Identifier shared by every candidate in this run.
    pub batch_id: BatchId,
    /// Non-conflicting candidates, in (date, instructor, slot) order.
    pub sessions: Vec<CandidateSession>,
    /// Skipped candidates with the session each collided with.
    pub conflicts: Vec<SlotConflict>,
}

/// Why a plan was rejected before generation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotPlanError {
    /// `end_date` precedes `start_date`.
    #[error("end date precedes start date")]
    EmptyDateRange,
    /// The range exceeds [`MAX_RANGE_DAYS`].
    #[error("date range exceeds {MAX_RANGE_DAYS} days")]
    RangeTooLong,
    /// `day_end` is not after `day_start`.
    #[error("daily window end must be after its start")]
    InvalidWindow,
    /// Slot length is zero.
    #[error("slot duration must be positive")]
    ZeroDuration,
    /// No instructors were supplied.
    #[error("at least one instructor is required")]
    NoInstructors,
    /// No weekdays were supplied.
    #[error("at least one weekday is required")]
    NoWeekdays,
}

/// Generates a session batch from a plan.
///
/// # Errors
///
/// Returns a [`SlotPlanError`] when the plan is structurally invalid; a
/// valid plan that produces zero candidates is not an error.
pub fn generate_batch(
    plan: &SlotPlan,
    existing: &[ExistingSlot],
) -> Result<GeneratedBatch, SlotPlanError> {
    validate(plan)?;

    let slot_length = Duration::minutes(i64::from(plan.slot_minutes));
    let batch_id = BatchId::new();
    let mut sessions = Vec::new();
    let mut conflicts = Vec::new();

    for date in eligible_dates(plan) {
        for slot_start in day_slots(plan, slot_length) {
            let start_time = date.and_time(slot_start).and_utc();
            let end_time = start_time + slot_length;
            for &instructor_id in &plan.instructors {
                let collision = existing.iter().find(|s| {
                    s.instructor_id == instructor_id
                        && s.start_time < end_time
                        && start_time < s.end_time
                });
                match collision {
                    Some(existing_slot) => conflicts.push(SlotConflict {
                        instructor_id,
                        start_time,
                        end_time,
                        conflicting_session: existing_slot.session_id,
                    }),
                    None => sessions.push(CandidateSession {
                        instructor_id,
                        start_time,
                        end_time,
                    }),
                }
            }
        }
    }

    Ok(GeneratedBatch {
        batch_id,
        sessions,
        conflicts,
    })
}

fn validate(plan: &SlotPlan) -> Result<(), SlotPlanError> {
    if plan.end_date < plan.start_date {
        return Err(SlotPlanError::EmptyDateRange);
    }
    if (plan.end_date - plan.start_date).num_days() > MAX_RANGE_DAYS {
        return Err(SlotPlanError::RangeTooLong);
    }
    if plan.day_end <= plan.day_start {
        return Err(SlotPlanError::InvalidWindow);
    }
    if plan.slot_minutes == 0 {
        return Err(SlotPlanError::ZeroDuration);
    }
    if plan.instructors.is_empty() {
        return Err(SlotPlanError::NoInstructors);
    }
    if plan.weekdays.is_empty() {
        return Err(SlotPlanError::NoWeekdays);
    }
    Ok(())
}

fn eligible_dates(plan: &SlotPlan) -> impl Iterator<Item = NaiveDate> + '_ {
    plan.start_date
        .iter_days()
        .take_while(|date| *date <= plan.end_date)
        .filter(|date| plan.weekdays.contains(&chrono::Datelike::weekday(date)))
        .filter(|date| !plan.blackout_dates.contains(date))
}

/// Slot start times inside the daily window, skipping break overlaps.
fn day_slots(plan: &SlotPlan, slot_length: Duration) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let mut cursor = plan.day_start;
    loop {
        let (slot_end, wrapped) = cursor.overflowing_add_signed(slot_length);
        if wrapped != 0 || slot_end > plan.day_end {
            break;
        }
        let overlaps_break = plan
            .breaks
            .iter()
            .any(|b| cursor < b.end && b.start < slot_end);
        if !overlaps_break {
            slots.push(cursor);
        }
        cursor = slot_end;
        if cursor >= plan.day_end {
            break;
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn one_week_plan() -> SlotPlan {
        SlotPlan {
            // 2026-08-24 is a Monday
            start_date: date(2026, 8, 24),
            end_date: date(2026, 8, 30),
            weekdays: vec![Weekday::Mon, Weekday::Wed],
            day_start: time(9, 0),
            day_end: time(10, 0),
            slot_minutes: 30,
            breaks: Vec::new(),
            blackout_dates: HashSet::new(),
            instructors: vec![InstructorId::new()],
        }
    }

    #[test]
    fn two_days_two_slots_yield_four_sessions() {
        let batch = generate_batch(&one_week_plan(), &[]).unwrap();
        assert_eq!(batch.sessions.len(), 4);
        assert!(batch.conflicts.is_empty());
    }

    #[test]
    fn blackout_date_removes_its_slots() {
        let mut plan = one_week_plan();
        plan.blackout_dates.insert(date(2026, 8, 26)); // the Wednesday
        let batch = generate_batch(&plan, &[]).unwrap();
        assert_eq!(batch.sessions.len(), 2);
    }

    #[test]
    fn break_window_skips_overlapping_slots() {
        let mut plan = one_week_plan();
        plan.breaks.push(BreakWindow {
            start: time(9, 15),
            end: time(9, 45),
        });
        // Both 9:00 and 9:30 slots overlap the break.
        let batch = generate_batch(&plan, &[]).unwrap();
        assert!(batch.sessions.is_empty());
    }

    #[test]
    fn instructor_conflict_is_reported_not_generated() {
        let plan = one_week_plan();
        let instructor = plan.instructors[0];
        let taken = SessionId::new();
        let existing = [ExistingSlot {
            session_id: taken,
            instructor_id: instructor,
            start_time: date(2026, 8, 24).and_time(time(9, 0)).and_utc(),
            end_time: date(2026, 8, 24).and_time(time(9, 30)).and_utc(),
        }];
        let batch = generate_batch(&plan, &existing).unwrap();
        assert_eq!(batch.sessions.len(), 3);
        assert_eq!(batch.conflicts.len(), 1);
        assert_eq!(batch.conflicts[0].conflicting_session, taken);
    }

    #[test]
    fn other_instructors_are_not_blocked_by_the_conflict() {
        let mut plan = one_week_plan();
        plan.instructors.push(InstructorId::new());
        let busy = plan.instructors[0];
        let existing = [ExistingSlot {
            session_id: SessionId::new(),
            instructor_id: busy,
            start_time: date(2026, 8, 24).and_time(time(9, 0)).and_utc(),
            end_time: date(2026, 8, 24).and_time(time(9, 30)).and_utc(),
        }];
        let batch = generate_batch(&plan, &existing).unwrap();
        // 8 candidates total, exactly one conflicted.
        assert_eq!(batch.sessions.len(), 7);
        assert_eq!(batch.conflicts.len(), 1);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut plan = one_week_plan();
        plan.end_date = plan.start_date - chrono::Days::new(1);
        assert_eq!(
            generate_batch(&plan, &[]).unwrap_err(),
            SlotPlanError::EmptyDateRange
        );
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut plan = one_week_plan();
        plan.slot_minutes = 0;
        assert_eq!(
            generate_batch(&plan, &[]).unwrap_err(),
            SlotPlanError::ZeroDuration
        );
    }

    #[test]
    fn slot_not_fitting_the_window_is_dropped() {
        let mut plan = one_week_plan();
        plan.slot_minutes = 45;
        // 9:00-9:45 fits, 9:45-10:30 does not.
        let batch = generate_batch(&plan, &[]).unwrap();
        assert_eq!(batch.sessions.len(), 2);
    }

    proptest! {
        #[test]
        fn output_is_bounded_by_the_cartesian_product(
            span in 0i64..28,
            slot_minutes in 10u32..120,
            instructor_count in 1usize..4,
        ) {
            let plan = SlotPlan {
                start_date: date(2026, 9, 1),
                end_date: date(2026, 9, 1) + chrono::Days::new(u64::try_from(span).unwrap()),
                weekdays: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
                day_start: time(8, 0),
                day_end: time(17, 0),
                slot_minutes,
                breaks: vec![BreakWindow { start: time(12, 0), end: time(13, 0) }],
                blackout_dates: HashSet::new(),
                instructors: (0..instructor_count).map(|_| InstructorId::new()).collect(),
            };
            let batch = generate_batch(&plan, &[]).unwrap();
            let window_minutes = 9 * 60;
            let max_slots_per_day = window_minutes / slot_minutes as usize;
            let max = (span as usize + 1) * instructor_count * max_slots_per_day;
            prop_assert!(batch.sessions.len() <= max);

            // No candidate overlaps the lunch break.
            for candidate in &batch.sessions {
                let start = candidate.start_time.time();
                let end = candidate.end_time.time();
                prop_assert!(end <= time(12, 0) || start >= time(13, 0));
            }
        }

        #[test]
        fn generation_is_deterministic_modulo_batch_id(seed in 0u64..50) {
            let _ = seed;
            let plan = one_week_plan();
            let a = generate_batch(&plan, &[]).unwrap();
            let b = generate_batch(&plan, &[]).unwrap();
            prop_assert_eq!(a.sessions, b.sessions);
            prop_assert_ne!(a.batch_id, b.batch_id);
        }
    }
}
