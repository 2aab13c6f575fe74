//! Attendance accounting for events and their visits.
//!
//! A visit holds `1 + companions_count` seats of its event from the moment it
//! is reserved; companions confirmed later fill seats the visit already holds,
//! so confirming never changes the event's aggregate.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Limited(u32),
    Unlimited,
}

impl Capacity {
    /// A limit of zero or below means the event takes any number of visits.
    pub fn from_visits_limit(visits_limit: i32) -> Self {
        if visits_limit > 0 {
            Capacity::Limited(visits_limit as u32)
        } else {
            Capacity::Unlimited
        }
    }

    pub fn as_limit(&self) -> Option<i64> {
        match self {
            Capacity::Limited(n) => Some(*n as i64),
            Capacity::Unlimited => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Seats left; negative when the event is already over its limit.
    Limited(i64),
    Unlimited,
}

impl Remaining {
    pub fn as_option(&self) -> Option<i64> {
        match self {
            Remaining::Limited(n) => Some(*n),
            Remaining::Unlimited => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationRejection {
    #[error("This event is fully booked")]
    FullyBooked,
    #[error("Companions must not be negative")]
    NegativeCompanions,
    #[error("Only {max} companions can be added to this reservation")]
    TooManyCompanions { requested: i32, max: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompanionRejection {
    #[error("This reservation is full")]
    Full,
}

/// Where a visit stands in the companion confirmation sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanionProgress {
    Created,
    PartiallyConfirmed,
    FullyConfirmed,
}

pub fn remaining_capacity(capacity: Capacity, current_total_attendance: i64) -> Remaining {
    match capacity {
        Capacity::Limited(limit) => Remaining::Limited(limit as i64 - current_total_attendance),
        Capacity::Unlimited => Remaining::Unlimited,
    }
}

/// One seat always goes to the registrant.
pub fn max_companions_for(remaining: Remaining, unlimited_cap: u32) -> u32 {
    match remaining {
        Remaining::Limited(n) => (n - 1).clamp(0, u32::MAX as i64) as u32,
        Remaining::Unlimited => unlimited_cap,
    }
}

pub fn has_room_for_registrant(remaining: Remaining) -> bool {
    match remaining {
        Remaining::Limited(n) => n >= 1,
        Remaining::Unlimited => true,
    }
}

/// Accepts `requested_companions` when it lies in `[0, max_companions]`.
pub fn validate_reservation(requested_companions: i32, max_companions: u32) -> Result<u32, ReservationRejection> {
    if requested_companions < 0 {
        return Err(ReservationRejection::NegativeCompanions);
    }
    if requested_companions as u32 > max_companions {
        return Err(ReservationRejection::TooManyCompanions {
            requested: requested_companions,
            max: max_companions,
        });
    }
    Ok(requested_companions as u32)
}

pub fn check_companion_slot(confirmed: i64, companions_count: i32) -> Result<(), CompanionRejection> {
    if confirmed >= companions_count as i64 {
        Err(CompanionRejection::Full)
    } else {
        Ok(())
    }
}

pub fn companion_progress(confirmed: i64, companions_count: i32) -> CompanionProgress {
    if confirmed <= 0 && companions_count > 0 {
        CompanionProgress::Created
    } else if confirmed < companions_count as i64 {
        CompanionProgress::PartiallyConfirmed
    } else {
        CompanionProgress::FullyConfirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_event_with_two_seats_left_allows_one_companion() {
        let remaining = remaining_capacity(Capacity::from_visits_limit(10), 8);
        assert_eq!(remaining, Remaining::Limited(2));

        let max = max_companions_for(remaining, 30);
        assert_eq!(max, 1);

        assert_eq!(
            validate_reservation(3, max),
            Err(ReservationRejection::TooManyCompanions { requested: 3, max: 1 })
        );
        assert_eq!(validate_reservation(1, max), Ok(1));
        assert_eq!(validate_reservation(0, max), Ok(0));
    }

    #[test]
    fn remaining_goes_negative_only_past_the_limit() {
        for limit in 1..=20u32 {
            for current in 0..=30i64 {
                let remaining = remaining_capacity(Capacity::Limited(limit), current);
                let n = remaining.as_option().unwrap();
                assert_eq!(n >= 0, current <= limit as i64);
                // companion ceiling never underflows
                let max = max_companions_for(remaining, 30);
                assert!(max as i64 <= n.max(0));
            }
        }
    }

    #[test]
    fn unlimited_uses_configured_cap_not_a_seat_count() {
        assert_eq!(Capacity::from_visits_limit(0), Capacity::Unlimited);
        assert_eq!(Capacity::from_visits_limit(-5), Capacity::Unlimited);

        let remaining = remaining_capacity(Capacity::Unlimited, 10_000);
        assert_eq!(remaining, Remaining::Unlimited);
        assert!(has_room_for_registrant(remaining));
        assert_eq!(max_companions_for(remaining, 30), 30);
        assert_eq!(max_companions_for(remaining, 4), 4);
    }

    #[test]
    fn full_event_has_no_room_for_registrant() {
        assert!(!has_room_for_registrant(remaining_capacity(Capacity::Limited(5), 5)));
        assert!(!has_room_for_registrant(remaining_capacity(Capacity::Limited(5), 7)));
        assert!(has_room_for_registrant(remaining_capacity(Capacity::Limited(5), 4)));
    }

    #[test]
    fn negative_companions_are_rejected() {
        assert_eq!(validate_reservation(-1, 5), Err(ReservationRejection::NegativeCompanions));
    }

    #[test]
    fn companion_slots_close_at_allotment() {
        assert!(check_companion_slot(0, 2).is_ok());
        assert!(check_companion_slot(1, 2).is_ok());
        assert_eq!(check_companion_slot(2, 2), Err(CompanionRejection::Full));
        assert_eq!(check_companion_slot(0, 0), Err(CompanionRejection::Full));
    }

    #[test]
    fn progress_follows_confirmed_count() {
        assert_eq!(companion_progress(0, 2), CompanionProgress::Created);
        assert_eq!(companion_progress(1, 2), CompanionProgress::PartiallyConfirmed);
        assert_eq!(companion_progress(2, 2), CompanionProgress::FullyConfirmed);
        // nothing to confirm
        assert_eq!(companion_progress(0, 0), CompanionProgress::FullyConfirmed);
    }
}
