//! Closed status enumerations.
//!
//! The source of truth for every lifecycle in the system. Statuses are stored
//! as lowercase snake-case text in Postgres; parsing is strict, so a row
//! carrying an unknown status is surfaced as a [`StatusParseError`] at the
//! storage boundary instead of silently falling through an `else` branch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a stored status string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value:?}")]
pub struct StatusParseError {
    /// Which status family failed to parse.
    pub kind: &'static str,
    /// The offending stored value.
    pub value: String,
}

macro_rules! status_enum {
    (
        $(#[$doc:meta])*
        $name:ident / $kind:literal {
            $($(#[$vdoc:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vdoc])* $variant),+
        }

        impl $name {
            /// Returns the stored text form of this status.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(StatusParseError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// Where a swimmer sits in the enrollment pipeline.
    EnrollmentStatus / "enrollment" {
        /// Signed up, waiting for an assessment offer.
        Waitlist => "waitlist",
        /// Invited to enroll, paperwork outstanding.
        PendingEnrollment => "pending_enrollment",
        /// Actively enrolled and eligible to book.
        Enrolled => "enrolled",
        /// Assessment approved and eligible to book.
        Approved => "approved",
        /// Left the program.
        Dropped => "dropped",
        /// Assessment declined.
        Declined => "declined",
        /// Invitation or authorization lapsed.
        Expired => "expired",
    }
}

impl EnrollmentStatus {
    /// Whether this status permits booking regular lessons.
    #[must_use]
    pub const fn can_book_lessons(self) -> bool {
        matches!(self, Self::Enrolled | Self::Approved)
    }
}

status_enum! {
    /// Lifecycle of a bookable session.
    SessionStatus / "session" {
        /// Generated but not yet opened for booking.
        Draft => "draft",
        /// Open for booking.
        Available => "available",
        /// At capacity.
        Booked => "booked",
        /// The session has taken place.
        Completed => "completed",
        /// Withdrawn from the schedule.
        Cancelled => "cancelled",
    }
}

impl SessionStatus {
    /// Whether new bookings may target a session in this status.
    #[must_use]
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Available)
    }
}

status_enum! {
    /// Lifecycle of a booking.
    BookingStatus / "booking" {
        /// Active booking occupying a seat.
        Confirmed => "confirmed",
        /// Cancelled before the session.
        Cancelled => "cancelled",
        /// The swimmer attended.
        Completed => "completed",
        /// The swimmer did not attend.
        NoShow => "no_show",
    }
}

impl BookingStatus {
    /// Whether this booking still occupies a seat in its session.
    #[must_use]
    pub const fn occupies_seat(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

status_enum! {
    /// Lifecycle of a purchase order.
    PoStatus / "purchase order" {
        /// Submitted to the funding source, not yet usable.
        Pending => "pending",
        /// Active authorization window.
        Approved => "approved",
        /// Every authorized session has been consumed.
        Exhausted => "exhausted",
        /// The validity window ended.
        Expired => "expired",
        /// Closed by staff.
        Closed => "closed",
    }
}

status_enum! {
    /// Lifecycle of a parent invitation.
    InvitationStatus / "invitation" {
        /// Sent, waiting to be claimed.
        Pending => "pending",
        /// Claimed by a parent account.
        Claimed => "claimed",
        /// Lapsed before being claimed.
        Expired => "expired",
    }
}

status_enum! {
    /// Lifecycle of a staff task.
    TaskStatus / "task" {
        /// Not started.
        Open => "open",
        /// Being worked on.
        InProgress => "in_progress",
        /// Finished.
        Done => "done",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn round_trips_every_enrollment_status() {
        for status in [
            EnrollmentStatus::Waitlist,
            EnrollmentStatus::PendingEnrollment,
            EnrollmentStatus::Enrolled,
            EnrollmentStatus::Approved,
            EnrollmentStatus::Dropped,
            EnrollmentStatus::Declined,
            EnrollmentStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<EnrollmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "definitely_not_a_status".parse::<SessionStatus>().unwrap_err();
        assert_eq!(err.kind, "session");
        assert_eq!(err.value, "definitely_not_a_status");
    }

    #[test]
    fn only_enrolled_and_approved_can_book() {
        assert!(EnrollmentStatus::Enrolled.can_book_lessons());
        assert!(EnrollmentStatus::Approved.can_book_lessons());
        assert!(!EnrollmentStatus::Waitlist.can_book_lessons());
        assert!(!EnrollmentStatus::PendingEnrollment.can_book_lessons());
        assert!(!EnrollmentStatus::Dropped.can_book_lessons());
    }

    #[test]
    fn cancelled_bookings_free_their_seat() {
        assert!(BookingStatus::Confirmed.occupies_seat());
        assert!(BookingStatus::Completed.occupies_seat());
        assert!(BookingStatus::NoShow.occupies_seat());
        assert!(!BookingStatus::Cancelled.occupies_seat());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&EnrollmentStatus::PendingEnrollment).unwrap();
        assert_eq!(json, "\"pending_enrollment\"");
    }
}
