//! Typed identifiers for domain entities.
//!
//! Every entity gets its own newtype over [`Uuid`] so a `SwimmerId` can never
//! be passed where a `SessionId` is expected. The inner UUID is reachable via
//! `as_uuid` for binding into SQL queries.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner `Uuid`.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Identifier of a swimmer (the child a parent manages).
    SwimmerId
);
define_id!(
    /// Identifier of a parent account.
    ParentId
);
define_id!(
    /// Identifier of an instructor.
    InstructorId
);
define_id!(
    /// Identifier of a bookable session.
    SessionId
);
define_id!(
    /// Identifier of a booking (swimmer occupying a session).
    BookingId
);
define_id!(
    /// Identifier of an external funding source.
    FundingSourceId
);
define_id!(
    /// Identifier of a purchase order (funding authorization window).
    PurchaseOrderId
);
define_id!(
    /// Identifier shared by all sessions generated in one batch.
    BatchId
);
define_id!(
    /// Identifier of a staff task.
    TaskId
);
define_id!(
    /// Identifier of a parent invitation.
    InvitationId
);

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(SwimmerId::new(), SwimmerId::new());
    }

    #[test]
    fn id_round_trips_through_uuid() {
        let id = SessionId::new();
        assert_eq!(SessionId::from_uuid(*id.as_uuid()), id);
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = BookingId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
