// ABOUTME: Identifier newtypes for lifts, programs, progressions, users, and sessions
// ABOUTME: Prevents mixing up UUIDs that belong to different entity kinds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from a UUID
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID value
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of an end user
    UserId
);
define_id!(
    /// Identifier of a lift (exercise)
    LiftId
);
define_id!(
    /// Identifier of a prescription (exercise slot template)
    PrescriptionId
);
define_id!(
    /// Identifier of a training day
    DayId
);
define_id!(
    /// Identifier of a program week
    WeekId
);
define_id!(
    /// Identifier of a program cycle
    CycleId
);
define_id!(
    /// Identifier of a program
    ProgramId
);
define_id!(
    /// Identifier of a weekly or daily lookup table
    LookupId
);
define_id!(
    /// Identifier of a progression rule
    ProgressionId
);
define_id!(
    /// Identifier of a stored reference max row
    ReferenceMaxId
);
define_id!(
    /// Identifier of a progression log entry
    ProgressionLogId
);
define_id!(
    /// Identifier of a workout session
    SessionId
);
define_id!(
    /// Identifier of an enrollment (user program state)
    EnrollmentId
);
