//! Type-safe name wrappers for every identity in a match.
//!
//! Agents, teams, facilities, items, jobs, and roles are identified by the
//! names the scenario (or the job counter) gives them. Each kind gets its own
//! newtype so a facility name can never be passed where an agent name is
//! expected. All wrappers are `Ord`, which is what makes every map keyed by
//! them iterate in a fixed, reproducible order.
//!
//! [`MatchId`] is the one UUID: it identifies a single match run for logging
//! and percept correlation and never takes part in resolution.

use core::borrow::Borrow;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create a name from anything string-like.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name! {
    /// Name of an agent-controlled entity (e.g. `agentA1`).
    AgentName
}

define_name! {
    /// Name of a team (e.g. `A`).
    TeamName
}

define_name! {
    /// Name of a facility (e.g. `shop1`, `storage0`).
    FacilityName
}

define_name! {
    /// Name of an item in the catalog (e.g. `item0`).
    ItemName
}

define_name! {
    /// Name assigned to a job or auction when it is registered.
    JobName
}

define_name! {
    /// Name of an entity role (e.g. `car`, `drone`).
    RoleName
}

/// Unique identifier for one match run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for MatchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
