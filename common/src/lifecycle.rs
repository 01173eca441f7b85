// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle state shared by clusters, hosts, and cluster memberships

use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;

/// Where a cluster, host, or cluster membership is in its installation
/// lifecycle
///
/// ```text
///   UNINITIALIZED --> INSTALLING --> SUCCESSFUL
///                         |
///                         +--------> ERROR  <-- (any state, via a
///                                                destructive action)
/// ```
///
/// Nothing here leaves `ERROR`.  Recovering an entity in `ERROR` is the job
/// of a reinstall, which lives outside the lifecycle core.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    EnumIter,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Uninitialized,
    Installing,
    Successful,
    Error,
}

impl LifecycleState {
    /// Returns whether an entity currently in state `self` may be moved to
    /// `next`.
    ///
    /// Rewriting the current state is always allowed, which is what makes a
    /// retried destructive action idempotent.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (current, next) if current == next => true,
            (_, Error) => true,
            (Uninitialized, Installing) => true,
            (Installing, Successful) => true,
            _ => false,
        }
    }

    /// Returns whether an installation is underway
    pub fn is_installing(self) -> bool {
        matches!(self, LifecycleState::Installing)
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Uninitialized
    }
}

#[cfg(test)]
mod test {
    use super::LifecycleState;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_transitions() {
        use LifecycleState::*;

        // Everything can be forced into ERROR, and every state can be
        // rewritten with itself.
        for state in LifecycleState::iter() {
            assert!(state.can_transition_to(Error), "{state} -> ERROR");
            assert!(state.can_transition_to(state), "{state} -> {state}");
        }

        assert!(Uninitialized.can_transition_to(Installing));
        assert!(Installing.can_transition_to(Successful));

        // There is no way out of ERROR.
        for next in [Uninitialized, Installing, Successful] {
            assert!(!Error.can_transition_to(next), "ERROR -> {next}");
        }
        assert!(!Successful.can_transition_to(Installing));
        assert!(!Uninitialized.can_transition_to(Successful));
        assert!(!Successful.can_transition_to(Uninitialized));
    }

    #[test]
    fn test_names() {
        for state in LifecycleState::iter() {
            let printed = state.to_string();
            assert_eq!(LifecycleState::from_str(&printed).unwrap(), state);
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{printed}\""));
        }
        assert_eq!(LifecycleState::Uninitialized.to_string(), "UNINITIALIZED");
    }
}
