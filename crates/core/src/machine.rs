// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning state machine as a pure transition table.
//!
//! The engine applying events (persisting the node, recording the target
//! state, refusing shared locks) lives in the conductor crate; this module
//! only answers "is `(state, event)` legal, and where does it go".

use crate::states::{ProvisionEvent, ProvisionState};
use crate::states::{ProvisionEvent as E, ProvisionState as S};

/// Look up the successor state for `(state, event)`.
///
/// Returns `None` for illegal pairs. `Fail` is legal from every *-ing and
/// *-wait state; `Done` is legal from every *-ing state and lands on the
/// operation's terminal. Operations without a dedicated failure state
/// (verification, adoption, deletion) fail back to `Enroll` or `Error`.
pub fn transition(state: ProvisionState, event: ProvisionEvent) -> Option<ProvisionState> {
    Some(match (state, event) {
        (S::Enroll, E::Manage) => S::Verifying,

        (S::Verifying, E::Done) => S::Manageable,
        (S::Verifying, E::Fail) => S::Enroll,

        (S::Manageable, E::Provide) => S::Cleaning,
        (S::Manageable, E::Clean) => S::Cleaning,
        (S::Manageable, E::Adopt) => S::Adopting,

        (S::Adopting, E::Done) => S::Active,
        (S::Adopting, E::Fail) => S::Error,

        (S::Available, E::Deploy) => S::Deploying,
        (S::Available, E::Manage) => S::Manageable,

        (S::Deploying, E::Wait) => S::DeployWait,
        (S::Deploying, E::Done) => S::Active,
        (S::Deploying, E::Active) => S::Active,
        (S::Deploying, E::Fail) => S::DeployFail,

        (S::DeployWait, E::Resume) => S::Deploying,
        (S::DeployWait, E::Active) => S::Active,
        (S::DeployWait, E::Fail) => S::DeployFail,
        (S::DeployWait, E::Abort) => S::DeployFail,
        (S::DeployWait, E::Delete) => S::Deleting,

        (S::DeployFail, E::Deploy) => S::Deploying,
        (S::DeployFail, E::Delete) => S::Deleting,

        (S::Active, E::Delete) => S::Deleting,
        (S::Active, E::Rescue) => S::Rescuing,

        (S::Deleting, E::Clean) => S::Cleaning,
        (S::Deleting, E::Done) => S::Available,
        (S::Deleting, E::Fail) => S::Error,

        (S::Error, E::Delete) => S::Deleting,
        (S::Error, E::Deploy) => S::Deploying,

        (S::Cleaning, E::Wait) => S::CleanWait,
        (S::Cleaning, E::Resume) => S::Cleaning,
        (S::Cleaning, E::Done) => S::Available,
        (S::Cleaning, E::Fail) => S::CleanFail,

        (S::CleanWait, E::Resume) => S::Cleaning,
        (S::CleanWait, E::Fail) => S::CleanFail,
        (S::CleanWait, E::Abort) => S::CleanFail,

        (S::CleanFail, E::Manage) => S::Manageable,
        (S::CleanFail, E::Clean) => S::Cleaning,

        (S::Rescuing, E::Wait) => S::RescueWait,
        (S::Rescuing, E::Done) => S::Rescue,
        (S::Rescuing, E::Fail) => S::RescueFail,

        (S::RescueWait, E::Resume) => S::Rescuing,
        (S::RescueWait, E::Fail) => S::RescueFail,
        (S::RescueWait, E::Abort) => S::RescueFail,

        (S::Rescue, E::Unrescue) => S::Unrescuing,
        (S::Rescue, E::Rescue) => S::Rescuing,
        (S::Rescue, E::Delete) => S::Deleting,

        (S::Unrescuing, E::Done) => S::Active,
        (S::Unrescuing, E::Fail) => S::RescueFail,

        (S::RescueFail, E::Rescue) => S::Rescuing,
        (S::RescueFail, E::Unrescue) => S::Unrescuing,
        (S::RescueFail, E::Delete) => S::Deleting,

        _ => return None,
    })
}

/// States with no operation in flight; entering one clears
/// `target_provision_state`.
pub fn is_stable_state(state: ProvisionState) -> bool {
    matches!(
        state,
        S::Enroll
            | S::Manageable
            | S::Available
            | S::Active
            | S::Rescue
            | S::Error
            | S::DeployFail
            | S::CleanFail
            | S::RescueFail
    )
}

/// States where the conductor is waiting on an in-band callback.
pub fn is_waiting_state(state: ProvisionState) -> bool {
    matches!(state, S::DeployWait | S::CleanWait | S::RescueWait)
}

/// The `target_provision_state` recorded when `event` starts an operation.
///
/// A manual clean (from `Manageable`) targets `Manageable`; the automated
/// clean run during tear-down or via `Provide` targets `Available`. A clean
/// retried from `CleanFail` keeps whatever target the failed run recorded.
/// Events that continue or finish an operation return `None` and leave the
/// target untouched.
pub fn operation_target(state: ProvisionState, event: ProvisionEvent) -> Option<ProvisionState> {
    Some(match (state, event) {
        (_, E::Manage) => S::Manageable,
        (_, E::Provide) => S::Available,
        (_, E::Adopt) => S::Active,
        (_, E::Deploy) => S::Active,
        (S::Manageable, E::Clean) => S::Manageable,
        (S::Deleting, E::Clean) => S::Available,
        (_, E::Rescue) => S::Rescue,
        (_, E::Unrescue) => S::Active,
        (_, E::Delete) => S::Available,
        _ => return None,
    })
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
