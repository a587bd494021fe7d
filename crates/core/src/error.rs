// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy for the conductor and its drivers.
//!
//! Drivers raise these values and the lifecycle handlers match on them, so
//! the enum lives here rather than per crate. `Unexpected` is the escape
//! hatch for faults outside the domain; handlers fold it into `last_error`
//! but never let it leave a node mid-operation.

use crate::states::{PowerState, ProvisionEvent, ProvisionState};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConductorError {
    /// Caller supplied a bad value; never retried, surfaced to the API.
    #[error("invalid parameter: {0}")]
    InvalidParameterValue(String),

    /// An invariant with another entity would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Illegal state-machine transition.
    #[error("event '{event}' is not allowed in state '{state}'")]
    InvalidState {
        state: ProvisionState,
        event: ProvisionEvent,
    },

    /// The worker pool refused the job.
    #[error("no free conductor workers available")]
    NoFreeConductorWorker,

    /// Timed out waiting for a node to reach a power state.
    #[error("failed to reach power state '{desired}' within the timeout")]
    PowerStateFailure { desired: PowerState },

    /// Raised by the network collaborator.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Raised by volume attach/detach.
    #[error("storage error: {0}")]
    StorageError(String),

    /// The driver does not implement the requested capability; callers
    /// treat this as "feature off" rather than failure.
    #[error("driver does not support the '{extension}' extension")]
    UnsupportedDriverExtension { extension: String },

    /// Driver-side runtime failure.
    #[error("driver operation failed: {0}")]
    DriverOperationError(String),

    /// Could not take or upgrade the node lock.
    #[error("failed to acquire lock on node {node}: {reason}")]
    LockAcquisitionFailed { node: String, reason: String },

    /// A mutating operation ran under a shared lock.
    #[error("operation '{operation}' requires an exclusive lock")]
    ExclusiveLockRequired { operation: String },

    /// Unknown record; the message names the entity.
    #[error("{0} could not be found")]
    NotFound(String),

    /// Optimistic-concurrency loss in the node store.
    #[error("record {0} was updated concurrently; refresh and retry")]
    ConcurrentUpdate(String),

    /// Ports of one port group disagree on physical network; should not
    /// occur while the validation rule holds.
    #[error("port group {portgroup} spans physical networks {physnets:?}")]
    PortgroupPhysnetInconsistent {
        portgroup: String,
        physnets: Vec<String>,
    },

    /// Developer error, not user-surfaced.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Anything that escaped the domain.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ConductorError {
    /// True for faults the domain anticipates; false only for
    /// [`ConductorError::Unexpected`]. Handlers word `last_error`
    /// differently for the two.
    pub fn is_domain(&self) -> bool {
        !matches!(self, ConductorError::Unexpected(_))
    }
}
