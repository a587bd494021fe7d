// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification bus and workload-manager seams.
//!
//! The transports live out of tree; the conductor only emits records.

use bmc_core::{InstanceId, NodeId, PowerState};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Start,
    End,
    Error,
}

/// Record emitted around every power-set request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSetNotification {
    pub node_uuid: NodeId,
    /// The state the caller asked for, not the computed target.
    pub requested_state: PowerState,
    pub level: NotificationLevel,
    pub status: NotificationStatus,
    pub timestamp_ms: u64,
}

impl PowerSetNotification {
    pub fn event_type(&self) -> &'static str {
        "baremetal.node.power_set"
    }
}

/// Emits notification records. Implementations must be thread-safe.
pub trait NotificationBus: Send + Sync + 'static {
    fn emit_power_set(&self, notification: PowerSetNotification);
}

/// Callback into the workload manager owning a node's instance.
pub trait WorkloadManager: Send + Sync + 'static {
    fn power_update(&self, instance: &InstanceId, state: PowerState);
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{NotificationBus, PowerSetNotification, WorkloadManager};
    use bmc_core::{InstanceId, PowerState};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Bus that records every emitted notification.
    #[derive(Clone, Default)]
    pub struct RecordingBus {
        emitted: Arc<Mutex<Vec<PowerSetNotification>>>,
    }

    impl RecordingBus {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn emitted(&self) -> Vec<PowerSetNotification> {
            self.emitted.lock().clone()
        }
    }

    impl NotificationBus for RecordingBus {
        fn emit_power_set(&self, notification: PowerSetNotification) {
            self.emitted.lock().push(notification);
        }
    }

    /// Workload manager that records power updates.
    #[derive(Clone, Default)]
    pub struct RecordingWorkload {
        updates: Arc<Mutex<Vec<(InstanceId, PowerState)>>>,
    }

    impl RecordingWorkload {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn updates(&self) -> Vec<(InstanceId, PowerState)> {
            self.updates.lock().clone()
        }
    }

    impl WorkloadManager for RecordingWorkload {
        fn power_update(&self, instance: &InstanceId, state: PowerState) {
            self.updates.lock().push((*instance, state));
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{RecordingBus, RecordingWorkload};
