// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch to peer conductors.
//!
//! The conductor core consumes this interface; the RPC layer provides it at
//! startup. Keeping the seam here avoids the core depending on transport.

use crate::task::Task;
use bmc_core::{Clock, ConductorError, NodeId, StepKind};

pub trait RpcDispatcher: Send + Sync + 'static {
    /// Ask whichever conductor owns `node` to continue its clean or deploy
    /// steps.
    fn continue_node_operation(&self, node: &NodeId, operation: StepKind)
        -> Result<(), ConductorError>;
}

/// Hand the node over to the owning conductor to resume `operation`.
///
/// The lease is released first; the peer re-acquires it.
pub fn notify_conductor_resume_operation<C: Clock>(
    task: &mut Task<C>,
    operation: StepKind,
) -> Result<(), ConductorError> {
    let node = task.node().uuid;
    tracing::debug!(node = %node, op = %operation, "dispatching resume to owning conductor");
    task.release_resources();
    task.context().rpc().continue_node_operation(&node, operation)
}

pub fn notify_conductor_resume_clean<C: Clock>(task: &mut Task<C>) -> Result<(), ConductorError> {
    notify_conductor_resume_operation(task, StepKind::Clean)
}

pub fn notify_conductor_resume_deploy<C: Clock>(task: &mut Task<C>) -> Result<(), ConductorError> {
    notify_conductor_resume_operation(task, StepKind::Deploy)
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::RpcDispatcher;
    use bmc_core::{ConductorError, NodeId, StepKind};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Dispatcher that records calls instead of sending them.
    #[derive(Clone, Default)]
    pub struct RecordingRpc {
        calls: Arc<Mutex<Vec<(NodeId, StepKind)>>>,
    }

    impl RecordingRpc {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<(NodeId, StepKind)> {
            self.calls.lock().clone()
        }
    }

    impl RpcDispatcher for RecordingRpc {
        fn continue_node_operation(
            &self,
            node: &NodeId,
            operation: StepKind,
        ) -> Result<(), ConductorError> {
            self.calls.lock().push((*node, operation));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingRpc;

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
