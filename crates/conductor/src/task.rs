// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node leases and the state-machine engine that runs under them.
//!
//! A [`Task`] is a held shared or exclusive lease on one node, bundled with
//! the node snapshot, its ports, the resolved driver record and the
//! conductor context. The lease is released on every exit path through
//! `Drop`. Cross-process coordination is the store's optimistic versioning;
//! these locks coordinate the workers of one process.

use crate::context::ConductorContext;
use bmc_core::{
    is_stable_state, machine, Clock, ConductorError, Node, NodeId, Port, ProvisionEvent,
    ProvisionState,
};
use bmc_drivers::Driver;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long acquisition or upgrade may wait before giving up.
const LOCK_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Default)]
struct LockState {
    shared: usize,
    exclusive: bool,
    waiting_exclusive: usize,
}

#[derive(Default)]
struct LockEntry {
    state: Mutex<LockState>,
    cond: Condvar,
}

/// Writer-priority shared/exclusive locks keyed by node id.
#[derive(Default)]
pub(crate) struct NodeLocks {
    entries: Mutex<HashMap<NodeId, Arc<LockEntry>>>,
}

impl NodeLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn entry(&self, node: &NodeId) -> Arc<LockEntry> {
        self.entries.lock().entry(*node).or_default().clone()
    }

    pub(crate) fn acquire(
        &self,
        node: &NodeId,
        shared: bool,
        purpose: &str,
    ) -> Result<Lease, ConductorError> {
        let entry = self.entry(node);
        let deadline = Instant::now() + LOCK_ACQUIRE_TIMEOUT;
        let mut state = entry.state.lock();
        if shared {
            // Pending writers block new readers.
            while state.exclusive || state.waiting_exclusive > 0 {
                if entry.cond.wait_until(&mut state, deadline).timed_out() {
                    return Err(lock_failed(node, purpose));
                }
            }
            state.shared += 1;
        } else {
            state.waiting_exclusive += 1;
            while state.exclusive || state.shared > 0 {
                if entry.cond.wait_until(&mut state, deadline).timed_out() {
                    state.waiting_exclusive -= 1;
                    entry.cond.notify_all();
                    return Err(lock_failed(node, purpose));
                }
            }
            state.waiting_exclusive -= 1;
            state.exclusive = true;
        }
        drop(state);
        Ok(Lease { entry, node: *node, shared })
    }

    /// Convert a shared lease to exclusive without a release window.
    fn upgrade(&self, lease: &mut Lease, purpose: &str) -> Result<(), ConductorError> {
        let entry = lease.entry.clone();
        let mut state = entry.state.lock();
        if state.waiting_exclusive > 0 {
            // Another upgrader is parked behind our shared hold; waiting
            // would deadlock until the timeout.
            return Err(lock_failed(&lease.node, purpose));
        }
        state.waiting_exclusive += 1;
        let deadline = Instant::now() + LOCK_ACQUIRE_TIMEOUT;
        while state.shared > 1 {
            if entry.cond.wait_until(&mut state, deadline).timed_out() {
                state.waiting_exclusive -= 1;
                entry.cond.notify_all();
                return Err(lock_failed(&lease.node, purpose));
            }
        }
        state.waiting_exclusive -= 1;
        state.shared -= 1;
        state.exclusive = true;
        drop(state);
        lease.shared = false;
        Ok(())
    }
}

fn lock_failed(node: &NodeId, purpose: &str) -> ConductorError {
    ConductorError::LockAcquisitionFailed {
        node: node.to_string(),
        reason: format!("timed out waiting for lock ({purpose})"),
    }
}

/// A held node lock. Dropping releases it.
pub(crate) struct Lease {
    entry: Arc<LockEntry>,
    node: NodeId,
    shared: bool,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut state = self.entry.state.lock();
        if self.shared {
            state.shared -= 1;
        } else {
            state.exclusive = false;
        }
        drop(state);
        self.entry.cond.notify_all();
        tracing::trace!(node = %self.node, "released node lock");
    }
}

/// Hands out [`Task`] leases over a context's lock table.
pub struct TaskManager<C: Clock> {
    context: Arc<ConductorContext<C>>,
}

impl<C: Clock> TaskManager<C> {
    pub fn new(context: Arc<ConductorContext<C>>) -> Self {
        Self { context }
    }

    /// Take a lease on `node_id` and load everything an operation needs.
    pub fn acquire(
        &self,
        node_id: &NodeId,
        shared: bool,
        purpose: &str,
    ) -> Result<Task<C>, ConductorError> {
        let lease = self.context.locks().acquire(node_id, shared, purpose)?;
        let node = self.context.store().get_node(node_id)?;
        let ports = self.context.store().ports_for_node(node_id);
        let driver = self.context.drivers().resolve(&node)?;
        tracing::debug!(node = %node_id, shared, purpose, "acquired node lock");
        Ok(Task {
            context: self.context.clone(),
            node,
            ports,
            driver,
            purpose: purpose.to_string(),
            lease: Some(lease),
        })
    }
}

/// A node operation in progress: the lease plus everything loaded under it.
pub struct Task<C: Clock> {
    context: Arc<ConductorContext<C>>,
    node: Node,
    ports: Vec<Port>,
    driver: Driver,
    purpose: String,
    lease: Option<Lease>,
}

impl<C: Clock> Task<C> {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn context(&self) -> &Arc<ConductorContext<C>> {
        &self.context
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    /// True while holding a shared (not exclusive) lease.
    pub fn shared(&self) -> bool {
        matches!(&self.lease, Some(lease) if lease.shared)
    }

    /// Guard for mutating operations.
    pub fn require_exclusive(&self, operation: &str) -> Result<(), ConductorError> {
        match &self.lease {
            Some(lease) if !lease.shared => Ok(()),
            _ => Err(ConductorError::ExclusiveLockRequired { operation: operation.to_string() }),
        }
    }

    /// Atomically convert a shared lease to exclusive. No-op when already
    /// exclusive; fails without dropping the shared hold.
    pub fn upgrade_lock(&mut self, purpose: &str) -> Result<(), ConductorError> {
        match &mut self.lease {
            Some(lease) if lease.shared => {
                self.context.locks().upgrade(lease, purpose)?;
                tracing::debug!(node = %self.node.uuid, purpose, "upgraded node lock");
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(ConductorError::LockAcquisitionFailed {
                node: self.node.uuid.to_string(),
                reason: "lease already released".to_string(),
            }),
        }
    }

    /// Drop the lease early, before dispatching work that re-acquires it.
    pub fn release_resources(&mut self) {
        self.lease = None;
    }

    /// Persist the node under the exclusive lease.
    pub fn save_node(&mut self) -> Result<(), ConductorError> {
        self.require_exclusive("save node")?;
        self.context.store().save_node(&mut self.node)
    }

    /// Persist, logging instead of propagating failures. Error paths use
    /// this so the original fault survives to the caller.
    pub(crate) fn persist_best_effort(&mut self, what: &str) {
        if let Err(error) = self.save_node() {
            tracing::error!(node = %self.node.uuid, %error, "failed to persist node while {what}");
        }
    }

    /// Reload the node record in place; other processes may have moved it.
    pub fn refresh(&mut self) -> Result<(), ConductorError> {
        self.context.store().refresh_node(&mut self.node)
    }

    /// Advance the provisioning state machine and persist the node.
    ///
    /// `target_state` overrides the recorded `target_provision_state`
    /// (used by `fail` with a manual-clean target); otherwise
    /// operation-starting events record their own target and stable states
    /// clear it.
    pub fn process_event(
        &mut self,
        event: ProvisionEvent,
        target_state: Option<ProvisionState>,
    ) -> Result<(), ConductorError> {
        self.require_exclusive("process event")?;
        let from = self.node.provision_state;
        let mut next =
            machine::transition(from, event).ok_or(ConductorError::InvalidState { state: from, event })?;

        // A manual clean finishes back in MANAGEABLE.
        if from == ProvisionState::Cleaning
            && event == ProvisionEvent::Done
            && self.node.target_provision_state == ProvisionState::Manageable
        {
            next = ProvisionState::Manageable;
        }

        self.node.provision_state = next;
        if let Some(target) = target_state {
            self.node.target_provision_state = target;
        } else if let Some(target) = machine::operation_target(from, event) {
            self.node.target_provision_state = target;
        } else if is_stable_state(next) {
            self.node.target_provision_state = ProvisionState::NoState;
        }
        self.save_node()?;
        tracing::info!(
            node = %self.node.uuid,
            %event,
            from = %from,
            to = %next,
            "provision state changed"
        );
        Ok(())
    }
}

impl<C: Clock> std::fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("node", &self.node.uuid)
            .field("purpose", &self.purpose)
            .field("shared", &self.shared())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
