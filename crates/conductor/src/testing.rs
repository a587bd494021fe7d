// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test harness: a conductor context over fake collaborators.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::context::{ConductorContext, ConductorDeps, SingleDriverRegistry};
use crate::netpower::FakeNetworkAgent;
use crate::notify::{RecordingBus, RecordingWorkload};
use crate::rpc::RecordingRpc;
use crate::task::{Task, TaskManager};
use bmc_core::{Config, ConductorError, FakeClock, Node, NodeId};
use bmc_drivers::FakeDriverSet;
use bmc_store::NodeStore;
use std::sync::Arc;

/// A full conductor context wired to recording fakes, plus handles to
/// script and inspect them.
pub struct TestHarness {
    pub context: Arc<ConductorContext<FakeClock>>,
    pub manager: TaskManager<FakeClock>,
    pub clock: FakeClock,
    pub store: NodeStore,
    pub fakes: FakeDriverSet,
    pub bus: RecordingBus,
    pub workload: RecordingWorkload,
    pub rpc: RecordingRpc,
    pub net_agent: FakeNetworkAgent,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let clock = FakeClock::new();
        let store = NodeStore::new();
        let fakes = FakeDriverSet::new();
        let bus = RecordingBus::new();
        let workload = RecordingWorkload::new();
        let rpc = RecordingRpc::new();
        let net_agent = FakeNetworkAgent::new();
        let deps = ConductorDeps {
            drivers: Arc::new(SingleDriverRegistry::new(fakes.driver())),
            bus: Arc::new(bus.clone()),
            workload: Arc::new(workload.clone()),
            rpc: Arc::new(rpc.clone()),
            net_agent: Arc::new(net_agent.clone()),
        };
        let context = ConductorContext::new(config, store.clone(), clock.clone(), deps);
        let manager = TaskManager::new(context.clone());
        Self { context, manager, clock, store, fakes, bus, workload, rpc, net_agent }
    }

    /// Register a node, returning its id.
    pub fn add_node(&self, node: Node) -> NodeId {
        let id = node.uuid;
        self.store.add_node(node);
        id
    }

    /// Exclusive lease for tests.
    pub fn acquire(&self, node: &NodeId) -> Result<Task<FakeClock>, ConductorError> {
        self.manager.acquire(node, false, "test")
    }

    /// Shared lease for tests.
    pub fn acquire_shared(&self, node: &NodeId) -> Result<Task<FakeClock>, ConductorError> {
        self.manager.acquire(node, true, "test")
    }

    /// The stored copy of a node.
    pub fn node(&self, id: &NodeId) -> Result<Node, ConductorError> {
        self.store.get_node(id)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
