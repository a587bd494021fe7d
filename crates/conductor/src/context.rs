// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared dependencies of every conductor operation.

use crate::netpower::NetworkAgentClient;
use crate::notify::{NotificationBus, WorkloadManager};
use crate::rpc::RpcDispatcher;
use crate::task::NodeLocks;
use bmc_core::{Clock, ConductorError, Config, Node};
use bmc_drivers::Driver;
use bmc_store::NodeStore;
use std::sync::Arc;

/// Resolves the capability record for a node at load time.
pub trait DriverRegistry: Send + Sync + 'static {
    fn resolve(&self, node: &Node) -> Result<Driver, ConductorError>;
}

/// Registry for deployments where every node shares one hardware type.
pub struct SingleDriverRegistry {
    driver: Driver,
}

impl SingleDriverRegistry {
    pub fn new(driver: Driver) -> Self {
        Self { driver }
    }
}

impl DriverRegistry for SingleDriverRegistry {
    fn resolve(&self, _node: &Node) -> Result<Driver, ConductorError> {
        Ok(self.driver.clone())
    }
}

/// The external collaborators, provided at startup.
pub struct ConductorDeps {
    pub drivers: Arc<dyn DriverRegistry>,
    pub bus: Arc<dyn NotificationBus>,
    pub workload: Arc<dyn WorkloadManager>,
    pub rpc: Arc<dyn RpcDispatcher>,
    pub net_agent: Arc<dyn NetworkAgentClient>,
}

/// Read-mostly shared state of one conductor process: config snapshot,
/// store handle, collaborator seams, clock, and the per-node lock table.
pub struct ConductorContext<C: Clock> {
    config: Arc<Config>,
    store: NodeStore,
    deps: ConductorDeps,
    clock: C,
    locks: NodeLocks,
}

impl<C: Clock> ConductorContext<C> {
    pub fn new(config: Config, store: NodeStore, clock: C, deps: ConductorDeps) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            store,
            deps,
            clock,
            locks: NodeLocks::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn drivers(&self) -> &dyn DriverRegistry {
        &*self.deps.drivers
    }

    pub fn bus(&self) -> &dyn NotificationBus {
        &*self.deps.bus
    }

    pub fn workload(&self) -> &dyn WorkloadManager {
        &*self.deps.workload
    }

    pub fn rpc(&self) -> &dyn RpcDispatcher {
        &*self.deps.rpc
    }

    pub fn net_agent(&self) -> &dyn NetworkAgentClient {
        &*self.deps.net_agent
    }

    pub(crate) fn locks(&self) -> &NodeLocks {
        &self.locks
    }
}
