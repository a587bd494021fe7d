// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-node capability record.

use crate::{
    DeployInterface, ManagementInterface, NetworkInterface, PowerInterface, RescueInterface,
    StorageInterface,
};
use std::sync::Arc;

/// The bag of sub-drivers resolved for a node at load time.
///
/// Cloning is cheap; all sub-drivers are shared.
#[derive(Clone)]
pub struct Driver {
    pub power: Arc<dyn PowerInterface>,
    pub management: Arc<dyn ManagementInterface>,
    pub deploy: Arc<dyn DeployInterface>,
    pub storage: Arc<dyn StorageInterface>,
    pub network: Arc<dyn NetworkInterface>,
    pub rescue: Arc<dyn RescueInterface>,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").finish_non_exhaustive()
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::Driver;
    use crate::{FakeDeploy, FakeManagement, FakeNetwork, FakePower, FakeRescue, FakeStorage};
    use std::sync::Arc;

    /// A full set of fake sub-drivers plus the [`Driver`] record over them.
    ///
    /// The handles share state with the record, so tests script and inspect
    /// through the set while the code under test goes through the record.
    #[derive(Clone, Default)]
    pub struct FakeDriverSet {
        pub power: FakePower,
        pub management: FakeManagement,
        pub deploy: FakeDeploy,
        pub storage: FakeStorage,
        pub network: FakeNetwork,
        pub rescue: FakeRescue,
    }

    impl FakeDriverSet {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn driver(&self) -> Driver {
            Driver {
                power: Arc::new(self.power.clone()),
                management: Arc::new(self.management.clone()),
                deploy: Arc::new(self.deploy.clone()),
                storage: Arc::new(self.storage.clone()),
                network: Arc::new(self.network.clone()),
                rescue: Arc::new(self.rescue.clone()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDriverSet;

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
