// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network interface: the single question the conductor asks of it.

use crate::DriverResult;
use bmc_core::Node;

pub trait NetworkInterface: Send + Sync + 'static {
    /// True when reprogramming this node's attachments requires the node to
    /// be powered on (smart-NIC wiring).
    fn need_power_on(&self, node: &Node) -> DriverResult<bool>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::NetworkInterface;
    use crate::DriverResult;
    use bmc_core::Node;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recording network driver for tests.
    #[derive(Clone, Default)]
    pub struct FakeNetwork {
        need_power_on: Arc<Mutex<bool>>,
    }

    impl FakeNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_need_power_on(&self, value: bool) {
            *self.need_power_on.lock() = value;
        }
    }

    impl NetworkInterface for FakeNetwork {
        fn need_power_on(&self, _node: &Node) -> DriverResult<bool> {
            Ok(*self.need_power_on.lock())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNetwork;
