// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rescue interface: tearing down rescue ramdisk state.

use crate::DriverResult;
use bmc_core::Node;

pub trait RescueInterface: Send + Sync + 'static {
    /// Undo rescue preparation (rescue network, published ramdisk).
    fn clean_up(&self, node: &Node) -> DriverResult<()>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::RescueInterface;
    use crate::DriverResult;
    use bmc_core::{ConductorError, Node};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct State {
        clean_up_error: Option<ConductorError>,
        clean_up_calls: usize,
    }

    /// Recording rescue driver for tests.
    #[derive(Clone, Default)]
    pub struct FakeRescue {
        state: Arc<Mutex<State>>,
    }

    impl FakeRescue {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_clean_up(&self, error: ConductorError) {
            self.state.lock().clean_up_error = Some(error);
        }

        pub fn clean_up_calls(&self) -> usize {
            self.state.lock().clean_up_calls
        }
    }

    impl RescueInterface for FakeRescue {
        fn clean_up(&self, _node: &Node) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.clean_up_calls += 1;
            match &state.clean_up_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRescue;
