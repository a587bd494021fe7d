// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy interface: the pieces of image deployment the lifecycle handlers
//! call back into.

use crate::DriverResult;
use bmc_core::Node;

pub trait DeployInterface: Send + Sync + 'static {
    /// Undo deployment preparation (boot configuration, published images).
    fn clean_up(&self, node: &Node) -> DriverResult<()>;

    /// Undo cleaning preparation (cleaning network, ramdisk boot).
    fn tear_down_cleaning(&self, node: &Node) -> DriverResult<()>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::DeployInterface;
    use crate::DriverResult;
    use bmc_core::{ConductorError, Node};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct State {
        clean_up_error: Option<ConductorError>,
        tear_down_error: Option<ConductorError>,
        clean_up_calls: usize,
        tear_down_calls: usize,
    }

    /// Recording deploy driver for tests.
    #[derive(Clone, Default)]
    pub struct FakeDeploy {
        state: Arc<Mutex<State>>,
    }

    impl FakeDeploy {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_clean_up(&self, error: ConductorError) {
            self.state.lock().clean_up_error = Some(error);
        }

        pub fn fail_tear_down_cleaning(&self, error: ConductorError) {
            self.state.lock().tear_down_error = Some(error);
        }

        pub fn clean_up_calls(&self) -> usize {
            self.state.lock().clean_up_calls
        }

        pub fn tear_down_cleaning_calls(&self) -> usize {
            self.state.lock().tear_down_calls
        }
    }

    impl DeployInterface for FakeDeploy {
        fn clean_up(&self, _node: &Node) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.clean_up_calls += 1;
            match &state.clean_up_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        fn tear_down_cleaning(&self, _node: &Node) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.tear_down_calls += 1;
            match &state.tear_down_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDeploy;
