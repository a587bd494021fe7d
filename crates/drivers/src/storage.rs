// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage interface: remote volume attachment.

use crate::DriverResult;
use bmc_core::Node;

pub trait StorageInterface: Send + Sync + 'static {
    /// Connect the node's remote volumes. Failure blocks power-on.
    fn attach_volumes(&self, node: &Node) -> DriverResult<()>;

    /// Disconnect the node's remote volumes.
    fn detach_volumes(&self, node: &Node) -> DriverResult<()>;

    /// True when deployment writes an image to the node's disk (as opposed
    /// to booting from a remote volume).
    fn should_write_image(&self, node: &Node) -> bool;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::StorageInterface;
    use crate::DriverResult;
    use bmc_core::{ConductorError, Node};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct State {
        attach_error: Option<ConductorError>,
        detach_error: Option<ConductorError>,
        should_write_image: bool,
        attach_calls: usize,
        detach_calls: usize,
    }

    impl Default for State {
        fn default() -> Self {
            Self {
                attach_error: None,
                detach_error: None,
                should_write_image: true,
                attach_calls: 0,
                detach_calls: 0,
            }
        }
    }

    /// Recording storage driver for tests.
    #[derive(Clone, Default)]
    pub struct FakeStorage {
        state: Arc<Mutex<State>>,
    }

    impl FakeStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_attach(&self, error: ConductorError) {
            self.state.lock().attach_error = Some(error);
        }

        pub fn fail_detach(&self, error: ConductorError) {
            self.state.lock().detach_error = Some(error);
        }

        pub fn set_should_write_image(&self, value: bool) {
            self.state.lock().should_write_image = value;
        }

        pub fn attach_calls(&self) -> usize {
            self.state.lock().attach_calls
        }

        pub fn detach_calls(&self) -> usize {
            self.state.lock().detach_calls
        }
    }

    impl StorageInterface for FakeStorage {
        fn attach_volumes(&self, _node: &Node) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.attach_calls += 1;
            match &state.attach_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        fn detach_volumes(&self, _node: &Node) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.detach_calls += 1;
            match &state.detach_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        fn should_write_image(&self, _node: &Node) -> bool {
            self.state.lock().should_write_image
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStorage;
