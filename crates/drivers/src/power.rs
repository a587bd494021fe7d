// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power interface: query and change chassis power.

use crate::DriverResult;
use bmc_core::{Node, PowerState};
use std::time::Duration;

/// Chassis power control.
///
/// `timeout` is how long the BMC may take to complete the change; `None`
/// uses the driver's own default.
pub trait PowerInterface: Send + Sync + 'static {
    /// Current chassis power state as the hardware reports it.
    fn get_power_state(&self, node: &Node) -> DriverResult<PowerState>;

    /// Drive the chassis to `state`. Not used for reboots.
    fn set_power_state(
        &self,
        node: &Node,
        state: PowerState,
        timeout: Option<Duration>,
    ) -> DriverResult<()>;

    /// Power-cycle the chassis.
    fn reboot(&self, node: &Node, timeout: Option<Duration>) -> DriverResult<()>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::PowerInterface;
    use crate::DriverResult;
    use bmc_core::{ConductorError, Node, PowerState};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct State {
        current: Option<PowerState>,
        scripted_gets: VecDeque<DriverResult<PowerState>>,
        set_error: Option<ConductorError>,
        reboot_error: Option<ConductorError>,
        get_calls: usize,
        set_calls: Vec<(PowerState, Option<Duration>)>,
        reboot_calls: Vec<Option<Duration>>,
    }

    /// Recording power driver for tests.
    ///
    /// Tracks a current chassis state (default `PowerOff`), which scripted
    /// queries and errors can override.
    #[derive(Clone, Default)]
    pub struct FakePower {
        state: Arc<Mutex<State>>,
    }

    impl FakePower {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the chassis state reported by `get_power_state`.
        pub fn set_current(&self, state: PowerState) {
            self.state.lock().current = Some(state);
        }

        /// Queue one result for the next `get_power_state` call.
        pub fn script_get(&self, result: DriverResult<PowerState>) {
            self.state.lock().scripted_gets.push_back(result);
        }

        /// Make every `set_power_state` call fail with `error`.
        pub fn fail_set(&self, error: ConductorError) {
            self.state.lock().set_error = Some(error);
        }

        /// Make every `reboot` call fail with `error`.
        pub fn fail_reboot(&self, error: ConductorError) {
            self.state.lock().reboot_error = Some(error);
        }

        pub fn get_calls(&self) -> usize {
            self.state.lock().get_calls
        }

        pub fn set_calls(&self) -> Vec<(PowerState, Option<Duration>)> {
            self.state.lock().set_calls.clone()
        }

        pub fn reboot_calls(&self) -> usize {
            self.state.lock().reboot_calls.len()
        }
    }

    impl PowerInterface for FakePower {
        fn get_power_state(&self, _node: &Node) -> DriverResult<PowerState> {
            let mut state = self.state.lock();
            state.get_calls += 1;
            if let Some(scripted) = state.scripted_gets.pop_front() {
                return scripted;
            }
            Ok(state.current.unwrap_or(PowerState::PowerOff))
        }

        fn set_power_state(
            &self,
            _node: &Node,
            requested: PowerState,
            timeout: Option<Duration>,
        ) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.set_calls.push((requested, timeout));
            if let Some(error) = &state.set_error {
                return Err(error.clone());
            }
            state.current = Some(match requested {
                PowerState::PowerOn => PowerState::PowerOn,
                _ => PowerState::PowerOff,
            });
            Ok(())
        }

        fn reboot(&self, _node: &Node, timeout: Option<Duration>) -> DriverResult<()> {
            let mut state = self.state.lock();
            state.reboot_calls.push(timeout);
            if let Some(error) = &state.reboot_error {
                return Err(error.clone());
            }
            state.current = Some(PowerState::PowerOn);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePower;
