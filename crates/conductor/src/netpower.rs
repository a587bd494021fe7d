// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power handling around network reconfiguration.
//!
//! Smart-NIC wiring is programmed by an agent on the attached host, so the
//! node must be powered on while its attachments change. The scoped entry
//! point powers the node on when needed, runs the reconfiguration, and
//! restores the previous power state on success and failure alike.

use crate::boot;
use crate::power;
use crate::task::Task;
use bmc_core::{BootDevice, Clock, ConductorError, PowerState};
use std::time::Duration;

/// Reported liveness of a host's network agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAgentState {
    Up,
    Down,
}

bmc_core::simple_display! {
    HostAgentState {
        Up => "up",
        Down => "down",
    }
}

/// Client for the external network agent service.
pub trait NetworkAgentClient: Send + Sync + 'static {
    /// Block until the agent on `host` reports `state`; errors surface as
    /// `NetworkError`.
    fn wait_for_host_agent(&self, host: &str, state: HostAgentState)
        -> Result<(), ConductorError>;
}

/// Power the node on if reconfiguration needs it.
///
/// Returns the previous power state when a change was made, `None`
/// otherwise. After powering on, waits for the smart-NIC host agent to go
/// down (its switch view resets with the node).
pub fn power_on_node_if_needed<C: Clock>(
    task: &mut Task<C>,
) -> Result<Option<PowerState>, ConductorError> {
    if !task.driver().network.need_power_on(task.node())? {
        return Ok(None);
    }

    let previous = task.driver().power.get_power_state(task.node())?;
    if previous != PowerState::PowerOff {
        return Ok(None);
    }

    boot::set_boot_device(task, BootDevice::Bios, false)?;
    power::power_action(task, PowerState::PowerOn, None)?;

    let host = task
        .ports()
        .iter()
        .find_map(|port| port.smartnic_hostname().map(str::to_owned));
    if let Some(host) = host {
        tracing::debug!(node = %task.node().uuid, host = %host, "waiting for host agent to be down");
        task.context().net_agent().wait_for_host_agent(&host, HostAgentState::Down)?;
    }
    Ok(Some(previous))
}

/// Undo [`power_on_node_if_needed`].
///
/// Sleeps twice the network agent's polling interval first, giving it time
/// to apply the changes before the node goes back off the wire.
pub fn restore_power_state_if_needed<C: Clock>(
    task: &mut Task<C>,
    previous: Option<PowerState>,
) -> Result<(), ConductorError> {
    let Some(previous) = previous else {
        return Ok(());
    };
    let interval = task.context().config().agent.neutron_agent_poll_interval;
    task.context().clock().clone().sleep(Duration::from_secs(interval * 2));
    power::power_action(task, previous, None)
}

/// Run `operation` with the node guaranteed on the wire, restoring the
/// previous power state on every exit path.
pub fn with_power_for_network_configuration<C: Clock, T>(
    task: &mut Task<C>,
    operation: impl FnOnce(&mut Task<C>) -> Result<T, ConductorError>,
) -> Result<T, ConductorError> {
    let previous = power_on_node_if_needed(task)?;
    let outcome = operation(task);
    let restore = restore_power_state_if_needed(task, previous);
    match (outcome, restore) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore_error)) => Err(restore_error),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(restore_error)) => {
            tracing::error!(
                node = %task.node().uuid,
                %restore_error,
                "failed to restore power state after reconfiguration error"
            );
            Err(error)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{HostAgentState, NetworkAgentClient};
    use bmc_core::ConductorError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct State {
        error: Option<ConductorError>,
        waits: Vec<(String, HostAgentState)>,
    }

    /// Recording network-agent client for tests.
    #[derive(Clone, Default)]
    pub struct FakeNetworkAgent {
        state: Arc<Mutex<State>>,
    }

    impl FakeNetworkAgent {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_waits(&self, error: ConductorError) {
            self.state.lock().error = Some(error);
        }

        pub fn waits(&self) -> Vec<(String, HostAgentState)> {
            self.state.lock().waits.clone()
        }
    }

    impl NetworkAgentClient for FakeNetworkAgent {
        fn wait_for_host_agent(
            &self,
            host: &str,
            state: HostAgentState,
        ) -> Result<(), ConductorError> {
            let mut inner = self.state.lock();
            inner.waits.push((host.to_string(), state));
            match &inner.error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNetworkAgent;

#[cfg(test)]
#[path = "netpower_tests.rs"]
mod tests;
