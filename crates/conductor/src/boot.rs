// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boot-device and boot-mode operations.
//!
//! Nodes being adopted are left alone: changing boot settings under a
//! workload the conductor did not deploy could alter its next boot.

use crate::task::Task;
use bmc_core::{BootDevice, BootMode, Clock, ConductorError, ProvisionState};

/// Set the device the node boots from.
pub fn set_boot_device<C: Clock>(
    task: &mut Task<C>,
    device: BootDevice,
    persistent: bool,
) -> Result<(), ConductorError> {
    task.require_exclusive("set boot device")?;
    task.driver().management.validate(task.node())?;
    if task.node().provision_state == ProvisionState::Adopting {
        return Ok(());
    }
    task.driver().management.set_boot_device(task.node(), device, persistent)
}

/// Read the currently configured boot mode, or `None` when the driver
/// cannot discover it.
pub fn get_boot_mode<C: Clock>(task: &Task<C>) -> Result<Option<BootMode>, ConductorError> {
    task.driver().management.validate(task.node())?;
    match task.driver().management.get_boot_mode(task.node()) {
        Ok(mode) => Ok(mode),
        Err(ConductorError::UnsupportedDriverExtension { .. }) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Set the firmware boot mode, validating it against what the driver
/// supports.
pub fn set_boot_mode<C: Clock>(task: &mut Task<C>, mode: BootMode) -> Result<(), ConductorError> {
    task.require_exclusive("set boot mode")?;
    if task.node().provision_state == ProvisionState::Adopting {
        return Ok(());
    }
    task.driver().management.validate(task.node())?;

    let supported = task.driver().management.get_supported_boot_modes(task.node())?;
    if !supported.contains(&mode) {
        let supported: Vec<String> = supported.iter().map(ToString::to_string).collect();
        return Err(ConductorError::InvalidParameterValue(format!(
            "unsupported boot mode {mode} specified for node {}; supported boot modes are: {}",
            task.node().uuid,
            supported.join(", ")
        )));
    }
    task.driver().management.set_boot_mode(task.node(), mode)
}

#[cfg(test)]
#[path = "boot_tests.rs"]
mod tests;
