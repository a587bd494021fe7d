// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power and provision state vocabulary.

use serde::{Deserialize, Serialize};

/// Power state of a node, as reported by or requested from the power driver.
///
/// `NoState` doubles as "unknown" for `power_state` and "no action in
/// progress" for `target_power_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    PowerOn,
    PowerOff,
    Reboot,
    SoftReboot,
    SoftPowerOff,
    Error,
    NoState,
}

crate::simple_display! {
    PowerState {
        PowerOn => "power on",
        PowerOff => "power off",
        Reboot => "rebooting",
        SoftReboot => "soft rebooting",
        SoftPowerOff => "soft power off",
        Error => "error",
        NoState => "nostate",
    }
}

impl PowerState {
    /// True for the reboot-flavored requests, which are never skipped by
    /// the power engine's no-op check.
    pub fn is_reboot(self) -> bool {
        matches!(self, PowerState::Reboot | PowerState::SoftReboot)
    }

    /// True when carrying out this request takes the node off the wire,
    /// invalidating in-band agent state.
    pub fn interrupts_agent(self) -> bool {
        matches!(
            self,
            PowerState::PowerOff
                | PowerState::SoftPowerOff
                | PowerState::Reboot
                | PowerState::SoftReboot
        )
    }
}

/// Position in the provisioning lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionState {
    Enroll,
    Verifying,
    Manageable,
    Available,
    Active,
    Adopting,
    Deploying,
    DeployWait,
    DeployFail,
    Cleaning,
    CleanWait,
    CleanFail,
    Rescuing,
    RescueWait,
    Rescue,
    RescueFail,
    Unrescuing,
    Deleting,
    Error,
    NoState,
}

crate::simple_display! {
    ProvisionState {
        Enroll => "enroll",
        Verifying => "verifying",
        Manageable => "manageable",
        Available => "available",
        Active => "active",
        Adopting => "adopting",
        Deploying => "deploying",
        DeployWait => "wait call-back",
        DeployFail => "deploy failed",
        Cleaning => "cleaning",
        CleanWait => "clean wait",
        CleanFail => "clean failed",
        Rescuing => "rescuing",
        RescueWait => "rescue wait",
        Rescue => "rescue",
        RescueFail => "rescue failed",
        Unrescuing => "unrescuing",
        Deleting => "deleting",
        Error => "error",
        NoState => "nostate",
    }
}

/// Events accepted by the provisioning state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionEvent {
    Manage,
    Provide,
    Adopt,
    Deploy,
    Active,
    Wait,
    Resume,
    Abort,
    Fail,
    Delete,
    Clean,
    Rescue,
    Unrescue,
    Done,
}

crate::simple_display! {
    ProvisionEvent {
        Manage => "manage",
        Provide => "provide",
        Adopt => "adopt",
        Deploy => "deploy",
        Active => "active",
        Wait => "wait",
        Resume => "resume",
        Abort => "abort",
        Fail => "fail",
        Delete => "delete",
        Clean => "clean",
        Rescue => "rescue",
        Unrescue => "unrescue",
        Done => "done",
    }
}

/// Boot devices understood by the management interface.
///
/// Values are vendor-neutral; drivers translate to their own encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootDevice {
    Pxe,
    Disk,
    Cdrom,
    Bios,
    Safe,
}

crate::simple_display! {
    BootDevice {
        Pxe => "pxe",
        Disk => "disk",
        Cdrom => "cdrom",
        Bios => "bios",
        Safe => "safe",
    }
}

/// Firmware boot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootMode {
    Uefi,
    Bios,
}

crate::simple_display! {
    BootMode {
        Uefi => "uefi",
        Bios => "bios",
    }
}

/// Default boot option for deployed instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootOption {
    Netboot,
    Local,
}

crate::simple_display! {
    BootOption {
        Netboot => "netboot",
        Local => "local",
    }
}

#[cfg(test)]
#[path = "states_tests.rs"]
mod tests;
