// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The power-action engine.

use crate::agent;
use crate::notify::{NotificationLevel, NotificationStatus, PowerSetNotification};
use crate::task::Task;
use crate::time_fmt;
use bmc_core::{info_keys, Clock, ConductorError, PowerState, ProvisionState};
use std::time::Duration;

fn emit_power_notification<C: Clock>(
    task: &Task<C>,
    level: NotificationLevel,
    status: NotificationStatus,
    requested: PowerState,
) {
    task.context().bus().emit_power_set(PowerSetNotification {
        node_uuid: task.node().uuid,
        requested_state: requested,
        level,
        status,
        timestamp_ms: task.context().clock().epoch_ms(),
    });
}

/// The persisted target for a requested power action.
fn calculate_target_state(new_state: PowerState) -> Option<PowerState> {
    match new_state {
        PowerState::PowerOn | PowerState::Reboot | PowerState::SoftReboot => {
            Some(PowerState::PowerOn)
        }
        PowerState::PowerOff | PowerState::SoftPowerOff => Some(PowerState::PowerOff),
        _ => None,
    }
}

/// Check whether the requested change is already in effect.
///
/// Only plain on/off requests can be skipped; reboots always run. A failed
/// driver query persists the failure and propagates, so callers never see a
/// skip decision without a current state behind it.
fn can_skip_state_change<C: Clock>(
    task: &mut Task<C>,
    new_state: PowerState,
) -> Result<bool, ConductorError> {
    if !matches!(
        new_state,
        PowerState::PowerOn | PowerState::PowerOff | PowerState::SoftPowerOff
    ) {
        return Ok(false);
    }

    let current = match task.driver().power.get_power_state(task.node()) {
        Ok(state) => state,
        Err(error) => {
            let node = task.node_mut();
            node.last_error =
                Some(format!("Failed to change power state to '{new_state}'. Error: {error}"));
            node.target_power_state = PowerState::NoState;
            task.persist_best_effort("recording power query failure");
            emit_power_notification(
                task,
                NotificationLevel::Error,
                NotificationStatus::Error,
                new_state,
            );
            return Err(error);
        }
    };

    let already_there = match current {
        PowerState::PowerOn => new_state == PowerState::PowerOn,
        PowerState::PowerOff => {
            matches!(new_state, PowerState::PowerOff | PowerState::SoftPowerOff)
        }
        PowerState::Error => {
            // Be optimistic and continue the action.
            tracing::warn!(node = %task.node().uuid, "driver returns ERROR power state");
            false
        }
        _ => false,
    };
    if !already_there {
        return Ok(false);
    }

    // The node is already where the caller wants it; clear stale error
    // state and report success.
    let node = task.node_mut();
    node.last_error = None;
    node.power_state = current;
    node.target_power_state = PowerState::NoState;
    task.save_node()?;
    emit_power_notification(task, NotificationLevel::Info, NotificationStatus::End, new_state);
    tracing::warn!(
        node = %task.node().uuid,
        state = %current,
        "not going to change power state; current state = requested state"
    );
    Ok(true)
}

fn do_power_call<C: Clock>(
    task: &Task<C>,
    new_state: PowerState,
    target: PowerState,
    timeout: Option<Duration>,
) -> Result<(), ConductorError> {
    if target == PowerState::PowerOn && task.node().provision_state == ProvisionState::Active {
        task.driver().storage.attach_volumes(task.node())?;
    }
    if new_state == PowerState::Reboot {
        task.driver().power.reboot(task.node(), timeout)
    } else {
        task.driver().power.set_power_state(task.node(), new_state, timeout)
    }
}

/// Change power state or reset a node.
///
/// Emits START/END/ERROR notifications, skips no-op on/off requests, wipes
/// agent state going off the wire, and leaves `target_power_state` at
/// `NoState` with `last_error` populated on every failure path.
pub fn power_action<C: Clock>(
    task: &mut Task<C>,
    new_state: PowerState,
    timeout: Option<Duration>,
) -> Result<(), ConductorError> {
    task.require_exclusive("power action")?;
    let Some(target) = calculate_target_state(new_state) else {
        return Err(ConductorError::InvalidParameterValue(format!(
            "'{new_state}' is not a valid power action"
        )));
    };

    emit_power_notification(task, NotificationLevel::Info, NotificationStatus::Start, new_state);

    if can_skip_state_change(task, new_state)? {
        return Ok(());
    }

    // Expose the in-progress action before touching hardware.
    let stamp = time_fmt::iso_utc(task.context().clock().epoch_ms());
    {
        let node = task.node_mut();
        node.target_power_state = target;
        node.last_error = None;
        node.driver_internal_info.set(info_keys::LAST_POWER_STATE_CHANGE, stamp);
        if new_state.interrupts_agent() {
            agent::wipe_internal_info_on_power_off(node);
        }
    }
    task.save_node()?;

    match do_power_call(task, new_state, target, timeout) {
        Ok(()) => {
            let node = task.node_mut();
            node.power_state = target;
            node.target_power_state = PowerState::NoState;
            task.save_node()?;
            if let Some(instance) = task.node().instance_uuid {
                task.context().workload().power_update(&instance, target);
            }
            emit_power_notification(
                task,
                NotificationLevel::Info,
                NotificationStatus::End,
                new_state,
            );
            tracing::info!(
                node = %task.node().uuid,
                target = %target,
                requested = %new_state,
                "successfully set power state"
            );
            if target == PowerState::PowerOff
                && task.node().provision_state == ProvisionState::Active
            {
                if let Err(error) = task.driver().storage.detach_volumes(task.node()) {
                    match error {
                        ConductorError::StorageError(_) => {
                            tracing::warn!(
                                node = %task.node().uuid,
                                %error,
                                "volume detachment failed"
                            );
                        }
                        other => return Err(other),
                    }
                }
            }
            Ok(())
        }
        Err(error) => {
            let node = task.node_mut();
            node.target_power_state = PowerState::NoState;
            node.last_error = Some(format!(
                "Failed to change power state to '{target}' by '{new_state}'. Error: {error}"
            ));
            task.persist_best_effort("recording power failure");
            emit_power_notification(
                task,
                NotificationLevel::Error,
                NotificationStatus::Error,
                new_state,
            );
            Err(error)
        }
    }
}

/// Poll the driver until the node reaches `desired`.
///
/// Back-off starts at one second and doubles, capped by the remaining
/// budget (`timeout`, or `conductor.power_state_change_timeout`).
pub fn wait_for_power_state<C: Clock>(
    task: &Task<C>,
    desired: PowerState,
    timeout: Option<Duration>,
) -> Result<PowerState, ConductorError> {
    let limit = timeout.unwrap_or(Duration::from_secs(
        task.context().config().conductor.power_state_change_timeout,
    ));
    let clock = task.context().clock().clone();
    let deadline = clock.now() + limit;
    let mut delay = Duration::from_secs(1);
    loop {
        let observed = task.driver().power.get_power_state(task.node())?;
        if observed == desired {
            return Ok(observed);
        }
        let now = clock.now();
        if now >= deadline {
            tracing::error!(
                node = %task.node().uuid,
                desired = %desired,
                timeout_secs = limit.as_secs(),
                "timed out waiting for power state"
            );
            return Err(ConductorError::PowerStateFailure { desired });
        }
        clock.sleep(delay.min(deadline - now));
        delay = (delay * 2).min(limit);
    }
}

#[cfg(test)]
#[path = "power_tests.rs"]
mod tests;
