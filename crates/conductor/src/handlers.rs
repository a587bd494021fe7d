// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle error handlers.
//!
//! Every handler is total: faults raised by its own cleanup are folded
//! into `last_error` and the node always ends up persisted in a consistent
//! failure state before the lease is released. The original fault stays
//! with the caller; these handlers only record it.

use crate::agent;
use crate::crypt;
use crate::power;
use crate::task::Task;
use bmc_core::{
    Clock, ConductorError, Fault, Node, PowerState, ProvisionEvent, ProvisionState, StepKind,
};
use bmc_store::NodeStore;

const NO_FREE_WORKERS: &str = "No free conductor workers available";

/// Fire `fail`, logging instead of propagating an illegal transition; the
/// node is already quiescent by the time this runs.
fn fire_fail<C: Clock>(task: &mut Task<C>, target: Option<ProvisionState>) {
    if let Err(error) = task.process_event(ProvisionEvent::Fail, target) {
        tracing::error!(
            node = %task.node().uuid,
            state = %task.node().provision_state,
            %error,
            "internal error: node could not transition to a failed state"
        );
    }
}

/// Put a failed deployment into DEPLOYFAIL.
///
/// `logmsg` is for the log, `errmsg` (defaulting to `logmsg`) for the
/// user-visible `last_error`. With `clean_up`, deployment preparation is
/// undone first; a failure there is appended to `last_error` without
/// losing the original cause.
pub fn deploying_error_handler<C: Clock>(
    task: &mut Task<C>,
    logmsg: &str,
    errmsg: Option<&str>,
    clean_up: bool,
) {
    let errmsg = errmsg.unwrap_or(logmsg).to_string();
    tracing::error!(node = %task.node().uuid, "{logmsg}");
    task.node_mut().last_error = Some(errmsg.clone());
    task.persist_best_effort("recording deploy failure");

    let mut cleanup_err = None;
    if clean_up {
        if let Err(error) = task.driver().deploy.clean_up(task.node()) {
            tracing::error!(
                node = %task.node().uuid,
                %error,
                "cleanup failed after deploy failure"
            );
            let addendum = if error.is_domain() {
                format!("Also failed to clean up due to: {error}")
            } else {
                "An unhandled exception was encountered while aborting. \
                 More information may be found in the log file."
                    .to_string()
            };
            cleanup_err = Some(format!("{errmsg}. {addendum}"));
        }
    }

    // Out-of-band changes may have landed while the driver was busy.
    if let Err(error) = task.refresh() {
        tracing::error!(
            node = %task.node().uuid,
            %error,
            "failed to reload node after deploy failure"
        );
    }

    if task.node().provision_in(&[
        ProvisionState::Deploying,
        ProvisionState::DeployWait,
        ProvisionState::DeployFail,
    ]) {
        // The step list stays behind for debugging; the step itself is done.
        task.node_mut().clear_step(StepKind::Deploy);
        agent::wipe_deploy_internal_info(task);
    }

    if let Some(combined) = cleanup_err {
        task.node_mut().last_error = Some(combined);
    }
    task.persist_best_effort("recording deploy cleanup outcome");

    fire_fail(task, None);
}

/// Put a failed clean into CLEANFAIL and maintenance.
pub fn cleaning_error_handler<C: Clock>(
    task: &mut Task<C>,
    msg: &str,
    tear_down_cleaning: bool,
    set_fail_state: bool,
) {
    {
        let node = task.node_mut();
        node.fault = Some(Fault::CleanFailure);
        node.maintenance = true;
    }

    let mut msg = msg.to_string();
    if tear_down_cleaning {
        if let Err(error) = task.driver().deploy.tear_down_cleaning(task.node()) {
            tracing::error!(
                node = %task.node().uuid,
                %error,
                "failed to tear down cleaning"
            );
            msg = format!("{msg}. Also failed to tear down cleaning.");
        }
    }

    if task.node().provision_in(&[
        ProvisionState::Cleaning,
        ProvisionState::CleanWait,
        ProvisionState::CleanFail,
    ]) {
        let node = task.node_mut();
        node.clear_step(StepKind::Clean);
        let kind = StepKind::Clean;
        node.driver_internal_info.remove(kind.step_index_key());
        node.driver_internal_info.remove(kind.reboot_key());
        node.driver_internal_info.remove(kind.polling_key());
        node.driver_internal_info.remove(kind.skip_current_key());
        // The agent URL changes on the next cleaning attempt.
        agent::remove_agent_url(node);
    }

    let manual_clean = task.node().target_provision_state == ProvisionState::Manageable;
    {
        let node = task.node_mut();
        node.last_error = Some(msg.clone());
        // An operator-set maintenance reason is kept.
        if node.maintenance_reason.is_none() {
            node.maintenance_reason = Some(msg);
        }
    }
    task.persist_best_effort("recording clean failure");

    if set_fail_state && task.node().provision_state != ProvisionState::CleanFail {
        let target = manual_clean.then_some(ProvisionState::Manageable);
        fire_fail(task, target);
    }
}

fn rescue_cleanup<C: Clock>(task: &mut Task<C>, msg: &str) -> Result<(), ConductorError> {
    power::power_action(task, PowerState::PowerOff, None)?;
    task.driver().rescue.clean_up(task.node())?;
    agent::remove_agent_url(task.node_mut());
    task.node_mut().last_error = Some(msg.to_string());
    Ok(())
}

/// Clean up a failed or timed-out rescue.
pub fn rescuing_error_handler<C: Clock>(task: &mut Task<C>, msg: &str, set_fail_state: bool) {
    match rescue_cleanup(task, msg) {
        Ok(()) => {}
        Err(error) if error.is_domain() => {
            tracing::error!(node = %task.node().uuid, %error, "rescue clean up failed");
            task.node_mut().last_error = Some(format!(
                "Rescue operation was unsuccessful, clean up failed for node: {error}"
            ));
        }
        Err(error) => {
            tracing::error!(
                node = %task.node().uuid,
                %error,
                "unexpected error while aborting rescue"
            );
            task.node_mut().last_error = Some(format!(
                "Rescue failed, but an unhandled exception was encountered while aborting: {error}"
            ));
        }
    }

    // Runs no matter how the cleanup went.
    agent::remove_agent_url(task.node_mut());
    task.persist_best_effort("recording rescue failure");

    if set_fail_state {
        fire_fail(task, None);
    }
}

/// Deploy-callback timeout: fail the deployment.
pub fn cleanup_after_timeout<C: Clock>(task: &mut Task<C>) -> Result<(), ConductorError> {
    task.require_exclusive("deploy timeout cleanup")?;
    let msg =
        format!("Timeout reached while waiting for callback for node {}", task.node().uuid);
    deploying_error_handler(task, &msg, None, true);
    Ok(())
}

/// Clean-callback timeout. The periodic sweep has already moved the node
/// to CLEANFAIL, so no `fail` event is fired here.
pub fn cleanup_cleanwait_timeout<C: Clock>(task: &mut Task<C>) {
    let step = task.node().clean_step.as_ref().map(|s| s.step.clone()).unwrap_or_default();
    let msg = format!(
        "Timeout reached while cleaning the node. Please check if the ramdisk \
         responsible for the cleaning is running on the node. Failed on step {step}."
    );
    cleaning_error_handler(task, &msg, true, false);
}

/// Rescue-callback timeout; the state machine has already transitioned.
pub fn cleanup_rescuewait_timeout<C: Clock>(task: &mut Task<C>) -> Result<(), ConductorError> {
    task.require_exclusive("rescue timeout cleanup")?;
    let msg = "Timeout reached while waiting for rescue ramdisk callback for node";
    tracing::error!(node = %task.node().uuid, "{msg}");
    rescuing_error_handler(task, msg, false);
    Ok(())
}

/// Record that an operation died with its conductor. The take-over itself
/// already moved the state, so no events are fired.
pub fn abort_on_conductor_take_over<C: Clock>(task: &mut Task<C>) -> Result<(), ConductorError> {
    task.require_exclusive("conductor take over")?;
    let msg = "Operation was aborted due to conductor take over";
    if task.node().provision_state == ProvisionState::CleanFail {
        cleaning_error_handler(task, msg, true, false);
    } else {
        task.node_mut().last_error = Some(msg.to_string());
        task.persist_best_effort("recording take-over abort");
    }
    tracing::warn!(
        node = %task.node().uuid,
        "aborted the current operation due to conductor take over"
    );
    Ok(())
}

fn save_best_effort(store: &NodeStore, node: &mut Node, what: &str) {
    if let Err(error) = store.save_node(node) {
        tracing::error!(node = %node.uuid, %error, "failed to persist node while {what}");
    }
}

/// Restore provisioning fields when the worker pool refused a job.
///
/// Only `NoFreeConductorWorker` is handled; anything else stays with the
/// caller untouched.
pub fn provisioning_error_handler(
    store: &NodeStore,
    error: &ConductorError,
    node: &mut Node,
    provision_state: ProvisionState,
    target_provision_state: ProvisionState,
) {
    if !matches!(error, ConductorError::NoFreeConductorWorker) {
        return;
    }
    node.provision_state = provision_state;
    node.target_provision_state = target_provision_state;
    node.last_error = Some(NO_FREE_WORKERS.to_string());
    save_best_effort(store, node, "restoring provision state");
    tracing::warn!(
        node = %node.uuid,
        provision_state = %provision_state,
        target_provision_state = %target_provision_state,
        "no free conductor workers; provision state restored"
    );
}

fn spawn_error_handler(
    store: &NodeStore,
    error: &ConductorError,
    node: &mut Node,
    operation: &str,
) {
    if !matches!(error, ConductorError::NoFreeConductorWorker) {
        return;
    }
    node.last_error = Some(NO_FREE_WORKERS.to_string());
    save_best_effort(store, node, "recording refused spawn");
    tracing::warn!(node = %node.uuid, operation, "no free conductor workers");
}

pub fn spawn_cleaning_error_handler(store: &NodeStore, error: &ConductorError, node: &mut Node) {
    spawn_error_handler(store, error, node, "cleaning");
}

pub fn spawn_deploying_error_handler(store: &NodeStore, error: &ConductorError, node: &mut Node) {
    spawn_error_handler(store, error, node, "deploying");
}

/// Rescue additionally scrubs the rescue password: the operation never
/// started, so the secret has no further use.
pub fn spawn_rescue_error_handler(store: &NodeStore, error: &ConductorError, node: &mut Node) {
    if matches!(error, ConductorError::NoFreeConductorWorker) {
        crypt::remove_node_rescue_password(node);
    }
    spawn_error_handler(store, error, node, "rescue");
}

/// Restore power fields when the worker pool refused a power action. No
/// notification is emitted; the power state never changed.
pub fn power_state_error_handler(
    store: &NodeStore,
    error: &ConductorError,
    node: &mut Node,
    power_state: PowerState,
) {
    if !matches!(error, ConductorError::NoFreeConductorWorker) {
        return;
    }
    node.power_state = power_state;
    node.target_power_state = PowerState::NoState;
    node.last_error = Some(NO_FREE_WORKERS.to_string());
    save_best_effort(store, node, "restoring power state");
    tracing::warn!(
        node = %node.uuid,
        power_state = %power_state,
        "no free conductor workers; power state restored"
    );
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
