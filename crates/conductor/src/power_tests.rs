// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notify::{NotificationLevel, NotificationStatus};
use crate::testing::TestHarness;
use bmc_core::{InstanceId, Node};

fn statuses(harness: &TestHarness) -> Vec<(NotificationLevel, NotificationStatus)> {
    harness.bus.emitted().iter().map(|n| (n.level, n.status)).collect()
}

#[test]
fn skips_power_on_when_already_on() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder()
            .power_state(PowerState::PowerOn)
            .last_error("previous failure")
            .build(),
    );
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOn, None).unwrap();

    assert!(harness.fakes.power.set_calls().is_empty());
    assert_eq!(harness.fakes.power.reboot_calls(), 0);

    let node = harness.node(&id).unwrap();
    assert!(node.last_error.is_none());
    assert_eq!(node.power_state, PowerState::PowerOn);
    assert_eq!(node.target_power_state, PowerState::NoState);
    assert_eq!(
        statuses(&harness),
        vec![
            (NotificationLevel::Info, NotificationStatus::Start),
            (NotificationLevel::Info, NotificationStatus::End),
        ]
    );
}

#[test]
fn soft_power_off_is_skipped_when_already_off() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOff).build());
    harness.fakes.power.set_current(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::SoftPowerOff, None).unwrap();
    assert!(harness.fakes.power.set_calls().is_empty());
}

#[test]
fn reboot_bypasses_the_skip_check() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOn).build());
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::Reboot, None).unwrap();

    assert_eq!(harness.fakes.power.reboot_calls(), 1);
    // The current state was never even queried.
    assert_eq!(harness.fakes.power.get_calls(), 0);
    let node = harness.node(&id).unwrap();
    assert_eq!(node.power_state, PowerState::PowerOn);
    assert_eq!(node.target_power_state, PowerState::NoState);
}

#[test]
fn soft_reboot_goes_through_set_power_state() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOn).build());
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::SoftReboot, None).unwrap();

    assert_eq!(harness.fakes.power.reboot_calls(), 0);
    let calls = harness.fakes.power.set_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, PowerState::SoftReboot);
    assert_eq!(harness.node(&id).unwrap().power_state, PowerState::PowerOn);
}

#[test]
fn successful_power_off_updates_state_and_stamps_the_change() {
    let harness = TestHarness::new();
    harness.clock.set_epoch_ms(1_700_000_000_000);
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOn).build());
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOff, None).unwrap();

    let node = harness.node(&id).unwrap();
    assert_eq!(node.power_state, PowerState::PowerOff);
    assert_eq!(node.target_power_state, PowerState::NoState);
    assert_eq!(
        node.driver_internal_info.get_str(info_keys::LAST_POWER_STATE_CHANGE),
        Some(crate::time_fmt::iso_utc(1_700_000_000_000).as_str())
    );
}

#[test]
fn workload_manager_is_told_about_instance_nodes() {
    let harness = TestHarness::new();
    let instance = InstanceId::new();
    let id = harness.add_node(
        Node::builder()
            .power_state(PowerState::PowerOff)
            .instance_uuid(instance)
            .build(),
    );
    harness.fakes.power.set_current(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOn, None).unwrap();
    assert_eq!(harness.workload.updates(), vec![(instance, PowerState::PowerOn)]);
}

#[test]
fn active_node_attaches_volumes_before_power_on() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder()
            .provision_state(ProvisionState::Active)
            .power_state(PowerState::PowerOff)
            .build(),
    );
    harness.fakes.power.set_current(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOn, None).unwrap();
    assert_eq!(harness.fakes.storage.attach_calls(), 1);
}

#[test]
fn attach_failure_blocks_power_on() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder()
            .provision_state(ProvisionState::Active)
            .power_state(PowerState::PowerOff)
            .build(),
    );
    harness.fakes.power.set_current(PowerState::PowerOff);
    harness.fakes.storage.fail_attach(ConductorError::StorageError("iscsi down".into()));

    let mut task = harness.acquire(&id).unwrap();
    let result = power_action(&mut task, PowerState::PowerOn, None);
    assert!(matches!(result, Err(ConductorError::StorageError(_))));
    assert!(harness.fakes.power.set_calls().is_empty());

    let node = harness.node(&id).unwrap();
    assert_eq!(node.target_power_state, PowerState::NoState);
    assert!(node.last_error.as_deref().unwrap_or_default().contains("iscsi down"));
}

#[test]
fn detach_failure_after_power_off_is_logged_not_raised() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder()
            .provision_state(ProvisionState::Active)
            .power_state(PowerState::PowerOn)
            .build(),
    );
    harness.fakes.power.set_current(PowerState::PowerOn);
    harness.fakes.storage.fail_detach(ConductorError::StorageError("late".into()));

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOff, None).unwrap();
    assert_eq!(harness.fakes.storage.detach_calls(), 1);
    assert_eq!(harness.node(&id).unwrap().power_state, PowerState::PowerOff);
}

#[test]
fn driver_failure_records_error_and_notifies() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOn).build());
    harness.fakes.power.set_current(PowerState::PowerOn);
    harness
        .fakes
        .power
        .fail_set(ConductorError::DriverOperationError("bmc rejected request".into()));

    let mut task = harness.acquire(&id).unwrap();
    let result = power_action(&mut task, PowerState::PowerOff, None);
    assert!(matches!(result, Err(ConductorError::DriverOperationError(_))));

    let node = harness.node(&id).unwrap();
    assert_eq!(node.target_power_state, PowerState::NoState);
    let last_error = node.last_error.unwrap_or_default();
    assert!(last_error.contains("Failed to change power state to 'power off'"));
    assert!(last_error.contains("bmc rejected request"));
    assert_eq!(
        statuses(&harness),
        vec![
            (NotificationLevel::Info, NotificationStatus::Start),
            (NotificationLevel::Error, NotificationStatus::Error),
        ]
    );
}

#[test]
fn failed_state_query_aborts_with_error_notification() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());
    harness
        .fakes
        .power
        .script_get(Err(ConductorError::DriverOperationError("no route to bmc".into())));

    let mut task = harness.acquire(&id).unwrap();
    let result = power_action(&mut task, PowerState::PowerOn, None);
    assert!(matches!(result, Err(ConductorError::DriverOperationError(_))));
    assert!(harness.fakes.power.set_calls().is_empty());

    let node = harness.node(&id).unwrap();
    assert_eq!(node.target_power_state, PowerState::NoState);
    assert!(node.last_error.unwrap_or_default().contains("no route to bmc"));
    assert_eq!(
        statuses(&harness),
        vec![
            (NotificationLevel::Info, NotificationStatus::Start),
            (NotificationLevel::Error, NotificationStatus::Error),
        ]
    );
}

#[test]
fn error_power_state_is_treated_optimistically() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());
    harness.fakes.power.script_get(Ok(PowerState::Error));

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOff, None).unwrap();
    assert_eq!(harness.fakes.power.set_calls().len(), 1);
}

#[test]
fn invalid_power_action_is_rejected_up_front() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let mut task = harness.acquire(&id).unwrap();
    let result = power_action(&mut task, PowerState::NoState, None);
    assert!(matches!(result, Err(ConductorError::InvalidParameterValue(_))));
    assert!(harness.bus.emitted().is_empty());
}

#[test]
fn power_action_requires_an_exclusive_lease() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let mut task = harness.acquire_shared(&id).unwrap();
    assert!(matches!(
        power_action(&mut task, PowerState::PowerOn, None),
        Err(ConductorError::ExclusiveLockRequired { .. })
    ));
}

#[test]
fn wait_for_power_state_backs_off_until_the_state_arrives() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());
    harness.fakes.power.set_current(PowerState::PowerOn);
    harness.fakes.power.script_get(Ok(PowerState::PowerOff));
    harness.fakes.power.script_get(Ok(PowerState::PowerOff));

    let task = harness.acquire(&id).unwrap();
    let observed = wait_for_power_state(&task, PowerState::PowerOn, None).unwrap();
    assert_eq!(observed, PowerState::PowerOn);

    let sleeps = harness.clock.sleeps();
    assert_eq!(
        sleeps,
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[test]
fn wait_for_power_state_times_out() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());
    harness.fakes.power.set_current(PowerState::PowerOff);

    let task = harness.acquire(&id).unwrap();
    let result =
        wait_for_power_state(&task, PowerState::PowerOn, Some(Duration::from_secs(5)));
    assert!(matches!(
        result,
        Err(ConductorError::PowerStateFailure { desired: PowerState::PowerOn })
    ));
    // 1s + 2s + 2s exhausts the five-second budget.
    assert_eq!(harness.clock.sleeps().len(), 3);
}
