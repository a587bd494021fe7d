// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Power-action specs.

use crate::prelude::*;
use bmc_conductor::notify::{NotificationLevel, NotificationStatus};
use bmc_conductor::power::power_action;

#[test]
fn power_on_an_already_on_node_is_a_recorded_noop() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder()
            .power_state(PowerState::PowerOn)
            .last_error("stale failure from last week")
            .build(),
    );
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOn, None).unwrap();

    // The driver was asked where it is, never to move.
    assert!(harness.fakes.power.set_calls().is_empty());
    assert_eq!(harness.fakes.power.reboot_calls(), 0);

    let node = harness.node(&id).unwrap();
    assert!(node.last_error.is_none());
    assert_eq!(node.power_state, PowerState::PowerOn);
    assert_eq!(node.target_power_state, PowerState::NoState);

    let emitted = harness.bus.emitted();
    assert_eq!(emitted.len(), 2);
    assert_eq!(
        (emitted[0].level, emitted[0].status),
        (NotificationLevel::Info, NotificationStatus::Start)
    );
    assert_eq!(
        (emitted[1].level, emitted[1].status),
        (NotificationLevel::Info, NotificationStatus::End)
    );
    assert!(emitted.iter().all(|n| n.requested_state == PowerState::PowerOn));
    assert!(emitted.iter().all(|n| n.node_uuid == id));
}

#[test]
fn repeated_power_actions_are_idempotent() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOn).build());
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOff, None).unwrap();
    let after_first = harness.node(&id).unwrap();

    power_action(&mut task, PowerState::PowerOff, None).unwrap();
    let after_second = harness.node(&id).unwrap();

    // The second request hit the skip check and changed nothing but the
    // version bump of its save.
    assert_eq!(harness.fakes.power.set_calls().len(), 1);
    assert_eq!(after_first.power_state, after_second.power_state);
    assert_eq!(after_first.target_power_state, after_second.target_power_state);
    assert_eq!(after_first.last_error, after_second.last_error);
    assert_eq!(
        after_first.driver_internal_info.get_str(info_keys::LAST_POWER_STATE_CHANGE),
        after_second.driver_internal_info.get_str(info_keys::LAST_POWER_STATE_CHANGE),
    );
}

#[test]
fn a_failed_power_action_always_clears_the_target() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(PowerState::PowerOff).build());
    harness.fakes.power.set_current(PowerState::PowerOff);
    harness
        .fakes
        .power
        .fail_set(ConductorError::DriverOperationError("chassis fault".into()));

    let mut task = harness.acquire(&id).unwrap();
    assert!(power_action(&mut task, PowerState::PowerOn, None).is_err());

    let node = harness.node(&id).unwrap();
    assert_eq!(node.target_power_state, PowerState::NoState);
    assert!(node.last_error.unwrap_or_default().contains("chassis fault"));
}
