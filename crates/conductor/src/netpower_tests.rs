// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testing::TestHarness;
use bmc_core::{Node, Port};
use serde_json::json;

fn smartnic_harness(powered: PowerState) -> (TestHarness, bmc_core::NodeId) {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().power_state(powered).build());
    let mut port = Port::builder().node_uuid(id).is_smartnic(true).build();
    port.local_link_connection.insert("hostname".to_string(), json!("cn-3.rack2"));
    harness.store.add_port(port);
    harness.fakes.network.set_need_power_on(true);
    harness.fakes.power.set_current(powered);
    (harness, id)
}

#[test]
fn nothing_happens_without_need_power_on() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let mut task = harness.acquire(&id).unwrap();
    assert_eq!(power_on_node_if_needed(&mut task).unwrap(), None);
    assert!(harness.fakes.power.set_calls().is_empty());
    assert!(harness.net_agent.waits().is_empty());
}

#[test]
fn an_already_powered_node_is_left_alone() {
    let (harness, id) = smartnic_harness(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    assert_eq!(power_on_node_if_needed(&mut task).unwrap(), None);
    assert!(harness.fakes.management.set_boot_device_calls().is_empty());
}

#[test]
fn powered_off_smartnic_node_is_brought_up() {
    let (harness, id) = smartnic_harness(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    let previous = power_on_node_if_needed(&mut task).unwrap();
    assert_eq!(previous, Some(PowerState::PowerOff));

    assert_eq!(
        harness.fakes.management.set_boot_device_calls(),
        vec![(BootDevice::Bios, false)]
    );
    assert_eq!(
        harness.net_agent.waits(),
        vec![("cn-3.rack2".to_string(), HostAgentState::Down)]
    );
    assert_eq!(harness.node(&id).unwrap().power_state, PowerState::PowerOn);
}

#[test]
fn restore_sleeps_twice_the_agent_poll_interval() {
    let (harness, id) = smartnic_harness(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    let previous = power_on_node_if_needed(&mut task).unwrap();
    restore_power_state_if_needed(&mut task, previous).unwrap();

    let sleeps = harness.clock.sleeps();
    assert!(sleeps.contains(&Duration::from_secs(4)));
    assert_eq!(harness.node(&id).unwrap().power_state, PowerState::PowerOff);
}

#[test]
fn restore_without_a_change_is_a_noop() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let mut task = harness.acquire(&id).unwrap();
    restore_power_state_if_needed(&mut task, None).unwrap();
    assert!(harness.clock.sleeps().is_empty());
    assert!(harness.fakes.power.set_calls().is_empty());
}

#[test]
fn scoped_reconfiguration_restores_on_success() {
    let (harness, id) = smartnic_harness(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    let value = with_power_for_network_configuration(&mut task, |task| {
        assert_eq!(task.node().power_state, PowerState::PowerOn);
        Ok(42)
    })
    .unwrap();
    assert_eq!(value, 42);
    assert_eq!(harness.node(&id).unwrap().power_state, PowerState::PowerOff);
}

#[test]
fn scoped_reconfiguration_restores_on_failure() {
    let (harness, id) = smartnic_harness(PowerState::PowerOff);

    let mut task = harness.acquire(&id).unwrap();
    let result: Result<(), _> = with_power_for_network_configuration(&mut task, |_| {
        Err(ConductorError::NetworkError("vif plug failed".into()))
    });
    assert!(matches!(result, Err(ConductorError::NetworkError(_))));
    assert_eq!(harness.node(&id).unwrap().power_state, PowerState::PowerOff);
}

#[test]
fn agent_wait_failures_propagate() {
    let (harness, id) = smartnic_harness(PowerState::PowerOff);
    harness.net_agent.fail_waits(ConductorError::NetworkError("agent never went down".into()));

    let mut task = harness.acquire(&id).unwrap();
    assert!(matches!(
        power_on_node_if_needed(&mut task),
        Err(ConductorError::NetworkError(_))
    ));
}
