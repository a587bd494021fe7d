// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-token lifecycle specs.

use crate::prelude::*;
use bmc_conductor::agent::{add_secret_token, is_agent_token_valid};
use bmc_conductor::power::power_action;

fn ramdisk_node(pregenerated: bool) -> Node {
    let mut node = Node::builder().power_state(PowerState::PowerOn).build();
    node.driver_internal_info.set(info_keys::AGENT_SECRET_TOKEN, "T");
    if pregenerated {
        node.driver_internal_info.set(info_keys::AGENT_SECRET_TOKEN_PREGENERATED, true);
    }
    node.driver_internal_info.set(info_keys::AGENT_URL, "http://ramdisk");
    node.driver_internal_info.set(info_keys::AGENT_CACHED_DEPLOY_STEPS, "cached");
    node.driver_internal_info.set(info_keys::AGENT_CACHED_CLEAN_STEPS, "cached");
    node
}

#[test]
fn power_off_wipes_a_negotiated_token() {
    let harness = TestHarness::new();
    let id = harness.add_node(ramdisk_node(false));
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOff, None).unwrap();

    let info = harness.node(&id).unwrap().driver_internal_info;
    assert!(!info.contains(info_keys::AGENT_SECRET_TOKEN));
    assert!(!info.contains(info_keys::AGENT_URL));
    assert!(!info.contains(info_keys::AGENT_CACHED_DEPLOY_STEPS));
    assert!(!info.contains(info_keys::AGENT_CACHED_CLEAN_STEPS));
}

#[test]
fn power_off_keeps_a_pregenerated_token() {
    let harness = TestHarness::new();
    let id = harness.add_node(ramdisk_node(true));
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut task = harness.acquire(&id).unwrap();
    power_action(&mut task, PowerState::PowerOff, None).unwrap();

    let info = harness.node(&id).unwrap().driver_internal_info;
    assert_eq!(info.get_str(info_keys::AGENT_SECRET_TOKEN), Some("T"));
    assert!(!info.contains(info_keys::AGENT_URL));
    assert!(!info.contains(info_keys::AGENT_CACHED_DEPLOY_STEPS));
    assert!(!info.contains(info_keys::AGENT_CACHED_CLEAN_STEPS));
}

#[test]
fn generated_tokens_round_trip_validation() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let mut task = harness.acquire(&id).unwrap();
    add_secret_token(task.node_mut(), false);
    task.save_node().unwrap();

    let node = harness.node(&id).unwrap();
    let token = node
        .driver_internal_info
        .get_str(info_keys::AGENT_SECRET_TOKEN)
        .map(str::to_owned)
        .unwrap();
    assert!(is_agent_token_valid(&node, Some(&token)));
    assert!(!is_agent_token_valid(&node, Some("forged")));
    assert!(!is_agent_token_valid(&node, None));
}
