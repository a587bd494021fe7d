// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fast-track gating specs.

use crate::prelude::*;
use bmc_conductor::agent::is_fast_track;
use bmc_conductor::time_fmt;

fn fast_track_config() -> Config {
    let mut config = Config::default();
    config.deploy.fast_track = true;
    config.deploy.fast_track_timeout = 300;
    config
}

#[test]
fn a_live_agent_on_a_powered_node_fast_tracks() {
    let harness = TestHarness::with_config(fast_track_config());
    harness.clock.set_epoch_ms(1_000_000 * 1000);
    harness.fakes.power.set_current(PowerState::PowerOn);
    harness.fakes.storage.set_should_write_image(true);

    let mut node = Node::builder().build();
    node.driver_internal_info.set(
        info_keys::AGENT_LAST_HEARTBEAT,
        time_fmt::iso_utc((1_000_000 - 100) * 1000),
    );
    let id = harness.add_node(node);

    let task = harness.acquire(&id).unwrap();
    assert!(is_fast_track(&task).unwrap());
}

#[test]
fn a_stale_heartbeat_denies_the_fast_track() {
    let harness = TestHarness::with_config(fast_track_config());
    harness.clock.set_epoch_ms(1_000_000 * 1000);
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut node = Node::builder().build();
    node.driver_internal_info.set(
        info_keys::AGENT_LAST_HEARTBEAT,
        time_fmt::iso_utc((1_000_000 - 400) * 1000),
    );
    let id = harness.add_node(node);

    let task = harness.acquire(&id).unwrap();
    assert!(!is_fast_track(&task).unwrap());
}

#[test]
fn a_node_with_a_recent_failure_never_fast_tracks() {
    let harness = TestHarness::with_config(fast_track_config());
    harness.clock.set_epoch_ms(1_000_000 * 1000);
    harness.fakes.power.set_current(PowerState::PowerOn);

    let mut node = Node::builder().last_error("deploy blew up").build();
    node.driver_internal_info.set(
        info_keys::AGENT_LAST_HEARTBEAT,
        time_fmt::iso_utc((1_000_000 - 10) * 1000),
    );
    let id = harness.add_node(node);

    let task = harness.acquire(&id).unwrap();
    assert!(!is_fast_track(&task).unwrap());
}

#[test]
fn a_missing_heartbeat_reads_as_nineteen_seventy() {
    let harness = TestHarness::with_config(fast_track_config());
    harness.clock.set_epoch_ms(1_000_000 * 1000);
    harness.fakes.power.set_current(PowerState::PowerOn);

    let id = harness.add_node(Node::builder().build());
    let task = harness.acquire(&id).unwrap();
    assert!(!is_fast_track(&task).unwrap());
}
