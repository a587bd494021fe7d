// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-group physical-network specs.

use crate::prelude::*;
use bmc_conductor::physnet::validate_port_physnet;
use bmc_core::{Port, PortGroup};

#[test]
fn a_port_on_another_physnet_cannot_join_the_group() {
    let harness = TestHarness::new();
    let node = harness.add_node(Node::builder().build());
    let group = PortGroup::builder().node_uuid(node).build();
    let group_id = group.uuid;
    harness.store.add_portgroup(group);
    for _ in 0..2 {
        harness.store.add_port(
            Port::builder()
                .node_uuid(node)
                .portgroup_id(group_id)
                .physical_network("physnet-a")
                .build(),
        );
    }

    let candidate = Port::builder()
        .node_uuid(node)
        .portgroup_id(group_id)
        .physical_network("physnet-b")
        .build();

    let mut task = harness.acquire(&node).unwrap();
    match validate_port_physnet(&mut task, &candidate) {
        Err(ConductorError::Conflict(message)) => {
            assert!(message.contains("physnet-a"));
            assert!(message.contains("physnet-b"));
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // The group invariant still holds afterwards.
    let physnets = harness.store.physnets_for_portgroup(&group_id, None);
    assert_eq!(physnets.len(), 1);
}

#[test]
fn a_matching_port_joins_and_keeps_the_singleton() {
    let harness = TestHarness::new();
    let node = harness.add_node(Node::builder().build());
    let group = PortGroup::builder().node_uuid(node).build();
    let group_id = group.uuid;
    harness.store.add_portgroup(group);
    harness.store.add_port(
        Port::builder()
            .node_uuid(node)
            .portgroup_id(group_id)
            .physical_network("physnet-a")
            .build(),
    );

    let mut candidate = Port::builder()
        .node_uuid(node)
        .portgroup_id(group_id)
        .physical_network("physnet-a")
        .build();

    let mut task = harness.acquire(&node).unwrap();
    validate_port_physnet(&mut task, &candidate).unwrap();
    harness.store.save_port(&mut candidate).unwrap();

    let physnets = harness.store.physnets_for_portgroup(&group_id, None);
    assert_eq!(physnets.len(), 1);
}
