// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-pool admission specs.

use crate::prelude::*;
use bmc_conductor::handlers::provisioning_error_handler;
use bmc_conductor::WorkerPool;
use std::sync::{mpsc, Arc, Barrier};
use std::time::Duration;

#[test]
fn a_refused_clean_dispatch_restores_the_node() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let pool = WorkerPool::new(1, 0).unwrap();
    let gate = Arc::new(Barrier::new(2));
    let worker_gate = gate.clone();
    let (started_tx, started_rx) = mpsc::channel();
    pool.try_spawn(move || {
        started_tx.send(()).unwrap();
        worker_gate.wait();
    })
    .unwrap();
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // The API already moved the node toward cleaning before dispatching.
    let mut node = harness.node(&id).unwrap();
    let previous_state = node.provision_state;
    let previous_target = node.target_provision_state;
    node.provision_state = ProvisionState::Cleaning;
    node.target_provision_state = ProvisionState::Available;
    harness.store.save_node(&mut node).unwrap();

    let refused = pool.try_spawn(|| {});
    let error = match refused {
        Err(error) => error,
        Ok(()) => panic!("expected the saturated pool to refuse the job"),
    };
    assert!(matches!(error, ConductorError::NoFreeConductorWorker));

    provisioning_error_handler(
        &harness.store,
        &error,
        &mut node,
        previous_state,
        previous_target,
    );
    gate.wait();

    let node = harness.node(&id).unwrap();
    assert_eq!(node.provision_state, previous_state);
    assert_eq!(node.target_provision_state, previous_target);
    assert_eq!(
        node.last_error.as_deref(),
        Some("No free conductor workers available")
    );
    // No fail event fired, no notification emitted.
    assert!(harness.bus.emitted().is_empty());
}

#[test]
fn other_dispatch_failures_reach_the_caller_untouched() {
    let harness = TestHarness::new();
    let id = harness.add_node(Node::builder().build());

    let mut node = harness.node(&id).unwrap();
    let error = ConductorError::Unexpected("dispatcher bug".into());
    provisioning_error_handler(
        &harness.store,
        &error,
        &mut node,
        ProvisionState::Manageable,
        ProvisionState::NoState,
    );

    let node = harness.node(&id).unwrap();
    assert_eq!(node.provision_state, ProvisionState::Available);
    assert!(node.last_error.is_none());
}
