// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning lifecycle specs.

use crate::prelude::*;
use bmc_conductor::handlers::deploying_error_handler;

#[test]
fn deploy_failure_folds_the_cleanup_error_and_scrubs_step_state() {
    let harness = TestHarness::new();
    let mut node = Node::builder()
        .provision_state(ProvisionState::Deploying)
        .target_provision_state(ProvisionState::Active)
        .deploy_step(Step::new("deploy", "write_image", 80))
        .build();
    let kind = StepKind::Deploy;
    node.driver_internal_info.set(kind.steps_key(), serde_json::json!([
        {"interface": "deploy", "step": "write_image", "priority": 80}
    ]));
    node.driver_internal_info.set(kind.step_index_key(), 0u64);
    node.driver_internal_info.set(kind.polling_key(), true);
    let id = harness.add_node(node);

    harness
        .fakes
        .deploy
        .fail_clean_up(ConductorError::DriverOperationError("cleanup-fail".into()));

    let mut task = harness.acquire(&id).unwrap();
    deploying_error_handler(&mut task, "boom", None, true);

    let node = harness.node(&id).unwrap();
    assert_eq!(node.provision_state, ProvisionState::DeployFail);
    let last_error = node.last_error.unwrap_or_default();
    assert!(last_error.contains("boom"));
    assert!(last_error.contains("Also failed to clean up due to:"));
    assert!(last_error.contains("cleanup-fail"));

    assert!(node.deploy_step.is_none());
    assert!(!node.driver_internal_info.contains(kind.step_index_key()));
    assert!(!node.driver_internal_info.contains(kind.polling_key()));
}

#[test]
fn a_node_walks_the_happy_path_from_enrollment_to_active() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder().provision_state(ProvisionState::Enroll).build(),
    );

    let mut task = harness.acquire(&id).unwrap();
    task.process_event(ProvisionEvent::Manage, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Verifying);
    task.process_event(ProvisionEvent::Done, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Manageable);

    // Into the pool via automated cleaning.
    task.process_event(ProvisionEvent::Provide, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Cleaning);
    assert_eq!(task.node().target_provision_state, ProvisionState::Available);
    task.process_event(ProvisionEvent::Done, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Available);
    assert_eq!(task.node().target_provision_state, ProvisionState::NoState);

    // Deploy with an agent callback in the middle.
    task.process_event(ProvisionEvent::Deploy, None).unwrap();
    task.process_event(ProvisionEvent::Wait, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::DeployWait);
    assert_eq!(task.node().target_provision_state, ProvisionState::Active);
    task.process_event(ProvisionEvent::Active, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Active);
    assert_eq!(task.node().target_provision_state, ProvisionState::NoState);

    let stored = harness.node(&id).unwrap();
    assert_eq!(stored.provision_state, ProvisionState::Active);
}

#[test]
fn a_manual_clean_returns_to_manageable() {
    let harness = TestHarness::new();
    let id = harness.add_node(
        Node::builder().provision_state(ProvisionState::Manageable).build(),
    );

    let mut task = harness.acquire(&id).unwrap();
    task.process_event(ProvisionEvent::Clean, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Cleaning);
    assert_eq!(task.node().target_provision_state, ProvisionState::Manageable);
    task.process_event(ProvisionEvent::Done, None).unwrap();
    assert_eq!(task.node().provision_state, ProvisionState::Manageable);
}
