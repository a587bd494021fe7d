// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bmc_core::{Node, NodeId, Step};
use proptest::prelude::*;
use serde_json::json;

fn node_with_steps(kind: StepKind, total: usize, index: Option<u64>) -> Node {
    let mut node = Node::new(NodeId::new());
    let steps: Vec<_> = (0..total)
        .map(|i| json!({"interface": "deploy", "step": format!("step-{i}"), "priority": 10}))
        .collect();
    node.driver_internal_info.set(kind.steps_key(), json!(steps));
    if let Some(index) = index {
        node.driver_internal_info.set(kind.step_index_key(), index);
        match kind {
            StepKind::Clean => node.clean_step = Some(Step::new("deploy", "running", 10)),
            StepKind::Deploy => node.deploy_step = Some(Step::new("deploy", "running", 10)),
        }
    }
    node
}

#[test]
fn fresh_operation_starts_at_zero() {
    let node = node_with_steps(StepKind::Clean, 3, None);
    assert_eq!(next_step_index(&node, StepKind::Clean, true), Some(0));
}

#[test]
fn skip_current_advances_past_the_running_step() {
    let node = node_with_steps(StepKind::Deploy, 3, Some(1));
    assert_eq!(next_step_index(&node, StepKind::Deploy, true), Some(2));
}

#[test]
fn retry_keeps_the_current_index() {
    let node = node_with_steps(StepKind::Deploy, 3, Some(1));
    assert_eq!(next_step_index(&node, StepKind::Deploy, false), Some(1));
}

#[test]
fn finishing_the_list_returns_none() {
    let node = node_with_steps(StepKind::Clean, 3, Some(2));
    assert_eq!(next_step_index(&node, StepKind::Clean, true), None);
}

#[test]
fn unknown_position_returns_none() {
    let mut node = node_with_steps(StepKind::Clean, 3, Some(0));
    node.driver_internal_info.remove(StepKind::Clean.step_index_key());
    assert_eq!(next_step_index(&node, StepKind::Clean, true), None);
}

#[test]
fn operations_do_not_share_tracking() {
    let node = node_with_steps(StepKind::Clean, 2, Some(0));
    assert_eq!(next_step_index(&node, StepKind::Deploy, true), Some(0));
}

#[test]
fn named_lookup_rejects_unknown_operations() {
    let node = Node::new(NodeId::new());
    assert!(matches!(
        next_step_index_named(&node, "verify", true),
        Err(ConductorError::Invalid(_))
    ));
    assert_eq!(next_step_index_named(&node, "clean", true).unwrap(), Some(0));
}

proptest! {
    // The returned index is always in range, whatever the recorded state.
    #[test]
    fn next_step_index_stays_in_range(
        total in 0usize..8,
        index in proptest::option::of(0u64..12),
        skip_current in proptest::bool::ANY,
        has_current in proptest::bool::ANY,
    ) {
        let mut node = node_with_steps(StepKind::Deploy, total, index);
        if !has_current {
            node.deploy_step = None;
        }
        let result = next_step_index(&node, StepKind::Deploy, skip_current);
        match result {
            Some(i) if node.deploy_step.is_some() => prop_assert!(i < total),
            Some(i) => prop_assert_eq!(i, 0),
            None => {}
        }
    }
}
