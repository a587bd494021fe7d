// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Position tracking within a clean or deploy step list.
//!
//! The full step list and the index of the running step live in
//! `driver_internal_info`; the step record itself is on the node.

use bmc_core::{ConductorError, Node, StepKind};

/// Index of the next step to run, or `None` when there is nothing left.
///
/// - No current step recorded: the operation is starting, all steps remain
///   (index 0).
/// - No recorded index: position unknown, nothing to resume.
/// - `skip_current` decides whether the current step runs again (false,
///   used when a step must be retried) or is skipped (true).
pub fn next_step_index(node: &Node, kind: StepKind, skip_current: bool) -> Option<usize> {
    if node.current_step(kind).is_none() {
        return Some(0);
    }
    let mut index = node.driver_internal_info.get_u64(kind.step_index_key())? as usize;
    if skip_current {
        index += 1;
    }
    let total = node
        .driver_internal_info
        .get(kind.steps_key())
        .and_then(|v| v.as_array())
        .map_or(0, Vec::len);
    (index < total).then_some(index)
}

/// [`next_step_index`] for an operation name arriving over the wire.
/// Unknown names are a developer error, not a user-facing one.
pub fn next_step_index_named(
    node: &Node,
    operation: &str,
    skip_current: bool,
) -> Result<Option<usize>, ConductorError> {
    Ok(next_step_index(node, StepKind::parse(operation)?, skip_current))
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
