// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request-shape checks that do not need a driver.

use bmc_core::{ConductorError, Config, Node};
use serde_json::Value;

/// Traits requested in `instance_info` must be a list of strings, each
/// also set on the node itself.
pub fn validate_instance_info_traits(node: &Node) -> Result<(), ConductorError> {
    let Some(requested) = node.instance_info.get("traits") else {
        return Ok(());
    };
    if requested.is_null() {
        return Ok(());
    }

    let invalid = || {
        ConductorError::InvalidParameterValue(format!(
            "error parsing traits from node {} instance_info field; a list of strings is expected",
            node.uuid
        ))
    };
    let Value::Array(items) = requested else {
        return Err(invalid());
    };
    let mut traits = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(value) => traits.push(value.as_str()),
            _ => return Err(invalid()),
        }
    }

    let missing: Vec<&str> =
        traits.iter().copied().filter(|t| !node.traits.contains(*t)).collect();
    if !missing.is_empty() {
        return Err(ConductorError::InvalidParameterValue(format!(
            "cannot specify instance traits that are not also set on the node; \
             node {} is missing traits {}",
            node.uuid,
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Whether automated cleaning is off for this node: disabled globally and
/// not switched back on per node.
pub fn skip_automated_cleaning(config: &Config, node: &Node) -> bool {
    !config.conductor.automated_clean && node.automated_clean != Some(true)
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
