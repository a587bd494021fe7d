// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vendor detection and caching.

use crate::task::Task;
use bmc_core::{Clock, ConductorError};

/// Cache the hardware vendor in `properties` if the driver can detect it.
///
/// Runs under a shared lock and upgrades only when there is something to
/// store. Detection being unsupported or failing is not an error; vendors
/// are assumed not to change under a running node.
pub fn cache_vendor<C: Clock>(task: &mut Task<C>) -> Result<(), ConductorError> {
    if task.node().properties.get_str("vendor").is_some() {
        return Ok(());
    }

    let vendor = match task.driver().management.detect_vendor(task.node()) {
        Ok(Some(vendor)) if !vendor.is_empty() => vendor,
        Ok(_) => return Ok(()),
        Err(ConductorError::UnsupportedDriverExtension { .. }) => return Ok(()),
        Err(error) => {
            tracing::warn!(
                node = %task.node().uuid,
                %error,
                "unexpected error while detecting vendor"
            );
            return Ok(());
        }
    };

    if let Err(error) = task.upgrade_lock("caching node vendor") {
        tracing::warn!(node = %task.node().uuid, %error, "could not cache detected vendor");
        return Ok(());
    }
    task.node_mut().properties.set("vendor", vendor);
    task.save_node()
}

#[cfg(test)]
#[path = "vendor_tests.rs"]
mod tests;
