// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Physical-network consistency of port groups.
//!
//! All ports bonded into one group must share a `physical_network` value.
//! `None` selects the legacy physnet-unaware attachment behavior and must
//! be shared like any other value.

use crate::task::Task;
use bmc_core::{Clock, ConductorError, Port};

/// Validate a port being created in or moved into a port group.
pub fn validate_port_physnet<C: Clock>(
    task: &mut Task<C>,
    port: &Port,
) -> Result<(), ConductorError> {
    task.require_exclusive("validate port physical network")?;

    let Some(group) = port.portgroup_id else {
        return Ok(());
    };

    // Only membership or physnet changes can break the invariant. During
    // creation both show as changed.
    let delta = task.context().store().what_changed_port(port);
    if !delta.contains("portgroup_id") && !delta.contains("physical_network") {
        return Ok(());
    }

    let physnets = task.context().store().physnets_for_portgroup(&group, Some(&port.uuid));
    if physnets.is_empty() {
        return Ok(());
    }
    if physnets.len() > 1 {
        return Err(ConductorError::PortgroupPhysnetInconsistent {
            portgroup: group.to_string(),
            physnets: physnets
                .into_iter()
                .map(|net| net.unwrap_or_else(|| "none".to_string()))
                .collect(),
        });
    }

    let group_physnet = physnets.into_iter().next().flatten();
    if port.physical_network != group_physnet {
        return Err(ConductorError::Conflict(format!(
            "port with physical network {} cannot become a member of port group {group} \
             which has ports in physical network {}",
            display_physnet(port.physical_network.as_deref()),
            display_physnet(group_physnet.as_deref()),
        )));
    }
    Ok(())
}

fn display_physnet(net: Option<&str>) -> &str {
    net.unwrap_or("none")
}

#[cfg(test)]
#[path = "physnet_tests.rs"]
mod tests;
