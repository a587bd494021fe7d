// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! L2 attachment records: ports and port groups.

use crate::id::{NodeId, PortGroupId, PortId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A physical network interface of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub uuid: PortId,
    pub node_uuid: NodeId,
    /// MAC address, if known.
    pub address: Option<String>,
    pub portgroup_id: Option<PortGroupId>,
    /// Physical network tag; `None` selects the legacy physnet-unaware
    /// attachment behavior.
    pub physical_network: Option<String>,
    /// Switch-side wiring (`switch_id`, `port_id`, `hostname`, ...).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub local_link_connection: serde_json::Map<String, Value>,
    /// True when the switch side is programmed by an agent on the attached
    /// host rather than by the conductor.
    pub is_smartnic: bool,
    pub version: u64,
}

impl Port {
    /// Mutable field names, as reported by the store's change tracking.
    pub const FIELDS: &'static [&'static str] = &[
        "address",
        "portgroup_id",
        "physical_network",
        "local_link_connection",
        "is_smartnic",
    ];

    pub fn new(uuid: PortId, node_uuid: NodeId) -> Self {
        Self {
            uuid,
            node_uuid,
            address: None,
            portgroup_id: None,
            physical_network: None,
            local_link_connection: serde_json::Map::new(),
            is_smartnic: false,
            version: 1,
        }
    }

    /// Hostname of the smart-NIC host owning this port's switch programming.
    pub fn smartnic_hostname(&self) -> Option<&str> {
        if !self.is_smartnic {
            return None;
        }
        self.local_link_connection.get("hostname").and_then(Value::as_str)
    }
}

/// An aggregation of ports bonded into one logical link.
///
/// Invariant: all member ports share one `physical_network` value,
/// possibly `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortGroup {
    pub uuid: PortGroupId,
    pub node_uuid: NodeId,
    pub name: Option<String>,
    pub version: u64,
}

crate::builder! {
    pub struct PortBuilder => Port {
        into {
            uuid: PortId = PortId::new(),
            node_uuid: NodeId = NodeId::new(),
        }
        set {
            local_link_connection: serde_json::Map<String, Value> = serde_json::Map::new(),
            is_smartnic: bool = false,
        }
        option {
            address: String = None,
            portgroup_id: PortGroupId = None,
            physical_network: String = None,
        }
        computed {
            version: u64 = 1,
        }
    }
}

crate::builder! {
    pub struct PortGroupBuilder => PortGroup {
        into {
            uuid: PortGroupId = PortGroupId::new(),
            node_uuid: NodeId = NodeId::new(),
        }
        option {
            name: String = None,
        }
        computed {
            version: u64 = 1,
        }
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
