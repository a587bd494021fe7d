// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory registries.

use bmc_core::{ConductorError, Node, NodeId, Port, PortGroup, PortGroupId, PortId};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Compare `$a` and `$b` field by field, inserting changed field names.
macro_rules! diff_fields {
    ($a:expr, $b:expr, $set:expr, [ $($field:ident),+ $(,)? ]) => {
        $( if $a.$field != $b.$field { $set.insert(stringify!($field)); } )+
    };
}

#[derive(Default)]
struct Registries {
    nodes: HashMap<NodeId, Node>,
    ports: HashMap<PortId, Port>,
    portgroups: HashMap<PortGroupId, PortGroup>,
}

/// Shared handle to the registries. Cloning is cheap.
#[derive(Clone, Default)]
pub struct NodeStore {
    inner: Arc<RwLock<Registries>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Used by enrollment and tests.
    pub fn add_node(&self, node: Node) {
        self.inner.write().nodes.insert(node.uuid, node);
    }

    pub fn add_port(&self, port: Port) {
        self.inner.write().ports.insert(port.uuid, port);
    }

    pub fn add_portgroup(&self, group: PortGroup) {
        self.inner.write().portgroups.insert(group.uuid, group);
    }

    /// Fetch a copy of a node record.
    pub fn get_node(&self, uuid: &NodeId) -> Result<Node, ConductorError> {
        self.inner
            .read()
            .nodes
            .get(uuid)
            .cloned()
            .ok_or_else(|| ConductorError::NotFound(format!("node {uuid}")))
    }

    /// Persist `node`, bumping its version.
    ///
    /// Fails with `ConcurrentUpdate` when the stored version has moved past
    /// the one `node` was loaded at.
    pub fn save_node(&self, node: &mut Node) -> Result<(), ConductorError> {
        let mut inner = self.inner.write();
        let stored = inner
            .nodes
            .get_mut(&node.uuid)
            .ok_or_else(|| ConductorError::NotFound(format!("node {}", node.uuid)))?;
        if stored.version != node.version {
            return Err(ConductorError::ConcurrentUpdate(node.uuid.to_string()));
        }
        node.version += 1;
        *stored = node.clone();
        Ok(())
    }

    /// Reload `node` in place from the store.
    pub fn refresh_node(&self, node: &mut Node) -> Result<(), ConductorError> {
        *node = self.get_node(&node.uuid)?;
        Ok(())
    }

    /// Field names on `node` that differ from the stored copy.
    ///
    /// An unknown record reports every field as changed, matching how a
    /// record under creation looks to validation rules.
    pub fn what_changed_node(&self, node: &Node) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        let inner = self.inner.read();
        let Some(stored) = inner.nodes.get(&node.uuid) else {
            return Node::FIELDS.iter().copied().collect();
        };
        diff_fields!(node, stored, changed, [
            name,
            provision_state,
            target_provision_state,
            power_state,
            target_power_state,
            last_error,
            maintenance,
            maintenance_reason,
            fault,
            automated_clean,
            instance_uuid,
            instance_info,
            properties,
            driver_internal_info,
            clean_step,
            deploy_step,
            traits,
        ]);
        changed
    }

    pub fn get_port(&self, uuid: &PortId) -> Result<Port, ConductorError> {
        self.inner
            .read()
            .ports
            .get(uuid)
            .cloned()
            .ok_or_else(|| ConductorError::NotFound(format!("port {uuid}")))
    }

    /// Persist `port`, bumping its version. Unknown ports are inserted,
    /// covering the creation path of port validation.
    pub fn save_port(&self, port: &mut Port) -> Result<(), ConductorError> {
        let mut inner = self.inner.write();
        match inner.ports.get_mut(&port.uuid) {
            Some(stored) => {
                if stored.version != port.version {
                    return Err(ConductorError::ConcurrentUpdate(port.uuid.to_string()));
                }
                port.version += 1;
                *stored = port.clone();
            }
            None => {
                inner.ports.insert(port.uuid, port.clone());
            }
        }
        Ok(())
    }

    /// Field names on `port` that differ from the stored copy.
    pub fn what_changed_port(&self, port: &Port) -> BTreeSet<&'static str> {
        let mut changed = BTreeSet::new();
        let inner = self.inner.read();
        let Some(stored) = inner.ports.get(&port.uuid) else {
            return Port::FIELDS.iter().copied().collect();
        };
        diff_fields!(port, stored, changed, [
            address,
            portgroup_id,
            physical_network,
            local_link_connection,
            is_smartnic,
        ]);
        changed
    }

    /// All ports of a node, ordered by id for determinism.
    pub fn ports_for_node(&self, node: &NodeId) -> Vec<Port> {
        let inner = self.inner.read();
        let mut ports: Vec<Port> =
            inner.ports.values().filter(|p| p.node_uuid == *node).cloned().collect();
        ports.sort_by(|a, b| a.uuid.as_str().cmp(b.uuid.as_str()));
        ports
    }

    pub fn get_portgroup(&self, uuid: &PortGroupId) -> Result<PortGroup, ConductorError> {
        self.inner
            .read()
            .portgroups
            .get(uuid)
            .cloned()
            .ok_or_else(|| ConductorError::NotFound(format!("portgroup {uuid}")))
    }

    /// Distinct `physical_network` values among the member ports of a
    /// group, optionally leaving one port out of the count.
    pub fn physnets_for_portgroup(
        &self,
        group: &PortGroupId,
        exclude: Option<&PortId>,
    ) -> BTreeSet<Option<String>> {
        self.inner
            .read()
            .ports
            .values()
            .filter(|p| p.portgroup_id.as_ref() == Some(group))
            .filter(|p| exclude != Some(&p.uuid))
            .map(|p| p.physical_network.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
