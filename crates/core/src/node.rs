// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The node record and its free-form info maps.

use crate::id::{InstanceId, NodeId};
use crate::states::{PowerState, ProvisionState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Generate a newtype over a JSON object with typed accessors.
macro_rules! json_map {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(serde_json::Map<String, Value>);

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn contains(&self, key: &str) -> bool {
                self.0.contains_key(key)
            }

            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }

            pub fn get_str(&self, key: &str) -> Option<&str> {
                self.0.get(key).and_then(Value::as_str)
            }

            /// Missing or non-boolean values read as `false`.
            pub fn get_bool(&self, key: &str) -> bool {
                self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
            }

            pub fn get_u64(&self, key: &str) -> Option<u64> {
                self.0.get(key).and_then(Value::as_u64)
            }

            pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
                self.0.insert(key.into(), value.into());
            }

            pub fn remove(&mut self, key: &str) -> Option<Value> {
                self.0.remove(key)
            }

            pub fn keys(&self) -> impl Iterator<Item = &str> {
                self.0.keys().map(String::as_str)
            }

            pub fn as_map(&self) -> &serde_json::Map<String, Value> {
                &self.0
            }
        }

        impl From<serde_json::Map<String, Value>> for $name {
            fn from(map: serde_json::Map<String, Value>) -> Self {
                Self(map)
            }
        }
    };
}

json_map! {
    /// Conductor-reserved transient state. Well-known keys in [`info_keys`];
    /// drivers may add their own.
    pub struct DriverInternalInfo;
}

json_map! {
    /// Tenant-provided data (`rescue_password`, `hashed_rescue_password`,
    /// `traits`, image references).
    pub struct InstanceInfo;
}

json_map! {
    /// Hardware properties (`vendor`, cpu/memory/disk sizing).
    pub struct Properties;
}

/// Well-known `driver_internal_info` keys.
///
/// Per-operation keys (`clean_step_index`, `deploying_reboot`, ...) are
/// derived through [`StepKind`].
pub mod info_keys {
    pub const AGENT_SECRET_TOKEN: &str = "agent_secret_token";
    pub const AGENT_SECRET_TOKEN_PREGENERATED: &str = "agent_secret_token_pregenerated";
    pub const AGENT_URL: &str = "agent_url";
    pub const AGENT_LAST_HEARTBEAT: &str = "agent_last_heartbeat";
    pub const AGENT_CACHED_DEPLOY_STEPS: &str = "agent_cached_deploy_steps";
    pub const AGENT_CACHED_CLEAN_STEPS: &str = "agent_cached_clean_steps";
    pub const LAST_POWER_STATE_CHANGE: &str = "last_power_state_change";
    pub const STEPS_VALIDATED: &str = "steps_validated";
}

/// The two step-driven operations, used to derive their
/// `driver_internal_info` key families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Clean,
    Deploy,
}

crate::simple_display! {
    StepKind {
        Clean => "clean",
        Deploy => "deploy",
    }
}

impl StepKind {
    /// Parse an operation name arriving over the wire.
    pub fn parse(op: &str) -> Result<Self, crate::error::ConductorError> {
        match op {
            "clean" => Ok(StepKind::Clean),
            "deploy" => Ok(StepKind::Deploy),
            other => Err(crate::error::ConductorError::Invalid(format!(
                "step kind must be one of clean, deploy, not {other}"
            ))),
        }
    }

    /// Key holding the full step list for the operation.
    pub fn steps_key(self) -> &'static str {
        match self {
            StepKind::Clean => "clean_steps",
            StepKind::Deploy => "deploy_steps",
        }
    }

    /// Key holding the index of the current step.
    pub fn step_index_key(self) -> &'static str {
        match self {
            StepKind::Clean => "clean_step_index",
            StepKind::Deploy => "deploy_step_index",
        }
    }

    pub fn reboot_key(self) -> &'static str {
        match self {
            StepKind::Clean => "cleaning_reboot",
            StepKind::Deploy => "deploying_reboot",
        }
    }

    pub fn polling_key(self) -> &'static str {
        match self {
            StepKind::Clean => "cleaning_polling",
            StepKind::Deploy => "deploying_polling",
        }
    }

    pub fn skip_current_key(self) -> &'static str {
        match self {
            StepKind::Clean => "skip_current_clean_step",
            StepKind::Deploy => "skip_current_deploy_step",
        }
    }

    /// Key holding the agent-reported step cache.
    pub fn cached_steps_key(self) -> &'static str {
        match self {
            StepKind::Clean => info_keys::AGENT_CACHED_CLEAN_STEPS,
            StepKind::Deploy => info_keys::AGENT_CACHED_DEPLOY_STEPS,
        }
    }
}

/// One clean or deploy step as exchanged with the deploy interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Sub-driver the step belongs to ("deploy", "management", "raid", ...).
    pub interface: String,
    pub step: String,
    pub priority: u32,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub args: serde_json::Map<String, Value>,
}

impl Step {
    pub fn new(interface: impl Into<String>, step: impl Into<String>, priority: u32) -> Self {
        Self {
            interface: interface.into(),
            step: step.into(),
            priority,
            args: serde_json::Map::new(),
        }
    }
}

/// Why a node was pushed into maintenance by the conductor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    CleanFailure,
    PowerFailure,
    RescueAbortFailure,
}

crate::simple_display! {
    Fault {
        CleanFailure => "clean failure",
        PowerFailure => "power failure",
        RescueAbortFailure => "rescue abort failure",
    }
}

/// A managed bare-metal machine record.
///
/// Mutated only while some worker holds the node's lock; persisted through
/// the node store, whose optimistic `version` rides along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uuid: NodeId,
    pub name: Option<String>,
    pub provision_state: ProvisionState,
    pub target_provision_state: ProvisionState,
    pub power_state: PowerState,
    pub target_power_state: PowerState,
    /// Last failure description; cleared at the start of each operation.
    pub last_error: Option<String>,
    pub maintenance: bool,
    pub maintenance_reason: Option<String>,
    pub fault: Option<Fault>,
    /// Per-node override of `[conductor] automated_clean`.
    pub automated_clean: Option<bool>,
    pub instance_uuid: Option<InstanceId>,
    pub instance_info: InstanceInfo,
    pub properties: Properties,
    pub driver_internal_info: DriverInternalInfo,
    /// Currently-executing step, if a clean run is in progress.
    pub clean_step: Option<Step>,
    /// Currently-executing step, if a deploy run is in progress.
    pub deploy_step: Option<Step>,
    pub traits: BTreeSet<String>,
    /// Store concurrency token; bumped on every successful save.
    pub version: u64,
}

impl Node {
    /// Mutable field names, as reported by the store's change tracking.
    pub const FIELDS: &'static [&'static str] = &[
        "name",
        "provision_state",
        "target_provision_state",
        "power_state",
        "target_power_state",
        "last_error",
        "maintenance",
        "maintenance_reason",
        "fault",
        "automated_clean",
        "instance_uuid",
        "instance_info",
        "properties",
        "driver_internal_info",
        "clean_step",
        "deploy_step",
        "traits",
    ];

    /// A freshly enrolled node with nothing known about it yet.
    pub fn new(uuid: NodeId) -> Self {
        Self {
            uuid,
            name: None,
            provision_state: ProvisionState::Enroll,
            target_provision_state: ProvisionState::NoState,
            power_state: PowerState::NoState,
            target_power_state: PowerState::NoState,
            last_error: None,
            maintenance: false,
            maintenance_reason: None,
            fault: None,
            automated_clean: None,
            instance_uuid: None,
            instance_info: InstanceInfo::new(),
            properties: Properties::new(),
            driver_internal_info: DriverInternalInfo::new(),
            clean_step: None,
            deploy_step: None,
            traits: BTreeSet::new(),
            version: 1,
        }
    }

    /// True if the provision state is one of `states`.
    pub fn provision_in(&self, states: &[ProvisionState]) -> bool {
        states.contains(&self.provision_state)
    }

    /// The current step record for `kind`, if that operation is running.
    pub fn current_step(&self, kind: StepKind) -> Option<&Step> {
        match kind {
            StepKind::Clean => self.clean_step.as_ref(),
            StepKind::Deploy => self.deploy_step.as_ref(),
        }
    }

    /// Clear the current step record for `kind`.
    pub fn clear_step(&mut self, kind: StepKind) {
        match kind {
            StepKind::Clean => self.clean_step = None,
            StepKind::Deploy => self.deploy_step = None,
        }
    }
}

crate::builder! {
    pub struct NodeBuilder => Node {
        into {
            uuid: NodeId = NodeId::new(),
        }
        set {
            provision_state: ProvisionState = ProvisionState::Available,
            target_provision_state: ProvisionState = ProvisionState::NoState,
            power_state: PowerState = PowerState::PowerOff,
            target_power_state: PowerState = PowerState::NoState,
            maintenance: bool = false,
            automated_clean: Option<bool> = None,
            instance_info: InstanceInfo = InstanceInfo::new(),
            properties: Properties = Properties::new(),
            driver_internal_info: DriverInternalInfo = DriverInternalInfo::new(),
            traits: BTreeSet<String> = BTreeSet::new(),
        }
        option {
            name: String = None,
            last_error: String = None,
            maintenance_reason: String = None,
            fault: Fault = None,
            instance_uuid: InstanceId = None,
            clean_step: Step = None,
            deploy_step: Step = None,
        }
        computed {
            version: u64 = 1,
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
