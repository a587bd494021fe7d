// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conductor tunables, grouped the way operators set them.
//!
//! All values have defaults, so an empty TOML document is a valid
//! configuration. Options marked *mutable* are safe to change on a running
//! conductor because every reader goes through the shared `Arc<Config>`
//! snapshot it captured at operation start.

use crate::error::ConductorError;
use crate::states::{BootMode, BootOption};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Hash algorithm for rescue-password crypt(3) hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

crate::simple_display! {
    HashAlgorithm {
        Sha256 => "sha256",
        Sha512 => "sha512",
    }
}

/// `[conductor]` group.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConductorConfig {
    /// Seconds to wait for a requested power-state change. *Mutable.*
    pub power_state_change_timeout: u64,
    /// Run automated cleaning between tenants.
    pub automated_clean: bool,
    pub rescue_password_hash_algorithm: HashAlgorithm,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            power_state_change_timeout: 60,
            automated_clean: true,
            rescue_password_hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

/// `[deploy]` group.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Allow agents already heartbeating to bypass the ramdisk boot
    /// sequence.
    pub fast_track: bool,
    /// Seconds for which the last heartbeat stays valid for fast-track
    /// purposes; capped at 300. *Mutable.*
    pub fast_track_timeout: u64,
    pub default_boot_mode: BootMode,
    pub default_boot_option: BootOption,
    pub power_off_after_deploy_failure: bool,
    /// Conductor HTTP server URL, e.g. `http://192.0.2.3:8080`.
    pub http_url: Option<String>,
    pub http_root: PathBuf,
    /// Subdirectory under `http_root` holding instance images.
    pub http_image_subdir: String,
    pub configdrive_use_object_store: bool,
    /// In-band erase-step priorities; `None` defers to the ramdisk.
    pub erase_devices_priority: Option<u32>,
    pub erase_devices_metadata_priority: Option<u32>,
    /// *Mutable.*
    pub delete_configuration_priority: Option<u32>,
    /// *Mutable.*
    pub create_configuration_priority: Option<u32>,
    pub shred_random_overwrite_iterations: u32,
    pub shred_final_overwrite_with_zeros: bool,
    pub enable_ata_secure_erase: bool,
    pub continue_if_disk_secure_erase_fails: bool,
    pub disk_erasure_concurrency: u32,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            fast_track: false,
            fast_track_timeout: 300,
            default_boot_mode: BootMode::Bios,
            default_boot_option: BootOption::Local,
            power_off_after_deploy_failure: true,
            http_url: None,
            http_root: PathBuf::from("/httpboot"),
            http_image_subdir: "agent_images".to_string(),
            configdrive_use_object_store: false,
            erase_devices_priority: None,
            erase_devices_metadata_priority: None,
            delete_configuration_priority: None,
            create_configuration_priority: None,
            shred_random_overwrite_iterations: 1,
            shred_final_overwrite_with_zeros: true,
            enable_ata_secure_erase: true,
            continue_if_disk_secure_erase_fails: false,
            disk_erasure_concurrency: 1,
        }
    }
}

/// `[agent]` group.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Polling interval of the external network agent, in seconds. Smart-NIC
    /// flows sleep twice this value to let switch programming settle.
    pub neutron_agent_poll_interval: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { neutron_agent_poll_interval: 2 }
    }
}

/// `[iscsi]` group.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IscsiConfig {
    /// *Mutable.*
    pub portal_port: u16,
    /// Extra `dd` conversion flags, comma-separated. *Mutable.*
    pub conv_flags: Option<String>,
    /// Attempts to verify an iSCSI connection, one second apart. *Mutable.*
    pub verify_attempts: u32,
}

impl Default for IscsiConfig {
    fn default() -> Self {
        Self { portal_port: 3260, conv_flags: None, verify_attempts: 3 }
    }
}

/// All conductor tunables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conductor: ConductorConfig,
    pub deploy: DeployConfig,
    pub agent: AgentConfig,
    pub iscsi: IscsiConfig,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConductorError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| ConductorError::InvalidParameterValue(format!("bad config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConductorError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConductorError::InvalidParameterValue(format!(
                "cannot read config {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConductorError> {
        if self.conductor.power_state_change_timeout == 0 {
            return Err(ConductorError::InvalidParameterValue(
                "conductor.power_state_change_timeout must be at least 1 second".to_string(),
            ));
        }
        if self.deploy.fast_track_timeout > 300 {
            return Err(ConductorError::InvalidParameterValue(format!(
                "deploy.fast_track_timeout must be at most 300 seconds, got {}",
                self.deploy.fast_track_timeout
            )));
        }
        if self.deploy.disk_erasure_concurrency == 0 {
            return Err(ConductorError::InvalidParameterValue(
                "deploy.disk_erasure_concurrency must be at least 1".to_string(),
            ));
        }
        if self.iscsi.portal_port == 0 {
            return Err(ConductorError::InvalidParameterValue(
                "iscsi.portal_port must be in 1..=65535".to_string(),
            ));
        }
        if self.iscsi.verify_attempts == 0 {
            return Err(ConductorError::InvalidParameterValue(
                "iscsi.verify_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
