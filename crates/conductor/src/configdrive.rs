// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config-drive assembly.
//!
//! The conductor fills in node identity and normalizes user data; turning
//! the pieces into an image is the assembler's job. The default assembler
//! renders the OpenStack metadata layout as a gzipped, base64-encoded
//! JSON tree, which the deploy ramdisk unpacks onto the drive.

use base64::Engine;
use bmc_core::{ConductorError, Node};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{Map, Value};
use std::io::Write;

/// The caller-supplied pieces of a config drive. All optional.
#[derive(Debug, Clone, Default)]
pub struct ConfigDrive {
    pub meta_data: Option<Map<String, Value>>,
    pub network_data: Option<Value>,
    pub user_data: Option<Value>,
    pub vendor_data: Option<Value>,
}

/// Produces the final encoded config-drive blob.
pub trait ImageAssembler: Send + Sync + 'static {
    fn assemble(
        &self,
        meta_data: &Map<String, Value>,
        network_data: Option<&Value>,
        user_data: Option<&[u8]>,
        vendor_data: Option<&Value>,
    ) -> Result<String, ConductorError>;
}

/// Build a config drive for `node`.
///
/// `meta_data.uuid` and `meta_data.name` default to the node's; values the
/// caller set are kept. Structured user data is serialized as JSON bytes,
/// string user data is UTF-8 encoded.
pub fn build_configdrive(
    assembler: &dyn ImageAssembler,
    node: &Node,
    configdrive: ConfigDrive,
) -> Result<String, ConductorError> {
    let mut meta_data = configdrive.meta_data.unwrap_or_default();
    meta_data
        .entry("uuid".to_string())
        .or_insert_with(|| Value::String(node.uuid.to_string()));
    if let Some(name) = &node.name {
        meta_data
            .entry("name".to_string())
            .or_insert_with(|| Value::String(name.clone()));
    }

    let user_data: Option<Vec<u8>> = match configdrive.user_data {
        Some(Value::String(text)) => Some(text.into_bytes()),
        Some(value @ (Value::Object(_) | Value::Array(_))) => {
            Some(serde_json::to_vec(&value).map_err(|e| {
                ConductorError::InvalidParameterValue(format!("unserializable user_data: {e}"))
            })?)
        }
        _ => None,
    };

    tracing::debug!(node = %node.uuid, "building a configdrive");
    assembler.assemble(
        &meta_data,
        configdrive.network_data.as_ref(),
        user_data.as_deref(),
        configdrive.vendor_data.as_ref(),
    )
}

/// Default assembler: OpenStack `openstack/latest/*` layout, gzipped and
/// base64-encoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct GzipBase64Assembler;

impl ImageAssembler for GzipBase64Assembler {
    fn assemble(
        &self,
        meta_data: &Map<String, Value>,
        network_data: Option<&Value>,
        user_data: Option<&[u8]>,
        vendor_data: Option<&Value>,
    ) -> Result<String, ConductorError> {
        let mut tree = Map::new();
        tree.insert(
            "openstack/latest/meta_data.json".to_string(),
            Value::Object(meta_data.clone()),
        );
        if let Some(network_data) = network_data {
            tree.insert("openstack/latest/network_data.json".to_string(), network_data.clone());
        }
        if let Some(user_data) = user_data {
            tree.insert(
                "openstack/latest/user_data".to_string(),
                Value::String(String::from_utf8_lossy(user_data).into_owned()),
            );
        }
        if let Some(vendor_data) = vendor_data {
            tree.insert("openstack/latest/vendor_data.json".to_string(), vendor_data.clone());
        }

        let document = serde_json::to_vec(&Value::Object(tree))
            .map_err(|e| ConductorError::Unexpected(format!("configdrive serialization: {e}")))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&document)
            .and_then(|()| encoder.finish())
            .map(|compressed| base64::engine::general_purpose::STANDARD.encode(compressed))
            .map_err(|e| ConductorError::Unexpected(format!("configdrive compression: {e}")))
    }
}

#[cfg(test)]
#[path = "configdrive_tests.rs"]
mod tests;
