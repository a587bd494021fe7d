// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-token lifecycle and the fast-track decision.
//!
//! The in-band ramdisk agent authenticates its callbacks with a per-node
//! bearer token held in `driver_internal_info`. Tokens normally die with
//! the ramdisk; tokens embedded in out-of-band boot media are marked
//! pregenerated and survive power cycles.

use crate::task::Task;
use crate::time_fmt;
use base64::Engine;
use bmc_core::{info_keys, Clock, ConductorError, Node, PowerState, StepKind};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// 256 bits of entropy, URL-safe encoded.
const TOKEN_BYTES: usize = 32;

/// Generate and store a fresh agent token.
pub fn add_secret_token(node: &mut Node, pregenerated: bool) {
    let mut raw = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut raw);
    let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw);
    node.driver_internal_info.set(info_keys::AGENT_SECRET_TOKEN, token);
    if pregenerated {
        node.driver_internal_info.set(info_keys::AGENT_SECRET_TOKEN_PREGENERATED, true);
    }
}

/// True when a token is recorded for the node.
pub fn is_agent_token_present(node: &Node) -> bool {
    node.driver_internal_info
        .get(info_keys::AGENT_SECRET_TOKEN)
        .is_some_and(|v| !v.is_null())
}

/// Validate a supplied token in constant time. A missing supplied token is
/// never valid.
pub fn is_agent_token_valid(node: &Node, token: Option<&str>) -> bool {
    let Some(supplied) = token else {
        return false;
    };
    let Some(known) = node.driver_internal_info.get_str(info_keys::AGENT_SECRET_TOKEN) else {
        return false;
    };
    known.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// True when the token was embedded in out-of-band boot media.
pub fn is_agent_token_pregenerated(node: &Node) -> bool {
    node.driver_internal_info.get_bool(info_keys::AGENT_SECRET_TOKEN_PREGENERATED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreRelease {
    Alpha(u32),
    Beta(u32),
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct AgentVersion {
    major: u32,
    minor: u32,
    patch: u32,
    pre: PreRelease,
}

/// Parse `X.Y[.Z]`, optionally suffixed `aN`/`bN` or `.devN`.
///
/// A dev build is ordered like a beta: any pre-release of a version sorts
/// below that version's final release and above every earlier final.
fn parse_agent_version(text: &str) -> Option<AgentVersion> {
    let (core, pre) = match text.split_once(".dev") {
        Some((head, num)) => (head, PreRelease::Beta(num.parse().ok()?)),
        None => match text.find(['a', 'b']) {
            Some(pos) => {
                let num: u32 = text[pos + 1..].parse().ok()?;
                let pre = if text.as_bytes()[pos] == b'a' {
                    PreRelease::Alpha(num)
                } else {
                    PreRelease::Beta(num)
                };
                (&text[..pos], pre)
            }
            None => (text, PreRelease::Final),
        },
    };
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = match parts.next() {
        Some(part) => part.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(AgentVersion { major, minor, patch, pre })
}

/// Agents newer than 6.1.0 understand token exchange; older ones only work
/// with pregenerated tokens. Unparseable versions read as unsupported.
pub fn is_agent_token_supported(agent_version: &str) -> bool {
    const BASELINE: AgentVersion =
        AgentVersion { major: 6, minor: 1, patch: 0, pre: PreRelease::Final };
    match parse_agent_version(agent_version.trim()) {
        Some(version) => version > BASELINE,
        None => false,
    }
}

/// True when `value` (a [`time_fmt::iso_utc`] timestamp) lies within the
/// previous `timeout_secs` from now. A missing or unparseable value reads
/// as the 1970 epoch.
pub fn value_within_timeout<C: Clock>(clock: &C, value: Option<&str>, timeout_secs: u64) -> bool {
    let epoch = chrono::DateTime::UNIX_EPOCH.naive_utc();
    let last = value.and_then(time_fmt::parse_iso_utc).unwrap_or(epoch);
    let now = chrono::DateTime::from_timestamp_millis(clock.epoch_ms() as i64)
        .map(|dt| dt.naive_utc())
        .unwrap_or(epoch);
    let cutoff = now - chrono::Duration::seconds(timeout_secs as i64);
    cutoff <= last
}

/// Whether this node is even eligible for a streamlined deployment
/// sequence: the feature is on, deployment writes an image, and the node
/// carries no fresh failure.
pub fn fast_track_able<C: Clock>(task: &Task<C>) -> bool {
    task.context().config().deploy.fast_track
        && task.driver().storage.should_write_image(task.node())
        && task.node().last_error.is_none()
}

/// Whether the ramdisk agent is still live enough to skip the boot
/// sequence: eligible, heartbeating within `deploy.fast_track_timeout`,
/// and powered on right now.
pub fn is_fast_track<C: Clock>(task: &Task<C>) -> Result<bool, ConductorError> {
    if !fast_track_able(task) {
        return Ok(false);
    }
    let heartbeat = task.node().driver_internal_info.get_str(info_keys::AGENT_LAST_HEARTBEAT);
    if !value_within_timeout(
        task.context().clock(),
        heartbeat,
        task.context().config().deploy.fast_track_timeout,
    ) {
        return Ok(false);
    }
    Ok(task.driver().power.get_power_state(task.node())? == PowerState::PowerOn)
}

/// Drop agent state that does not survive going off the wire.
///
/// A pregenerated token rides in the boot media and is kept; a negotiated
/// one must not be reused by the next ramdisk.
pub fn wipe_internal_info_on_power_off(node: &mut Node) {
    let pregenerated = is_agent_token_pregenerated(node);
    let info = &mut node.driver_internal_info;
    // DHCP may hand the agent a new address on the next boot.
    info.remove(info_keys::AGENT_URL);
    if !pregenerated {
        info.remove(info_keys::AGENT_SECRET_TOKEN);
    }
    // Cached steps may change after a reboot.
    info.remove(info_keys::AGENT_CACHED_DEPLOY_STEPS);
    info.remove(info_keys::AGENT_CACHED_CLEAN_STEPS);
}

/// Operation-end wipe: token, pregenerated flag and URL go together.
pub fn wipe_token_and_url(node: &mut Node) {
    let info = &mut node.driver_internal_info;
    info.remove(info_keys::AGENT_SECRET_TOKEN);
    info.remove(info_keys::AGENT_SECRET_TOKEN_PREGENERATED);
    // The URL is re-asserted on the next deployment attempt.
    info.remove(info_keys::AGENT_URL);
}

fn wipe_operation_internal_info<C: Clock>(task: &mut Task<C>, kind: StepKind) {
    // Across a fast-track handoff the live agent keeps its credentials.
    if !fast_track_able(task) {
        wipe_token_and_url(task.node_mut());
    }
    let info = &mut task.node_mut().driver_internal_info;
    info.set(kind.steps_key(), serde_json::Value::Null);
    info.remove(kind.cached_steps_key());
    info.remove(kind.step_index_key());
    info.remove(kind.reboot_key());
    info.remove(kind.polling_key());
    info.remove(kind.skip_current_key());
    info.remove(info_keys::STEPS_VALIDATED);
}

/// Remove temporary deployment fields from `driver_internal_info`.
pub fn wipe_deploy_internal_info<C: Clock>(task: &mut Task<C>) {
    wipe_operation_internal_info(task, StepKind::Deploy);
}

/// Remove temporary cleaning fields from `driver_internal_info`.
pub fn wipe_cleaning_internal_info<C: Clock>(task: &mut Task<C>) {
    wipe_operation_internal_info(task, StepKind::Clean);
}

/// Drop the recorded agent URL.
pub fn remove_agent_url(node: &mut Node) {
    node.driver_internal_info.remove(info_keys::AGENT_URL);
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
