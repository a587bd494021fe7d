// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rescue-password hashing in crypt(3) `$5$`/`$6$` format.
//!
//! The rescue ramdisk consumes `/etc/shadow`-style entries, so the hash
//! must be bit-exact sha-crypt (Drepper's scheme, default 5000 rounds, no
//! explicit `rounds=` field). Implemented over `sha2`; the byte-order
//! tables below follow the reference encoding.

use bmc_core::{ConductorError, HashAlgorithm, Node};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// `instance_info` key holding the tenant-supplied rescue password.
pub const RESCUE_PASSWORD_KEY: &str = "rescue_password";
/// `instance_info` key holding its sha-crypt hash.
pub const HASHED_RESCUE_PASSWORD_KEY: &str = "hashed_rescue_password";

const ROUNDS: usize = 5000;
const SALT_LEN: usize = 16;
const CRYPT64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn prefix(algorithm: HashAlgorithm) -> &'static str {
    match algorithm {
        HashAlgorithm::Sha256 => "$5$",
        HashAlgorithm::Sha512 => "$6$",
    }
}

/// A fresh random salt in crypt setting form, e.g. `$5$0Zplg3iirunqmeSH`.
pub fn make_salt(algorithm: HashAlgorithm) -> String {
    let mut rng = rand::rngs::OsRng;
    let mut salt = String::with_capacity(3 + SALT_LEN);
    salt.push_str(prefix(algorithm));
    for _ in 0..SALT_LEN {
        salt.push(CRYPT64[(rng.next_u32() % 64) as usize] as char);
    }
    salt
}

/// Hash `password` with a fresh salt for the configured algorithm.
pub fn hash_password(
    algorithm: HashAlgorithm,
    password: &str,
) -> Result<String, ConductorError> {
    crypt(password, &make_salt(algorithm))
}

/// crypt(3) over a sha-crypt setting string (`$5$salt` / `$6$salt`, with
/// or without trailing hash). Returns the full `$N$salt$hash` entry.
pub fn crypt(password: &str, setting: &str) -> Result<String, ConductorError> {
    let (algorithm, rest) = if let Some(rest) = setting.strip_prefix("$5$") {
        (HashAlgorithm::Sha256, rest)
    } else if let Some(rest) = setting.strip_prefix("$6$") {
        (HashAlgorithm::Sha512, rest)
    } else {
        return Err(ConductorError::InvalidParameterValue(format!(
            "unsupported password hash setting '{setting}'"
        )));
    };
    let salt: &str = rest.split('$').next().unwrap_or(rest);
    let salt = &salt[..salt.len().min(SALT_LEN)];

    let encoded = match algorithm {
        HashAlgorithm::Sha256 => {
            encode_sha256(&sha_crypt_raw::<Sha256>(password.as_bytes(), salt.as_bytes()))
        }
        HashAlgorithm::Sha512 => {
            encode_sha512(&sha_crypt_raw::<Sha512>(password.as_bytes(), salt.as_bytes()))
        }
    };
    Ok(format!("{}{salt}${encoded}", prefix(algorithm)))
}

/// Recompute and compare; unparseable settings never verify.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    crypt(password, hashed).map(|computed| computed == hashed).unwrap_or(false)
}

/// Drop both rescue-password fields from `instance_info`.
pub fn remove_node_rescue_password(node: &mut Node) {
    node.instance_info.remove(RESCUE_PASSWORD_KEY);
    node.instance_info.remove(HASHED_RESCUE_PASSWORD_KEY);
}

/// [`remove_node_rescue_password`] plus persistence.
pub fn remove_and_save_rescue_password(
    store: &bmc_store::NodeStore,
    node: &mut Node,
) -> Result<(), ConductorError> {
    remove_node_rescue_password(node);
    store.save_node(node)
}

/// The digest series from the sha-crypt reference: mixes password and salt
/// into A/B, derives the P and S sequences, then runs the round loop.
fn sha_crypt_raw<D: Digest>(password: &[u8], salt: &[u8]) -> Vec<u8> {
    let digest_len = <D as Digest>::output_size();

    let mut ctx = D::new();
    ctx.update(password);
    ctx.update(salt);
    ctx.update(password);
    let b = ctx.finalize();

    let mut ctx = D::new();
    ctx.update(password);
    ctx.update(salt);
    let mut remaining = password.len();
    while remaining > digest_len {
        ctx.update(&b);
        remaining -= digest_len;
    }
    ctx.update(&b[..remaining]);
    let mut bits = password.len();
    while bits > 0 {
        if bits & 1 != 0 {
            ctx.update(&b);
        } else {
            ctx.update(password);
        }
        bits >>= 1;
    }
    let a = ctx.finalize();

    let mut ctx = D::new();
    for _ in 0..password.len() {
        ctx.update(password);
    }
    let dp = ctx.finalize();
    let p: Vec<u8> = dp.iter().cycle().take(password.len()).copied().collect();

    let mut ctx = D::new();
    for _ in 0..(16 + a[0] as usize) {
        ctx.update(salt);
    }
    let ds = ctx.finalize();
    let s: Vec<u8> = ds.iter().cycle().take(salt.len()).copied().collect();

    let mut c = a;
    for round in 0..ROUNDS {
        let mut ctx = D::new();
        if round & 1 != 0 {
            ctx.update(&p);
        } else {
            ctx.update(&c);
        }
        if round % 3 != 0 {
            ctx.update(&s);
        }
        if round % 7 != 0 {
            ctx.update(&p);
        }
        if round & 1 != 0 {
            ctx.update(&c);
        } else {
            ctx.update(&p);
        }
        c = ctx.finalize();
    }
    c.to_vec()
}

fn b64_from_24bit(out: &mut String, b2: u8, b1: u8, b0: u8, chars: usize) {
    let mut w = (u32::from(b2) << 16) | (u32::from(b1) << 8) | u32::from(b0);
    for _ in 0..chars {
        out.push(CRYPT64[(w & 0x3f) as usize] as char);
        w >>= 6;
    }
}

fn encode_sha256(d: &[u8]) -> String {
    let mut out = String::with_capacity(43);
    b64_from_24bit(&mut out, d[0], d[10], d[20], 4);
    b64_from_24bit(&mut out, d[21], d[1], d[11], 4);
    b64_from_24bit(&mut out, d[12], d[22], d[2], 4);
    b64_from_24bit(&mut out, d[3], d[13], d[23], 4);
    b64_from_24bit(&mut out, d[24], d[4], d[14], 4);
    b64_from_24bit(&mut out, d[15], d[25], d[5], 4);
    b64_from_24bit(&mut out, d[6], d[16], d[26], 4);
    b64_from_24bit(&mut out, d[27], d[7], d[17], 4);
    b64_from_24bit(&mut out, d[18], d[28], d[8], 4);
    b64_from_24bit(&mut out, d[9], d[19], d[29], 4);
    b64_from_24bit(&mut out, 0, d[31], d[30], 3);
    out
}

fn encode_sha512(d: &[u8]) -> String {
    let mut out = String::with_capacity(86);
    b64_from_24bit(&mut out, d[0], d[21], d[42], 4);
    b64_from_24bit(&mut out, d[22], d[43], d[1], 4);
    b64_from_24bit(&mut out, d[44], d[2], d[23], 4);
    b64_from_24bit(&mut out, d[3], d[24], d[45], 4);
    b64_from_24bit(&mut out, d[25], d[46], d[4], 4);
    b64_from_24bit(&mut out, d[47], d[5], d[26], 4);
    b64_from_24bit(&mut out, d[6], d[27], d[48], 4);
    b64_from_24bit(&mut out, d[28], d[49], d[7], 4);
    b64_from_24bit(&mut out, d[50], d[8], d[29], 4);
    b64_from_24bit(&mut out, d[9], d[30], d[51], 4);
    b64_from_24bit(&mut out, d[31], d[52], d[10], 4);
    b64_from_24bit(&mut out, d[53], d[11], d[32], 4);
    b64_from_24bit(&mut out, d[12], d[33], d[54], 4);
    b64_from_24bit(&mut out, d[34], d[55], d[13], 4);
    b64_from_24bit(&mut out, d[56], d[14], d[35], 4);
    b64_from_24bit(&mut out, d[15], d[36], d[57], 4);
    b64_from_24bit(&mut out, d[37], d[58], d[16], 4);
    b64_from_24bit(&mut out, d[59], d[17], d[38], 4);
    b64_from_24bit(&mut out, d[18], d[39], d[60], 4);
    b64_from_24bit(&mut out, d[40], d[61], d[19], 4);
    b64_from_24bit(&mut out, d[62], d[20], d[41], 4);
    b64_from_24bit(&mut out, 0, 0, d[63], 2);
    out
}

#[cfg(test)]
#[path = "crypt_tests.rs"]
mod tests;
