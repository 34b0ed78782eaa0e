// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use rand::Rng;
use ring::pbkdf2;
use std::num::NonZeroU32;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[cfg(not(test))]
const ITERATIONS: u32 = 100_000;
#[cfg(test)]
const ITERATIONS: u32 = 1_000; // keep tests fast

/// Hash a password with PBKDF2-HMAC-SHA256 and a random salt.
///
/// The result is `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`.
pub(crate) fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt[..]);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(ITERATIONS).unwrap_or(NonZeroU32::MIN),
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    format!(
        "{}${}${}${}",
        SCHEME,
        ITERATIONS,
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Check a password against a hash made by [`hash_password`].
///
/// Malformed hashes never match.
pub(crate) fn verify_password(password: &str, encoded: &str) -> bool {
    let parts: Vec<&str> = encoded.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };

    if *scheme != SCHEME {
        return false;
    }

    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };

    let (Ok(salt), Ok(hash)) = (hex::decode(salt), hex::decode(hash)) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}
