//! Session token generation.
//!
//! Tokens are short store-scoped identifiers minted from a SHA256 digest of
//! a timestamp, a process-local counter, and a retry nonce, then base36
//! encoded as `sess-{hash}`. The caller supplies the collision predicate,
//! so uniqueness is always judged against the live key set rather than any
//! global state.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::types::SessionId;

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Length of the base36 suffix.
const TOKEN_LENGTH: usize = 8;

/// Prefix marking store-issued session tokens.
const TOKEN_PREFIX: &str = "sess";

pub(crate) struct TokenGenerator {
    counter: AtomicU64,
}

impl TokenGenerator {
    pub(crate) fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Mints a token that `in_use` does not reject.
    ///
    /// Retries with fresh nonces on collision; a full nonce sweep failing
    /// against a bounded live set means the suffix is too short for the
    /// caller's store, so the suffix widens and the sweep restarts. The
    /// live set is finite, so some width always has a free token.
    pub(crate) fn next(&self, in_use: impl Fn(&SessionId) -> bool) -> SessionId {
        let serial = self.counter.fetch_add(1, Ordering::Relaxed);
        let timestamp = Utc::now().timestamp_millis();
        let mut length = TOKEN_LENGTH;
        loop {
            for nonce in 0..MAX_NONCE {
                let candidate = mint(timestamp, serial, nonce, length);
                if !in_use(&candidate) {
                    if nonce > 0 {
                        debug!(nonce, length, "issued session token after collision retries");
                    }
                    return candidate;
                }
            }
            length += 1;
            warn!(length, "session token space saturated, widening suffix");
        }
    }
}

fn mint(timestamp: i64, serial: u64, nonce: u32, length: usize) -> SessionId {
    let content = format!("{timestamp}|{serial}|{nonce}");

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash_bytes = hasher.finalize();

    let hash = encode_base36(&hash_bytes[..8], length);
    SessionId::new(format!("{TOKEN_PREFIX}-{hash}"))
}

/// Encode bytes as a base36 string of exactly `length` characters.
///
/// The byte-to-u64 fold uses wrapping arithmetic; the caller passes at most
/// eight bytes, and a wrapped value still encodes deterministically.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut num: u64 = 0;
    for &byte in bytes {
        num = num.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut digits = Vec::with_capacity(length);
    let mut n = num;
    while digits.len() < length {
        digits.push(char::from(BASE36_CHARS[(n % 36) as usize]));
        n /= 36;
    }

    digits.iter().rev().collect()
}
