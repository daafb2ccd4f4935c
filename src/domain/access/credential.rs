//! Raw API-key generation, hashing and validity windows.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::str::FromStr;

use super::PrincipalKind;
use crate::domain::foundation::{Timestamp, ValidationError};

/// Number of leading characters of a raw key kept for display.
pub const KEY_PREFIX_LEN: usize = 8;

const RANDOM_BYTES: usize = 24;

/// Returns the lowercase hex SHA-256 digest of a raw key.
///
/// This is the only form of a key that is ever stored or looked up.
pub fn hash_key(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Returns the display prefix (first 8 characters) of a raw key.
pub fn key_prefix(raw: &str) -> String {
    raw.chars().take(KEY_PREFIX_LEN).collect()
}

/// A freshly generated credential. The raw value exists only here.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub raw: String,
    pub hash: String,
    pub prefix: String,
}

impl GeneratedKey {
    /// Generates a new random key for the given principal kind.
    ///
    /// Format: `nxus_` (user) or `nxsa_` (super admin) followed by 48 hex
    /// characters.
    pub fn generate(kind: PrincipalKind) -> Self {
        let mut bytes = [0u8; RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let body: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self::from_raw(format!("{}{}", kind.key_scheme(), body))
    }

    /// Wraps an existing raw key, e.g. the bootstrap key from configuration.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            hash: hash_key(&raw),
            prefix: key_prefix(&raw),
            raw,
        }
    }
}

/// How long an issued key stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validity {
    Days30,
    Days90,
    Days180,
    Days365,
}

impl Validity {
    pub fn days(&self) -> i64 {
        match self {
            Validity::Days30 => 30,
            Validity::Days90 => 90,
            Validity::Days180 => 180,
            Validity::Days365 => 365,
        }
    }

    /// Expiry for a key issued (or renewed) at `from`.
    pub fn expires_at(&self, from: Timestamp) -> Timestamp {
        from.add_days(self.days())
    }

    /// Parses an optional selector; empty or absent means "never expires".
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, ValidationError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }
}

impl FromStr for Validity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "30" => Ok(Validity::Days30),
            "90" => Ok(Validity::Days90),
            "180" => Ok(Validity::Days180),
            "365" => Ok(Validity::Days365),
            other => Err(ValidationError::invalid_format(
                "validity",
                format!("'{}' is not one of 30, 90, 180, 365", other),
            )),
        }
    }
}
