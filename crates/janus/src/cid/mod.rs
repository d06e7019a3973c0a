//! Canonicalizer and content identity (§4.3).
//!
//! A [`Cid`] is a 32-byte BLAKE3-256 digest computed recursively,
//! bottom-up, over a node's *semantic* content: kind, canonical payload,
//! and child CIDs. Source positions, token ids and node ids never enter the
//! hash — only [`ToolchainOpts`] and the tree shape do.

mod canonicalize;

pub use canonicalize::Canonicalizer;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::de::Error as _;

/// Mixed into every node's hash so the same AST under different
/// compilation options yields distinct identities. Exact 16-byte layout:
/// `[toolchain_version: u32 LE][profile_mask: u32 LE][effect_mask: u32 LE]
/// [flags: u8][pad: 3 zero bytes]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ToolchainOpts {
    pub toolchain_version: u32,
    pub profile_mask: u32,
    pub effect_mask: u32,
    pub deterministic: bool,
}

impl ToolchainOpts {
    pub fn to_bytes(self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&self.toolchain_version.to_le_bytes());
        buf[4..8].copy_from_slice(&self.profile_mask.to_le_bytes());
        buf[8..12].copy_from_slice(&self.effect_mask.to_le_bytes());
        buf[12] = self.deterministic as u8;
        buf
    }
}

impl Default for ToolchainOpts {
    fn default() -> Self {
        Self {
            toolchain_version: 1,
            profile_mask: 0,
            effect_mask: 0,
            deterministic: true,
        }
    }
}

/// A 32-byte BLAKE3-256 content identifier. Equality is byte-wise.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid([u8; 32]);

impl Cid {
    pub const ZERO: Cid = Cid([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in &self.0 {
            use std::fmt::Write;
            write!(s, "{byte:02x}").expect("String write never fails");
        }
        s
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = ((hi << 4) | lo) as u8;
        }
        Some(Self(bytes))
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.to_hex())
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Serializes as the stable 64-character lowercase hex shape from §6.
impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Cid::from_hex(&s).ok_or_else(|| D::Error::custom("invalid CID hex string"))
    }
}

/// Hit/miss counters for a [`Canonicalizer`]'s lazily-populated cache.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CidCacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CidCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let cid = Cid::from_bytes([7u8; 32]);
        let hex = cid.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Cid::from_hex(&hex), Some(cid));
    }

    #[test]
    fn zero_is_zero() {
        assert!(Cid::ZERO.is_zero());
        assert!(!Cid::from_bytes([1u8; 32]).is_zero());
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert_eq!(Cid::from_hex("ab"), None);
    }

    #[test]
    fn options_bytes_are_sixteen_and_pad_is_zero() {
        let opts = ToolchainOpts {
            toolchain_version: 1,
            profile_mask: 2,
            effect_mask: 3,
            deterministic: true,
        };
        let bytes = opts.to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[13..16], &[0, 0, 0]);
    }
}
