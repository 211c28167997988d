//! Network identifiers
//!
//! Fixed-size newtypes for chunk addresses, feed topics, owners and signatures.

use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Compute keccak256 over the concatenation of `parts`
pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], hex::FromHexError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    if bytes.len() != N {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// 32-byte network address of a chunk, blob root or single-owner chunk
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Create address from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Keccak256 of the concatenated parts
    pub fn keccak(parts: &[&[u8]]) -> Self {
        Address(keccak256(parts))
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string (optional `0x` prefix)
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed(s).map(Address)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// 32-byte domain separator scoping a feed to one purpose
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic([u8; 32]);

impl Topic {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Topic(bytes)
    }

    /// Topic for a human-readable name (keccak256 of the name)
    pub fn from_name(name: &str) -> Self {
        Topic(keccak256(&[name.as_bytes()]))
    }

    /// Derive a sub-topic that cannot collide with `self` for another purpose
    pub fn derive(&self, domain: &[u8]) -> Self {
        Topic(keccak256(&[domain, &self.0]))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// 20-byte account address of a feed owner
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner([u8; 20]);

impl Owner {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Owner(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        decode_fixed(s).map(Owner)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({})", self.to_hex())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Owner {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Recoverable 65-byte owner signature (r || s || v)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 65]);

impl Signature {
    pub const LEN: usize = 65;

    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        Signature(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 65] = bytes.try_into().ok()?;
        Some(Signature(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}
