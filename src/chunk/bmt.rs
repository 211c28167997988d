//! Binary Merkle tree chunk hash
//!
//! The payload is zero-padded to [`CHUNK_SIZE`] and split into 32-byte
//! segments; sibling pairs are keccak-hashed up to a single root, and the
//! chunk address is `keccak256(span_le || root)`.

use super::CHUNK_SIZE;
use crate::address::{keccak256, Address};

/// Segment size (one keccak digest)
pub const SEGMENT_SIZE: usize = 32;

/// Root of the binary Merkle tree over a payload of at most `CHUNK_SIZE` bytes
fn root(payload: &[u8]) -> [u8; 32] {
    debug_assert!(payload.len() <= CHUNK_SIZE);

    let mut level = vec![0u8; CHUNK_SIZE];
    level[..payload.len()].copy_from_slice(payload);

    while level.len() > SEGMENT_SIZE {
        let mut next = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks(2 * SEGMENT_SIZE) {
            next.extend_from_slice(&keccak256(&[pair]));
        }
        level = next;
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&level);
    out
}

/// Chunk address for a span and payload
pub fn hash(span: u64, payload: &[u8]) -> Address {
    let root = root(payload);
    Address::keccak(&[&span.to_le_bytes(), &root])
}
