//! Single-owner chunks
//!
//! A SOC wraps a plain chunk under an address derived from `(id, owner)`
//! rather than from its content. The owner signs `keccak256(id || chunk address)`.
//!
//! Network framing: `id (32) || signature (65) || span (8) || payload`.

use super::{Chunk, ChunkError, SPAN_SIZE};
use crate::address::{keccak256, Address, Owner, Signature};
use thiserror::Error;

const ID_SIZE: usize = 32;

/// Signing failure reported by a [`Signer`]
#[derive(Debug, Error)]
#[error("signing failed: {0}")]
pub struct SignError(pub String);

/// Owner-signing capability supplied by the account layer
pub trait Signer: Send + Sync {
    /// Account address the signatures recover to
    fn owner(&self) -> Owner;

    /// Sign a 32-byte digest
    fn sign(&self, digest: &[u8; 32]) -> Result<Signature, SignError>;
}

/// SOC address for an id and owner
pub fn soc_address(id: &Address, owner: &Owner) -> Address {
    Address::keccak(&[id.as_bytes(), owner.as_bytes()])
}

/// Digest the owner signs for `id` wrapping `chunk`
pub fn signing_digest(id: &Address, chunk: &Chunk) -> [u8; 32] {
    keccak256(&[id.as_bytes(), chunk.address().as_bytes()])
}

/// Parsed single-owner chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleOwnerChunk {
    pub id: Address,
    pub signature: Signature,
    pub chunk: Chunk,
}

impl SingleOwnerChunk {
    /// Sign `chunk` under `id`
    pub fn sign(id: Address, chunk: Chunk, signer: &dyn Signer) -> Result<Self, SignError> {
        let signature = signer.sign(&signing_digest(&id, &chunk))?;
        Ok(Self {
            id,
            signature,
            chunk,
        })
    }

    /// Parse the network framing
    pub fn from_bytes(data: &[u8]) -> Result<Self, ChunkError> {
        let header = ID_SIZE + Signature::LEN;
        if data.len() < header + SPAN_SIZE {
            return Err(ChunkError::TooShort(data.len()));
        }

        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&data[..ID_SIZE]);
        let signature = Signature::from_slice(&data[ID_SIZE..header])
            .ok_or(ChunkError::TooShort(data.len()))?;
        let chunk = Chunk::from_bytes(&data[header..])?;

        Ok(Self {
            id: Address::from_bytes(id),
            signature,
            chunk,
        })
    }

    /// Network framing
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ID_SIZE + Signature::LEN + SPAN_SIZE + self.chunk.payload().len());
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(self.signature.as_bytes());
        out.extend_from_slice(&self.chunk.to_bytes());
        out
    }

    /// Address of this SOC for `owner`
    pub fn address(&self, owner: &Owner) -> Address {
        soc_address(&self.id, owner)
    }
}
