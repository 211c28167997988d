//! Chunks
//!
//! A chunk is the bounded storage unit of the network: an 8-byte little-endian
//! span followed by at most 4096 bytes of payload. Plain chunks are addressed
//! by their BMT hash; single-owner chunks by owner and id (see [`soc`]).

pub mod bmt;
pub mod soc;

pub use soc::{SignError, Signer, SingleOwnerChunk};

use crate::address::Address;
use thiserror::Error;

/// Maximum payload size of a single chunk
pub const CHUNK_SIZE: usize = 4096;

/// Size of the span prefix
pub const SPAN_SIZE: usize = 8;

/// Chunk framing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("payload too large: {0} bytes (max {max})", max = CHUNK_SIZE)]
    TooLarge(usize),

    #[error("chunk too short: {0} bytes")]
    TooShort(usize),

    #[error("address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },
}

/// Content-addressed chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    span: u64,
    payload: Vec<u8>,
}

impl Chunk {
    /// Create a chunk whose span is the payload length
    pub fn new(payload: Vec<u8>) -> Result<Self, ChunkError> {
        let span = payload.len() as u64;
        Self::with_span(span, payload)
    }

    /// Create an intermediate chunk with an explicit span
    pub fn with_span(span: u64, payload: Vec<u8>) -> Result<Self, ChunkError> {
        if payload.len() > CHUNK_SIZE {
            return Err(ChunkError::TooLarge(payload.len()));
        }
        Ok(Self { span, payload })
    }

    /// Parse the wire form `span || payload`
    pub fn from_bytes(data: &[u8]) -> Result<Self, ChunkError> {
        if data.len() < SPAN_SIZE {
            return Err(ChunkError::TooShort(data.len()));
        }
        let mut span = [0u8; SPAN_SIZE];
        span.copy_from_slice(&data[..SPAN_SIZE]);
        Self::with_span(u64::from_le_bytes(span), data[SPAN_SIZE..].to_vec())
    }

    /// Wire form `span || payload`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SPAN_SIZE + self.payload.len());
        out.extend_from_slice(&self.span.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn span(&self) -> u64 {
        self.span
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Content address of this chunk
    pub fn address(&self) -> Address {
        bmt::hash(self.span, &self.payload)
    }

    /// Check that `address` is this chunk's content address
    pub fn verify(&self, address: &Address) -> Result<(), ChunkError> {
        let actual = self.address();
        if &actual != address {
            return Err(ChunkError::AddressMismatch {
                expected: *address,
                actual,
            });
        }
        Ok(())
    }
}
