//! In-memory store
//!
//! Backs the store traits with process-local maps. Useful for embedding the
//! feed layer without a node and as a call-counting double in tests.

use super::{BlobStore, ChunkStore, ClientError, ClientResult, Operation};
use crate::address::{Address, Owner, Signature};
use crate::chunk::{soc, Chunk, SingleOwnerChunk};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Process-local chunk and blob store
#[derive(Default)]
pub struct MemoryStore {
    chunks: Mutex<HashMap<Address, Vec<u8>>>,
    blobs: Mutex<HashMap<Address, Vec<u8>>>,
    pins: Mutex<HashSet<Address>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_pinned(&self, address: &Address) -> bool {
        self.pins.lock().contains(address)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn pin(&self, address: Address, pin: bool) {
        if pin {
            self.pins.lock().insert(address);
        }
    }

    fn unpin(&self, op: Operation, address: &Address) -> ClientResult<()> {
        self.count();
        if self.pins.lock().remove(address) {
            Ok(())
        } else {
            Err(ClientError::NotFound {
                op,
                address: address.to_hex(),
            })
        }
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn upload_chunk(&self, chunk: &Chunk, pin: bool) -> ClientResult<Address> {
        self.count();
        let address = chunk.address();
        self.chunks.lock().insert(address, chunk.to_bytes());
        self.pin(address, pin);
        Ok(address)
    }

    async fn download_chunk(
        &self,
        cancel: &CancellationToken,
        address: &Address,
    ) -> ClientResult<Vec<u8>> {
        let op = Operation::DownloadChunk;
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled { op });
        }
        self.count();
        self.chunks
            .lock()
            .get(address)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                op,
                address: address.to_hex(),
            })
    }

    async fn upload_soc(
        &self,
        owner: &Owner,
        id: &Address,
        signature: &Signature,
        chunk: &Chunk,
    ) -> ClientResult<Address> {
        self.count();
        let address = soc::soc_address(id, owner);
        let soc = SingleOwnerChunk {
            id: *id,
            signature: *signature,
            chunk: chunk.clone(),
        };
        self.chunks.lock().insert(address, soc.to_bytes());
        Ok(address)
    }

    async fn delete_chunk(&self, address: &Address) -> ClientResult<()> {
        self.unpin(Operation::DeleteChunk, address)
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload_blob(&self, data: &[u8], pin: bool, encrypt: bool) -> ClientResult<Address> {
        self.count();
        let address = if encrypt {
            Address::keccak(&[b"encrypted", data])
        } else {
            Address::keccak(&[data])
        };
        self.blobs.lock().insert(address, data.to_vec());
        self.pin(address, pin);
        Ok(address)
    }

    async fn download_blob(&self, address: &Address) -> ClientResult<(Vec<u8>, StatusCode)> {
        self.count();
        match self.blobs.lock().get(address) {
            Some(data) => Ok((data.clone(), StatusCode::OK)),
            None => Err(ClientError::NotFound {
                op: Operation::DownloadBlob,
                address: address.to_hex(),
            }),
        }
    }

    async fn delete_blob(&self, address: &Address) -> ClientResult<()> {
        self.unpin(Operation::DeleteBlob, address)
    }
}
