//! Storage-node client
//!
//! This module defines the narrow store contracts consumed by the feed layer
//! and the layers above it, plus two implementations: [`Client`] talking HTTP
//! to one node, and [`MemoryStore`] holding everything in process.

pub mod http;
pub mod memory;
#[cfg(test)]
pub(crate) mod testnode;

pub use http::{CacheStats, Client, NODE_GREETING};
pub use memory::MemoryStore;

use crate::address::{Address, Owner, Signature};
use crate::chunk::{Chunk, ChunkError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Operation a client error was raised by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    UploadChunk,
    DownloadChunk,
    UploadSoc,
    UploadBlob,
    DownloadBlob,
    DeleteChunk,
    DeleteBlob,
    CheckConnection,
}

impl Operation {
    /// Whether this operation writes to the node
    pub fn is_upload(&self) -> bool {
        matches!(
            self,
            Operation::UploadChunk | Operation::UploadSoc | Operation::UploadBlob
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::UploadChunk => "upload chunk",
            Operation::DownloadChunk => "download chunk",
            Operation::UploadSoc => "upload soc",
            Operation::UploadBlob => "upload blob",
            Operation::DownloadBlob => "download blob",
            Operation::DeleteChunk => "unpin chunk",
            Operation::DeleteBlob => "unpin blob",
            Operation::CheckConnection => "check connection",
        };
        f.write_str(name)
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Node unreachable, connection or TLS failure, timeout
    #[error("{op}: transport error: {source}")]
    Transport {
        op: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op}: {address} not found")]
    NotFound { op: Operation, address: String },

    #[error("{op}: node returned {status}: {body}")]
    Status {
        op: Operation,
        status: StatusCode,
        body: String,
    },

    /// Malformed response from the node
    #[error("{op}: bad response: {message}")]
    Decode { op: Operation, message: String },

    #[error("{op}: invalid chunk: {source}")]
    InvalidChunk {
        op: Operation,
        #[source]
        source: ChunkError,
    },

    #[error("{op}: cancelled")]
    Cancelled { op: Operation },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// HTTP status carried by the error, if the node answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ClientError::Transport { op, .. }
            | ClientError::NotFound { op, .. }
            | ClientError::Status { op, .. }
            | ClientError::Decode { op, .. }
            | ClientError::InvalidChunk { op, .. }
            | ClientError::Cancelled { op } => *op,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Chunk-level store: plain chunks and single-owner chunks
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store a chunk, returning its content address
    async fn upload_chunk(&self, chunk: &Chunk, pin: bool) -> ClientResult<Address>;

    /// Fetch the raw bytes stored at `address`.
    /// Plain chunks come back as `span || payload`, SOCs in their network framing.
    async fn download_chunk(
        &self,
        cancel: &CancellationToken,
        address: &Address,
    ) -> ClientResult<Vec<u8>>;

    /// Store `chunk` as a single-owner chunk under `(owner, id)`
    async fn upload_soc(
        &self,
        owner: &Owner,
        id: &Address,
        signature: &Signature,
        chunk: &Chunk,
    ) -> ClientResult<Address>;

    /// Drop the retention pin on a chunk. Does not erase it from the network.
    async fn delete_chunk(&self, address: &Address) -> ClientResult<()>;
}

/// Blob-level store: arbitrary-length content chunked by the node
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload_blob(&self, data: &[u8], pin: bool, encrypt: bool) -> ClientResult<Address>;

    /// Fetch a blob with the status of the response that produced it
    async fn download_blob(&self, address: &Address) -> ClientResult<(Vec<u8>, StatusCode)>;

    /// Drop the retention pin on a blob. Does not erase it from the network.
    async fn delete_blob(&self, address: &Address) -> ClientResult<()>;
}
