//! Storage-network client with epoch-based feeds
//!
//! This crate turns content into immutable, content-addressed chunks and
//! blobs on a storage network node, and maintains logically mutable feeds
//! whose latest update any reader can locate in logarithmic time.

pub mod address;
pub mod cache;
pub mod chunk;
pub mod client;
pub mod config;
pub mod feed;

pub use address::{Address, Owner, Signature, Topic};
pub use chunk::{Chunk, Signer, SingleOwnerChunk};
pub use client::{BlobStore, ChunkStore, Client, ClientError, MemoryStore};
pub use config::Config;
pub use feed::{Epoch, Feed, FeedError, FeedUpdate, Tracker};
