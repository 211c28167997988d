//! Epoch-based feeds
//!
//! A feed is an append-only sequence of updates for one `(owner, topic)`
//! pair. Each update is a single-owner chunk at an address derived from the
//! owner, the topic and the update's epoch, so any reader can find the latest
//! one by probing the network without a shared index.
//!
//! Update payload inside the SOC: `time (8 bytes big-endian) || data`.

pub mod epoch;
pub mod lookup;
pub mod tracker;

pub use epoch::{Epoch, HIGHEST_LEVEL, LOWEST_LEVEL};
pub use lookup::{Lookup, Step};
pub use tracker::Tracker;

use crate::address::{Address, Owner, Topic};
use crate::chunk::{Chunk, ChunkError, SignError, Signer, SingleOwnerChunk, CHUNK_SIZE};
use crate::client::{ChunkStore, ClientError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

const TIME_SIZE: usize = 8;

/// Largest `data` one update can carry
pub const MAX_UPDATE_DATA: usize = CHUNK_SIZE - TIME_SIZE;

/// Feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Never published as of `at`; a normal negative result
    #[error("feed {topic} has no update at or before {at}")]
    NotFound { topic: Topic, at: u64 },

    #[error("update at {epoch:?} would overwrite the previous update")]
    EpochCollision { epoch: Epoch },

    #[error("update time {now} is before the previous update {previous:?}")]
    Stale { previous: Epoch, now: u64 },

    #[error("invalid update at {address}: {reason}")]
    InvalidUpdate { address: Address, reason: String },

    #[error("feed of {owner} is read-only")]
    ReadOnly { owner: Owner },

    #[error("update data too large: {0}")]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl FeedError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::NotFound { .. })
    }
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Source of the current time in Unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// One feed update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    /// Bucket the update lives in; `epoch.time` is the publish time
    pub epoch: Epoch,
    pub data: Vec<u8>,
}

impl FeedUpdate {
    /// Publish time in Unix seconds
    pub fn time(&self) -> u64 {
        self.epoch.time
    }

    /// Interpret the data as a content reference (plain 32-byte address)
    pub fn reference(&self) -> Option<Address> {
        let bytes: [u8; 32] = self.data.as_slice().try_into().ok()?;
        Some(Address::from_bytes(bytes))
    }
}

/// Reader and, given a signer, writer of the feeds of one owner
pub struct Feed<S> {
    store: Arc<S>,
    owner: Owner,
    signer: Option<Arc<dyn Signer>>,
    clock: Arc<dyn Clock>,
}

impl<S: ChunkStore> Feed<S> {
    /// Read-only access to the feeds of `owner`
    pub fn reader(store: Arc<S>, owner: Owner) -> Self {
        Self {
            store,
            owner,
            signer: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Read-write access to the feeds of the signer's owner
    pub fn writer(store: Arc<S>, signer: Arc<dyn Signer>) -> Self {
        Self {
            store,
            owner: signer.owner(),
            signer: Some(signer),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Read the update stored at `epoch`, if one exists with time at or before `at`
    pub async fn read_epoch(
        &self,
        cancel: &CancellationToken,
        topic: &Topic,
        epoch: &Epoch,
        at: u64,
    ) -> FeedResult<Option<FeedUpdate>> {
        let id = epoch::update_id(topic, epoch);
        let address = epoch::update_address(&self.owner, topic, epoch);

        let bytes = match self.store.download_chunk(cancel, &address).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let invalid = |reason: String| FeedError::InvalidUpdate { address, reason };
        let soc = SingleOwnerChunk::from_bytes(&bytes).map_err(|e| invalid(e.to_string()))?;
        if soc.id != id {
            return Err(invalid(format!("id {} does not match epoch {:?}", soc.id, epoch)));
        }

        let payload = soc.chunk.payload();
        if payload.len() < TIME_SIZE {
            return Err(invalid(format!("payload of {} bytes", payload.len())));
        }
        let mut time = [0u8; TIME_SIZE];
        time.copy_from_slice(&payload[..TIME_SIZE]);
        let time = u64::from_be_bytes(time);
        if !epoch.contains(time) {
            return Err(invalid(format!("time {} outside {:?}", time, epoch)));
        }

        if time > at {
            return Ok(None);
        }
        Ok(Some(FeedUpdate {
            epoch: Epoch::new(time, epoch.level),
            data: payload[TIME_SIZE..].to_vec(),
        }))
    }

    /// Latest update of `topic` at or before `at`
    pub async fn lookup(
        &self,
        cancel: &CancellationToken,
        topic: &Topic,
        at: u64,
    ) -> FeedResult<FeedUpdate> {
        let start = Instant::now();
        let mut lookup = Lookup::new(at);
        let mut found = self.read_epoch(cancel, topic, &lookup.probe(), at).await?;

        loop {
            match lookup.advance(found) {
                Step::Probe(epoch) => {
                    found = self.read_epoch(cancel, topic, &epoch, at).await?;
                }
                Step::Found(_, update) => {
                    log::debug!(
                        "feed {} at {}: {:?} after {} probes in {:?}",
                        topic,
                        at,
                        update.epoch,
                        lookup.probes(),
                        start.elapsed()
                    );
                    return Ok(update);
                }
                Step::NotFound => {
                    log::debug!("feed {} at {}: not found in {:?}", topic, at, start.elapsed());
                    return Err(FeedError::NotFound { topic: *topic, at });
                }
            }
        }
    }

    /// Latest update of `topic` now
    pub async fn latest(&self, topic: &Topic) -> FeedResult<FeedUpdate> {
        self.lookup(&CancellationToken::new(), topic, self.now()).await
    }

    /// Write `data` as the update at `now`, following `previous`
    pub async fn publish_at(
        &self,
        topic: &Topic,
        previous: Option<&Epoch>,
        now: u64,
        data: &[u8],
    ) -> FeedResult<FeedUpdate> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(FeedError::ReadOnly { owner: self.owner })?;
        let epoch = epoch::next_epoch(previous, now)?;

        let mut payload = Vec::with_capacity(TIME_SIZE + data.len());
        payload.extend_from_slice(&now.to_be_bytes());
        payload.extend_from_slice(data);
        let chunk = Chunk::new(payload)?;

        let id = epoch::update_id(topic, &epoch);
        let soc = SingleOwnerChunk::sign(id, chunk, signer.as_ref())?;
        let address = self
            .store
            .upload_soc(&self.owner, &soc.id, &soc.signature, &soc.chunk)
            .await?;

        log::debug!("feed {} updated at {:?} -> {}", topic, epoch, address);
        Ok(FeedUpdate {
            epoch,
            data: data.to_vec(),
        })
    }

    /// Append `data` to `topic`, finding the previous update on the network
    pub async fn update(&self, topic: &Topic, data: &[u8]) -> FeedResult<FeedUpdate> {
        let now = self.now();
        let previous = match self.lookup(&CancellationToken::new(), topic, now).await {
            Ok(update) => Some(update.epoch),
            Err(FeedError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        self.publish_at(topic, previous.as_ref(), now, data).await
    }

    /// Append a content reference to `topic`
    pub async fn update_reference(
        &self,
        topic: &Topic,
        reference: &Address,
    ) -> FeedResult<FeedUpdate> {
        self.update(topic, reference.as_bytes()).await
    }
}
