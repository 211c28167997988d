//! Feed update tracker
//!
//! Durable, append-only `topic -> epoch` store kept entirely on the network.
//! Each value is written as an update of a tracker feed derived from the
//! topic, so any tracker bound to the same owner reads back the same epochs
//! without local state or coordination. Writes to one topic must come from a
//! single writer at a time.

use super::{Clock, Epoch, Feed, FeedError, FeedResult};
use crate::address::{Owner, Topic};
use crate::chunk::Signer;
use crate::client::ChunkStore;
use std::sync::Arc;

/// Domain separating tracker feeds from content feeds on the same topic
const TRACKER_DOMAIN: &[u8] = b"epoch-tracker";

/// Topic -> epoch pointer store backed by feeds
pub struct Tracker<S> {
    feed: Feed<S>,
}

impl<S: ChunkStore> Tracker<S> {
    /// Tracker able to record epochs for the signer's owner
    pub fn new(store: Arc<S>, signer: Arc<dyn Signer>) -> Self {
        Self {
            feed: Feed::writer(store, signer),
        }
    }

    /// Read-only tracker for `owner`
    pub fn reader(store: Arc<S>, owner: Owner) -> Self {
        Self {
            feed: Feed::reader(store, owner),
        }
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            feed: self.feed.with_clock(clock),
        }
    }

    pub fn owner(&self) -> &Owner {
        self.feed.owner()
    }

    fn tracker_topic(topic: &Topic) -> Topic {
        topic.derive(TRACKER_DOMAIN)
    }

    /// Record `epoch` as the latest epoch of `topic`
    pub async fn put_feed_update_epoch(&self, topic: &Topic, epoch: &Epoch) -> FeedResult<()> {
        let tracked = Self::tracker_topic(topic);
        let update = self.feed.update(&tracked, &epoch.to_bytes()).await?;
        log::debug!("tracker {}: {:?} recorded at {:?}", topic, epoch, update.epoch);
        Ok(())
    }

    /// Latest epoch recorded for `topic`
    pub async fn get_feed_update_epoch(&self, topic: &Topic) -> FeedResult<Epoch> {
        let tracked = Self::tracker_topic(topic);
        let update = self.feed.latest(&tracked).await.map_err(|e| match e {
            FeedError::NotFound { at, .. } => FeedError::NotFound { topic: *topic, at },
            other => other,
        })?;

        Epoch::from_bytes(&update.data).ok_or_else(|| FeedError::InvalidUpdate {
            address: super::epoch::update_address(self.owner(), &tracked, &update.epoch),
            reason: format!("{} bytes is not an epoch", update.data.len()),
        })
    }
}
