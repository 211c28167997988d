//! Epoch arithmetic
//!
//! An epoch `(time, level)` owns the interval `[base, base + 2^level)` where
//! `base` is `time` with its low `level` bits cleared. Everything here is pure.

use super::FeedError;
use crate::address::{Address, Owner, Topic};
use crate::chunk::soc;
use std::fmt;

/// Coarsest level; one top-level epoch spans 2^31 seconds
pub const HIGHEST_LEVEL: u8 = 31;

/// Finest level; one second
pub const LOWEST_LEVEL: u8 = 0;

/// Time bucket addressing one feed update
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch {
    pub time: u64,
    pub level: u8,
}

impl Epoch {
    pub fn new(time: u64, level: u8) -> Self {
        debug_assert!(level < 64);
        Self { time, level }
    }

    /// First epoch of a feed
    pub fn first(time: u64) -> Self {
        Self::new(time, HIGHEST_LEVEL)
    }

    /// Start of the interval this epoch owns
    pub fn base(&self) -> u64 {
        base(self.time, self.level)
    }

    pub fn contains(&self, time: u64) -> bool {
        base(time, self.level) == self.base()
    }

    /// Same bucket: equal base and level regardless of the time inside it
    pub fn same_bucket(&self, other: &Epoch) -> bool {
        self.level == other.level && self.base() == other.base()
    }

    /// Identifier bytes: `base` big-endian followed by `level`
    pub fn id(&self) -> [u8; 9] {
        let mut id = [0u8; 9];
        id[..8].copy_from_slice(&self.base().to_be_bytes());
        id[8] = self.level;
        id
    }

    /// Encode as `time` big-endian followed by `level`
    pub fn to_bytes(&self) -> [u8; 9] {
        let mut out = [0u8; 9];
        out[..8].copy_from_slice(&self.time.to_be_bytes());
        out[8] = self.level;
        out
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() != 9 || data[8] >= 64 {
            return None;
        }
        let mut time = [0u8; 8];
        time.copy_from_slice(&data[..8]);
        Some(Self::new(u64::from_be_bytes(time), data[8]))
    }
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch({}@{}, base {})", self.time, self.level, self.base())
    }
}

/// `time` with its low `level` bits cleared
pub fn base(time: u64, level: u8) -> u64 {
    if level >= 64 {
        return 0;
    }
    time & !((1u64 << level) - 1)
}

/// SOC id of the update for `topic` at `epoch`
pub fn update_id(topic: &Topic, epoch: &Epoch) -> Address {
    Address::keccak(&[topic.as_bytes(), &epoch.id()])
}

/// Network address of the update for `(owner, topic)` at `epoch`
pub fn update_address(owner: &Owner, topic: &Topic, epoch: &Epoch) -> Address {
    soc::soc_address(&update_id(topic, epoch), owner)
}

/// Level for the next update at `now` after an update at `previous`.
///
/// The highest bit in which `previous.base()` and `now` differ, but never
/// below `previous.level - 1`. Capped at [`HIGHEST_LEVEL`].
pub fn next_level(previous: &Epoch, now: u64) -> u8 {
    let mut mix = previous.base() ^ now;
    if previous.level > LOWEST_LEVEL {
        mix |= 1u64 << (previous.level - 1);
    }
    if mix == 0 {
        return LOWEST_LEVEL;
    }
    let highest_bit = (63 - mix.leading_zeros()) as u8;
    highest_bit.min(HIGHEST_LEVEL)
}

/// Epoch for an update at `now`, given the previous update's epoch.
///
/// Fails rather than reuse the previous bucket, which would overwrite it.
pub fn next_epoch(previous: Option<&Epoch>, now: u64) -> Result<Epoch, FeedError> {
    let Some(previous) = previous else {
        return Ok(Epoch::first(now));
    };

    if now < previous.time {
        return Err(FeedError::Stale {
            previous: *previous,
            now,
        });
    }

    let next = Epoch::new(now, next_level(previous, now));
    if next.same_bucket(previous) {
        return Err(FeedError::EpochCollision { epoch: next });
    }
    Ok(next)
}
