//! Latest-update search
//!
//! [`Lookup`] is a pure state machine: it names the next epoch to probe and
//! the caller reports what the probe found. It starts at the top level for the
//! target time and walks down, at each level trying the child that contains
//! the cursor and, if that is the later child and empty, its earlier sibling.
//! Each level costs at most two probes.

use super::epoch::{Epoch, HIGHEST_LEVEL, LOWEST_LEVEL};

/// Upper bound on probes for one lookup
pub const MAX_PROBES: usize = 2 * (HIGHEST_LEVEL as usize + 1);

/// What the caller should do next
#[derive(Debug, PartialEq, Eq)]
pub enum Step<T> {
    /// Probe this epoch and report the result to [`Lookup::advance`]
    Probe(Epoch),
    /// Latest update at or before the target time
    Found(Epoch, T),
    /// Nothing was published at or before the target time
    NotFound,
}

/// Search for the latest update at or before `target`
pub struct Lookup<T> {
    /// Latest time still worth looking at
    cursor: u64,
    probe: Epoch,
    /// Epoch whose children are being probed
    parent: Option<Epoch>,
    best: Option<(Epoch, T)>,
    probes: usize,
}

impl<T> Lookup<T> {
    pub fn new(target: u64) -> Self {
        Self {
            cursor: target,
            probe: Epoch::new(target, HIGHEST_LEVEL),
            parent: None,
            best: None,
            probes: 1,
        }
    }

    /// Epoch to probe now
    pub fn probe(&self) -> Epoch {
        self.probe
    }

    /// Probes issued so far, including the current one
    pub fn probes(&self) -> usize {
        self.probes
    }

    /// Report the current probe's result.
    ///
    /// `found` must only carry an update whose time is at or before the
    /// target; a later update in the probed epoch counts as absent.
    pub fn advance(&mut self, found: Option<T>) -> Step<T> {
        let probe = self.probe;

        if let Some(value) = found {
            if probe.level == LOWEST_LEVEL {
                return Step::Found(probe, value);
            }
            self.best = Some((probe, value));
            self.parent = Some(probe);
            return self.next(Epoch::new(self.cursor, probe.level - 1));
        }

        let Some(parent) = self.parent else {
            // Top level is empty
            return Step::NotFound;
        };

        if probe.base() == parent.base() {
            // Earlier child is empty too: nothing finer than the best so far
            return match self.best.take() {
                Some((epoch, value)) => Step::Found(epoch, value),
                None => Step::NotFound,
            };
        }

        // Later child is empty, move to its earlier sibling
        self.cursor = probe.base() - 1;
        self.next(Epoch::new(self.cursor, probe.level))
    }

    fn next(&mut self, epoch: Epoch) -> Step<T> {
        self.probe = epoch;
        self.probes += 1;
        Step::Probe(epoch)
    }
}
