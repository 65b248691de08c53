//! Counters for the settings check.

use std::sync::atomic::{AtomicU64, Ordering};

use super::task::FinalizeCause;

/// Why a fragment was not merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The verification backend was not ready.
    BackendNotReady,
    /// Remote privacy settings forbid collection.
    PrivacyOptOut,
    /// The player has no check state.
    UnknownPlayer,
    /// Settings were already verified this session.
    AlreadyChecked,
    /// The connection's check was already finalized, or the connection
    /// closed within the last window.
    Sealed,
}

/// Live counters, updated with relaxed atomics.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    fragments_accepted: AtomicU64,
    dropped_backend: AtomicU64,
    dropped_privacy: AtomicU64,
    dropped_unknown_player: AtomicU64,
    dropped_already_checked: AtomicU64,
    dropped_sealed: AtomicU64,
    aggregations_started: AtomicU64,
    finalized_expired: AtomicU64,
    finalized_disconnected: AtomicU64,
    finalized_replaced: AtomicU64,
}

impl ProcessorStats {
    pub(crate) fn record_accepted(&self) {
        self.fragments_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::BackendNotReady => &self.dropped_backend,
            DropReason::PrivacyOptOut => &self.dropped_privacy,
            DropReason::UnknownPlayer => &self.dropped_unknown_player,
            DropReason::AlreadyChecked => &self.dropped_already_checked,
            DropReason::Sealed => &self.dropped_sealed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_started(&self) {
        self.aggregations_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_finalized(&self, cause: FinalizeCause) {
        let counter = match cause {
            FinalizeCause::Expired => &self.finalized_expired,
            FinalizeCause::Disconnected => &self.finalized_disconnected,
            FinalizeCause::Replaced => &self.finalized_replaced,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fragments_accepted: self.fragments_accepted.load(Ordering::Relaxed),
            dropped_backend: self.dropped_backend.load(Ordering::Relaxed),
            dropped_privacy: self.dropped_privacy.load(Ordering::Relaxed),
            dropped_unknown_player: self.dropped_unknown_player.load(Ordering::Relaxed),
            dropped_already_checked: self.dropped_already_checked.load(Ordering::Relaxed),
            dropped_sealed: self.dropped_sealed.load(Ordering::Relaxed),
            aggregations_started: self.aggregations_started.load(Ordering::Relaxed),
            finalized_expired: self.finalized_expired.load(Ordering::Relaxed),
            finalized_disconnected: self.finalized_disconnected.load(Ordering::Relaxed),
            finalized_replaced: self.finalized_replaced.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`ProcessorStats`] at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Fragments merged into a live task.
    pub fragments_accepted: u64,
    /// Fragments dropped because the backend was not ready.
    pub dropped_backend: u64,
    /// Fragments dropped by the privacy toggle.
    pub dropped_privacy: u64,
    /// Fragments for players without check state.
    pub dropped_unknown_player: u64,
    /// Fragments for players already checked.
    pub dropped_already_checked: u64,
    /// Fragments for connections already finalized.
    pub dropped_sealed: u64,
    /// Tasks created.
    pub aggregations_started: u64,
    /// Tasks finalized by the sweep.
    pub finalized_expired: u64,
    /// Tasks finalized by disconnect.
    pub finalized_disconnected: u64,
    /// Tasks finalized on the submit path after their deadline.
    pub finalized_replaced: u64,
}

impl StatsSnapshot {
    /// Total tasks finalized, by any cause.
    #[must_use]
    pub const fn finalized_total(&self) -> u64 {
        self.finalized_expired + self.finalized_disconnected + self.finalized_replaced
    }

    /// Total fragments dropped, by any reason.
    #[must_use]
    pub const fn dropped_total(&self) -> u64 {
        self.dropped_backend
            + self.dropped_privacy
            + self.dropped_unknown_player
            + self.dropped_already_checked
            + self.dropped_sealed
    }
}
