//! # Settings Check Processor
//!
//! Routes fragments to per-connection tasks and drives their finalization.
//!
//! ## Design
//!
//! - One `parking_lot::Mutex` around the pending table, held only for map
//!   operations, never across a merge or a sink call
//! - Per-task locking for merges
//! - Finalized connections are sealed until disconnect
//! - Disconnect leaves a tombstone for one window, so a fragment already past
//!   the gates cannot open a second task for the closed connection

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use warden_shared::{ClientSettings, ConnectionId, SkinLayers};

use super::stats::{DropReason, ProcessorStats, StatsSnapshot};
use super::task::{FinalizeCause, SettingsCallbackTask};
use crate::backend::BackendGate;
use crate::check_state::{CheckStateStore, PlayerCheckData};
use crate::clock::{Clock, MonotonicClock};
use crate::config::ProcessorConfig;
use crate::remote::RemoteSettings;
use crate::sink::SettingsSink;

#[derive(Debug, Default)]
struct PendingTable {
    /// Live tasks, at most one per connection.
    tasks: HashMap<ConnectionId, Arc<SettingsCallbackTask>>,
    /// Connections whose task was finalized while still connected.
    sealed: HashSet<ConnectionId>,
    /// Recently closed connections and when they closed.
    closed: HashMap<ConnectionId, Instant>,
}

enum Claim {
    Live(Arc<SettingsCallbackTask>),
    Expired(Arc<SettingsCallbackTask>),
    Sealed,
}

/// Collection coordinator for client settings.
///
/// ## Usage
///
/// ```rust,ignore
/// let processor = SettingsCheckProcessor::new(config, backend, remote, players, sink);
///
/// // Packet handler (any thread)
/// processor.submit_fragment(conn, "Steve", &settings, &skin);
///
/// // Connection handler
/// processor.on_disconnect(conn);
///
/// // Server tick
/// processor.on_maintenance_tick();
/// ```
pub struct SettingsCheckProcessor {
    window: Duration,
    backend: Arc<dyn BackendGate>,
    remote: Arc<RemoteSettings>,
    check_data: Arc<dyn CheckStateStore>,
    sink: Arc<dyn SettingsSink>,
    clock: Arc<dyn Clock>,
    pending: Mutex<PendingTable>,
    stats: ProcessorStats,
}

impl SettingsCheckProcessor {
    /// Creates a processor on the real monotonic clock.
    #[must_use]
    pub fn new(
        config: &ProcessorConfig,
        backend: Arc<dyn BackendGate>,
        remote: Arc<RemoteSettings>,
        check_data: Arc<dyn CheckStateStore>,
        sink: Arc<dyn SettingsSink>,
    ) -> Self {
        Self {
            window: config.window(),
            backend,
            remote,
            check_data,
            sink,
            clock: Arc::new(MonotonicClock),
            pending: Mutex::new(PendingTable::default()),
            stats: ProcessorStats::default(),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The aggregation window.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Number of disconnected connections still refusing new tasks.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.pending.lock().closed.len()
    }

    /// Number of tasks waiting for finalize.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().tasks.len()
    }

    /// Returns true if a task is collecting for this connection.
    #[must_use]
    pub fn is_pending(&self, connection_id: ConnectionId) -> bool {
        self.pending.lock().tasks.contains_key(&connection_id)
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Feeds one decoded settings packet into the check.
    ///
    /// Silently does nothing when the backend is down, privacy settings forbid
    /// collection, the player is unknown or already checked, or this
    /// connection's check was already finalized or the connection just closed.
    pub fn submit_fragment(
        &self,
        connection_id: ConnectionId,
        username: &str,
        settings: &ClientSettings,
        skin: &SkinLayers,
    ) {
        if !self.backend.is_ready() {
            self.drop_fragment(connection_id, DropReason::BackendNotReady);
            return;
        }

        let remote = self.remote.snapshot();
        if remote.cache_invalidated() && !remote.collect_player_settings() {
            self.drop_fragment(connection_id, DropReason::PrivacyOptOut);
            return;
        }

        let Some(check_data) = self.check_data.get(username) else {
            self.drop_fragment(connection_id, DropReason::UnknownPlayer);
            return;
        };

        if check_data.is_player_settings_checked() {
            self.drop_fragment(connection_id, DropReason::AlreadyChecked);
            return;
        }

        let now = self.clock.now();
        match self.claim(connection_id, username, check_data, now) {
            Claim::Live(task) => {
                if task.merge(settings, skin) {
                    self.stats.record_accepted();
                } else {
                    // Finalized between claim and merge.
                    self.drop_fragment(connection_id, DropReason::Sealed);
                }
            }
            Claim::Expired(task) => {
                tracing::debug!(
                    "Settings check for {} ({}) past deadline before sweep",
                    username,
                    connection_id
                );
                self.finalize(&task, FinalizeCause::Replaced, now);
                self.drop_fragment(connection_id, DropReason::Sealed);
            }
            Claim::Sealed => self.drop_fragment(connection_id, DropReason::Sealed),
        }
    }

    /// Finalizes the connection's task immediately, if there is one.
    ///
    /// The connection stays closed to new tasks until a sweep one window
    /// later forgets it.
    pub fn on_disconnect(&self, connection_id: ConnectionId) {
        let now = self.clock.now();
        let task = {
            let mut table = self.pending.lock();
            table.sealed.remove(&connection_id);
            table.closed.insert(connection_id, now);
            table.tasks.remove(&connection_id)
        };

        if let Some(task) = task {
            self.finalize(&task, FinalizeCause::Disconnected, now);
        }
    }

    /// Reaps every task past its deadline and forgets connections closed
    /// more than one window ago.
    ///
    /// Returns the number of tasks this sweep finalized.
    pub fn on_maintenance_tick(&self) -> usize {
        let now = self.clock.now();
        let window = self.window;
        let expired = {
            let mut guard = self.pending.lock();
            let PendingTable {
                tasks,
                sealed,
                closed,
            } = &mut *guard;
            closed.retain(|_, closed_at| now.saturating_duration_since(*closed_at) < window);
            let mut expired = Vec::new();
            tasks.retain(|connection_id, task| {
                if task.is_expired(now) {
                    sealed.insert(*connection_id);
                    expired.push(Arc::clone(task));
                    false
                } else {
                    true
                }
            });
            expired
        };

        let reaped = expired
            .iter()
            .filter(|task| self.finalize(task, FinalizeCause::Expired, now))
            .count();

        if reaped > 0 {
            tracing::debug!("Maintenance sweep finalized {} settings checks", reaped);
        }
        reaped
    }

    /// Looks up or creates the task for a connection.
    fn claim(
        &self,
        connection_id: ConnectionId,
        username: &str,
        check_data: Arc<PlayerCheckData>,
        now: Instant,
    ) -> Claim {
        let mut table = self.pending.lock();
        if table.sealed.contains(&connection_id) || table.closed.contains_key(&connection_id) {
            return Claim::Sealed;
        }

        match table.tasks.get(&connection_id).cloned() {
            Some(task) if task.is_expired(now) => {
                table.tasks.remove(&connection_id);
                table.sealed.insert(connection_id);
                Claim::Expired(task)
            }
            Some(task) => Claim::Live(task),
            None => {
                let task = Arc::new(SettingsCallbackTask::start(
                    connection_id,
                    username,
                    check_data,
                    now,
                    self.window,
                ));
                table.tasks.insert(connection_id, Arc::clone(&task));
                self.stats.record_started();
                tracing::debug!(
                    "Settings check started for {} ({}), window {:?}",
                    username,
                    connection_id,
                    self.window
                );
                Claim::Live(task)
            }
        }
    }

    fn finalize(&self, task: &SettingsCallbackTask, cause: FinalizeCause, now: Instant) -> bool {
        let delivered = task.finalize(self.sink.as_ref(), cause, now);
        if delivered {
            self.stats.record_finalized(cause);
        }
        delivered
    }

    fn drop_fragment(&self, connection_id: ConnectionId, reason: DropReason) {
        tracing::trace!("Settings fragment from {} dropped: {:?}", connection_id, reason);
        self.stats.record_drop(reason);
    }
}
