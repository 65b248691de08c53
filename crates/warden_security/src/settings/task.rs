//! # Settings Callback Task
//!
//! The per-connection accumulator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use warden_shared::{ClientSettings, ConnectionId, SkinLayers};

use crate::check_state::PlayerCheckData;
use crate::sink::SettingsSink;

/// What caused a task to be finalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FinalizeCause {
    /// The aggregation window elapsed and a sweep reaped it.
    Expired,
    /// The player disconnected before the window elapsed.
    Disconnected,
    /// A fragment found the entry already past its deadline.
    Replaced,
}

impl FinalizeCause {
    /// Short lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Disconnected => "disconnected",
            Self::Replaced => "replaced",
        }
    }
}

impl fmt::Display for FinalizeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consolidated settings record, as handed to the sink.
///
/// Missing keys mean the client never sent that field within the window.
#[derive(Clone, Debug)]
pub struct SettingsRecord {
    /// Connection the settings were collected on.
    pub connection_id: ConnectionId,
    /// Player display name.
    pub username: String,
    /// The player's check state.
    pub check_data: Arc<PlayerCheckData>,
    /// Client settings, keyed by [`settings_keys`](warden_shared::settings_keys).
    pub settings: BTreeMap<String, String>,
    /// Skin layers, keyed by [`skin_keys`](warden_shared::skin_keys).
    pub skin_parts: BTreeMap<String, String>,
    /// What triggered delivery.
    pub cause: FinalizeCause,
    /// Time between the first fragment and finalize.
    pub collected_for: Duration,
}

#[derive(Debug, Default)]
struct Collected {
    settings: BTreeMap<String, String>,
    skin_parts: BTreeMap<String, String>,
}

/// Accumulates settings for one connection until finalized.
///
/// ## Thread Safety
///
/// `merge` and `finalize` may be called from any thread. The completion flag
/// is checked under the collection lock by `merge` and flipped with a CAS by
/// `finalize`, so every merge lands either wholly before the snapshot or not
/// at all.
#[derive(Debug)]
pub struct SettingsCallbackTask {
    connection_id: ConnectionId,
    username: String,
    check_data: Arc<PlayerCheckData>,
    started_at: Instant,
    deadline: Instant,
    collected: Mutex<Collected>,
    completed: AtomicBool,
}

impl SettingsCallbackTask {
    /// Starts a task whose window opens at `now`.
    #[must_use]
    pub fn start(
        connection_id: ConnectionId,
        username: impl Into<String>,
        check_data: Arc<PlayerCheckData>,
        now: Instant,
        window: Duration,
    ) -> Self {
        Self {
            connection_id,
            username: username.into(),
            check_data,
            started_at: now,
            deadline: now + window,
            collected: Mutex::new(Collected::default()),
            completed: AtomicBool::new(false),
        }
    }

    /// Connection this task collects for.
    #[inline]
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Player display name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Instant after which the task is due for finalize.
    #[inline]
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns true once the window has elapsed.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Returns true once the task has been finalized.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Merges one fragment. Later values win for the same key.
    ///
    /// Returns false, leaving everything untouched, if the task was already
    /// finalized.
    pub fn merge(&self, settings: &ClientSettings, skin: &SkinLayers) -> bool {
        let mut collected = self.collected.lock();
        if self.is_completed() {
            return false;
        }

        for (key, value) in settings.fields() {
            collected.settings.insert(key.to_owned(), value.to_owned());
        }
        for (key, value) in skin.fields() {
            collected.skin_parts.insert(key.to_owned(), value.to_owned());
        }
        true
    }

    /// Current settings, for inspection.
    #[must_use]
    pub fn settings(&self) -> BTreeMap<String, String> {
        self.collected.lock().settings.clone()
    }

    /// Current skin layers, for inspection.
    #[must_use]
    pub fn skin_parts(&self) -> BTreeMap<String, String> {
        self.collected.lock().skin_parts.clone()
    }

    /// Hands the collected settings to `sink`, exactly once.
    ///
    /// Returns true for the caller that actually delivered. Every other call,
    /// concurrent or later, returns false and does nothing.
    pub fn finalize(&self, sink: &dyn SettingsSink, cause: FinalizeCause, now: Instant) -> bool {
        if self
            .completed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let collected = std::mem::take(&mut *self.collected.lock());
        let record = SettingsRecord {
            connection_id: self.connection_id,
            username: self.username.clone(),
            check_data: Arc::clone(&self.check_data),
            settings: collected.settings,
            skin_parts: collected.skin_parts,
            cause,
            collected_for: now.saturating_duration_since(self.started_at),
        };

        tracing::debug!(
            "Settings check for {} ({}) finalized: {}, {} settings, {} skin parts",
            record.username,
            record.connection_id,
            cause,
            record.settings.len(),
            record.skin_parts.len()
        );

        sink.deliver(record);
        true
    }
}
