//! # Player Check State
//!
//! Per-player record of which checks already ran this session.
//!
//! The settings check only reads the flag. The verification sink sets it once
//! a record has been handed over.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Check state for one player session.
#[derive(Debug)]
pub struct PlayerCheckData {
    username: String,
    player_settings_checked: AtomicBool,
}

impl PlayerCheckData {
    /// Creates unchecked state for a player.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            player_settings_checked: AtomicBool::new(false),
        }
    }

    /// Player name this state belongs to.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns true if settings were already verified this session.
    #[inline]
    #[must_use]
    pub fn is_player_settings_checked(&self) -> bool {
        self.player_settings_checked.load(Ordering::Acquire)
    }

    /// Marks settings as verified (or not).
    pub fn set_player_settings_checked(&self, checked: bool) {
        self.player_settings_checked.store(checked, Ordering::Release);
    }
}

/// Lookup of check state by username.
pub trait CheckStateStore: Send + Sync {
    /// Returns the player's state, or `None` if the player is not tracked.
    fn get(&self, username: &str) -> Option<Arc<PlayerCheckData>>;
}

/// In-memory check state store.
///
/// The host calls [`track`](Self::track) on login and
/// [`forget`](Self::forget) on logout.
#[derive(Debug, Default)]
pub struct CheckDataCache {
    players: RwLock<HashMap<String, Arc<PlayerCheckData>>>,
}

impl CheckDataCache {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a player, returning their state.
    ///
    /// An already tracked player keeps their existing state.
    pub fn track(&self, username: &str) -> Arc<PlayerCheckData> {
        let mut players = self.players.write();
        Arc::clone(
            players
                .entry(username.to_owned())
                .or_insert_with(|| Arc::new(PlayerCheckData::new(username))),
        )
    }

    /// Stops tracking a player.
    pub fn forget(&self, username: &str) -> Option<Arc<PlayerCheckData>> {
        self.players.write().remove(username)
    }

    /// Number of tracked players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    /// Returns true if no player is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }
}

impl CheckStateStore for CheckDataCache {
    fn get(&self, username: &str) -> Option<Arc<PlayerCheckData>> {
        self.players.read().get(username).cloned()
    }
}
