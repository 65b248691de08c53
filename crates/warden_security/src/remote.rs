//! # Remote Settings
//!
//! Hot-swappable configuration pushed by the verification backend.
//!
//! ## Design
//!
//! ```text
//! backend push ──► replace(snapshot) ──► RwLock<Arc<RemoteSnapshot>>
//!                                              │
//!                      submit_fragment ◄── snapshot() (fresh every call)
//! ```
//!
//! Readers clone the `Arc` and release the lock immediately, so a push never
//! waits on a fragment and a fragment never sees a half-applied push.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use toml::{Table, Value};
use warden_shared::config_keys;

use crate::error::{read_file, SecurityResult};

/// Immutable view of the remote configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteSnapshot {
    values: Table,
}

impl RemoteSnapshot {
    /// Wraps an already parsed table.
    #[must_use]
    pub fn new(values: Table) -> Self {
        Self { values }
    }

    /// Parses a snapshot from TOML.
    pub fn from_toml_str(source: &str) -> SecurityResult<Self> {
        Ok(Self::new(source.parse::<Table>()?))
    }

    /// Returns a copy with a boolean set at a dotted key.
    ///
    /// Intermediate tables are created as needed. A non-table value in the
    /// way is replaced.
    #[must_use]
    pub fn with_bool(mut self, key: &str, value: bool) -> Self {
        let mut parts = key.split('.').peekable();
        let mut table = &mut self.values;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                table.insert(part.to_owned(), Value::Boolean(value));
                break;
            }
            let slot = table
                .entry(part.to_owned())
                .or_insert_with(|| Value::Table(Table::new()));
            if !slot.is_table() {
                *slot = Value::Table(Table::new());
            }
            let Some(inner) = slot.as_table_mut() else {
                break;
            };
            table = inner;
        }
        self
    }

    /// Looks up a dotted key such as `privacy.collectPlayerSettings`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        parts.try_fold(self.values.get(first)?, |value, part| {
            value.as_table()?.get(part)
        })
    }

    /// Reads a boolean, falling back when missing or mistyped.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Whether the privacy policy allows collecting player settings.
    #[must_use]
    pub fn collect_player_settings(&self) -> bool {
        self.get_bool(config_keys::COLLECT_PLAYER_SETTINGS, true)
    }

    /// Whether the backend asked for strict enforcement of cached toggles.
    #[must_use]
    pub fn cache_invalidated(&self) -> bool {
        self.get_bool(config_keys::INVALIDATE_CACHE, false)
    }
}

/// Shared handle to the current remote snapshot.
#[derive(Debug, Default)]
pub struct RemoteSettings {
    current: RwLock<Arc<RemoteSnapshot>>,
}

impl RemoteSettings {
    /// Creates a handle holding the given snapshot.
    #[must_use]
    pub fn new(snapshot: RemoteSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Loads the initial snapshot from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SecurityResult<Self> {
        let source = read_file(path.as_ref())?;
        Ok(Self::new(RemoteSnapshot::from_toml_str(&source)?))
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RemoteSnapshot> {
        Arc::clone(&*self.current.read())
    }

    /// Swaps in a new snapshot, returning the previous one.
    pub fn replace(&self, snapshot: RemoteSnapshot) -> Arc<RemoteSnapshot> {
        std::mem::replace(&mut *self.current.write(), Arc::new(snapshot))
    }
}
