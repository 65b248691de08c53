//! # Replay Scenarios
//!
//! Scripted sequences of fragments, ticks and disconnects, run against a
//! processor on a manual clock. Used to reproduce field reports offline.
//!
//! ```toml
//! window_ms = 1000
//!
//! [remote.privacy]
//! collectPlayerSettings = true
//!
//! [[players]]
//! name = "Steve"
//!
//! [[events]]
//! kind = "fragment"
//! at_ms = 0
//! connection = 1
//! player = "Steve"
//! settings = { locale = "en_US" }
//!
//! [[events]]
//! kind = "tick"
//! at_ms = 1000
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use toml::Table;
use warden_shared::{ClientSettings, ConnectionId, SkinLayers};

use crate::backend::BackendStatus;
use crate::check_state::CheckDataCache;
use crate::clock::ManualClock;
use crate::config::ProcessorConfig;
use crate::error::{read_file, SecurityError, SecurityResult};
use crate::remote::{RemoteSettings, RemoteSnapshot};
use crate::settings::{SettingsCheckProcessor, SettingsRecord, StatsSnapshot};
use crate::sink::CollectingSink;

/// A player known to the check state store when the replay starts.
#[derive(Clone, Debug, Deserialize)]
pub struct ScenarioPlayer {
    /// Username.
    pub name: String,
    /// Whether settings were already checked.
    #[serde(default)]
    pub checked: bool,
}

/// One scripted event. `at_ms` is relative to the start of the replay.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioEvent {
    /// A decoded settings packet.
    Fragment {
        /// Time offset.
        at_ms: u64,
        /// Connection the packet arrived on.
        connection: ConnectionId,
        /// Username of the sender.
        player: String,
        /// Settings fields present in the packet.
        #[serde(default)]
        settings: ClientSettings,
        /// Skin layers present in the packet.
        #[serde(default)]
        skin: SkinLayers,
    },
    /// A maintenance sweep.
    Tick {
        /// Time offset.
        at_ms: u64,
    },
    /// A connection closing.
    Disconnect {
        /// Time offset.
        at_ms: u64,
        /// The closing connection.
        connection: ConnectionId,
    },
    /// A remote configuration push.
    Remote {
        /// Time offset.
        at_ms: u64,
        /// The new snapshot, replacing the old one entirely.
        values: Table,
    },
    /// The backend going up or down.
    Backend {
        /// Time offset.
        at_ms: u64,
        /// New readiness.
        ready: bool,
    },
}

impl ScenarioEvent {
    /// Time offset of this event.
    #[must_use]
    pub const fn at_ms(&self) -> u64 {
        match self {
            Self::Fragment { at_ms, .. }
            | Self::Tick { at_ms }
            | Self::Disconnect { at_ms, .. }
            | Self::Remote { at_ms, .. }
            | Self::Backend { at_ms, .. } => *at_ms,
        }
    }
}

/// A complete replay script.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Window override. Falls back to the processor default.
    pub window_ms: Option<u64>,
    /// Backend readiness at start.
    pub backend_ready: bool,
    /// Initial remote configuration.
    pub remote: Table,
    /// Players tracked at start.
    pub players: Vec<ScenarioPlayer>,
    /// Events, in time order.
    pub events: Vec<ScenarioEvent>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            window_ms: None,
            backend_ready: true,
            remote: Table::new(),
            players: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// What a replay produced.
#[derive(Clone, Debug)]
pub struct ReplayOutcome {
    /// Records delivered to the sink, in delivery order.
    pub records: Vec<SettingsRecord>,
    /// Processor counters at the end of the replay.
    pub stats: StatsSnapshot,
    /// Tasks still collecting when the script ran out.
    pub still_pending: usize,
}

impl Scenario {
    /// Parses and validates a scenario.
    pub fn from_toml_str(source: &str) -> SecurityResult<Self> {
        let scenario: Self = toml::from_str(source)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Loads and validates a scenario file.
    pub fn load(path: impl AsRef<Path>) -> SecurityResult<Self> {
        Self::from_toml_str(&read_file(path.as_ref())?)
    }

    /// Checks that events are in time order.
    pub fn validate(&self) -> SecurityResult<()> {
        if let Some(pair) = self.events.windows(2).find(|w| w[1].at_ms() < w[0].at_ms()) {
            return Err(SecurityError::InvalidConfig(format!(
                "events out of order: {}ms after {}ms",
                pair[1].at_ms(),
                pair[0].at_ms()
            )));
        }
        Ok(())
    }

    /// Runs the script. `window_ms` overrides the scenario's own window.
    pub fn run(&self, window_ms: Option<u64>) -> SecurityResult<ReplayOutcome> {
        self.validate()?;

        let mut config = ProcessorConfig::default();
        if let Some(window_ms) = window_ms.or(self.window_ms) {
            config.window_ms = window_ms;
        }
        config.validate()?;

        let clock = Arc::new(ManualClock::new());
        let backend = Arc::new(BackendStatus::new(self.backend_ready));
        let remote = Arc::new(RemoteSettings::new(RemoteSnapshot::new(self.remote.clone())));
        let players = Arc::new(CheckDataCache::new());
        let sink = Arc::new(CollectingSink::new());

        for player in &self.players {
            players
                .track(&player.name)
                .set_player_settings_checked(player.checked);
        }

        let processor = SettingsCheckProcessor::new(
            &config,
            backend.clone(),
            remote.clone(),
            players,
            sink.clone(),
        )
        .with_clock(clock.clone());

        let mut elapsed_ms = 0;
        for event in &self.events {
            clock.advance(Duration::from_millis(event.at_ms() - elapsed_ms));
            elapsed_ms = event.at_ms();

            match event {
                ScenarioEvent::Fragment {
                    connection,
                    player,
                    settings,
                    skin,
                    ..
                } => processor.submit_fragment(*connection, player, settings, skin),
                ScenarioEvent::Tick { .. } => {
                    processor.on_maintenance_tick();
                }
                ScenarioEvent::Disconnect { connection, .. } => processor.on_disconnect(*connection),
                ScenarioEvent::Remote { values, .. } => {
                    remote.replace(RemoteSnapshot::new(values.clone()));
                }
                ScenarioEvent::Backend { ready, .. } => backend.set_ready(*ready),
            }
        }

        Ok(ReplayOutcome {
            records: sink.take(),
            stats: processor.stats(),
            still_pending: processor.pending_count(),
        })
    }
}
