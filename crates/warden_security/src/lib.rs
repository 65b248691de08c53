//! # WARDEN Security - The Settings Check
//!
//! Windowed collection of client settings for server-side cheat detection.
//!
//! ## The Problem
//!
//! Clients report their settings (locale, view distance, chat mode, skin
//! layers) across several packets. The backend wants one record per session,
//! and it wants it exactly once.
//!
//! ## Architecture
//!
//! ```text
//! DECODER                 SETTINGS CHECK                      BACKEND
//!    │                          │                                 │
//!    │── fragment ────────────►│ gates (ready? privacy? checked?)│
//!    │── fragment ────────────►│      │                          │
//!    │                          │      ▼                          │
//!    │                          │ ┌──────────────┐                │
//!    │                          │ │ pending table│ conn → task    │
//!    │                          │ └──────┬───────┘                │
//!    │                          │        │ expiry / disconnect    │
//!    │                          │        ▼                        │
//!    │                          │   finalize (once) ─────────────►│ sink
//! ```
//!
//! The host drives two hooks: `on_disconnect` from its connection handler and
//! `on_maintenance_tick` from its tick loop. Nothing here spawns threads or
//! sleeps.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod check_state;
pub mod clock;
pub mod config;
pub mod error;
pub mod remote;
pub mod scenario;
pub mod settings;
pub mod sink;

pub use backend::{BackendGate, BackendStatus};
pub use check_state::{CheckDataCache, CheckStateStore, PlayerCheckData};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::ProcessorConfig;
pub use error::{SecurityError, SecurityResult};
pub use remote::{RemoteSettings, RemoteSnapshot};
pub use scenario::{ReplayOutcome, Scenario, ScenarioEvent};
pub use settings::{
    DropReason, FinalizeCause, ProcessorStats, SettingsCallbackTask, SettingsCheckProcessor, SettingsRecord,
    StatsSnapshot,
};
pub use sink::{ChannelSink, CollectingSink, SettingsSink};
