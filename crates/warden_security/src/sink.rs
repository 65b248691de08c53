//! # Verification Sink
//!
//! Where finalized settings records go.
//!
//! The settings check guarantees at most one [`SettingsRecord`] per
//! connection. What happens to it afterwards (heuristics, scoring, bans) is
//! the backend's business.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::config::ProcessorConfig;
use crate::settings::SettingsRecord;

/// Receives finalized settings records.
///
/// Called on whichever thread won the finalize race, so implementations must
/// return quickly and must not call back into the processor.
pub trait SettingsSink: Send + Sync {
    /// Takes ownership of a finalized record.
    fn deliver(&self, record: SettingsRecord);
}

/// Hands records to the backend over a bounded channel.
///
/// The player's check state is marked before sending, so later fragments for
/// the same player are gated out even while the record is still queued.
///
/// ```text
/// finalize ──► ChannelSink ──► [bounded channel] ──► backend worker
/// ```
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<SettingsRecord>,
}

impl ChannelSink {
    /// Creates a sink and the receiver the backend worker should drain.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, Receiver<SettingsRecord>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }

    /// Creates a sink sized by `sink_buffer`.
    #[must_use]
    pub fn from_config(config: &ProcessorConfig) -> (Self, Receiver<SettingsRecord>) {
        Self::new(config.sink_buffer)
    }
}

impl SettingsSink for ChannelSink {
    fn deliver(&self, record: SettingsRecord) {
        record.check_data.set_player_settings_checked(true);

        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                tracing::warn!(
                    "Settings channel full, dropping record for {} ({})",
                    record.username,
                    record.connection_id
                );
            }
            Err(TrySendError::Disconnected(record)) => {
                tracing::warn!(
                    "Settings backend gone, dropping record for {} ({})",
                    record.username,
                    record.connection_id
                );
            }
        }
    }
}

/// Keeps every record in memory.
///
/// Also marks check state, mirroring [`ChannelSink`].
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<SettingsRecord>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Takes all received records.
    pub fn take(&self) -> Vec<SettingsRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Clones all received records.
    #[must_use]
    pub fn records(&self) -> Vec<SettingsRecord> {
        self.records.lock().clone()
    }
}

impl SettingsSink for CollectingSink {
    fn deliver(&self, record: SettingsRecord) {
        record.check_data.set_player_settings_checked(true);
        self.records.lock().push(record);
    }
}
