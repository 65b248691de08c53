//! Connection identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one client session.
///
/// Assigned by the host when the connection is accepted. Identifiers are never
/// reused, so a finalized settings check cannot be resurrected by a reconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
