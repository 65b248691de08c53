//! # Settings Check Constants
//!
//! Field names as the verification backend expects them.
//!
//! **CRITICAL:** These strings are part of the backend contract.
//! Changes require a coordinated backend release.

// =============================================================================
// AGGREGATION WINDOW
// =============================================================================

/// Collection window in milliseconds, measured from the first fragment.
pub const DEFAULT_WINDOW_MS: u64 = 1_000;

// =============================================================================
// CLIENT SETTINGS
// =============================================================================

/// Keys of the client settings map.
pub mod settings_keys {
    /// Client locale, e.g. `en_US`.
    pub const LOCALE: &str = "locale";
    /// Render distance in chunks.
    pub const VIEW_DISTANCE: &str = "viewDistance";
    /// Whether chat colors are enabled.
    pub const COLORS: &str = "colors";
    /// Main hand (left/right).
    pub const MAIN_HAND: &str = "mainHand";
    /// Chat visibility mode.
    pub const CHAT_MODE: &str = "chatMode";
    /// Whether the client allows server listing. Older clients never send it.
    pub const CLIENT_LISTING_ALLOWED: &str = "clientListingAllowed";
}

// =============================================================================
// SKIN LAYERS
// =============================================================================

/// Keys of the skin layer map.
pub mod skin_keys {
    /// Hat layer.
    pub const HAT: &str = "hat";
    /// Cape.
    pub const CAPE: &str = "cape";
    /// Jacket layer.
    pub const JACKET: &str = "jacket";
    /// Left sleeve layer.
    pub const LEFT_SLEEVE: &str = "leftSleeve";
    /// Right sleeve layer.
    pub const RIGHT_SLEEVE: &str = "rightSleeve";
    /// Left pants layer.
    pub const LEFT_PANTS: &str = "leftPants";
    /// Right pants layer.
    pub const RIGHT_PANTS: &str = "rightPants";
}

// =============================================================================
// REMOTE CONFIGURATION
// =============================================================================

/// Dotted keys read from the remote configuration snapshot.
pub mod config_keys {
    /// Privacy toggle. Defaults to `true`.
    pub const COLLECT_PLAYER_SETTINGS: &str = "privacy.collectPlayerSettings";
    /// When set, the privacy toggle is honored strictly. Defaults to `false`.
    pub const INVALIDATE_CACHE: &str = "cache.invalidate";
}
