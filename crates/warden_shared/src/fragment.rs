//! # Settings Fragments
//!
//! One client packet's worth of settings data.
//!
//! Values are opaque tokens: the decoder hands over whatever the client sent
//! and the verification backend interprets it. A `None` field means the packet
//! did not carry it, and it is never forwarded as a null marker.

use serde::{Deserialize, Serialize};

use crate::constants::{settings_keys, skin_keys};

/// Client settings carried by a single fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientSettings {
    /// Client locale.
    pub locale: Option<String>,
    /// Render distance.
    pub view_distance: Option<String>,
    /// Chat colors flag.
    pub colors: Option<String>,
    /// Main hand.
    pub main_hand: Option<String>,
    /// Chat mode.
    pub chat_mode: Option<String>,
    /// Server listing flag (optional even on a complete packet).
    pub client_listing_allowed: Option<String>,
}

impl ClientSettings {
    /// Returns the fields present in this fragment, keyed by backend name.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (settings_keys::LOCALE, &self.locale),
            (settings_keys::VIEW_DISTANCE, &self.view_distance),
            (settings_keys::COLORS, &self.colors),
            (settings_keys::MAIN_HAND, &self.main_hand),
            (settings_keys::CHAT_MODE, &self.chat_mode),
            (settings_keys::CLIENT_LISTING_ALLOWED, &self.client_listing_allowed),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Sets the locale.
    #[must_use]
    pub fn locale(mut self, value: impl Into<String>) -> Self {
        self.locale = Some(value.into());
        self
    }

    /// Sets the view distance.
    #[must_use]
    pub fn view_distance(mut self, value: impl Into<String>) -> Self {
        self.view_distance = Some(value.into());
        self
    }

    /// Sets the chat colors flag.
    #[must_use]
    pub fn colors(mut self, value: impl Into<String>) -> Self {
        self.colors = Some(value.into());
        self
    }

    /// Sets the main hand.
    #[must_use]
    pub fn main_hand(mut self, value: impl Into<String>) -> Self {
        self.main_hand = Some(value.into());
        self
    }

    /// Sets the chat mode.
    #[must_use]
    pub fn chat_mode(mut self, value: impl Into<String>) -> Self {
        self.chat_mode = Some(value.into());
        self
    }

    /// Sets the server listing flag.
    #[must_use]
    pub fn client_listing_allowed(mut self, value: impl Into<String>) -> Self {
        self.client_listing_allowed = Some(value.into());
        self
    }
}

/// Skin layer visibility flags carried by a single fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkinLayers {
    /// Hat layer.
    pub hat: Option<String>,
    /// Cape.
    pub cape: Option<String>,
    /// Jacket layer.
    pub jacket: Option<String>,
    /// Left sleeve layer.
    pub left_sleeve: Option<String>,
    /// Right sleeve layer.
    pub right_sleeve: Option<String>,
    /// Left pants layer.
    pub left_pants: Option<String>,
    /// Right pants layer.
    pub right_pants: Option<String>,
}

impl SkinLayers {
    /// Returns the layers present in this fragment, keyed by backend name.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (skin_keys::HAT, &self.hat),
            (skin_keys::CAPE, &self.cape),
            (skin_keys::JACKET, &self.jacket),
            (skin_keys::LEFT_SLEEVE, &self.left_sleeve),
            (skin_keys::RIGHT_SLEEVE, &self.right_sleeve),
            (skin_keys::LEFT_PANTS, &self.left_pants),
            (skin_keys::RIGHT_PANTS, &self.right_pants),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    /// Returns true if no layer is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Sets every layer to the same value.
    ///
    /// Clients send all seven flags in one bitmask, so a decoded packet
    /// usually fills them together.
    #[must_use]
    pub fn all(value: &str) -> Self {
        Self {
            hat: Some(value.to_owned()),
            cape: Some(value.to_owned()),
            jacket: Some(value.to_owned()),
            left_sleeve: Some(value.to_owned()),
            right_sleeve: Some(value.to_owned()),
            left_pants: Some(value.to_owned()),
            right_pants: Some(value.to_owned()),
        }
    }
}
