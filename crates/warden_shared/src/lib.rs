//! # WARDEN Shared
//!
//! Vocabulary shared between the protocol decoder and the settings check.
//!
//! ## CRITICAL RULE
//!
//! This crate carries plain data only. The keys defined here are the contract
//! with the verification backend: renaming one silently drops that field from
//! every record the backend receives.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod fragment;
pub mod id;

pub use constants::{config_keys, settings_keys, skin_keys, DEFAULT_WINDOW_MS};
pub use fragment::{ClientSettings, SkinLayers};
pub use id::ConnectionId;
