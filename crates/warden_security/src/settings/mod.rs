//! # Client Settings Check
//!
//! Collects settings fragments per connection and finalizes them once.
//!
//! ## Lifecycle
//!
//! ```text
//!  first fragment            more fragments           deadline / disconnect
//!        │                         │                           │
//!        ▼                         ▼                           ▼
//!   ┌─────────┐   merge      ┌─────────┐   finalize (CAS)  ┌──────────┐
//!   │ started │ ───────────► │ pending │ ────────────────► │ complete │ ──► sink
//!   └─────────┘              └─────────┘                   └──────────┘
//! ```
//!
//! The deadline is fixed when the first fragment arrives. Later fragments do
//! not extend it, so a slow drip cannot postpone verification.
//!
//! ## Racing finalizers
//!
//! The maintenance sweep, a disconnect and a late fragment hitting an expired
//! entry can all try to finalize the same task. The table only decides who
//! removes the entry; the task's completion flag decides who delivers.

mod processor;
mod stats;
mod task;

pub use processor::SettingsCheckProcessor;
pub use stats::{DropReason, ProcessorStats, StatsSnapshot};
pub use task::{FinalizeCause, SettingsCallbackTask, SettingsRecord};
