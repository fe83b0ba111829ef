//! # Varhub Architecture
//!
//! Varhub is a **UI-agnostic view-synchronization core** for browsing and editing
//! variable groups (key/value sets, some values secret) and secure files. It is a
//! library that happens to have a terminal client, not the other way round.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Rendering collaborator (the `varhub` CLI, or any host UI)  │
//! │  - Displays rows in the order given, reports events back    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  View Session (session.rs)                                  │
//! │  - Owns store, filter, config and the three adapters        │
//! │  - Dispatches events, sequences recomputation, notifies     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  View Adapters (adapters/)                                  │
//! │  - Table, Tree, Matrix projections with their own ordering  │
//! │  - Derivation Pipeline: sort, then filter                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record Store + Status Tracker (store/, status.rs)          │
//! │  - Single source of truth, derived statuses, soft delete    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Data enters through a [`source::LibrarySource`] (the only async seam) and leaves as
//! plain row view models. Nothing in this crate writes to a terminal.
//!
//! ## Threading
//!
//! Everything is single-threaded and synchronous apart from the fetch. Mutations fully
//! apply before any subscriber is called, and subscribers get events by reference, so
//! they cannot re-enter the session.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber; that is the
//! host's call.

pub mod adapters;
pub mod columns;
pub mod config;
pub mod error;
pub mod filter;
pub mod interaction;
pub mod model;
pub mod observable;
pub mod pipeline;
pub mod session;
pub mod source;
pub mod status;
pub mod store;

pub use error::{Result, VarhubError};
pub use session::{ViewKind, ViewSession};
