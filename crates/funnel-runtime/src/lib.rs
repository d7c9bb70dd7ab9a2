#![forbid(unsafe_code)]

//! Funnel Runtime
//!
//! Ties page events, controllers, and side effects together.
//!
//! # Key Components
//!
//! - [`Program`] - Elm-style runner that drives a [`Model`] from host events
//! - [`Model`] - Trait for page controllers
//! - [`Cmd`] - Side effects: navigation, scrolling, notifications, persistence
//! - [`Subscription`] - Timers, with [`Every`] and [`After`] built in
//! - [`KeyValueStore`] - Durable string store over a [`StorageBackend`]
//! - [`ProgramSimulator`] - Deterministic, virtual-time test harness
//!
//! # How it fits in the system
//! `funnel-core` defines events and the headless document. This crate runs
//! controllers against them. The controllers themselves live in
//! `funnel-app`.

pub mod location;
pub mod program;
pub mod simulator;
pub mod state_persistence;
pub mod subscription;

pub use location::{Location, encode_component};
pub use program::{Cmd, Host, Model, Program, RecordingHost};
pub use simulator::{CmdRecord, ProgramSimulator};
#[cfg(feature = "file-storage")]
pub use state_persistence::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use state_persistence::LocalStorage;
pub use state_persistence::{
    Changes, KeyValueStore, MemoryStorage, StorageBackend, StorageError, StorageResult,
};
pub use subscription::{After, Every, Schedule, StopSignal, SubId, Subscription};
