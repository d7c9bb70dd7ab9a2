#![forbid(unsafe_code)]

//! Core: canonical events, the headless document surface, and formatting helpers.
//!
//! Nothing in this crate touches a real browser. Hosts translate DOM events
//! into [`event::Event`] values and mirror [`document::Document`] changes back
//! onto the page.

pub mod document;
pub mod event;
pub mod format;
pub mod logging;
pub mod place;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
