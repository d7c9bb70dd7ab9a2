#![forbid(unsafe_code)]

//! Enrollment funnel public facade crate.
//!
//! Re-exports the controllers, the runtime that drives them, and the
//! headless page model, plus a prelude for hosts and tests.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use funnel_core::document::{Document, Element, ElementFlags, ElementKind};
pub use funnel_core::event::{Event, FieldValue, FormData};
pub use funnel_core::format::{format_currency, format_percent, format_phone_input};
pub use funnel_core::place::{AddressComponent, PlaceResult};

// --- Runtime re-exports ----------------------------------------------------

pub use funnel_runtime::{
    Cmd, Host, KeyValueStore, Location, MemoryStorage, Model, Program, ProgramSimulator,
    RecordingHost, StorageBackend, StorageError,
};
#[cfg(feature = "file-storage")]
pub use funnel_runtime::FileStorage;

// --- Controller re-exports -------------------------------------------------

pub use funnel_app::{
    ApplicationRecord, ApplyForm, ApplyMsg, EnrollmentFunnel, FunnelConfig, FunnelMsg, Screen,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for funnel hosts.
#[derive(Debug)]
pub enum Error {
    /// The durable store could not be read or written.
    Storage(StorageError),
    /// Host-side I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for funnel APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Persist any pending answers in `store`.
///
/// Hosts call this when a page unloads; controllers already persist before
/// every navigation.
pub fn flush_store(store: &KeyValueStore) -> Result<bool> {
    Ok(store.flush()?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ApplyForm, Cmd, Document, EnrollmentFunnel, Error, Event, FunnelConfig, KeyValueStore,
        Model, Program, ProgramSimulator, Result,
    };

    pub use crate::{app, core, runtime};
}

pub use funnel_app as app;
pub use funnel_core as core;
pub use funnel_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn storage_errors_convert() {
        let err: Error = StorageError::Unavailable("private browsing".into()).into();
        assert_eq!(err.to_string(), "storage unavailable: private browsing");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn flush_reports_writes() {
        let origin = Arc::new(MemoryStorage::new());
        let store = KeyValueStore::new(Box::new(origin.clone()));
        store.set("debtAmount", "15000");
        assert!(flush_store(&store).unwrap());
        assert!(!flush_store(&store).unwrap());
        assert_eq!(
            origin.load_all().unwrap().get("debtAmount").map(String::as_str),
            Some("15000")
        );
    }

    #[test]
    fn prelude_drives_a_page() {
        let store = KeyValueStore::in_memory().shared();
        let mut sim = ProgramSimulator::new(ApplyForm::new(store, FunnelConfig::default()))
            .with_document(app::pages::landing_document());
        sim.init();
        sim.fill("debt-amount", "9000");
        sim.submit_form("step1-form");
        assert_eq!(
            sim.last_navigation().map(ToString::to_string).as_deref(),
            Some("apply-step1.html")
        );
    }
}
