#![forbid(unsafe_code)]

//! Funnel configuration.
//!
//! Defaults reproduce the shipped page behaviour. A host may override them
//! through `FUNNEL_*` environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FUNNEL_TOTAL_SCREENS` | `total_screens` |
//! | `FUNNEL_GATE_THRESHOLD` | `gate_threshold` (fraction, `0.0..=1.0`) |
//! | `FUNNEL_CAPTION_INTERVAL_MS` | `caption_interval` |
//! | `FUNNEL_AVATAR_DELAY_MS` | `avatar_reveal_delay` |
//! | `FUNNEL_DEMO_UNLOCK_MS` | `demo_unlock_after` |
//! | `FUNNEL_PLACES` | `places_available` (`1`/`true`/`yes`/`on`) |
//! | `FUNNEL_CLEAR_ON_RESULTS` | `clear_on_results` |
//! | `FUNNEL_STATE_FILE` | `state_file` |
//!
//! Malformed values are ignored and the default is kept.

use std::path::PathBuf;
use std::time::Duration;

use funnel_runtime::state_persistence::KeyValueStore;

use crate::funnel::INTRO_VIDEO_ID;

/// Tunable funnel behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelConfig {
    /// Number of funnel screens.
    pub total_screens: u32,
    /// Playback fraction that unlocks a media-gated screen.
    pub gate_threshold: f64,
    /// Screen whose next button waits for the primary media.
    pub primary_screen: u32,
    /// Element id of the primary media.
    pub primary_media: String,
    /// Period of the assistant caption rotation.
    pub caption_interval: Duration,
    /// Delay before the floating assistant appears.
    pub avatar_reveal_delay: Duration,
    /// Enable every gate after this delay. `None` keeps media gating.
    pub demo_unlock_after: Option<Duration>,
    /// Whether the address autocomplete provider is loaded.
    pub places_available: bool,
    /// Remove the application record once the results page is requested.
    pub clear_on_results: bool,
    /// Persist the store to this JSON file instead of memory.
    pub state_file: Option<PathBuf>,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            total_screens: 5,
            gate_threshold: 0.8,
            primary_screen: 1,
            primary_media: INTRO_VIDEO_ID.into(),
            caption_interval: Duration::from_secs(3),
            avatar_reveal_delay: Duration::from_secs(2),
            demo_unlock_after: None,
            places_available: false,
            clear_on_results: false,
            state_file: None,
        }
    }
}

impl FunnelConfig {
    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults with overrides read through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(n) = parsed::<u32>(&lookup, "FUNNEL_TOTAL_SCREENS") {
            if n >= 1 {
                config.total_screens = n;
            } else {
                tracing::debug!(value = n, "FUNNEL_TOTAL_SCREENS must be positive");
            }
        }
        if let Some(t) = parsed::<f64>(&lookup, "FUNNEL_GATE_THRESHOLD") {
            if (0.0..=1.0).contains(&t) {
                config.gate_threshold = t;
            } else {
                tracing::debug!(value = t, "FUNNEL_GATE_THRESHOLD out of range");
            }
        }
        if let Some(ms) = parsed::<u64>(&lookup, "FUNNEL_CAPTION_INTERVAL_MS")
            && ms > 0
        {
            config.caption_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64>(&lookup, "FUNNEL_AVATAR_DELAY_MS") {
            config.avatar_reveal_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64>(&lookup, "FUNNEL_DEMO_UNLOCK_MS") {
            config.demo_unlock_after = Some(Duration::from_millis(ms));
        }
        if let Some(on) = flag(&lookup, "FUNNEL_PLACES") {
            config.places_available = on;
        }
        if let Some(on) = flag(&lookup, "FUNNEL_CLEAR_ON_RESULTS") {
            config.clear_on_results = on;
        }
        if let Some(path) = lookup("FUNNEL_STATE_FILE")
            && !path.trim().is_empty()
        {
            config.state_file = Some(PathBuf::from(path));
        }

        config
    }

    /// Open the store this configuration asks for and load it.
    ///
    /// A load failure leaves the store empty; the funnel still works, it
    /// just starts without prior answers.
    pub fn open_store(&self) -> KeyValueStore {
        let store = match &self.state_file {
            #[cfg(feature = "file-storage")]
            Some(path) => KeyValueStore::with_file(path),
            #[cfg(not(feature = "file-storage"))]
            Some(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "file storage not compiled in, using memory store"
                );
                KeyValueStore::in_memory()
            }
            None => KeyValueStore::in_memory(),
        };
        if let Err(err) = store.load() {
            tracing::warn!(error = %err, backend = store.backend_name(), "store load failed");
        }
        store
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(var = name, value = %raw, "ignoring malformed override");
            None
        }
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let raw = lookup(name)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::debug!(var = name, value = %raw, "ignoring malformed flag");
            None
        }
    }
}
