#![forbid(unsafe_code)]

//! Canonical page events.
//!
//! Hosts translate browser events into these values before handing them to a
//! model. Targets are element ids; a target the model does not recognise is
//! simply ignored.
//!
//! # Design Notes
//!
//! - Media timing carries raw `currentTime`/`duration` seconds; the gate
//!   decides what counts as "watched".
//! - Submissions carry an already-serialized [`FormData`] so controllers never
//!   look elements up themselves.

use crate::place::PlaceResult;

/// Canonical page event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The page finished loading (`DOMContentLoaded`).
    DomContentLoaded,

    /// An element was clicked.
    Click {
        /// Id of the clicked element.
        target: String,
    },

    /// A form was submitted. Default navigation is always suppressed.
    Submit {
        /// Id of the submitted form.
        form: String,
        /// Field values at submit time.
        fields: FormData,
    },

    /// The value of an input changed.
    Input {
        /// Id of the input.
        target: String,
        /// Raw value after the change.
        value: String,
    },

    /// An input gained focus.
    Focus {
        /// Id of the input.
        target: String,
    },

    /// An input lost focus.
    Blur {
        /// Id of the input.
        target: String,
    },

    /// A media element reported playback progress (`timeupdate`).
    MediaTimeUpdate {
        /// Id of the media element.
        media: String,
        /// Playback position in seconds.
        current_time: f64,
        /// Total duration in seconds. May be `NaN` before metadata loads.
        duration: f64,
    },

    /// A media element played to its natural end (`ended`).
    MediaEnded {
        /// Id of the media element.
        media: String,
    },

    /// The address autocomplete provider reported a selected place.
    PlaceChanged {
        /// Id of the input the provider is attached to.
        target: String,
        /// The selected place as delivered by the provider.
        place: PlaceResult,
    },

    /// A timer fired in the host.
    Tick,
}

impl Event {
    /// Shorthand for a click on `target`.
    #[must_use]
    pub fn click(target: impl Into<String>) -> Self {
        Self::Click {
            target: target.into(),
        }
    }

    /// Shorthand for a submission of `form`.
    #[must_use]
    pub fn submit(form: impl Into<String>, fields: FormData) -> Self {
        Self::Submit {
            form: form.into(),
            fields,
        }
    }

    /// Shorthand for an input change.
    #[must_use]
    pub fn input(target: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Input {
            target: target.into(),
            value: value.into(),
        }
    }

    /// Shorthand for a `timeupdate` report.
    #[must_use]
    pub fn time_update(media: impl Into<String>, current_time: f64, duration: f64) -> Self {
        Self::MediaTimeUpdate {
            media: media.into(),
            current_time,
            duration,
        }
    }

    /// Shorthand for an `ended` report.
    #[must_use]
    pub fn media_ended(media: impl Into<String>) -> Self {
        Self::MediaEnded {
            media: media.into(),
        }
    }

    /// Short stable name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::Click { .. } => "click",
            Self::Submit { .. } => "submit",
            Self::Input { .. } => "input",
            Self::Focus { .. } => "focus",
            Self::Blur { .. } => "blur",
            Self::MediaTimeUpdate { .. } => "timeupdate",
            Self::MediaEnded { .. } => "ended",
            Self::PlaceChanged { .. } => "place_changed",
            Self::Tick => "tick",
        }
    }
}

/// Value of a single form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text-like control (`input`, `select`, `textarea`).
    Text(String),
    /// Checkbox state.
    Checked(bool),
}

/// Ordered snapshot of a form's controls, keyed by element id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FieldValue)>,
}

impl FormData {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a text control.
    #[must_use]
    pub fn with_text(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(id, FieldValue::Text(value.into()));
        self
    }

    /// Builder: add a checkbox.
    #[must_use]
    pub fn with_checked(mut self, id: impl Into<String>, checked: bool) -> Self {
        self.insert(id, FieldValue::Checked(checked));
        self
    }

    /// Insert or replace a control value.
    pub fn insert(&mut self, id: impl Into<String>, value: FieldValue) {
        let id = id.into();
        match self.fields.iter_mut().find(|(k, _)| *k == id) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((id, value)),
        }
    }

    /// Raw value of a control.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// Text value of a control; empty when absent or not text-like.
    #[must_use]
    pub fn text(&self, id: &str) -> &str {
        match self.get(id) {
            Some(FieldValue::Text(value)) => value,
            _ => "",
        }
    }

    /// Checkbox state; `false` when absent or not a checkbox.
    #[must_use]
    pub fn checked(&self, id: &str) -> bool {
        matches!(self.get(id), Some(FieldValue::Checked(true)))
    }

    /// Number of controls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the snapshot has no controls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate controls in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_data_reads_text_and_checkbox() {
        let data = FormData::new()
            .with_text("first-name", "Ana")
            .with_checked("spanish", true);
        assert_eq!(data.text("first-name"), "Ana");
        assert!(data.checked("spanish"));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn form_data_missing_fields_default() {
        let data = FormData::new();
        assert_eq!(data.text("email"), "");
        assert!(!data.checked("spanish"));
        assert!(data.is_empty());
    }

    #[test]
    fn form_data_type_mismatch_defaults() {
        let data = FormData::new()
            .with_checked("email", true)
            .with_text("spanish", "true");
        assert_eq!(data.text("email"), "");
        assert!(!data.checked("spanish"));
    }

    #[test]
    fn form_data_insert_replaces_in_place() {
        let mut data = FormData::new().with_text("a", "1").with_text("b", "2");
        data.insert("a", FieldValue::Text("3".into()));
        let ids: Vec<_> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(data.text("a"), "3");
    }

    #[test]
    fn event_kind_names_are_dom_names() {
        assert_eq!(Event::click("x").kind(), "click");
        assert_eq!(Event::time_update("v", 1.0, 2.0).kind(), "timeupdate");
        assert_eq!(Event::media_ended("v").kind(), "ended");
        assert_eq!(Event::DomContentLoaded.kind(), "DOMContentLoaded");
    }
}
