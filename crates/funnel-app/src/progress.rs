#![forbid(unsafe_code)]

//! Step progress indicator.
//!
//! Derived entirely from the current position; nothing here is persisted.
//! Positions are 1-based, and the completed funnel counts as
//! `total + 1` so every step reads as completed.

use funnel_core::document::Document;

/// Class carried by each step marker.
pub const STEP_CLASS: &str = "step";
/// Class carried by the connector between two markers.
pub const CONNECTOR_CLASS: &str = "step-connector";
/// Background of a traversed connector.
pub const CONNECTOR_TRAVERSED: &str = "var(--primary-blue)";
/// Background of a connector not yet traversed.
pub const CONNECTOR_PENDING: &str = "var(--border-color)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

impl StepStatus {
    /// Status of step `index` while `position` is current.
    #[must_use]
    pub fn of(index: u32, position: u32) -> Self {
        use std::cmp::Ordering;
        match index.cmp(&position) {
            Ordering::Less => Self::Completed,
            Ordering::Equal => Self::Active,
            Ordering::Greater => Self::Pending,
        }
    }

    /// Class added to the marker, if any.
    #[must_use]
    pub fn class(self) -> Option<&'static str> {
        match self {
            Self::Pending => None,
            Self::Active => Some("active"),
            Self::Completed => Some("completed"),
        }
    }
}

/// Snapshot of every marker and connector for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressIndicator {
    position: u32,
    steps: Vec<StepStatus>,
    connectors: Vec<bool>,
}

impl ProgressIndicator {
    /// Statuses for steps `1..=total` with `position` current.
    ///
    /// Connector `i` joins step `i` and `i + 1` and is traversed iff
    /// `i <= position - 1`.
    #[must_use]
    pub fn compute(position: u32, total: u32) -> Self {
        let steps = (1..=total).map(|i| StepStatus::of(i, position)).collect();
        let connectors = (1..total)
            .map(|i| i <= position.saturating_sub(1))
            .collect();
        Self {
            position,
            steps,
            connectors,
        }
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn steps(&self) -> &[StepStatus] {
        &self.steps
    }

    /// Status of 1-based step `index`.
    pub fn step(&self, index: u32) -> Option<StepStatus> {
        let slot = usize::try_from(index.checked_sub(1)?).ok()?;
        self.steps.get(slot).copied()
    }

    pub fn connectors(&self) -> &[bool] {
        &self.connectors
    }

    /// Write marker classes and connector backgrounds.
    ///
    /// Markers and connectors are matched by document order. Extra markers
    /// beyond `total` are treated with the same rule; missing ones are
    /// skipped.
    pub fn render(&self, doc: &mut Document) {
        let position = self.position;
        doc.update_class(STEP_CLASS, |slot, el| {
            let index = u32::try_from(slot).map_or(u32::MAX, |s| s.saturating_add(1));
            el.remove_class("completed");
            el.remove_class("active");
            if let Some(class) = StepStatus::of(index, position).class() {
                el.add_class(class);
            }
        });
        doc.update_class(CONNECTOR_CLASS, |slot, el| {
            let traversed = u32::try_from(slot).is_ok_and(|s| s < position.saturating_sub(1));
            el.set_background(if traversed {
                CONNECTOR_TRAVERSED
            } else {
                CONNECTOR_PENDING
            });
        });
    }
}
