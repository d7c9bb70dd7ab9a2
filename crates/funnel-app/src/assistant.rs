#![forbid(unsafe_code)]

//! Floating assistant overlay.
//!
//! A small video bubble that appears a moment after load, plays unmuted when
//! its overlay is clicked, and can be dismissed. A caption under it cycles
//! through [`CAPTIONS`] on a timer. None of this affects funnel gating.

use funnel_core::document::{Document, ElementFlags};

pub const AVATAR_ID: &str = "floating-avatar";
pub const OVERLAY_ID: &str = "avatar-overlay";
pub const VIDEO_ID: &str = "avatar-video";
pub const CLOSE_ID: &str = "avatar-close";
pub const CAPTION_ID: &str = "avatar-caption";

/// Caption lines, shown in order and wrapping around.
pub const CAPTIONS: [&str; 5] = [
    "which includes your total debt that we can assist",
    "with your monthly minimum payment",
    "by not being in debt, not to mention all the stress",
    "to make sure you're a hundred percent clear on every aspect",
    "and we'll use that money to negotiate with your creditors",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantOverlay {
    revealed: bool,
    playing: bool,
    muted: bool,
    dismissed: bool,
    caption: Option<&'static str>,
    next_caption: usize,
    rotating: bool,
    has_caption: bool,
}

impl Default for AssistantOverlay {
    fn default() -> Self {
        Self {
            revealed: false,
            playing: false,
            muted: true,
            dismissed: false,
            caption: None,
            next_caption: 0,
            rotating: true,
            has_caption: true,
        }
    }
}

impl AssistantOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the bubble. Has no effect once dismissed.
    pub fn reveal(&mut self) {
        if !self.dismissed {
            self.revealed = true;
        }
    }

    /// Hide the overlay and play the video with sound.
    pub fn play(&mut self) {
        self.playing = true;
        self.muted = false;
    }

    /// Hide the bubble for the rest of the page view.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    /// Record whether the page has a caption element. Without one,
    /// rotation leaves the caption index where it is.
    pub fn set_caption_present(&mut self, present: bool) {
        self.has_caption = present;
    }

    /// Advance to the next caption. Returns the caption now shown, or
    /// `None` when the page has no caption element.
    pub fn rotate(&mut self) -> Option<&'static str> {
        if !self.has_caption {
            return None;
        }
        let caption = CAPTIONS[self.next_caption];
        self.caption = Some(caption);
        self.next_caption = (self.next_caption + 1) % CAPTIONS.len();
        Some(caption)
    }

    /// Stop caption rotation.
    pub fn stop_captions(&mut self) {
        self.rotating = false;
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_visible(&self) -> bool {
        self.revealed && !self.dismissed
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn caption(&self) -> Option<&'static str> {
        self.caption
    }

    pub fn render(&self, doc: &mut Document) {
        let visible = self.is_visible();
        doc.update(AVATAR_ID, |e| e.set_flag(ElementFlags::HIDDEN, !visible));
        doc.update(OVERLAY_ID, |e| e.set_class("hidden", self.playing));
        doc.update(VIDEO_ID, |e| {
            e.set_flag(ElementFlags::PLAYING, self.playing);
            e.set_flag(ElementFlags::MUTED, self.muted);
        });
        if let Some(caption) = self.caption {
            doc.update(CAPTION_ID, |e| e.set_text(caption));
        }
    }
}
