#![forbid(unsafe_code)]

//! The multi-screen enrollment funnel.
//!
//! Screens advance strictly forward, one at a time. The primary screen's
//! next button stays disabled until its intro video is mostly watched or
//! ends. Advancing past the last screen completes the funnel and notifies
//! the user once.
//!
//! # Element ids
//!
//! | Id | Role |
//! |----|------|
//! | `screen-N` (class `screen`) | Screen container, `active` when shown |
//! | `next-btn-N` | Next button of screen N |
//! | `play-btn`, `video-overlay` | Start the intro video |
//! | `intro-video` | Primary gating media |
//! | `.step`, `.step-connector` | Progress indicator |
//! | `floating-avatar` and friends | See [`crate::assistant`] |

use std::collections::BTreeMap;

use funnel_core::document::{Document, ElementFlags};
use funnel_core::event::Event;
use funnel_runtime::program::{Cmd, Model};
use funnel_runtime::subscription::{After, Every, SubId, Subscription};

use crate::assistant::{self, AssistantOverlay};
use crate::config::FunnelConfig;
use crate::gate::{GateRule, ScreenGate};
use crate::progress::ProgressIndicator;

pub const SCREEN_CLASS: &str = "screen";
pub const NEXT_BUTTON_PREFIX: &str = "next-btn-";
pub const PLAY_BUTTON_ID: &str = "play-btn";
pub const VIDEO_OVERLAY_ID: &str = "video-overlay";
/// Default gating media on the first screen.
pub const INTRO_VIDEO_ID: &str = "intro-video";

pub const COMPLETION_LOG: &str = "Funnel completed!";
pub const COMPLETION_NOTICE: &str = "Congratulations! You have completed the enrollment process.";

const REVEAL_SUB: SubId = 0x4641_5652; // "FAVR"
const CAPTION_SUB: SubId = 0x4341_5054; // "CAPT"
const DEMO_UNLOCK_SUB: SubId = 0x444D_4F55; // "DMOU"

/// Element id of screen `n`.
#[must_use]
pub fn screen_id(n: u32) -> String {
    format!("screen-{n}")
}

/// Element id of the next button on screen `n`.
#[must_use]
pub fn next_button_id(n: u32) -> String {
    format!("{NEXT_BUTTON_PREFIX}{n}")
}

/// Where the user is in the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// 1-based screen index.
    Step(u32),
    /// Past the last screen. Terminal.
    Completed,
}

impl Screen {
    /// Progress position: the step index, or `total + 1` once completed.
    #[must_use]
    pub fn position(self, total: u32) -> u32 {
        match self {
            Screen::Step(n) => n,
            Screen::Completed => total.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunnelMsg {
    /// Page loaded.
    Start,
    /// Next clicked on screen `n`.
    Next(u32),
    PlayIntro,
    MediaProgress {
        media: String,
        current_time: f64,
        duration: f64,
    },
    MediaEnded {
        media: String,
    },
    PlayAssistant,
    CloseAssistant,
    RevealAssistant,
    RotateCaption,
    /// Cancel caption rotation for the rest of the page view.
    StopCaptions,
    DemoUnlock,
    Ignored,
}

impl From<Event> for FunnelMsg {
    fn from(event: Event) -> Self {
        match event {
            Event::DomContentLoaded => FunnelMsg::Start,
            Event::Click { target } => {
                if let Some(n) = target
                    .strip_prefix(NEXT_BUTTON_PREFIX)
                    .and_then(|n| n.parse().ok())
                {
                    return FunnelMsg::Next(n);
                }
                match target.as_str() {
                    PLAY_BUTTON_ID | VIDEO_OVERLAY_ID => FunnelMsg::PlayIntro,
                    assistant::OVERLAY_ID => FunnelMsg::PlayAssistant,
                    assistant::CLOSE_ID => FunnelMsg::CloseAssistant,
                    _ => FunnelMsg::Ignored,
                }
            }
            Event::MediaTimeUpdate {
                media,
                current_time,
                duration,
            } => FunnelMsg::MediaProgress {
                media,
                current_time,
                duration,
            },
            Event::MediaEnded { media } => FunnelMsg::MediaEnded { media },
            _ => FunnelMsg::Ignored,
        }
    }
}

/// Funnel controller.
#[derive(Debug, Clone)]
pub struct EnrollmentFunnel {
    config: FunnelConfig,
    started: bool,
    screen: Screen,
    gates: BTreeMap<u32, ScreenGate>,
    video_watched: BTreeMap<u32, bool>,
    intro_playing: bool,
    assistant: AssistantOverlay,
    demo_unlocked: bool,
}

impl EnrollmentFunnel {
    #[must_use]
    pub fn new(config: FunnelConfig) -> Self {
        let gates = (1..=config.total_screens)
            .map(|n| {
                let rule = if n == config.primary_screen {
                    GateRule::Media {
                        media: config.primary_media.clone(),
                        threshold: config.gate_threshold,
                    }
                } else {
                    GateRule::Open
                };
                (n, ScreenGate::new(rule))
            })
            .collect();
        Self {
            config,
            started: false,
            screen: Screen::Step(1),
            gates,
            video_watched: BTreeMap::new(),
            intro_playing: false,
            assistant: AssistantOverlay::new(),
            demo_unlocked: false,
        }
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.screen == Screen::Completed
    }

    pub fn gate(&self, screen: u32) -> Option<&ScreenGate> {
        self.gates.get(&screen)
    }

    /// Whether the next button of `screen` works. Unknown screens are closed.
    pub fn is_next_enabled(&self, screen: u32) -> bool {
        self.gate(screen).is_some_and(ScreenGate::is_enabled)
    }

    /// Whether the gating media of `screen` played to its end.
    pub fn video_watched(&self, screen: u32) -> bool {
        self.video_watched.get(&screen).copied().unwrap_or(false)
    }

    pub fn is_intro_playing(&self) -> bool {
        self.intro_playing
    }

    pub fn assistant(&self) -> &AssistantOverlay {
        &self.assistant
    }

    #[must_use]
    pub fn progress(&self) -> ProgressIndicator {
        let total = self.config.total_screens;
        ProgressIndicator::compute(self.screen.position(total), total)
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.screen = Screen::Step(1);
        tracing::debug!(total = self.config.total_screens, "funnel started");
    }

    fn advance(&mut self, from: u32) -> Cmd<FunnelMsg> {
        let Screen::Step(current) = self.screen else {
            tracing::debug!(from, "funnel already completed");
            return Cmd::none();
        };
        if from != current {
            tracing::debug!(from, current, "ignoring next for inactive screen");
            return Cmd::none();
        }
        if !self.is_next_enabled(from) {
            tracing::debug!(screen = from, "next is still disabled");
            return Cmd::none();
        }

        if from < self.config.total_screens {
            self.screen = Screen::Step(from + 1);
            tracing::debug!(from, to = from + 1, "screen advanced");
            Cmd::scroll_to_top()
        } else {
            self.screen = Screen::Completed;
            tracing::info!(screens = self.config.total_screens, "funnel completed");
            Cmd::batch(vec![Cmd::log(COMPLETION_LOG), Cmd::notify(COMPLETION_NOTICE)])
        }
    }

    fn on_media_progress(&mut self, media: &str, current_time: f64, duration: f64) {
        for (screen, gate) in &mut self.gates {
            if gate.on_time_update(media, current_time, duration) {
                tracing::debug!(screen = *screen, media, "gate opened by progress");
            }
        }
    }

    fn on_media_ended(&mut self, media: &str) {
        for (screen, gate) in &mut self.gates {
            if gate.media() == Some(media) {
                self.video_watched.insert(*screen, true);
            }
            if gate.on_ended(media) {
                tracing::debug!(screen = *screen, media, "gate opened by end of media");
            }
        }
    }

    fn unlock_all(&mut self) {
        self.demo_unlocked = true;
        let opened = self
            .gates
            .values_mut()
            .filter_map(|g| g.force_enable().then_some(()))
            .count();
        tracing::debug!(opened, "demo unlock");
    }

    fn active_screen(&self) -> u32 {
        match self.screen {
            Screen::Step(n) => n,
            // The last screen stays on display after completion.
            Screen::Completed => self.config.total_screens,
        }
    }
}

impl Model for EnrollmentFunnel {
    type Message = FunnelMsg;

    fn mount(&mut self, doc: &Document) {
        let present = doc.contains(assistant::CAPTION_ID);
        if !present {
            tracing::debug!("no caption element, captions stay put");
        }
        self.assistant.set_caption_present(present);
    }

    fn init(&mut self) -> Cmd<FunnelMsg> {
        self.start();
        Cmd::none()
    }

    fn update(&mut self, msg: FunnelMsg) -> Cmd<FunnelMsg> {
        match msg {
            FunnelMsg::Start => self.start(),
            FunnelMsg::Next(from) => return self.advance(from),
            FunnelMsg::PlayIntro => self.intro_playing = true,
            FunnelMsg::MediaProgress {
                media,
                current_time,
                duration,
            } => self.on_media_progress(&media, current_time, duration),
            FunnelMsg::MediaEnded { media } => self.on_media_ended(&media),
            FunnelMsg::PlayAssistant => self.assistant.play(),
            FunnelMsg::CloseAssistant => self.assistant.dismiss(),
            FunnelMsg::RevealAssistant => self.assistant.reveal(),
            FunnelMsg::RotateCaption => {
                self.assistant.rotate();
            }
            FunnelMsg::StopCaptions => self.assistant.stop_captions(),
            FunnelMsg::DemoUnlock => self.unlock_all(),
            FunnelMsg::Ignored => {}
        }
        Cmd::none()
    }

    fn view(&self, doc: &mut Document) {
        let active = screen_id(self.active_screen());
        doc.update_class(SCREEN_CLASS, |_, el| {
            let on = el.id() == active;
            el.set_class("active", on);
        });

        for (screen, gate) in &self.gates {
            let enabled = gate.is_enabled();
            doc.update(&next_button_id(*screen), |el| {
                el.set_flag(ElementFlags::DISABLED, !enabled);
                el.set_class("disabled", !enabled);
                if enabled {
                    el.set_text("Next");
                }
            });
        }

        doc.update(VIDEO_OVERLAY_ID, |el| el.set_class("hidden", self.intro_playing));
        doc.update(&self.config.primary_media, |el| {
            el.set_flag(ElementFlags::PLAYING, self.intro_playing);
        });

        self.progress().render(doc);
        self.assistant.render(doc);
    }

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<FunnelMsg>>> {
        if !self.started {
            return vec![];
        }
        let mut subs: Vec<Box<dyn Subscription<FunnelMsg>>> = Vec::new();
        if !self.assistant.is_revealed() && !self.assistant.is_dismissed() {
            subs.push(Box::new(After::with_id(
                REVEAL_SUB,
                self.config.avatar_reveal_delay,
                || FunnelMsg::RevealAssistant,
            )));
        }
        if self.assistant.is_rotating() {
            subs.push(Box::new(Every::with_id(
                CAPTION_SUB,
                self.config.caption_interval,
                || FunnelMsg::RotateCaption,
            )));
        }
        if let Some(delay) = self.config.demo_unlock_after
            && !self.demo_unlocked
        {
            subs.push(Box::new(After::with_id(DEMO_UNLOCK_SUB, delay, || {
                FunnelMsg::DemoUnlock
            })));
        }
        subs
    }
}
