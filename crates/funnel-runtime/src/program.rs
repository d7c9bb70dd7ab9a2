#![forbid(unsafe_code)]

//! Elm-style program runtime.
//!
//! A page controller is a [`Model`]: it receives messages converted from
//! [`Event`]s, updates its own state, and describes side effects as [`Cmd`]
//! values. After each update the runner re-renders the model into a
//! [`Document`] and reconciles its declared subscriptions.
//!
//! Side effects that leave the page (navigation, scrolling, alerts) go
//! through a [`Host`]. The browser host lives outside this crate;
//! [`RecordingHost`] captures everything for tests and headless runs.
//!
//! # Example
//!
//! ```ignore
//! use funnel_runtime::program::{Cmd, Model};
//! use funnel_core::document::Document;
//! use funnel_core::event::Event;
//!
//! struct Landing { amount: String }
//!
//! enum Msg { Amount(String), Noop }
//!
//! impl From<Event> for Msg {
//!     fn from(event: Event) -> Self {
//!         match event {
//!             Event::Input { value, .. } => Msg::Amount(value),
//!             _ => Msg::Noop,
//!         }
//!     }
//! }
//!
//! impl Model for Landing {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         if let Msg::Amount(v) = msg { self.amount = v; }
//!         Cmd::none()
//!     }
//!
//!     fn view(&self, _doc: &mut Document) {}
//! }
//! ```

use std::sync::{Arc, mpsc};
use std::time::Duration;

use funnel_core::document::Document;
use funnel_core::event::Event;

use crate::location::Location;
use crate::state_persistence::KeyValueStore;
use crate::subscription::{SubId, Subscription, SubscriptionManager};

/// The page controller.
pub trait Model: Sized {
    /// Messages understood by this model. Every page event converts into one.
    type Message: From<Event> + Send + 'static;

    /// Inspect the page the model is attached to. Called once, before
    /// [`init`](Self::init).
    fn mount(&mut self, _doc: &Document) {}

    /// Startup commands. Called once before any event.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// State transition.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Project the current state onto the document.
    ///
    /// Must be idempotent: it is called after every update.
    fn view(&self, doc: &mut Document);

    /// Declare the subscriptions that should currently be running.
    ///
    /// Called after each update. Ids that disappear are stopped.
    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![]
    }
}

/// Side effects requested by a model.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Stop processing events.
    Quit,
    /// Execute several commands in order.
    Batch(Vec<Cmd<M>>),
    /// Execute commands strictly in order; used where ordering is part of the
    /// contract (persist, then navigate).
    Sequence(Vec<Cmd<M>>),
    /// Feed a message back into `update`.
    Msg(M),
    /// Leave the page for `Location`.
    Navigate(Location),
    /// Scroll the viewport to the top.
    ScrollToTop,
    /// Show a blocking notification to the user.
    Notify(String),
    /// Write a line to the host's console.
    Log(String),
    /// Flush the durable store. No-op when no store is configured.
    SaveState,
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Navigate(loc) => write!(f, "Navigate({loc})"),
            Self::ScrollToTop => write!(f, "ScrollToTop"),
            Self::Notify(s) => f.debug_tuple("Notify").field(s).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::SaveState => write!(f, "SaveState"),
        }
    }
}

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    #[inline]
    pub fn navigate(location: Location) -> Self {
        Self::Navigate(location)
    }

    #[inline]
    pub fn scroll_to_top() -> Self {
        Self::ScrollToTop
    }

    #[inline]
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Flush the durable store.
    #[inline]
    pub fn save_state() -> Self {
        Self::SaveState
    }

    /// Collapse empty and single-element lists.
    pub fn batch(cmds: Vec<Self>) -> Self {
        match cmds.len() {
            0 => Self::None,
            1 => cmds.into_iter().next().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    /// Collapse empty and single-element lists.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        match cmds.len() {
            0 => Self::None,
            1 => cmds.into_iter().next().unwrap_or(Self::None),
            _ => Self::Sequence(cmds),
        }
    }

    /// Stable name for tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Sequence(_) => "Sequence",
            Self::Msg(_) => "Msg",
            Self::Navigate(_) => "Navigate",
            Self::ScrollToTop => "ScrollToTop",
            Self::Notify(_) => "Notify",
            Self::Log(_) => "Log",
            Self::SaveState => "SaveState",
        }
    }

    /// Whether this command, or any command nested in it, satisfies `pred`.
    pub fn any(&self, pred: &impl Fn(&Self) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            Self::Batch(cmds) | Self::Sequence(cmds) => cmds.iter().any(|c| c.any(pred)),
            _ => false,
        }
    }
}

/// Effects that leave the document.
pub trait Host {
    fn navigate(&mut self, location: &Location);

    fn scroll_to_top(&mut self);

    /// Blocking user notification (`alert`).
    fn notify(&mut self, message: &str);

    fn log(&mut self, message: &str) {
        tracing::info!(target: "funnel::console", "{message}");
    }
}

/// Host that records every effect.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingHost {
    pub navigations: Vec<Location>,
    pub scrolls: usize,
    pub notifications: Vec<String>,
    pub logs: Vec<String>,
}

impl Host for RecordingHost {
    fn navigate(&mut self, location: &Location) {
        self.navigations.push(location.clone());
    }

    fn scroll_to_top(&mut self) {
        self.scrolls += 1;
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }

    fn log(&mut self, message: &str) {
        tracing::info!(target: "funnel::console", "{message}");
        self.logs.push(message.to_string());
    }
}

/// Thread-backed runner.
///
/// Events arrive from the host one at a time; subscription messages are
/// drained between events. All model access happens on the caller's thread.
pub struct Program<M: Model, H: Host> {
    model: M,
    host: H,
    document: Document,
    store: Option<Arc<KeyValueStore>>,
    subscriptions: SubscriptionManager<M::Message>,
    running: bool,
}

impl<M: Model, H: Host> Program<M, H> {
    pub fn new(model: M, host: H, document: Document) -> Self {
        Self {
            model,
            host,
            document,
            store: None,
            subscriptions: SubscriptionManager::new(),
            running: true,
        }
    }

    /// Route `Cmd::SaveState` to `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run `Model::init`, then render and start subscriptions.
    pub fn init(&mut self) {
        self.model.mount(&self.document);
        let cmd = self.model.init();
        self.execute(cmd);
        self.refresh();
    }

    /// Deliver one page event.
    pub fn dispatch(&mut self, event: Event) {
        if !self.running {
            return;
        }
        tracing::trace!(event = event.kind(), "dispatch");
        self.send(M::Message::from(event));
    }

    /// Deliver one message.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute(cmd);
        self.refresh();
    }

    /// Process all messages produced by subscriptions so far.
    ///
    /// Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let pending = self.subscriptions.drain_messages();
        let count = pending.len();
        for msg in pending {
            if !self.running {
                break;
            }
            self.send(msg);
        }
        count
    }

    /// Event loop: dispatch events as they arrive and pump subscriptions at
    /// least every `poll`. Returns when the sender hangs up or the model
    /// quits.
    pub fn run(&mut self, events: &mpsc::Receiver<Event>, poll: Duration) {
        while self.running {
            match events.recv_timeout(poll) {
                Ok(event) => self.dispatch(event),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.pump();
        }
        self.shutdown();
    }

    /// Stop all subscriptions.
    pub fn shutdown(&mut self) {
        self.running = false;
        self.subscriptions.stop_all();
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn active_subscriptions(&self) -> Vec<SubId> {
        self.subscriptions.active_ids()
    }

    fn refresh(&mut self) {
        if self.running {
            self.subscriptions.reconcile(self.model.subscriptions());
        } else {
            self.subscriptions.stop_all();
        }
        self.model.view(&mut self.document);
    }

    fn execute(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Batch(cmds) | Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.execute(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.execute(cmd);
            }
            Cmd::Navigate(location) => {
                tracing::debug!(to = %location, "navigate");
                self.host.navigate(&location);
            }
            Cmd::ScrollToTop => self.host.scroll_to_top(),
            Cmd::Notify(text) => self.host.notify(&text),
            Cmd::Log(text) => self.host.log(&text),
            Cmd::SaveState => {
                if let Some(store) = &self.store
                    && let Err(err) = store.flush()
                {
                    tracing::warn!(error = %err, "store flush failed");
                }
            }
        }
    }
}

impl<M: Model, H: Host> Drop for Program<M, H> {
    fn drop(&mut self) {
        self.subscriptions.stop_all();
    }
}
