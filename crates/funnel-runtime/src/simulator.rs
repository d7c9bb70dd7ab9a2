#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] against a headless [`Document`] with
//! no threads and no wall clock. Timer subscriptions fire only when the test
//! calls [`advance_time`](ProgramSimulator::advance_time), in deadline order,
//! so "the caption rotates every 3 s" becomes an exact assertion.
//!
//! # Example
//!
//! ```ignore
//! use funnel_runtime::simulator::ProgramSimulator;
//!
//! let mut sim = ProgramSimulator::new(EnrollmentFunnel::new(config))
//!     .with_document(pages::funnel_document(5));
//! sim.init();
//! sim.advance_time(Duration::from_secs(2));
//! assert!(sim.document().get("floating-avatar").is_some_and(|e| !e.is_hidden()));
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use funnel_core::document::Document;
use funnel_core::event::Event;

use crate::location::Location;
use crate::program::{Cmd, Model};
use crate::state_persistence::KeyValueStore;
use crate::subscription::{Schedule, StopSignal, SubId, Subscription};

/// Record of a command executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    None,
    Quit,
    /// Message fed back to the model (not stored).
    Msg,
    Batch(usize),
    Sequence(usize),
    /// Navigation target, rendered as an href.
    Navigate(String),
    ScrollToTop,
    Notify(String),
    Log(String),
    SaveState,
}

struct Timer<Msg: Send + 'static> {
    sub: Box<dyn Subscription<Msg>>,
    schedule: Schedule,
    next_due: Duration,
    /// One-shot timer that already fired. Kept until the model stops
    /// declaring it so it does not re-arm.
    spent: bool,
}

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    model: M,
    document: Document,
    store: Option<Arc<KeyValueStore>>,
    command_log: Vec<CmdRecord>,
    navigations: Vec<Location>,
    notifications: Vec<String>,
    logs: Vec<String>,
    scrolls: usize,
    running: bool,
    now: Duration,
    timers: BTreeMap<SubId, Timer<M::Message>>,
    /// Ids of non-timer subscriptions that already ran.
    ran_once: Vec<SubId>,
}

impl<M: Model> ProgramSimulator<M> {
    /// The model is not initialized until [`init`](Self::init) is called.
    pub fn new(model: M) -> Self {
        Self {
            model,
            document: Document::new(),
            store: None,
            command_log: Vec::new(),
            navigations: Vec::new(),
            notifications: Vec::new(),
            logs: Vec::new(),
            scrolls: 0,
            running: true,
            now: Duration::ZERO,
            timers: BTreeMap::new(),
            ran_once: Vec::new(),
        }
    }

    /// Use `document` as the page.
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    /// Route `Cmd::SaveState` to `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Mount the model on the document, call `Model::init()`, execute its
    /// commands, render, and arm timers.
    pub fn init(&mut self) {
        self.model.mount(&self.document);
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.refresh();
    }

    /// Convert each event to a message and dispatch it.
    pub fn inject_events(&mut self, events: &[Event]) {
        for event in events {
            if !self.running {
                break;
            }
            self.send(M::Message::from(event.clone()));
        }
    }

    pub fn inject_event(&mut self, event: Event) {
        self.inject_events(&[event]);
    }

    /// Dispatch a message through `Model::update()`.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
        self.refresh();
    }

    /// Click the element with `id`.
    pub fn click(&mut self, id: &str) {
        self.inject_event(Event::click(id));
    }

    /// Type `value` into the input `id`: the document value changes first,
    /// then an input event is delivered.
    pub fn fill(&mut self, id: &str, value: &str) {
        self.document.update(id, |e| e.set_value(value));
        self.inject_event(Event::input(id, value));
    }

    /// Submit `form_id` with the values currently in the document.
    pub fn submit_form(&mut self, form_id: &str) {
        let fields = self.document.form_data(form_id);
        self.inject_event(Event::submit(form_id, fields));
    }

    /// Move the virtual clock forward by `delta`, firing due timers in
    /// deadline order. Ties fire in subscription id order.
    pub fn advance_time(&mut self, delta: Duration) {
        let target = self.now.saturating_add(delta);
        while self.running {
            let due = self
                .timers
                .iter()
                .filter(|(_, t)| !t.spent && t.next_due <= target)
                .min_by_key(|(id, t)| (t.next_due, **id))
                .map(|(id, _)| *id);
            let Some(id) = due else { break };

            let Some(timer) = self.timers.get_mut(&id) else {
                break;
            };
            self.now = timer.next_due;
            match timer.schedule {
                Schedule::Interval(period) => {
                    timer.next_due += period.max(Duration::from_nanos(1));
                }
                Schedule::Once(_) => timer.spent = true,
            }
            let msg = timer.sub.emit();
            tracing::trace!(sub_id = id, now_ms = self.now.as_millis() as u64, "timer fired");
            if let Some(msg) = msg {
                self.send(msg);
            }
        }
        if self.running {
            self.now = target;
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn store(&self) -> Option<&Arc<KeyValueStore>> {
        self.store.as_ref()
    }

    pub fn navigations(&self) -> &[Location] {
        &self.navigations
    }

    pub fn last_navigation(&self) -> Option<&Location> {
        self.navigations.last()
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Lines written through `Cmd::Log`.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Virtual time since the simulator was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Ids of armed timers that can still fire, in id order.
    pub fn active_subscriptions(&self) -> Vec<SubId> {
        self.timers
            .iter()
            .filter(|(_, t)| !t.spent)
            .map(|(id, _)| *id)
            .collect()
    }

    fn refresh(&mut self) {
        let declared = if self.running {
            self.model.subscriptions()
        } else {
            Vec::new()
        };
        let ids: Vec<SubId> = declared.iter().map(|s| s.id()).collect();
        self.timers.retain(|id, _| ids.contains(id));
        self.ran_once.retain(|id| ids.contains(id));

        let mut immediate = Vec::new();
        for sub in declared {
            let id = sub.id();
            if self.timers.contains_key(&id) || self.ran_once.contains(&id) {
                continue;
            }
            match sub.schedule() {
                Some(schedule) => {
                    let delay = match schedule {
                        Schedule::Interval(d) | Schedule::Once(d) => d,
                    };
                    self.timers.insert(
                        id,
                        Timer {
                            sub,
                            schedule,
                            next_due: self.now + delay,
                            spent: false,
                        },
                    );
                }
                None => {
                    self.ran_once.push(id);
                    let (tx, rx) = mpsc::channel();
                    sub.run(tx, StopSignal::stopped());
                    immediate.extend(rx.try_iter());
                }
            }
        }

        self.model.view(&mut self.document);

        for msg in immediate {
            self.send(msg);
        }
    }

    /// Execute a command as the runtime would.
    pub fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => self.command_log.push(CmdRecord::None),
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Sequence(cmds) => {
                self.command_log.push(CmdRecord::Sequence(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Navigate(location) => {
                self.command_log
                    .push(CmdRecord::Navigate(location.to_string()));
                self.navigations.push(location);
            }
            Cmd::ScrollToTop => {
                self.command_log.push(CmdRecord::ScrollToTop);
                self.scrolls += 1;
            }
            Cmd::Notify(text) => {
                self.command_log.push(CmdRecord::Notify(text.clone()));
                self.notifications.push(text);
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
            Cmd::SaveState => {
                self.command_log.push(CmdRecord::SaveState);
                if let Some(store) = &self.store
                    && let Err(err) = store.flush()
                {
                    tracing::warn!(error = %err, "store flush failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{After, Every, MockSubscription};
    use funnel_core::document::Element;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        Start,
        Reveal,
        Tick,
        StopTicking,
        Seed(u32),
        Other,
    }

    impl From<Event> for Msg {
        fn from(event: Event) -> Self {
            match event {
                Event::Click { target } if target == "start" => Msg::Start,
                Event::Click { target } if target == "stop" => Msg::StopTicking,
                _ => Msg::Other,
            }
        }
    }

    #[derive(Default)]
    struct Clocked {
        started: bool,
        revealed: bool,
        ticking: bool,
        ticks: u32,
        seeded: Vec<u32>,
        seed: bool,
    }

    impl Model for Clocked {
        type Message = Msg;

        fn init(&mut self) -> Cmd<Msg> {
            Cmd::log("ready")
        }

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Start => self.started = true,
                Msg::Reveal => {
                    self.revealed = true;
                    self.ticking = true;
                }
                Msg::Tick => self.ticks += 1,
                Msg::StopTicking => self.ticking = false,
                Msg::Seed(n) => self.seeded.push(n),
                Msg::Other => {}
            }
            Cmd::none()
        }

        fn view(&self, doc: &mut Document) {
            doc.update("ticks", |e| e.set_text(self.ticks.to_string()));
        }

        fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
            let mut subs: Vec<Box<dyn Subscription<Msg>>> = Vec::new();
            if self.started && !self.revealed {
                subs.push(Box::new(After::with_id(1, Duration::from_secs(2), || {
                    Msg::Reveal
                })));
            }
            if self.ticking {
                subs.push(Box::new(Every::with_id(2, Duration::from_secs(3), || {
                    Msg::Tick
                })));
            }
            if self.seed {
                subs.push(Box::new(MockSubscription::new(3, vec![Msg::Seed(1), Msg::Seed(2)])));
            }
            subs
        }
    }

    fn sim() -> ProgramSimulator<Clocked> {
        let mut sim = ProgramSimulator::new(Clocked::default())
            .with_document(Document::new().with(Element::new("ticks")));
        sim.init();
        sim
    }

    #[test]
    fn init_executes_commands() {
        let sim = sim();
        assert_eq!(sim.logs(), ["ready".to_string()]);
        assert_eq!(sim.command_log(), [CmdRecord::Log("ready".into())]);
    }

    #[test]
    fn nothing_fires_before_subscriptions_are_declared() {
        let mut sim = sim();
        sim.advance_time(Duration::from_secs(60));
        assert!(!sim.model().revealed);
        assert_eq!(sim.now(), Duration::from_secs(60));
    }

    #[test]
    fn one_shot_fires_once_at_deadline() {
        let mut sim = sim();
        sim.click("start");
        sim.advance_time(Duration::from_millis(1999));
        assert!(!sim.model().revealed);
        sim.advance_time(Duration::from_millis(1));
        assert!(sim.model().revealed);
        assert_eq!(sim.active_subscriptions(), vec![2]);
    }

    #[test]
    fn interval_chains_from_reveal_time() {
        let mut sim = sim();
        sim.click("start");
        // Reveal at 2s, ticks at 5s, 8s, 11s.
        sim.advance_time(Duration::from_secs(11));
        assert_eq!(sim.model().ticks, 3);
        assert_eq!(
            sim.document().get("ticks").map(Element::text_content),
            Some("3")
        );
    }

    #[test]
    fn undeclared_timer_stops() {
        let mut sim = sim();
        sim.click("start");
        sim.advance_time(Duration::from_secs(5));
        assert_eq!(sim.model().ticks, 1);
        sim.click("stop");
        sim.advance_time(Duration::from_secs(30));
        assert_eq!(sim.model().ticks, 1);
        assert!(sim.active_subscriptions().is_empty());
    }

    #[test]
    fn non_timer_subscription_runs_once() {
        let mut sim = ProgramSimulator::new(Clocked {
            seed: true,
            ..Clocked::default()
        });
        sim.init();
        sim.click("start");
        sim.click("start");
        assert_eq!(sim.model().seeded, vec![1, 2]);
    }

    #[test]
    fn fill_updates_document_before_event() {
        let mut sim = ProgramSimulator::new(Clocked::default()).with_document(
            Document::new().with(Element::new("name").kind(funnel_core::document::ElementKind::TextInput)),
        );
        sim.init();
        sim.fill("name", "Ana");
        assert_eq!(
            sim.document().get("name").map(Element::input_value),
            Some("Ana")
        );
    }

    #[test]
    fn quit_freezes_the_clock() {
        let mut sim = sim();
        sim.execute_cmd(Cmd::quit());
        sim.advance_time(Duration::from_secs(5));
        assert!(!sim.is_running());
        assert_eq!(sim.now(), Duration::ZERO);
    }

    #[test]
    fn save_state_flushes_store() {
        let store = KeyValueStore::in_memory().shared();
        let mut sim = ProgramSimulator::new(Clocked::default()).with_store(store.clone());
        sim.init();
        store.set("k", "v");
        assert!(store.is_dirty());
        sim.execute_cmd(Cmd::save_state());
        assert!(!store.is_dirty());
        assert_eq!(sim.command_log().last(), Some(&CmdRecord::SaveState));
    }

    #[test]
    fn navigation_is_recorded_as_href() {
        let mut sim = sim();
        sim.execute_cmd(Cmd::sequence(vec![
            Cmd::save_state(),
            Cmd::navigate(Location::new("quote.html").param("firstName", "Ana")),
        ]));
        assert_eq!(
            sim.last_navigation().map(ToString::to_string).as_deref(),
            Some("quote.html?firstName=Ana")
        );
        assert!(sim
            .command_log()
            .contains(&CmdRecord::Navigate("quote.html?firstName=Ana".into())));
    }
}
