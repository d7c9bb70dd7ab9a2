//! Ordering guarantees of `Cmd::Sequence` and `Cmd::Batch` under the
//! simulator: persistence completes before navigation, and nothing runs
//! after `Quit`.

use std::collections::HashMap;
use std::sync::Arc;

use funnel_core::document::Document;
use funnel_core::event::Event;
use funnel_runtime::location::Location;
use funnel_runtime::program::{Cmd, Model};
use funnel_runtime::simulator::{CmdRecord, ProgramSimulator};
use funnel_runtime::state_persistence::{
    Changes, KeyValueStore, MemoryStorage, StorageBackend, StorageError, StorageResult,
};

struct Saver {
    store: Arc<KeyValueStore>,
    executed_after_quit: bool,
}

#[derive(Debug)]
enum Msg {
    Save(String),
    QuitInBatch,
    SetExecuted,
}

impl From<Event> for Msg {
    fn from(_: Event) -> Self {
        Msg::QuitInBatch
    }
}

impl Model for Saver {
    type Message = Msg;

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Save(amount) => {
                self.store.set("debtAmount", amount);
                Cmd::sequence(vec![
                    Cmd::save_state(),
                    Cmd::navigate(Location::new("apply-step1.html")),
                ])
            }
            Msg::QuitInBatch => Cmd::Batch(vec![Cmd::Quit, Cmd::Msg(Msg::SetExecuted)]),
            Msg::SetExecuted => {
                self.executed_after_quit = true;
                Cmd::None
            }
        }
    }

    fn view(&self, _doc: &mut Document) {}
}

#[test]
fn save_precedes_navigation() {
    let storage = Arc::new(MemoryStorage::new());
    let store = KeyValueStore::new(Box::new(storage.clone())).shared();
    let mut sim = ProgramSimulator::new(Saver {
        store: store.clone(),
        executed_after_quit: false,
    })
    .with_store(store);
    sim.init();

    sim.send(Msg::Save("15000".into()));

    let log = sim.command_log();
    let save = log.iter().position(|c| *c == CmdRecord::SaveState);
    let nav = log
        .iter()
        .position(|c| matches!(c, CmdRecord::Navigate(href) if href == "apply-step1.html"));
    assert!(save.is_some() && nav.is_some());
    assert!(save < nav, "store must be flushed before leaving the page");

    // A fresh store over the same origin storage sees the value.
    let next_page = KeyValueStore::new(Box::new(storage));
    next_page.load().unwrap();
    assert_eq!(next_page.get("debtAmount").as_deref(), Some("15000"));
}

#[test]
fn batch_stops_after_quit() {
    let mut sim = ProgramSimulator::new(Saver {
        store: KeyValueStore::in_memory().shared(),
        executed_after_quit: false,
    });
    sim.init();

    sim.inject_event(Event::click("anything"));

    assert!(
        !sim.model().executed_after_quit,
        "commands after Quit in a batch must not run"
    );
    assert!(!sim.is_running());
}

/// Backend whose writes always fail, like a full `localStorage` quota.
struct FullQuota;

impl StorageBackend for FullQuota {
    fn name(&self) -> &str {
        "FullQuota"
    }

    fn load_all(&self) -> StorageResult<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    fn apply(&self, _changes: &Changes) -> StorageResult<()> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    fn clear(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[test]
fn failed_save_still_navigates() {
    let store = KeyValueStore::new(Box::new(FullQuota)).shared();
    let mut sim = ProgramSimulator::new(Saver {
        store: store.clone(),
        executed_after_quit: false,
    })
    .with_store(store.clone());
    sim.init();

    sim.send(Msg::Save("15000".into()));

    assert_eq!(
        sim.last_navigation().map(ToString::to_string).as_deref(),
        Some("apply-step1.html")
    );
    // The value is still readable for the rest of this page view.
    assert_eq!(store.get("debtAmount").as_deref(), Some("15000"));
    assert!(store.is_dirty());
}
