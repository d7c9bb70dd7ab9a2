//! End-to-end application form scenarios.
//!
//! Each page gets a fresh store over one shared origin storage, the way a
//! browser hands `localStorage` from page to page.
//!
//! ```sh
//! RUST_LOG=funnel_app=debug cargo test -p funnel-app --test apply_scenarios -- --nocapture
//! ```

use std::sync::Arc;

use funnel_app::apply::{
    ACCESSIBILITY_BUTTON_ID, ADDRESS_FORM_ID, ADDRESS_ID, CONTACT_FORM_ID, EMAIL_ID, FIRST_NAME_ID,
    LANDING_FORM_ID, LAST_NAME_ID, PHONE_ID,
};
use funnel_app::{ApplyForm, FunnelConfig, pages};
use funnel_core::document::{Document, ElementFlags};
use funnel_core::event::{Event, FormData};
use funnel_core::place::{AddressComponent, PlaceResult};
use funnel_runtime::program::Cmd;
use funnel_runtime::simulator::ProgramSimulator;
use funnel_runtime::state_persistence::{KeyValueStore, MemoryStorage, StorageBackend};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn open_page(
    origin: &Arc<MemoryStorage>,
    document: Document,
    config: FunnelConfig,
) -> ProgramSimulator<ApplyForm> {
    init_tracing();
    let store = KeyValueStore::new(Box::new(origin.clone()));
    store.load().unwrap();
    let store = store.shared();
    let mut sim = ProgramSimulator::new(ApplyForm::new(store.clone(), config))
        .with_document(document)
        .with_store(store);
    sim.init();
    sim
}

fn href(sim: &ProgramSimulator<ApplyForm>) -> Option<String> {
    sim.last_navigation().map(ToString::to_string)
}

fn stored(origin: &MemoryStorage, key: &str) -> Option<String> {
    origin.load_all().unwrap().get(key).cloned()
}

#[test]
fn scenario_a_landing_persists_and_navigates() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::landing_document(), FunnelConfig::default());

    sim.fill("debt-amount", "15000");
    sim.submit_form(LANDING_FORM_ID);

    assert_eq!(stored(&origin, "debtAmount").as_deref(), Some("15000"));
    assert_eq!(href(&sim).as_deref(), Some("apply-step1.html"));
}

#[test]
fn landing_without_amount_does_nothing() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::landing_document(), FunnelConfig::default());

    sim.submit_form(LANDING_FORM_ID);

    assert!(sim.navigations().is_empty());
    assert!(origin.load_all().unwrap().is_empty());
}

#[test]
fn scenario_b_contact_fields_persist_verbatim() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::contact_document(), FunnelConfig::default());

    sim.inject_event(Event::submit(
        CONTACT_FORM_ID,
        FormData::new()
            .with_text(FIRST_NAME_ID, "Ana")
            .with_text(LAST_NAME_ID, "Diaz")
            .with_text(PHONE_ID, "5551234567")
            .with_text(EMAIL_ID, "a@x.com"),
    ));

    assert_eq!(stored(&origin, "firstName").as_deref(), Some("Ana"));
    assert_eq!(stored(&origin, "lastName").as_deref(), Some("Diaz"));
    assert_eq!(stored(&origin, "phone").as_deref(), Some("5551234567"));
    assert_eq!(stored(&origin, "email").as_deref(), Some("a@x.com"));
    assert_eq!(href(&sim).as_deref(), Some("apply-step2.html"));
}

#[test]
fn scenario_c_results_query_from_earlier_pages() {
    let origin = Arc::new(MemoryStorage::with_entries([
        ("firstName", "Ana"),
        ("debtAmount", "15000"),
    ]));
    let mut sim = open_page(&origin, pages::address_document(), FunnelConfig::default());

    sim.fill(ADDRESS_ID, "401 Congress Ave, Austin, TX");
    sim.submit_form(ADDRESS_FORM_ID);

    let target = href(&sim).unwrap();
    assert!(target.contains("firstName=Ana&debt=15000"), "{target}");
    assert_eq!(target, "quote.html?firstName=Ana&debt=15000");
    assert_eq!(
        stored(&origin, "address").as_deref(),
        Some("401 Congress Ave, Austin, TX")
    );
    assert_eq!(stored(&origin, "spanish").as_deref(), Some("false"));
}

#[test]
fn spanish_checkbox_is_stored_as_true() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::address_document(), FunnelConfig::default());

    sim.document_mut()
        .update("spanish", |e| e.set_flag(ElementFlags::CHECKED, true));
    sim.submit_form(ADDRESS_FORM_ID);

    assert_eq!(stored(&origin, "spanish").as_deref(), Some("true"));
    assert_eq!(href(&sim).as_deref(), Some("quote.html?firstName=&debt=20000"));
}

#[test]
fn scenario_d_phone_mask_while_typing() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::contact_document(), FunnelConfig::default());

    let mut seen = Vec::new();
    for ch in "5551234567".chars() {
        let current = sim
            .document()
            .get(PHONE_ID)
            .map(|e| e.input_value().to_string())
            .unwrap_or_default();
        sim.fill(PHONE_ID, &format!("{current}{ch}"));
        seen.push(sim.document().get(PHONE_ID).unwrap().input_value().to_string());
    }

    assert_eq!(
        seen,
        vec![
            "(5",
            "(55",
            "(555",
            "(555) 1",
            "(555) 12",
            "(555) 123",
            "(555) 123-4",
            "(555) 123-45",
            "(555) 123-456",
            "(555) 123-4567",
        ]
    );

    // An eleventh digit is dropped.
    sim.fill(PHONE_ID, "(555) 123-45678");
    assert_eq!(
        sim.document().get(PHONE_ID).unwrap().input_value(),
        "(555) 123-4567"
    );
}

#[test]
fn whole_application_across_three_pages() {
    let origin = Arc::new(MemoryStorage::new());

    let mut landing = open_page(&origin, pages::landing_document(), FunnelConfig::default());
    landing.fill("debt-amount", "32000");
    landing.submit_form(LANDING_FORM_ID);

    let mut contact = open_page(&origin, pages::contact_document(), FunnelConfig::default());
    contact.fill(FIRST_NAME_ID, "José");
    contact.fill(LAST_NAME_ID, "Núñez");
    contact.fill(PHONE_ID, "5125550100");
    contact.fill(EMAIL_ID, "jose@example.com");
    contact.submit_form(CONTACT_FORM_ID);
    assert_eq!(stored(&origin, "phone").as_deref(), Some("(512) 555-0100"));

    let mut address = open_page(&origin, pages::address_document(), FunnelConfig::default());
    address.fill(ADDRESS_ID, "1 Main St");
    address.submit_form(ADDRESS_FORM_ID);

    assert_eq!(
        href(&address).as_deref(),
        Some("quote.html?firstName=Jos%C3%A9&debt=32000")
    );
    // Answers are kept for a later visit unless configured otherwise.
    assert_eq!(stored(&origin, "firstName").as_deref(), Some("José"));
}

#[test]
fn clear_on_results_leaves_origin_empty() {
    let origin = Arc::new(MemoryStorage::with_entries([("firstName", "Ana")]));
    let config = FunnelConfig {
        clear_on_results: true,
        ..FunnelConfig::default()
    };
    let mut sim = open_page(&origin, pages::address_document(), config);
    sim.submit_form(ADDRESS_FORM_ID);

    assert_eq!(href(&sim).as_deref(), Some("quote.html?firstName=Ana&debt=20000"));
    assert!(origin.load_all().unwrap().is_empty());
}

#[test]
fn clear_application_forgets_answers_only() {
    let origin = Arc::new(MemoryStorage::with_entries([
        ("debtAmount", "15000"),
        ("firstName", "Ana"),
        ("zip", "78701"),
        ("theme", "dark"),
    ]));
    let mut sim = open_page(&origin, pages::address_document(), FunnelConfig::default());

    let cmd = sim.model_mut().clear_application();
    assert!(matches!(cmd, Cmd::SaveState));
    sim.execute_cmd(cmd);

    let stored = origin.load_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.get("theme").map(String::as_str), Some("dark"));
    assert!(sim.navigations().is_empty());

    // Later pages see defaults again.
    let results = open_page(&origin, pages::address_document(), FunnelConfig::default());
    assert_eq!(results.model().record().debt_amount(), "20000");
}

#[test]
fn floating_labels_follow_focus_and_value() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::contact_document(), FunnelConfig::default());
    let label = "first-name-label";

    sim.inject_event(Event::Focus {
        target: FIRST_NAME_ID.into(),
    });
    assert!(sim.document().get(label).unwrap().has_class("focused"));

    sim.fill(FIRST_NAME_ID, "Ana");
    // Still focused: has-value waits for blur.
    assert!(!sim.document().get(FIRST_NAME_ID).unwrap().has_class("has-value"));

    sim.inject_event(Event::Blur {
        target: FIRST_NAME_ID.into(),
    });
    assert!(!sim.document().get(label).unwrap().has_class("focused"));
    assert!(sim.document().get(FIRST_NAME_ID).unwrap().has_class("has-value"));

    sim.inject_event(Event::Focus {
        target: FIRST_NAME_ID.into(),
    });
    sim.fill(FIRST_NAME_ID, "");
    sim.inject_event(Event::Blur {
        target: FIRST_NAME_ID.into(),
    });
    assert!(!sim.document().get(FIRST_NAME_ID).unwrap().has_class("has-value"));
}

#[test]
fn prefilled_inputs_show_value_on_first_render() {
    let origin = Arc::new(MemoryStorage::new());
    let mut doc = pages::contact_document();
    doc.update(EMAIL_ID, |e| e.set_value("a@x.com"));
    let sim = open_page(&origin, doc, FunnelConfig::default());

    assert!(sim.document().get(EMAIL_ID).unwrap().has_class("has-value"));
    assert!(!sim.document().get(PHONE_ID).unwrap().has_class("has-value"));
}

#[test]
fn accessibility_button_toggles_high_contrast() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::landing_document(), FunnelConfig::default());

    sim.click(ACCESSIBILITY_BUTTON_ID);
    assert!(sim.document().body().has_class("high-contrast"));
    sim.click(ACCESSIBILITY_BUTTON_ID);
    assert!(!sim.document().body().has_class("high-contrast"));
}

fn austin_place() -> PlaceResult {
    let component = |long: &str, short: &str, kind: &str| AddressComponent {
        long_name: long.into(),
        short_name: short.into(),
        types: vec![kind.into(), "political".into()],
    };
    PlaceResult {
        address_components: Some(vec![
            component("401", "401", "street_number"),
            component("Congress Avenue", "Congress Ave", "route"),
            component("Austin", "Austin", "locality"),
            component("Texas", "TX", "administrative_area_level_1"),
            component("78701", "78701", "postal_code"),
        ]),
        formatted_address: Some("401 Congress Ave, Austin, TX 78701, USA".into()),
    }
}

#[test]
fn autocomplete_selection_stores_address_parts() {
    let origin = Arc::new(MemoryStorage::new());
    let config = FunnelConfig {
        places_available: true,
        ..FunnelConfig::default()
    };
    let mut sim = open_page(&origin, pages::address_document(), config);

    sim.inject_event(Event::PlaceChanged {
        target: ADDRESS_ID.into(),
        place: austin_place(),
    });

    assert_eq!(stored(&origin, "street").as_deref(), Some("401 Congress Avenue"));
    assert_eq!(stored(&origin, "city").as_deref(), Some("Austin"));
    assert_eq!(stored(&origin, "state").as_deref(), Some("TX"));
    assert_eq!(stored(&origin, "zip").as_deref(), Some("78701"));
    assert!(sim.navigations().is_empty());
}

#[test]
fn autocomplete_inactive_without_provider() {
    let origin = Arc::new(MemoryStorage::new());
    let mut sim = open_page(&origin, pages::address_document(), FunnelConfig::default());

    sim.inject_event(Event::PlaceChanged {
        target: ADDRESS_ID.into(),
        place: austin_place(),
    });

    assert!(origin.load_all().unwrap().is_empty());
}
