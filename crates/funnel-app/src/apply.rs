#![forbid(unsafe_code)]

//! Page-per-step application form.
//!
//! Each page submits one form. The controller copies the submitted fields
//! into the durable store, flushes it, and moves on to the next page. The
//! last page builds the results address from what earlier pages stored.
//!
//! Presentation extras handled here: phone masking while typing, floating
//! labels, the high-contrast toggle, and address autocomplete.

use std::sync::Arc;

use funnel_core::document::{BODY_ID, Document};
use funnel_core::event::{Event, FormData};
use funnel_core::format::format_phone_input;
use funnel_core::place::PlaceResult;
use funnel_runtime::location::Location;
use funnel_runtime::program::{Cmd, Model};
use funnel_runtime::state_persistence::KeyValueStore;

use crate::address::ParsedAddress;
use crate::application::{ApplicationRecord, Field};
use crate::config::FunnelConfig;

pub const LANDING_FORM_ID: &str = "step1-form";
pub const DEBT_AMOUNT_ID: &str = "debt-amount";

pub const CONTACT_FORM_ID: &str = "contact-form";
pub const FIRST_NAME_ID: &str = "first-name";
pub const LAST_NAME_ID: &str = "last-name";
pub const PHONE_ID: &str = "phone";
pub const EMAIL_ID: &str = "email";

pub const ADDRESS_FORM_ID: &str = "address-form";
pub const ADDRESS_ID: &str = "address";
pub const SPANISH_ID: &str = "spanish";

pub const ACCESSIBILITY_BUTTON_ID: &str = "accessibility-btn";
pub const HIGH_CONTRAST_CLASS: &str = "high-contrast";
pub const FLOATING_LABEL_CLASS: &str = "floating-label";
pub const FORM_INPUT_CLASS: &str = "form-input";

pub const CONTACT_PAGE: &str = "apply-step1.html";
pub const ADDRESS_PAGE: &str = "apply-step2.html";
pub const RESULTS_PAGE: &str = "quote.html";

/// Landing page submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandingStep {
    pub debt_amount: String,
}

impl LandingStep {
    #[must_use]
    pub fn from_form(fields: &FormData) -> Self {
        Self {
            debt_amount: fields.text(DEBT_AMOUNT_ID).to_string(),
        }
    }
}

/// Contact page submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactStep {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}

impl ContactStep {
    #[must_use]
    pub fn from_form(fields: &FormData) -> Self {
        Self {
            first_name: fields.text(FIRST_NAME_ID).to_string(),
            last_name: fields.text(LAST_NAME_ID).to_string(),
            phone: fields.text(PHONE_ID).to_string(),
            email: fields.text(EMAIL_ID).to_string(),
        }
    }
}

/// Address page submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressStep {
    pub address: String,
    pub spanish: bool,
}

impl AddressStep {
    #[must_use]
    pub fn from_form(fields: &FormData) -> Self {
        Self {
            address: fields.text(ADDRESS_ID).to_string(),
            spanish: fields.checked(SPANISH_ID),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyMsg {
    SubmitLanding(LandingStep),
    SubmitContact(ContactStep),
    SubmitAddress(AddressStep),
    /// Raw phone field contents after a keystroke.
    PhoneInput(String),
    Focus(String),
    Blur(String),
    ToggleContrast,
    PlaceSelected { target: String, place: PlaceResult },
    Ignored,
}

impl From<Event> for ApplyMsg {
    fn from(event: Event) -> Self {
        match event {
            Event::Submit { form, fields } => match form.as_str() {
                LANDING_FORM_ID => ApplyMsg::SubmitLanding(LandingStep::from_form(&fields)),
                CONTACT_FORM_ID => ApplyMsg::SubmitContact(ContactStep::from_form(&fields)),
                ADDRESS_FORM_ID => ApplyMsg::SubmitAddress(AddressStep::from_form(&fields)),
                _ => ApplyMsg::Ignored,
            },
            Event::Input { target, value } if target == PHONE_ID => ApplyMsg::PhoneInput(value),
            Event::Focus { target } => ApplyMsg::Focus(target),
            Event::Blur { target } => ApplyMsg::Blur(target),
            Event::Click { target } if target == ACCESSIBILITY_BUTTON_ID => {
                ApplyMsg::ToggleContrast
            }
            Event::PlaceChanged { target, place } => ApplyMsg::PlaceSelected { target, place },
            _ => ApplyMsg::Ignored,
        }
    }
}

/// Step-form controller for one application page.
pub struct ApplyForm {
    store: Arc<KeyValueStore>,
    config: FunnelConfig,
    phone_display: Option<String>,
    focused: Option<String>,
    high_contrast: bool,
    last_address: Option<ParsedAddress>,
}

impl ApplyForm {
    #[must_use]
    pub fn new(store: Arc<KeyValueStore>, config: FunnelConfig) -> Self {
        Self {
            store,
            config,
            phone_display: None,
            focused: None,
            high_contrast: false,
            last_address: None,
        }
    }

    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    /// Application answers currently in the store.
    #[must_use]
    pub fn record(&self) -> ApplicationRecord {
        ApplicationRecord::load(&self.store)
    }

    /// Masked phone value, once the user has typed into the field.
    pub fn phone_display(&self) -> Option<&str> {
        self.phone_display.as_deref()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_high_contrast(&self) -> bool {
        self.high_contrast
    }

    /// Address parts from the most recent autocomplete selection.
    pub fn last_address(&self) -> Option<&ParsedAddress> {
        self.last_address.as_ref()
    }

    /// Store the debt amount and continue to the contact page.
    ///
    /// An empty amount does nothing.
    pub fn submit_landing_step(&mut self, step: LandingStep) -> Cmd<ApplyMsg> {
        if step.debt_amount.is_empty() {
            tracing::debug!("landing submitted without a debt amount");
            return Cmd::none();
        }
        ApplicationRecord {
            debt_amount: Some(step.debt_amount),
            ..ApplicationRecord::default()
        }
        .save_fields(&self.store, &[Field::DebtAmount]);
        Self::persist_and_go(Location::new(CONTACT_PAGE))
    }

    /// Store the contact fields verbatim and continue to the address page.
    pub fn submit_contact_step(&mut self, step: ContactStep) -> Cmd<ApplyMsg> {
        ApplicationRecord {
            first_name: Some(step.first_name),
            last_name: Some(step.last_name),
            phone: Some(step.phone),
            email: Some(step.email),
            ..ApplicationRecord::default()
        }
        .save_fields(
            &self.store,
            &[Field::FirstName, Field::LastName, Field::Phone, Field::Email],
        );
        Self::persist_and_go(Location::new(ADDRESS_PAGE))
    }

    /// Store the address and language preference, then open the results
    /// page with the first name and debt amount from earlier pages.
    pub fn submit_address_step(&mut self, step: AddressStep) -> Cmd<ApplyMsg> {
        ApplicationRecord {
            address: Some(step.address),
            spanish: Some(step.spanish),
            ..ApplicationRecord::default()
        }
        .save_fields(&self.store, &[Field::Address, Field::Spanish]);

        let record = self.record();
        let results = Location::new(RESULTS_PAGE)
            .param("firstName", record.first_name())
            .raw_param("debt", record.debt_amount());

        if self.config.clear_on_results {
            let removed = ApplicationRecord::clear(&self.store);
            tracing::debug!(removed, "cleared application before results");
        }
        Self::persist_and_go(results)
    }

    /// Forget every stored answer.
    pub fn clear_application(&mut self) -> Cmd<ApplyMsg> {
        let removed = ApplicationRecord::clear(&self.store);
        tracing::debug!(removed, "application cleared");
        Cmd::save_state()
    }

    fn persist_and_go(to: Location) -> Cmd<ApplyMsg> {
        Cmd::sequence(vec![Cmd::save_state(), Cmd::navigate(to)])
    }

    fn select_place(&mut self, target: &str, place: &PlaceResult) -> Cmd<ApplyMsg> {
        if !self.config.places_available {
            tracing::trace!("autocomplete unavailable, ignoring place");
            return Cmd::none();
        }
        if target != ADDRESS_ID {
            return Cmd::none();
        }
        let Some(parsed) = ParsedAddress::from_place(place) else {
            tracing::debug!("place without components ignored");
            return Cmd::none();
        };
        ApplicationRecord {
            street: Some(parsed.street.clone()),
            city: Some(parsed.city.clone()),
            state: Some(parsed.state.clone()),
            zip: Some(parsed.zip.clone()),
            ..ApplicationRecord::default()
        }
        .save_fields(
            &self.store,
            &[Field::Street, Field::City, Field::State, Field::Zip],
        );
        self.last_address = Some(parsed);
        Cmd::save_state()
    }

    fn render_floating_labels(&self, doc: &mut Document) {
        let page: &Document = doc;
        let labelled: Vec<(String, String, bool)> = page
            .by_class(FORM_INPUT_CLASS)
            .filter_map(|input| {
                let parent = input.parent()?;
                page.get(parent)
                    .filter(|p| p.has_class(FLOATING_LABEL_CLASS))
                    .map(|_| {
                        (
                            input.id().to_string(),
                            parent.to_string(),
                            !input.input_value().is_empty(),
                        )
                    })
            })
            .collect();

        for (input, parent, has_value) in labelled {
            let focused = self.focused.as_deref() == Some(input.as_str());
            doc.update(&parent, |p| p.set_class("focused", focused));
            if !focused {
                doc.update(&input, |i| i.set_class("has-value", has_value));
            }
        }
    }
}

impl Model for ApplyForm {
    type Message = ApplyMsg;

    fn update(&mut self, msg: ApplyMsg) -> Cmd<ApplyMsg> {
        match msg {
            ApplyMsg::SubmitLanding(step) => self.submit_landing_step(step),
            ApplyMsg::SubmitContact(step) => self.submit_contact_step(step),
            ApplyMsg::SubmitAddress(step) => self.submit_address_step(step),
            ApplyMsg::PhoneInput(raw) => {
                self.phone_display = Some(format_phone_input(&raw));
                Cmd::none()
            }
            ApplyMsg::Focus(target) => {
                self.focused = Some(target);
                Cmd::none()
            }
            ApplyMsg::Blur(target) => {
                if self.focused.as_deref() == Some(target.as_str()) {
                    self.focused = None;
                }
                Cmd::none()
            }
            ApplyMsg::ToggleContrast => {
                self.high_contrast = !self.high_contrast;
                Cmd::none()
            }
            ApplyMsg::PlaceSelected { target, place } => self.select_place(&target, &place),
            ApplyMsg::Ignored => Cmd::none(),
        }
    }

    fn view(&self, doc: &mut Document) {
        doc.update(BODY_ID, |body| {
            body.set_class(HIGH_CONTRAST_CLASS, self.high_contrast);
        });
        if let Some(phone) = &self.phone_display {
            doc.update(PHONE_ID, |el| el.set_value(phone.clone()));
        }
        self.render_floating_labels(doc);
    }
}
