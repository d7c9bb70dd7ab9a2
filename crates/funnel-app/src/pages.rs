#![forbid(unsafe_code)]

//! Headless skeletons of the funnel pages.
//!
//! These carry exactly the ids and classes the controllers touch, in page
//! order. Hosts that render real markup do not need them; tests and
//! headless runs start from them.

use funnel_core::document::{Document, Element, ElementFlags, ElementKind};

use crate::apply::{
    ACCESSIBILITY_BUTTON_ID, ADDRESS_FORM_ID, ADDRESS_ID, CONTACT_FORM_ID, DEBT_AMOUNT_ID,
    EMAIL_ID, FIRST_NAME_ID, FLOATING_LABEL_CLASS, FORM_INPUT_CLASS, LANDING_FORM_ID,
    LAST_NAME_ID, PHONE_ID, SPANISH_ID,
};
use crate::assistant::{AVATAR_ID, CAPTION_ID, CLOSE_ID, OVERLAY_ID, VIDEO_ID};
use crate::funnel::{
    INTRO_VIDEO_ID, PLAY_BUTTON_ID, SCREEN_CLASS, VIDEO_OVERLAY_ID, next_button_id, screen_id,
};
use crate::progress::{CONNECTOR_CLASS, STEP_CLASS};

/// The funnel page with `total` screens. Screen 1 carries the intro video
/// and starts with its next button disabled.
#[must_use]
pub fn funnel_document(total: u32) -> Document {
    let mut doc = Document::new();

    for i in 1..=total {
        doc.insert(Element::new(format!("progress-step-{i}")).class(STEP_CLASS));
        if i < total {
            doc.insert(Element::new(format!("progress-connector-{i}")).class(CONNECTOR_CLASS));
        }
    }

    for n in 1..=total {
        let screen = screen_id(n);
        doc.insert(Element::new(screen.clone()).class(SCREEN_CLASS));
        if n == 1 {
            doc.insert(
                Element::new(INTRO_VIDEO_ID)
                    .kind(ElementKind::Media)
                    .child_of(screen.clone()),
            );
            doc.insert(Element::new(VIDEO_OVERLAY_ID).child_of(screen.clone()));
            doc.insert(
                Element::new(PLAY_BUTTON_ID)
                    .kind(ElementKind::Button)
                    .child_of(VIDEO_OVERLAY_ID),
            );
        }
        let mut next = Element::new(next_button_id(n))
            .kind(ElementKind::Button)
            .class("primary-btn")
            .child_of(screen);
        if n == 1 {
            next = next
                .class("disabled")
                .flags(ElementFlags::DISABLED)
                .text("Watch the video to continue");
        } else {
            next = next.text("Next");
        }
        doc.insert(next);
    }

    doc.insert(Element::new(AVATAR_ID).flags(ElementFlags::HIDDEN));
    doc.insert(Element::new(OVERLAY_ID).child_of(AVATAR_ID));
    doc.insert(
        Element::new(VIDEO_ID)
            .kind(ElementKind::Media)
            .child_of(AVATAR_ID)
            .flags(ElementFlags::MUTED),
    );
    doc.insert(
        Element::new(CLOSE_ID)
            .kind(ElementKind::Button)
            .child_of(AVATAR_ID),
    );
    doc.insert(Element::new(CAPTION_ID).child_of(AVATAR_ID));
    doc
}

/// Landing page: the debt amount form.
#[must_use]
pub fn landing_document() -> Document {
    Document::new()
        .with(accessibility_button())
        .with(Element::new(LANDING_FORM_ID))
        .with(
            Element::new(DEBT_AMOUNT_ID)
                .kind(ElementKind::TextInput)
                .child_of(LANDING_FORM_ID),
        )
}

/// First application page: contact details.
#[must_use]
pub fn contact_document() -> Document {
    let mut doc = Document::new()
        .with(accessibility_button())
        .with(Element::new(CONTACT_FORM_ID));
    for id in [FIRST_NAME_ID, LAST_NAME_ID, PHONE_ID, EMAIL_ID] {
        labelled_input(&mut doc, CONTACT_FORM_ID, id);
    }
    doc
}

/// Second application page: address and language preference.
#[must_use]
pub fn address_document() -> Document {
    let mut doc = Document::new()
        .with(accessibility_button())
        .with(Element::new(ADDRESS_FORM_ID));
    labelled_input(&mut doc, ADDRESS_FORM_ID, ADDRESS_ID);
    doc.insert(
        Element::new(SPANISH_ID)
            .kind(ElementKind::Checkbox)
            .child_of(ADDRESS_FORM_ID),
    );
    doc
}

fn accessibility_button() -> Element {
    Element::new(ACCESSIBILITY_BUTTON_ID)
        .kind(ElementKind::Button)
        .class(ACCESSIBILITY_BUTTON_ID)
}

fn labelled_input(doc: &mut Document, form: &str, id: &str) {
    let label = format!("{id}-label");
    doc.insert(
        Element::new(label.clone())
            .class(FLOATING_LABEL_CLASS)
            .child_of(form),
    );
    doc.insert(
        Element::new(id)
            .kind(ElementKind::TextInput)
            .class(FORM_INPUT_CLASS)
            .child_of(label),
    );
}
