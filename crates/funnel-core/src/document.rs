#![forbid(unsafe_code)]

//! Headless presentation surface.
//!
//! A [`Document`] is the subset of page state the funnel controllers read and
//! write: class lists, visibility, disabled flags, text, input values, a
//! connector background, and media playback flags. Hosts mirror it onto the
//! real DOM; tests assert against it directly.
//!
//! # Absent elements
//!
//! Every mutation goes through an id lookup that returns `Option`/`bool`.
//! Updating an id that does not exist is a no-op, never an error: a page that
//! omits an element simply loses the behaviour attached to it.

use bitflags::bitflags;

use crate::event::{FieldValue, FormData};

/// Id used for the `<body>` element.
pub const BODY_ID: &str = "body";

bitflags! {
    /// Boolean element state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// `style.display = 'none'`.
        const HIDDEN   = 0b0000_0001;
        /// `disabled` attribute.
        const DISABLED = 0b0000_0010;
        /// Checkbox `checked`.
        const CHECKED  = 0b0000_0100;
        /// Media element is playing.
        const PLAYING  = 0b0000_1000;
        /// Media element is muted.
        const MUTED    = 0b0001_0000;
    }
}

/// Coarse element role, enough to serialize forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementKind {
    #[default]
    Container,
    TextInput,
    Checkbox,
    Button,
    Media,
}

/// A single page element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    id: String,
    kind: ElementKind,
    parent: Option<String>,
    classes: Vec<String>,
    flags: ElementFlags,
    text: String,
    value: String,
    background: Option<String>,
}

impl Element {
    /// Create a container element.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ElementKind::Container,
            parent: None,
            classes: Vec::new(),
            flags: ElementFlags::empty(),
            text: String::new(),
            value: String::new(),
            background: None,
        }
    }

    /// Builder: set the element kind.
    #[must_use]
    pub fn kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder: set the parent id.
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Builder: add a class.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Builder: set flags.
    #[must_use]
    pub fn flags(mut self, flags: ElementFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Builder: set text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: set the input value.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element_kind(&self) -> ElementKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Class list in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Add or remove `class` depending on `on`.
    pub fn set_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    /// Flip `class`; returns whether it is now present.
    pub fn toggle_class(&mut self, class: &str) -> bool {
        let on = !self.has_class(class);
        self.set_class(class, on);
        on
    }

    pub fn state(&self) -> ElementFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: ElementFlags, on: bool) {
        self.flags.set(flag, on);
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(ElementFlags::HIDDEN)
    }

    pub fn is_disabled(&self) -> bool {
        self.flags.contains(ElementFlags::DISABLED)
    }

    pub fn is_checked(&self) -> bool {
        self.flags.contains(ElementFlags::CHECKED)
    }

    pub fn is_playing(&self) -> bool {
        self.flags.contains(ElementFlags::PLAYING)
    }

    pub fn is_muted(&self) -> bool {
        self.flags.contains(ElementFlags::MUTED)
    }

    pub fn text_content(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn input_value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Inline `style.background`, if set.
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn set_background(&mut self, background: impl Into<String>) {
        self.background = Some(background.into());
    }
}

/// Ordered collection of elements plus the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    body: Element,
    elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with only a body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: Element::new(BODY_ID),
            elements: Vec::new(),
        }
    }

    /// Builder: append an element.
    #[must_use]
    pub fn with(mut self, element: Element) -> Self {
        self.insert(element);
        self
    }

    /// Append an element, replacing any existing element with the same id
    /// in place.
    pub fn insert(&mut self, element: Element) {
        match self.elements.iter_mut().find(|e| e.id == element.id) {
            Some(slot) => *slot = element,
            None => self.elements.push(element),
        }
    }

    /// Remove an element by id.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        let idx = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(idx))
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Element {
        &mut self.body
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        if id == BODY_ID {
            return Some(&self.body);
        }
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        if id == BODY_ID {
            return Some(&mut self.body);
        }
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Apply `f` to the element with `id`.
    ///
    /// Returns `false` (and does nothing) when the element is absent.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut Element)) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                f(element);
                true
            }
            None => {
                crate::trace!(id = %id, "element absent, skipping update");
                false
            }
        }
    }

    /// Apply `f` to every element carrying `class`, in document order,
    /// passing the element's position among matches.
    pub fn update_class(&mut self, class: &str, mut f: impl FnMut(usize, &mut Element)) -> usize {
        let mut count = 0;
        for element in self.elements.iter_mut().filter(|e| e.has_class(class)) {
            f(count, element);
            count += 1;
        }
        count
    }

    /// Elements carrying `class`, in document order.
    pub fn by_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.has_class(class))
    }

    /// All elements in document order (body excluded).
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Whether `id` is nested (at any depth) under `ancestor`.
    pub fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        let mut current = self.get(id).and_then(Element::parent);
        let mut depth = 0;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            depth += 1;
            // Guards against parent cycles in hand-built documents.
            if depth > self.elements.len() {
                return false;
            }
            current = self.get(parent).and_then(Element::parent);
        }
        false
    }

    /// Serialize the controls nested under `form`.
    ///
    /// Text inputs contribute their value, checkboxes their checked state.
    /// An absent form yields an empty snapshot.
    pub fn form_data(&self, form: &str) -> FormData {
        let mut data = FormData::new();
        for element in &self.elements {
            if !self.is_descendant(&element.id, form) {
                continue;
            }
            match element.kind {
                ElementKind::TextInput => {
                    data.insert(element.id.clone(), FieldValue::Text(element.value.clone()));
                }
                ElementKind::Checkbox => {
                    data.insert(element.id.clone(), FieldValue::Checked(element.is_checked()));
                }
                _ => {}
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::new()
            .with(Element::new("form"))
            .with(Element::new("label").class("floating-label").child_of("form"))
            .with(
                Element::new("name")
                    .kind(ElementKind::TextInput)
                    .class("form-input")
                    .child_of("label")
                    .value("Ana"),
            )
            .with(
                Element::new("spanish")
                    .kind(ElementKind::Checkbox)
                    .child_of("form")
                    .flags(ElementFlags::CHECKED),
            )
            .with(Element::new("outside").kind(ElementKind::TextInput).value("x"))
    }

    #[test]
    fn update_missing_element_is_noop() {
        let mut doc = sample();
        let before = doc.clone();
        assert!(!doc.update("nope", |e| e.add_class("active")));
        assert_eq!(doc, before);
    }

    #[test]
    fn class_helpers() {
        let mut el = Element::new("a").class("x");
        el.add_class("x");
        assert_eq!(el.classes(), ["x".to_string()]);
        assert!(el.toggle_class("y"));
        assert!(!el.toggle_class("y"));
        el.set_class("x", false);
        assert!(el.classes().is_empty());
    }

    #[test]
    fn body_is_addressable_by_id() {
        let mut doc = Document::new();
        assert!(doc.update(BODY_ID, |b| b.add_class("high-contrast")));
        assert!(doc.body().has_class("high-contrast"));
    }

    #[test]
    fn by_class_preserves_document_order() {
        let doc = Document::new()
            .with(Element::new("s2").class("step"))
            .with(Element::new("c1").class("step-connector"))
            .with(Element::new("s1").class("step"));
        let ids: Vec<_> = doc.by_class("step").map(Element::id).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
    }

    #[test]
    fn form_data_collects_nested_controls_only() {
        let doc = sample();
        let data = doc.form_data("form");
        assert_eq!(data.text("name"), "Ana");
        assert!(data.checked("spanish"));
        assert!(data.get("outside").is_none());
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn descendant_check_survives_cycles() {
        let doc = Document::new()
            .with(Element::new("a").child_of("b"))
            .with(Element::new("b").child_of("a"));
        assert!(!doc.is_descendant("a", "form"));
    }

    #[test]
    fn insert_replaces_existing_id() {
        let mut doc = Document::new().with(Element::new("a").text("one"));
        doc.insert(Element::new("a").text("two"));
        assert_eq!(doc.elements().len(), 1);
        assert_eq!(doc.get("a").map(Element::text_content), Some("two"));
    }
}
