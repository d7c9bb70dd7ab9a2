#![forbid(unsafe_code)]

//! Address parts extracted from an autocomplete selection.

use funnel_core::place::{ComponentKind, PlaceResult};

/// The four strings persisted after a place is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: String,
    pub city: String,
    /// Short form, e.g. `TX`.
    pub state: String,
    pub zip: String,
}

impl ParsedAddress {
    /// Extract street, city, state and zip from `place`.
    ///
    /// The first component of each kind wins. The street is the street
    /// number and route joined by one space; a missing half leaves no stray
    /// separator. Returns `None` for a place without structured components.
    #[must_use]
    pub fn from_place(place: &PlaceResult) -> Option<Self> {
        place.address_components.as_ref()?;

        let long = |kind| {
            place
                .first(kind)
                .map(|c| c.long_name.clone())
                .unwrap_or_default()
        };

        let street = [long(ComponentKind::StreetNumber), long(ComponentKind::Route)]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Some(Self {
            street,
            city: long(ComponentKind::Locality),
            state: place
                .first(ComponentKind::AdministrativeArea)
                .map(|c| c.short_name.clone())
                .unwrap_or_default(),
            zip: long(ComponentKind::PostalCode),
        })
    }
}
