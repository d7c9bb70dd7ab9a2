#![forbid(unsafe_code)]

//! Payload types delivered by the address autocomplete provider.
//!
//! The shape follows the provider's place JSON (`address_components` with
//! `long_name`, `short_name`, and `types`) so hosts can deserialize the
//! provider object directly.

use serde::{Deserialize, Serialize};

/// Component kinds the funnel cares about, by provider type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    StreetNumber,
    Route,
    Locality,
    AdministrativeArea,
    PostalCode,
}

impl ComponentKind {
    /// Provider type tag for this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::StreetNumber => "street_number",
            Self::Route => "route",
            Self::Locality => "locality",
            Self::AdministrativeArea => "administrative_area_level_1",
            Self::PostalCode => "postal_code",
        }
    }
}

/// One structured part of a place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    /// Whether this component carries the tag for `kind`.
    #[must_use]
    pub fn is(&self, kind: ComponentKind) -> bool {
        self.types.iter().any(|t| t == kind.tag())
    }
}

/// A place selected in the autocomplete dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceResult {
    /// Structured components. `None` when the user pressed enter on free text.
    #[serde(default)]
    pub address_components: Option<Vec<AddressComponent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
}

impl PlaceResult {
    /// First component of the given kind, in provider order.
    #[must_use]
    pub fn first(&self, kind: ComponentKind) -> Option<&AddressComponent> {
        self.address_components
            .as_deref()?
            .iter()
            .find(|c| c.is(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_provider_shape() {
        let json = r#"{
            "address_components": [
                {"long_name": "1600", "short_name": "1600", "types": ["street_number"]},
                {"long_name": "Amphitheatre Parkway", "short_name": "Amphitheatre Pkwy", "types": ["route"]},
                {"long_name": "California", "short_name": "CA", "types": ["administrative_area_level_1", "political"]}
            ],
            "formatted_address": "1600 Amphitheatre Pkwy"
        }"#;
        let place: PlaceResult = serde_json::from_str(json).unwrap();
        assert_eq!(
            place.first(ComponentKind::Route).unwrap().long_name,
            "Amphitheatre Parkway"
        );
        assert_eq!(
            place.first(ComponentKind::AdministrativeArea).unwrap().short_name,
            "CA"
        );
        assert!(place.first(ComponentKind::PostalCode).is_none());
    }

    #[test]
    fn missing_components_is_none() {
        let place: PlaceResult = serde_json::from_str(r#"{"name": "somewhere"}"#).unwrap();
        assert!(place.address_components.is_none());
        assert!(place.first(ComponentKind::Locality).is_none());
    }

    #[test]
    fn first_match_wins() {
        let place = PlaceResult {
            address_components: Some(vec![
                AddressComponent {
                    long_name: "Springfield".into(),
                    short_name: "Springfield".into(),
                    types: vec!["locality".into()],
                },
                AddressComponent {
                    long_name: "Shelbyville".into(),
                    short_name: "Shelbyville".into(),
                    types: vec!["locality".into()],
                },
            ]),
            formatted_address: None,
        };
        assert_eq!(
            place.first(ComponentKind::Locality).unwrap().long_name,
            "Springfield"
        );
    }
}
