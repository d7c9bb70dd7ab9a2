#![forbid(unsafe_code)]

//! Page addresses and query strings.
//!
//! Navigation targets are relative page addresses with an optional query.
//! Parameters are either percent-encoded the way `encodeURIComponent` does
//! it, or passed through verbatim for values already known to be URL-safe.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters `encodeURIComponent` escapes: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a query component.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// A relative page address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    /// Already-encoded `(name, value)` pairs.
    query: Vec<(String, String)>,
}

impl Location {
    /// Address with no query.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Append a parameter, percent-encoding the value.
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.query
            .push((encode_component(name), encode_component(value)));
        self
    }

    /// Append a parameter without encoding the value.
    #[must_use]
    pub fn raw_param(mut self, name: &str, value: &str) -> Self {
        self.query.push((encode_component(name), value.to_string()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Encoded query string without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Decoded value of the first parameter called `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.query
            .iter()
            .find(|(k, _)| percent_decode_str(k).decode_utf8_lossy() == name)
            .map(|(_, v)| percent_decode_str(v).decode_utf8_lossy().into_owned())
    }

    /// Parse an `href` such as `quote.html?firstName=Ana&debt=15000`.
    ///
    /// Values are kept exactly as written; no re-encoding happens.
    #[must_use]
    pub fn parse(href: &str) -> Self {
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (k.to_string(), v.to_string())
            })
            .collect();
        Self {
            path: path.to_string(),
            query,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        Ok(())
    }
}
