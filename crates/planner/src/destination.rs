//! Destination tokens: `LOCATION`, `LOCATION:POS`, `LOCATION@POS`, `<empty>`.

use spoolctl_core::spool::EMPTY_LOCATION_LABEL;
use std::collections::HashMap;

/// A resolved destination: a canonical location plus an optional 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestSpec {
    pub location: String,
    pub position: Option<i64>,
}

impl DestSpec {
    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            position: None,
        }
    }

    pub fn at(location: impl Into<String>, position: i64) -> Self {
        Self {
            location: location.into(),
            position: Some(position),
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }
}

impl std::fmt::Display for DestSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let location = spoolctl_core::location_label(&self.location);
        match self.position {
            Some(pos) => write!(f, "{location}:{pos}"),
            None => write!(f, "{location}"),
        }
    }
}

/// Turns user-typed destination tokens into [`DestSpec`]s.
///
/// Resolution is total: malformed positions fall back to treating the whole
/// token as a location name rather than failing.
#[derive(Debug, Clone, Default)]
pub struct DestinationResolver {
    aliases: HashMap<String, String>,
}

impl DestinationResolver {
    /// Lookups upper-case the typed text, so keys must be written in
    /// upper case to match. A lowercase key never matches.
    pub fn new(aliases: &HashMap<String, String>) -> Self {
        Self {
            aliases: aliases.clone(),
        }
    }

    /// Map an alias to its location, or return the text unchanged.
    pub fn alias<'a>(&'a self, location: &'a str) -> &'a str {
        self.aliases
            .get(&location.to_uppercase())
            .map(String::as_str)
            .unwrap_or(location)
    }

    pub fn resolve(&self, token: &str) -> DestSpec {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case(EMPTY_LOCATION_LABEL) {
            return DestSpec::location("");
        }

        let whole = || DestSpec::location(self.alias(token));

        let Some(idx) = token.rfind([':', '@']) else {
            return whole();
        };
        // separator must have text on both sides
        if idx == 0 || idx == token.len() - 1 {
            return whole();
        }

        let mut location = token[..idx].trim();
        let position = token[idx + 1..].trim();
        if location.eq_ignore_ascii_case(EMPTY_LOCATION_LABEL) {
            location = "";
        }

        match position.parse::<i64>() {
            Ok(pos) => DestSpec::at(self.alias(location), pos),
            Err(_) => whole(),
        }
    }
}
