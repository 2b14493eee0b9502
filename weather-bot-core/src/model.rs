use serde::{Deserialize, Serialize};

use crate::translit::transliterate;

/// Free text a user sent as a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    text: String,
}

impl LocationQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Latin-script variant of the query. Recomputed on every call.
    pub fn transliterated(&self) -> String {
        transliterate(&self.text)
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Whether the user asked about a city or (by accident) a whole country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationKind {
    City,
    Country,
}

impl LocationKind {
    /// Coarse heuristic: the query names a country when it equals the country
    /// code returned by the provider, ignoring case.
    pub fn classify(location: &str, country: &str) -> Self {
        if location.to_lowercase() != country.to_lowercase() {
            LocationKind::City
        } else {
            LocationKind::Country
        }
    }

    /// Russian locative phrase used in the report header.
    pub fn locative(&self) -> &'static str {
        match self {
            LocationKind::City => "городе",
            LocationKind::Country => "стране",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    /// Empty when the provider did not report a country.
    pub country: String,
    pub kind: LocationKind,
    pub temperature_c: f64,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(WeatherReport),
    NotFound,
}

/// A similarly named place suggested by the geocoding provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCandidate {
    pub name: String,
    pub country_name: String,
}

impl CityCandidate {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.country_name)
    }
}

/// What the transport should deliver back to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Greeting(String),
    /// Asks the user to type a location, e.g. after an empty message.
    Prompt(String),
    Report(String),
    /// Disambiguation prompt; every option is offered as a quick reply.
    Suggestions {
        text: String,
        options: Vec<String>,
    },
    NoMatches(String),
    Failure(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Greeting(text)
            | Reply::Prompt(text)
            | Reply::Report(text)
            | Reply::NoMatches(text)
            | Reply::Failure(text) => text,
            Reply::Suggestions { text, .. } => text,
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            Reply::Suggestions { options, .. } => options,
            _ => &[],
        }
    }
}
