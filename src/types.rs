//! Core types for extracted bookings

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// Text written in place of a field that could not be extracted
pub const NOT_FOUND: &str = "Not found";

/// A booking request extracted from one notification email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRecord {
    /// Provider message ID of the source email, if known
    pub source: Option<MessageId>,

    /// Which layout rules produced this record
    pub layout: LayoutVariant,

    /// Booking number printed by the form layout
    pub booking_reference: Field<String>,

    pub first_name: Field<String>,
    pub last_name: Field<String>,
    pub email: Field<String>,
    pub phone: Field<String>,
    pub street_address: Field<String>,
    pub city: Field<String>,
    pub postal_code: Field<String>,
    pub country_code: CountryCode,

    /// Guest breakdown; missing categories are zero
    pub guests: GuestCounts,

    /// Free-text message the guest left
    pub guest_message: Field<String>,

    pub arrival: Field<NaiveDate>,
    pub departure: Field<NaiveDate>,

    /// Regular price in EUR
    pub total_price: Price,
}

impl BookingRecord {
    /// Attach the provider message ID this record was extracted from
    #[must_use]
    pub fn with_source(self, id: MessageId) -> Self {
        Self {
            source: Some(id),
            ..self
        }
    }

    /// `false` only when both dates are known and departure precedes arrival
    #[must_use]
    pub fn has_consistent_period(&self) -> bool {
        match (&self.arrival, &self.departure) {
            (Field::Found(arrival), Field::Found(departure)) => arrival <= departure,
            _ => true,
        }
    }

    /// Number of nights, when both dates are known
    #[must_use]
    pub fn nights(&self) -> Option<i64> {
        match (&self.arrival, &self.departure) {
            (Field::Found(arrival), Field::Found(departure)) => {
                Some((*departure - *arrival).num_days())
            }
            _ => None,
        }
    }

    /// Names of the fields that carry the not-found state
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let text = [
            ("first_name", self.first_name.is_found()),
            ("last_name", self.last_name.is_found()),
            ("email", self.email.is_found()),
            ("phone", self.phone.is_found()),
            ("street_address", self.street_address.is_found()),
            ("city", self.city.is_found()),
            ("postal_code", self.postal_code.is_found()),
            ("guest_message", self.guest_message.is_found()),
            ("arrival", self.arrival.is_found()),
            ("departure", self.departure.is_found()),
        ];
        text.into_iter()
            .filter(|(_, found)| !found)
            .map(|(name, _)| name)
            .collect()
    }
}

/// A best-effort field: either extracted or explicitly not found
///
/// Serializes as the inner value, or as [`NOT_FOUND`] when missing, so every
/// key is always present in JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field<T> {
    Found(T),
    NotFound,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::NotFound
    }
}

impl<T> Field<T> {
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Found(value) => Field::Found(f(value)),
            Self::NotFound => Field::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

impl<T: fmt::Display> Field<T> {
    /// Render the value, substituting [`NOT_FOUND`] when missing
    #[must_use]
    pub fn display_or_sentinel(&self) -> String {
        match self {
            Self::Found(value) => value.to_string(),
            Self::NotFound => NOT_FOUND.to_string(),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found(value) => value.serialize(serializer),
            Self::NotFound => serializer.serialize_str(NOT_FOUND),
        }
    }
}

/// Provider message ID wrapper type
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Known notification templates
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVariant {
    /// Free-form "DIT IS EEN RESERVERING" notification with `Boeker:` block
    KeywordAnchored,
    /// Form notification that starts with a `Boekingsnummer:` line
    BookingForm,
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeywordAnchored => write!(f, "keyword-anchored"),
            Self::BookingForm => write!(f, "booking-form"),
        }
    }
}

/// Guest country, limited to the codes seen in notifications
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
pub enum CountryCode {
    #[serde(rename = "NL")]
    Netherlands,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "UK")]
    UnitedKingdom,
    #[serde(rename = "BE")]
    Belgium,
    #[default]
    Other,
}

impl CountryCode {
    /// Fixed scan order used when guessing the country from free text
    pub const SCAN_ORDER: [Self; 4] = [
        Self::Netherlands,
        Self::Germany,
        Self::UnitedKingdom,
        Self::Belgium,
    ];

    /// Match a two-letter token, case-insensitively
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::SCAN_ORDER
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(token.trim()))
    }

    /// Match a code or a country name as written in a form field
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(code) = Self::from_token(name) {
            return Some(code);
        }
        match name.to_lowercase().as_str() {
            "nederland" | "netherlands" | "the netherlands" | "holland" => Some(Self::Netherlands),
            "duitsland" | "deutschland" | "germany" => Some(Self::Germany),
            "gb" | "verenigd koninkrijk" | "united kingdom" | "engeland" => {
                Some(Self::UnitedKingdom)
            }
            "belgie" | "belgië" | "belgium" | "belgique" => Some(Self::Belgium),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Netherlands => "NL",
            Self::Germany => "DE",
            Self::UnitedKingdom => "UK",
            Self::Belgium => "BE",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Guest breakdown per age category
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq, Hash)]
pub struct GuestCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl GuestCounts {
    /// Sum of all categories, saturating at `u32::MAX`
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.adults
            .saturating_add(self.children)
            .saturating_add(self.infants)
    }
}

/// Non-negative EUR amount with cent precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u64,
}

impl Price {
    pub const ZERO: Self = Self { cents: 0 };

    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    #[must_use]
    pub const fn cents(self) -> u64 {
        self.cents
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Guest name as printed after the booker label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestName {
    pub first: String,
    pub last: Option<String>,
}

/// Salutations that precede the name and are not part of it
const HONORIFICS: &[&str] = &[
    "mw.", "mw", "mevr.", "mevr", "mevrouw", "dhr.", "dhr", "heer", "hr.", "mr.", "mrs.", "ms.",
    "fam.", "fam", "familie",
];

impl GuestName {
    /// Parse a name line, dropping a leading honorific
    ///
    /// The first remaining token is the first name; everything after it is the
    /// last name, so Dutch infixes ("de Vries") stay with the surname.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts: Vec<&str> = s.split_whitespace().collect();

        while let Some(first) = parts.first() {
            if HONORIFICS.contains(&first.to_lowercase().as_str()) {
                parts.remove(0);
            } else {
                break;
            }
        }

        let (first, rest) = parts.split_first()?;
        let last = if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        };

        Some(Self {
            first: (*first).to_string(),
            last,
        })
    }
}

impl fmt::Display for GuestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            Some(last) => write!(f, "{} {}", self.first, last),
            None => write!(f, "{}", self.first),
        }
    }
}
