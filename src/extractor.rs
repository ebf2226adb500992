//! Field extraction from notification bodies
//!
//! Every field is found by an anchored search over the whole body, never by
//! line position, so blank-line drift in a template cannot shift values into
//! the wrong field. Each layout is described by a label table; the same rule
//! constructors turn every table into a [`RuleSet`].

use crate::error::{ExtractionFailure, IntakeError, Result};
use crate::types::{CountryCode, GuestName, LayoutVariant};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Raw field names produced by the rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    BookingReference,
    FirstName,
    LastName,
    Email,
    Phone,
    StreetAddress,
    PostalCode,
    City,
    Country,
    Adults,
    Children,
    Infants,
    GuestMessage,
    Arrival,
    Departure,
    TotalPrice,
}

/// Untyped extraction result: matched fields as text, tagged with the layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFields {
    layout: LayoutVariant,
    values: BTreeMap<FieldName, String>,
}

impl RawFields {
    #[must_use]
    pub const fn new(layout: LayoutVariant) -> Self {
        Self {
            layout,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn layout(&self) -> LayoutVariant {
        self.layout
    }

    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Record a value; empty values are treated as not found
    pub fn insert(&mut self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.values.insert(field, value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// What to do with a rule's captures
#[derive(Debug, Clone, Copy)]
enum PostProcess {
    /// Group 1, trimmed
    Trim(FieldName),
    /// Group 1, trimmed and lowercased
    Lowercase(FieldName),
    /// Group 1 split into first/last name, honorific dropped
    Name,
    /// Group 1 postal code, first token of group 2 as city
    PostalCity,
    /// First participating group is a country token
    CountryToken,
    /// Group 1 is a country code or name
    CountryName,
    /// Group 1 is a guest count
    Count(FieldName),
    /// Group 1 runs from the message marker to the end of the body
    MessageBlock,
    /// Groups 1 and 2 are arrival and departure
    Period,
    /// Group 1 is an amount with unknown separator convention
    Amount,
}

impl PostProcess {
    fn apply(self, caps: &Captures<'_>, out: &mut RawFields) {
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        match self {
            Self::Trim(field) | Self::Count(field) => out.insert(field, group(1).trim()),
            Self::Lowercase(field) => out.insert(field, group(1).trim().to_lowercase()),
            Self::Name => {
                if let Some(name) = GuestName::parse(group(1)) {
                    out.insert(FieldName::FirstName, name.first);
                    if let Some(last) = name.last {
                        out.insert(FieldName::LastName, last);
                    }
                }
            }
            Self::PostalCity => {
                out.insert(FieldName::PostalCode, group(1).trim());
                if let Some(city) = group(2).split_whitespace().next() {
                    out.insert(FieldName::City, city);
                }
            }
            Self::CountryToken => {
                if let Some(token) = caps.iter().skip(1).flatten().next() {
                    out.insert(FieldName::Country, token.as_str().to_uppercase());
                }
            }
            Self::CountryName => {
                if let Some(code) = CountryCode::from_name(group(1)) {
                    out.insert(FieldName::Country, code.as_str());
                }
            }
            Self::MessageBlock => {
                if let Some(message) = message_block(group(1)) {
                    out.insert(FieldName::GuestMessage, message);
                }
            }
            Self::Period => {
                out.insert(FieldName::Arrival, group(1));
                out.insert(FieldName::Departure, group(2));
            }
            Self::Amount => out.insert(FieldName::TotalPrice, group(1)),
        }
    }
}

/// One independent extraction rule
#[derive(Debug)]
pub struct FieldRule {
    label: &'static str,
    pattern: Regex,
    post: PostProcess,
}

impl FieldRule {
    fn new(label: &'static str, pattern: &str, post: PostProcess) -> Self {
        Self {
            label,
            pattern: Regex::new(pattern).unwrap(),
            post,
        }
    }

    /// Rule for a `Label: value` line
    fn labelled(label: &'static str, value: &str, post: PostProcess) -> Self {
        let pattern = [r"(?mi)^[ \t]*", label, r":[ \t]*", value].concat();
        Self::new(label, &pattern, post)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Run the rule; a miss leaves `out` untouched
    pub fn apply(&self, text: &str, out: &mut RawFields) -> bool {
        self.pattern.captures(text).is_some_and(|caps| {
            self.post.apply(&caps, out);
            true
        })
    }
}

/// Where the street line sits
#[derive(Debug, Clone, Copy)]
enum StreetAnchor {
    /// First non-blank line after the booker line, "words + house number"
    AfterName,
    /// Its own labelled line
    Label(&'static str),
}

/// Where the country is stated
#[derive(Debug, Clone, Copy)]
enum CountryAnchor {
    /// A line holding only a two-letter code, anywhere in the body
    StandaloneToken,
    /// Its own labelled line
    Label(&'static str),
}

/// Label table describing one notification template
///
/// Labels are regex fragments matched case-insensitively at line start.
#[derive(Debug)]
struct LayoutLabels {
    variant: LayoutVariant,
    markers: &'static [&'static str],
    reference: Option<&'static str>,
    name: &'static str,
    street: StreetAnchor,
    postal: Option<&'static str>,
    country: CountryAnchor,
    adults: &'static str,
    children: &'static str,
    infants: &'static str,
    message: &'static str,
}

/// Templates in detection order; the more specific marker comes first
static LAYOUTS: [LayoutLabels; 2] = [
    LayoutLabels {
        variant: LayoutVariant::BookingForm,
        markers: &["Boekingsnummer:"],
        reference: Some("Boekingsnummer"),
        name: "Naam",
        street: StreetAnchor::Label("Adres"),
        postal: Some(r"Postcode[ \t]*(?:/|en)?[ \t]*(?:woon)?plaats"),
        country: CountryAnchor::Label("Land"),
        adults: r"Aantal volwassenen",
        children: r"Aantal kinderen",
        infants: r"Aantal baby'?s",
        message: r"Opmerkingen",
    },
    LayoutLabels {
        variant: LayoutVariant::KeywordAnchored,
        markers: &["DIT IS EEN RESERVERING", "Boeker:", "Klantgegevens:"],
        reference: None,
        name: "Boeker",
        street: StreetAnchor::AfterName,
        postal: None,
        country: CountryAnchor::StandaloneToken,
        adults: r"Personen(?:[ \t]*\([^)\n]*\))?",
        children: r"Kinderen(?:[ \t]*\([^)\n]*\))?",
        infants: r"(?:Babies|Baby'?s)(?:[ \t]*\([^)\n]*\))?",
        message: r"Bericht",
    },
];

const EMAIL_VALUE: &str = r"([a-z0-9_.+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)+)";
const PHONE_VALUE: &str = r"(\+?[0-9][0-9 ()\-]*[0-9])";
const POSTAL_VALUE: &str = r"(\d{4}[ \t]?[A-Z]{2})[ \t]+(\p{L}[\p{L} '\-]*?)[ \t]*$";
const DATE_VALUE: &str = r"(\d{1,2}-\d{1,2}-\d{4})";

/// Rules applied to a body once its layout is known
#[derive(Debug)]
pub struct RuleSet {
    variant: LayoutVariant,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    fn for_layout(layout: &LayoutLabels) -> Self {
        let mut rules = vec![
            FieldRule::labelled(layout.name, r"(.+?)[ \t]*$", PostProcess::Name),
            FieldRule::labelled(
                r"e-?mail(?:adres)?",
                EMAIL_VALUE,
                PostProcess::Lowercase(FieldName::Email),
            ),
            FieldRule::labelled(
                r"tel(?:efoon)?(?:nummer)?",
                PHONE_VALUE,
                PostProcess::Trim(FieldName::Phone),
            ),
            FieldRule::labelled(
                layout.adults,
                r"(\d+)",
                PostProcess::Count(FieldName::Adults),
            ),
            FieldRule::labelled(
                layout.children,
                r"(\d+)",
                PostProcess::Count(FieldName::Children),
            ),
            FieldRule::labelled(
                layout.infants,
                r"(\d+)",
                PostProcess::Count(FieldName::Infants),
            ),
            FieldRule::new(
                "message",
                &[r"(?msi)^[ \t]*", layout.message, r":(.*)"].concat(),
                PostProcess::MessageBlock,
            ),
            FieldRule::labelled(
                "Periode",
                &[
                    r"(?:\p{L}+[ \t]+)?",
                    DATE_VALUE,
                    r"[ \t]+tot[ \t]+(?:\p{L}+[ \t]+)?",
                    DATE_VALUE,
                ]
                .concat(),
                PostProcess::Period,
            ),
            FieldRule::new(
                "Reguliere prijs",
                r"(?mi)Reguliere prijs[^\n]*?Euro[ \t]*(\d[\d.,]*)",
                PostProcess::Amount,
            ),
        ];

        if let Some(reference) = layout.reference {
            rules.push(FieldRule::labelled(
                reference,
                r"(\S+)",
                PostProcess::Trim(FieldName::BookingReference),
            ));
        }

        rules.push(match layout.street {
            StreetAnchor::AfterName => FieldRule::new(
                "street",
                &[
                    r"(?mi)^[ \t]*",
                    layout.name,
                    r":[^\n]*\n(?:[ \t]*\n)*[ \t]*",
                    r"(\p{L}[\p{L}.' \-]*[ \t]\d+[^\s]*(?:[ \t]+\p{L}{1,3})?)[ \t]*$",
                ]
                .concat(),
                PostProcess::Trim(FieldName::StreetAddress),
            ),
            StreetAnchor::Label(label) => FieldRule::labelled(
                label,
                r"(.+?)[ \t]*$",
                PostProcess::Trim(FieldName::StreetAddress),
            ),
        });

        rules.push(match layout.postal {
            Some(label) => FieldRule::labelled(label, POSTAL_VALUE, PostProcess::PostalCity),
            None => FieldRule::new(
                "postal",
                &[r"(?m)^[ \t]*", POSTAL_VALUE].concat(),
                PostProcess::PostalCity,
            ),
        });

        rules.push(match layout.country {
            CountryAnchor::StandaloneToken => FieldRule::new(
                "country",
                &standalone_country_pattern(),
                PostProcess::CountryToken,
            ),
            CountryAnchor::Label(label) => {
                FieldRule::labelled(label, r"(.+?)[ \t]*$", PostProcess::CountryName)
            }
        });

        Self {
            variant: layout.variant,
            rules,
        }
    }

    #[must_use]
    pub const fn variant(&self) -> LayoutVariant {
        self.variant
    }

    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Apply every rule to `text`; misses are logged and skipped
    #[must_use]
    pub fn extract(&self, text: &str) -> RawFields {
        let mut out = RawFields::new(self.variant);
        for rule in &self.rules {
            if !rule.apply(text, &mut out) {
                trace!(rule = rule.label(), layout = %self.variant, "Rule did not match");
            }
        }
        out
    }
}

/// One alternative per code in scan order, all anchored at the start of the
/// body. Alternation is leftmost-first, so the earliest code in scan order that
/// occurs anywhere wins, not the earliest line.
fn standalone_country_pattern() -> String {
    let branches: Vec<String> = CountryCode::SCAN_ORDER
        .iter()
        .map(|code| {
            format!(
                r".*?^[ \t]*({})[ \t]*$",
                code.as_str().to_ascii_lowercase()
            )
        })
        .collect();
    format!(r"(?msi)\A(?:{})", branches.join("|"))
}

/// Message text up to the next structural delimiter
fn message_block(rest: &str) -> Option<String> {
    let mut lines: Vec<&str> = Vec::new();

    for line in rest.lines().map(str::trim) {
        if is_delimiter(line) {
            if lines.is_empty() {
                continue;
            }
            break;
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn is_delimiter(line: &str) -> bool {
    line.starts_with('|') || (line.len() >= 3 && line.chars().all(|c| matches!(c, '-' | '=' | '_')))
}

struct CompiledLayout {
    variant: LayoutVariant,
    markers: Vec<Regex>,
    rules: RuleSet,
}

static COMPILED: LazyLock<Vec<CompiledLayout>> = LazyLock::new(|| {
    LAYOUTS
        .iter()
        .map(|layout| CompiledLayout {
            variant: layout.variant,
            markers: layout
                .markers
                .iter()
                .map(|marker| {
                    Regex::new(&format!(r"(?mi)^[ \t]*{}", regex::escape(marker))).unwrap()
                })
                .collect(),
            rules: RuleSet::for_layout(layout),
        })
        .collect()
});

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Detect which template produced `text`
#[must_use]
pub fn detect_layout(text: &str) -> Option<LayoutVariant> {
    let text = normalize_newlines(text);
    detect_compiled(&text).map(|layout| layout.variant)
}

fn detect_compiled(text: &str) -> Option<&'static CompiledLayout> {
    COMPILED
        .iter()
        .find(|layout| layout.markers.iter().any(|marker| marker.is_match(text)))
}

/// Rule set used for a layout
#[must_use]
pub fn rule_set(variant: LayoutVariant) -> Option<&'static RuleSet> {
    COMPILED
        .iter()
        .find(|layout| layout.variant == variant)
        .map(|layout| &layout.rules)
}

/// Detect the layout and run its rules
///
/// Fails only when the body is empty or no layout marker is present; missing
/// fields are simply absent from the result.
pub fn extract_fields(text: &str) -> Result<RawFields> {
    if text.trim().is_empty() {
        return Err(IntakeError::extraction(ExtractionFailure::EmptyBody));
    }

    let text = normalize_newlines(text);
    let layout = detect_compiled(&text)
        .ok_or_else(|| IntakeError::extraction(ExtractionFailure::UnrecognizedLayout))?;

    let fields = layout.rules.extract(&text);
    debug!(
        layout = %layout.variant,
        matched = fields.len(),
        "Extracted raw booking fields"
    );
    Ok(fields)
}
