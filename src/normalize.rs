//! Conversion of raw extracted text into typed booking values
//!
//! Nothing here fails: a value that cannot be coerced keeps its not-found or
//! zero default.

use crate::extractor::{FieldName, RawFields};
use crate::types::{BookingRecord, CountryCode, Field, GuestCounts, Price};
use chrono::NaiveDate;
use tracing::warn;

/// Date format used in notification bodies
pub const BODY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Parse a `dd-mm-yyyy` date
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BODY_DATE_FORMAT).ok()
}

/// Format a date the way notification bodies write it
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(BODY_DATE_FORMAT).to_string()
}

/// Parse a guest count; anything but a non-negative integer counts as zero
#[must_use]
pub fn parse_count(raw: &str) -> u32 {
    raw.trim().parse().unwrap_or(0)
}

/// Parse an amount whose separator convention is not known up front
///
/// - With both `.` and `,` present, the one written last is the decimal
///   separator.
/// - With only one kind present, it is the decimal separator when it occurs
///   exactly once and is not followed by exactly three digits. Otherwise it
///   separates thousands: `735.00` and `735,00` are 735, `1.425` and
///   `1.425.000` are whole euros.
/// - Fractions beyond cents are rounded half up.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Price> {
    let s = raw.trim().trim_end_matches(['.', ',']);
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let decimal = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => decimal_if_single(s, '.'),
        (None, Some(_)) => decimal_if_single(s, ','),
        (None, None) => None,
    };

    let (whole, fraction) = match decimal {
        Some(sep) => s.rsplit_once(sep)?,
        None => (s, ""),
    };

    let whole_digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    let whole: u64 = if whole_digits.is_empty() {
        0
    } else {
        whole_digits.parse().ok()?
    };

    whole
        .checked_mul(100)?
        .checked_add(fraction_to_cents(fraction))
        .map(Price::from_cents)
}

fn decimal_if_single(s: &str, sep: char) -> Option<char> {
    let fraction_len = s.len() - s.rfind(sep)? - 1;
    (s.matches(sep).count() == 1 && fraction_len != 3).then_some(sep)
}

fn fraction_to_cents(fraction: &str) -> u64 {
    let digit = |i: usize| {
        fraction
            .as_bytes()
            .get(i)
            .map_or(0, |b| u64::from(b - b'0'))
    };
    let round_up = u64::from(digit(2) >= 5);
    digit(0) * 10 + digit(1) + round_up
}

/// Build a typed record from raw fields
#[must_use]
pub fn normalize(raw: &RawFields) -> BookingRecord {
    let text = |field: FieldName| Field::from(raw.get(field).map(str::to_string));

    let date = |field: FieldName| -> Field<NaiveDate> {
        raw.get(field)
            .map_or(Field::NotFound, |value| match parse_date(value) {
                Some(date) => Field::Found(date),
                None => {
                    warn!(field = ?field, value, "Unparseable date, keeping not-found");
                    Field::NotFound
                }
            })
    };

    let count = |field: FieldName| raw.get(field).map_or(0, parse_count);

    let total_price = raw.get(FieldName::TotalPrice).map_or(Price::ZERO, |value| {
        parse_price(value).unwrap_or_else(|| {
            warn!(value, "Unparseable price, using zero");
            Price::ZERO
        })
    });

    let record = BookingRecord {
        source: None,
        layout: raw.layout(),
        booking_reference: text(FieldName::BookingReference),
        first_name: text(FieldName::FirstName),
        last_name: text(FieldName::LastName),
        email: text(FieldName::Email),
        phone: text(FieldName::Phone),
        street_address: text(FieldName::StreetAddress),
        city: text(FieldName::City),
        postal_code: text(FieldName::PostalCode),
        country_code: raw
            .get(FieldName::Country)
            .and_then(CountryCode::from_token)
            .unwrap_or_default(),
        guests: GuestCounts {
            adults: count(FieldName::Adults),
            children: count(FieldName::Children),
            infants: count(FieldName::Infants),
        },
        guest_message: text(FieldName::GuestMessage),
        arrival: date(FieldName::Arrival),
        departure: date(FieldName::Departure),
        total_price,
    };

    if !record.has_consistent_period() {
        warn!(
            arrival = ?record.arrival,
            departure = ?record.departure,
            "Departure precedes arrival"
        );
    }

    record
}
