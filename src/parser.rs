//! Booking parser entry points

use crate::error::Result;
use crate::extractor::extract_fields;
use crate::normalize::normalize;
use crate::types::BookingRecord;
use tracing::debug;

/// Parse a plain-text notification body into a booking record
///
/// Fails only for empty bodies and bodies without a known layout marker.
pub fn extract_booking(text: &str) -> Result<BookingRecord> {
    let raw = extract_fields(text)?;
    let record = normalize(&raw);

    debug!(
        layout = %record.layout,
        missing = ?record.missing_fields(),
        "Parsed booking"
    );

    Ok(record)
}

/// Like [`extract_booking`], discarding the failure reason
#[must_use]
pub fn parse_booking(text: &str) -> Option<BookingRecord> {
    extract_booking(text).ok()
}
