// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::significant_drop_tightening)]

//! Booking Intake
//!
//! Turns vacation-rental booking notification emails into reservations.
//!
//! # Stages
//!
//! - Body decoding of provider payloads (base64url, multipart)
//! - Layout detection and anchored field extraction
//! - Normalization into a typed [`BookingRecord`] where every field is present
//! - Mapping onto the reservation API payload and submission
//!
//! # Example
//!
//! ```rust
//! use booking_intake::{parse_booking, Field, LayoutVariant};
//!
//! let body = "DIT IS EEN RESERVERING\n\
//!             Periode: vrijdag 15-11-2024 tot maandag 18-11-2024\n\
//!             Boeker: Mw. Els Jansen\n\
//!             Reguliere prijs (4d3n) is Euro 735.00\n";
//!
//! let booking = parse_booking(body).unwrap();
//!
//! assert_eq!(booking.layout, LayoutVariant::KeywordAnchored);
//! assert_eq!(booking.first_name, Field::Found("Els".to_string()));
//! assert_eq!(booking.total_price.to_string(), "735.00");
//! ```

mod config;
mod decoder;
mod error;
mod extractor;
mod ledger;
mod mail;
mod normalize;
mod parser;
mod pipeline;
mod reservation;
mod session;
mod types;

pub use config::*;
pub use decoder::{MessagePart, PartBody, decode_body, decode_data, decode_rfc822};
pub use error::{ErrorCategory, ExtractionFailure, IntakeError, Result};
pub use extractor::{
    FieldName, FieldRule, RawFields, RuleSet, detect_layout, extract_fields, rule_set,
};
pub use ledger::ProcessedLedger;
pub use mail::{GMAIL_API_BASE, GmailClient, GmailMessage, MailSource};
pub use normalize::{BODY_DATE_FORMAT, format_date, normalize, parse_count, parse_date, parse_price};
pub use parser::{extract_booking, parse_booking};
pub use pipeline::{BatchReport, MessageOutcome, MessageReport, Pipeline};
pub use reservation::*;
pub use session::Session;
pub use types::*;
