//! Reservation payload mapping and submission

use crate::error::{IntakeError, Result};
use crate::types::{BookingRecord, CountryCode, Field, GuestCounts, Price};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RESERVATION_URL: &str = "https://api.lodgify.com/v1/reservation/booking";

/// Property and room type a reservation is booked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyTarget {
    pub property_id: u64,
    pub room_type_id: u64,
}

impl Default for PropertyTarget {
    fn default() -> Self {
        Self {
            property_id: 619_075,
            room_type_id: 685_974,
        }
    }
}

/// JSON body of a reservation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationRequest {
    pub guest: ReservationGuest,
    pub rooms: Vec<ReservationRoom>,
    pub messages: Vec<ReservationMessage>,
    pub bookability: &'static str,
    pub total: Price,
    pub currency_code: &'static str,
    pub arrival: Field<NaiveDate>,
    pub departure: Field<NaiveDate>,
    pub property_id: u64,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationGuest {
    pub guest_name: ReservationGuestName,
    pub email: Field<String>,
    pub phone: Field<String>,
    pub street_address1: Field<String>,
    pub city: Field<String>,
    pub country_code: CountryCode,
    pub postal_code: Field<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationGuestName {
    pub first_name: Field<String>,
    pub last_name: Field<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationRoom {
    pub guest_breakdown: GuestCounts,
    pub room_type_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationMessage {
    pub subject: String,
    pub message: Field<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ReservationRequest {
    /// Map a booking onto the reservation API's shape
    #[must_use]
    pub fn from_record(record: &BookingRecord, target: &PropertyTarget) -> Self {
        Self {
            guest: ReservationGuest {
                guest_name: ReservationGuestName {
                    first_name: record.first_name.clone(),
                    last_name: record.last_name.clone(),
                },
                email: record.email.clone(),
                phone: record.phone.clone(),
                street_address1: record.street_address.clone(),
                city: record.city.clone(),
                country_code: record.country_code,
                postal_code: record.postal_code.clone(),
            },
            rooms: vec![ReservationRoom {
                guest_breakdown: record.guests,
                room_type_id: target.room_type_id,
            }],
            messages: vec![ReservationMessage {
                subject: String::new(),
                message: record.guest_message.clone(),
                kind: "Renter",
            }],
            bookability: "BookingRequest",
            total: record.total_price,
            currency_code: "EUR",
            arrival: record.arrival.clone(),
            departure: record.departure.clone(),
            property_id: target.property_id,
            status: "Tentative",
        }
    }
}

/// Destination for finished reservations
#[async_trait]
pub trait ReservationSink: Send + Sync {
    /// Submit one reservation; anything but a created response is an error
    async fn create_reservation(&self, request: &ReservationRequest) -> Result<()>;

    /// Name used in logs
    fn sink_name(&self) -> &'static str;
}

/// Lodgify reservation API client
pub struct LodgifyClient {
    http: Client,
    url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for LodgifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LodgifyClient")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl LodgifyClient {
    pub fn new(url: impl Into<String>, api_key: SecretString) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            http,
            url: url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ReservationSink for LodgifyClient {
    async fn create_reservation(&self, request: &ReservationRequest) -> Result<()> {
        let body = serde_json::to_vec(request)?;

        let response = self
            .http
            .post(&self.url)
            .header("X-ApiKey", self.api_key.expose_secret())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/*+json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED {
            info!(arrival = ?request.arrival, "Reservation created");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %body, "Reservation rejected");
        Err(IntakeError::Submission {
            status: status.as_u16(),
            body,
        })
    }

    fn sink_name(&self) -> &'static str {
        "lodgify"
    }
}
