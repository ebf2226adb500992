//! Run configuration
//!
//! Build with [`Config::builder`] or read it from the environment with
//! [`Config::from_env`]:
//!
//! ```
//! use booking_intake::Config;
//!
//! let config = Config::builder()
//!     .api_key("lodgify-key")
//!     .sender("bookings@example.nl")
//!     .property_id(619_075)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.max_messages, 25);
//! assert!(config.search_query().starts_with("from:bookings@example.nl "));
//! ```

use crate::error::{IntakeError, Result};
use crate::reservation::{DEFAULT_RESERVATION_URL, PropertyTarget};
use secrecy::SecretString;
use std::path::PathBuf;

/// Provider search for booking notifications
pub const DEFAULT_MAIL_QUERY: &str =
    r#"subject:"Boekingsassistent.net: Nieuwe boekingsaanvraag" newer_than:2d"#;

pub const ENV_MAIL_QUERY: &str = "BOOKING_INTAKE_MAIL_QUERY";
pub const ENV_SENDER: &str = "BOOKING_INTAKE_SENDER";
pub const ENV_MAX_MESSAGES: &str = "BOOKING_INTAKE_MAX_MESSAGES";
pub const ENV_TOKEN_FILE: &str = "BOOKING_INTAKE_TOKEN_FILE";
pub const ENV_LEDGER_FILE: &str = "BOOKING_INTAKE_LEDGER_FILE";
pub const ENV_API_KEY: &str = "LODGIFY_API_KEY";
pub const ENV_RESERVATION_URL: &str = "LODGIFY_URL";
pub const ENV_PROPERTY_ID: &str = "LODGIFY_PROPERTY_ID";
pub const ENV_ROOM_TYPE_ID: &str = "LODGIFY_ROOM_TYPE_ID";

/// Everything one intake run needs
///
/// The API key is kept as a [`SecretString`] and redacted from `Debug`. It is
/// only required for submitting; see [`Config::require_api_key`].
#[derive(Clone)]
pub struct Config {
    /// Provider search query selecting notification emails
    pub mail_query: String,
    /// Address notifications are sent from, added to the query as `from:`
    pub sender: Option<String>,
    /// Upper bound on messages fetched per run
    pub max_messages: u32,
    /// Cached mailbox token
    pub token_file: PathBuf,
    /// Processed-message ledger
    pub ledger_file: PathBuf,
    /// Reservation endpoint
    pub reservation_url: String,
    api_key: Option<SecretString>,
    /// Property and room type reservations are booked against
    pub target: PropertyTarget,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mail_query", &self.mail_query)
            .field("sender", &self.sender)
            .field("max_messages", &self.max_messages)
            .field("token_file", &self.token_file)
            .field("ledger_file", &self.ledger_file)
            .field("reservation_url", &self.reservation_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("target", &self.target)
            .finish()
    }
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(query) = lookup(ENV_MAIL_QUERY) {
            builder = builder.mail_query(query);
        }
        if let Some(sender) = lookup(ENV_SENDER) {
            builder = builder.sender(sender);
        }
        if let Some(max) = lookup(ENV_MAX_MESSAGES) {
            builder = builder.max_messages(parse_number(ENV_MAX_MESSAGES, &max)?);
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE) {
            builder = builder.token_file(path);
        }
        if let Some(path) = lookup(ENV_LEDGER_FILE) {
            builder = builder.ledger_file(path);
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Some(url) = lookup(ENV_RESERVATION_URL) {
            builder = builder.reservation_url(url);
        }
        if let Some(id) = lookup(ENV_PROPERTY_ID) {
            builder = builder.property_id(parse_number(ENV_PROPERTY_ID, &id)?);
        }
        if let Some(id) = lookup(ENV_ROOM_TYPE_ID) {
            builder = builder.room_type_id(parse_number(ENV_ROOM_TYPE_ID, &id)?);
        }

        builder.build()
    }

    /// Reservation API key, if configured
    #[must_use]
    pub const fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    /// Reservation API key, failing when it is not configured
    pub fn require_api_key(&self) -> Result<&SecretString> {
        self.api_key
            .as_ref()
            .ok_or_else(|| IntakeError::Config(format!("{ENV_API_KEY} is required")))
    }

    /// Mail query with the sender clause prepended when a sender is set
    #[must_use]
    pub fn search_query(&self) -> String {
        match &self.sender {
            Some(sender) => format!("from:{sender} {}", self.mail_query),
            None => self.mail_query.clone(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| IntakeError::Config(format!("{key} must be a number, got '{value}'")))
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    mail_query: Option<String>,
    sender: Option<String>,
    max_messages: Option<u32>,
    token_file: Option<PathBuf>,
    ledger_file: Option<PathBuf>,
    reservation_url: Option<String>,
    api_key: Option<String>,
    property_id: Option<u64>,
    room_type_id: Option<u64>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn mail_query(mut self, query: impl Into<String>) -> Self {
        self.mail_query = Some(query.into());
        self
    }

    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    #[must_use]
    pub const fn max_messages(mut self, max: u32) -> Self {
        self.max_messages = Some(max);
        self
    }

    #[must_use]
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn ledger_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn reservation_url(mut self, url: impl Into<String>) -> Self {
        self.reservation_url = Some(url.into());
        self
    }

    /// Sets the reservation API key (required for submitting)
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub const fn property_id(mut self, id: u64) -> Self {
        self.property_id = Some(id);
        self
    }

    #[must_use]
    pub const fn room_type_id(mut self, id: u64) -> Self {
        self.room_type_id = Some(id);
        self
    }

    pub fn build(self) -> Result<Config> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        let sender = self
            .sender
            .map(|sender| sender.trim().to_string())
            .filter(|sender| !sender.is_empty());
        if let Some(sender) = sender
            .as_deref()
            .filter(|s| s.contains(char::is_whitespace) || !s.contains('@'))
        {
            return Err(IntakeError::Config(format!(
                "sender must be a single email address, got '{sender}'"
            )));
        }

        let max_messages = self.max_messages.unwrap_or(25);
        if max_messages == 0 {
            return Err(IntakeError::Config(
                "max_messages must be at least 1".into(),
            ));
        }

        let mail_query = self
            .mail_query
            .unwrap_or_else(|| DEFAULT_MAIL_QUERY.to_string());
        if mail_query.trim().is_empty() {
            return Err(IntakeError::Config("mail query must not be empty".into()));
        }

        let defaults = PropertyTarget::default();

        Ok(Config {
            mail_query,
            sender,
            max_messages,
            token_file: self.token_file.unwrap_or_else(|| "token.json".into()),
            ledger_file: self
                .ledger_file
                .unwrap_or_else(|| "processed_messages.json".into()),
            reservation_url: self
                .reservation_url
                .unwrap_or_else(|| DEFAULT_RESERVATION_URL.to_string()),
            api_key,
            target: PropertyTarget {
                property_id: self.property_id.unwrap_or(defaults.property_id),
                room_type_id: self.room_type_id.unwrap_or(defaults.room_type_id),
            },
        })
    }
}
