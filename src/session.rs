//! Cached mailbox credentials
//!
//! A [`Session`] owns the token file for one run: [`Session::load`] reads it,
//! [`Session::ensure_fresh`] refreshes an expiring access token and
//! [`Session::persist`] writes the refreshed token back. Creating the token file
//! in the first place takes an interactive consent flow that this crate does not
//! perform.

use crate::error::{IntakeError, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Authorized-user token file as written by Google's client libraries
#[derive(Clone, Serialize, Deserialize)]
struct TokenFile {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
    /// Keys this crate does not interpret, kept on rewrite
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub struct Session {
    path: PathBuf,
    token: TokenFile,
    refreshed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("token", &"[REDACTED]")
            .field("expiry", &self.token.expiry)
            .field("refreshed", &self.refreshed)
            .finish()
    }
}

impl Session {
    /// Read the cached token file
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IntakeError::AuthorizationRequired { path });
            }
            Err(e) => return Err(e.into()),
        };

        Self::from_json(path, &contents)
    }

    fn from_json(path: PathBuf, contents: &str) -> Result<Self> {
        let token: TokenFile = serde_json::from_str(contents)?;
        debug!(path = %path.display(), expiry = ?token.expiry, "Loaded cached token");
        Ok(Self {
            path,
            token,
            refreshed: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.token.token
    }

    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.token
            .expiry
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// `true` when the token is expired or about to expire
    ///
    /// A token without a recorded expiry is assumed valid.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expiry()
            .is_some_and(|expiry| expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
    }

    /// Refresh the access token if it is about to expire
    pub async fn ensure_fresh(&mut self, http: &Client) -> Result<()> {
        if !self.needs_refresh(Utc::now()) {
            return Ok(());
        }

        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            self.token.refresh_token.clone(),
            self.token.client_id.clone(),
            self.token.client_secret.clone(),
        ) else {
            return Err(IntakeError::AuthorizationRequired {
                path: self.path.clone(),
            });
        };

        let token_uri = self
            .token
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        let response = http
            .post(&token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::TokenRefresh(format!("{status}: {body}")));
        }

        let refreshed: RefreshResponse = response.json().await?;
        self.apply_refresh(refreshed, Utc::now());
        info!(path = %self.path.display(), expiry = ?self.token.expiry, "Refreshed mail token");
        Ok(())
    }

    fn apply_refresh(&mut self, refreshed: RefreshResponse, now: DateTime<Utc>) {
        self.token.token = refreshed.access_token;
        self.token.expiry = refreshed.expires_in.map(|secs| {
            (now + Duration::seconds(secs)).to_rfc3339_opts(SecondsFormat::Micros, true)
        });
        self.refreshed = true;
    }

    /// Write the token back if it was refreshed during this run
    pub async fn persist(&self) -> Result<()> {
        if !self.refreshed {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.token)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "Persisted refreshed token");
        Ok(())
    }
}
