//! Identity provider webhooks.
//!
//! Deliveries are signed Svix-style: HMAC-SHA256 over `"{id}.{timestamp}.{body}"`
//! with a `whsec_`-prefixed base64 secret. Verified user events are mirrored into
//! the `users` table.

use crate::error::{GleanError, Result};
use crate::store::SqliteStore;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";

/// Delivery headers required for verification.
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| GleanError::WebhookVerification(format!("missing {} header", name)))
        };

        Ok(Self {
            id: get("svix-id")?,
            timestamp: get("svix-timestamp")?,
            signature: get("svix-signature")?,
        })
    }
}

/// A verified webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

/// What a delivery means for the mirrored user table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    Upserted {
        id: String,
        email: String,
        name: Option<String>,
    },
    Deleted {
        id: String,
    },
    Ignored(String),
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: Option<String>,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    primary_email_address_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeletedPayload {
    id: String,
}

fn mac_for(secret: &str) -> Result<HmacSha256> {
    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    let key = STANDARD
        .decode(encoded)
        .map_err(|e| GleanError::Config(format!("webhook secret is not valid base64: {}", e)))?;

    HmacSha256::new_from_slice(&key)
        .map_err(|e| GleanError::Config(format!("invalid webhook secret: {}", e)))
}

fn signed_mac(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256> {
    let mut mac = mac_for(secret)?;
    mac.update(id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Produce a `v1,<base64>` signature for a payload.
pub fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> Result<String> {
    let mac = signed_mac(secret, id, timestamp, body)?;
    Ok(format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes())))
}

/// Verify a delivery and decode its event.
#[instrument(skip_all, fields(id = %headers.id))]
pub fn verify(
    secret: &str,
    headers: &WebhookHeaders,
    body: &[u8],
    now: DateTime<Utc>,
    tolerance_secs: i64,
) -> Result<WebhookEvent> {
    let sent_at: i64 = headers
        .timestamp
        .parse()
        .map_err(|_| GleanError::WebhookVerification("invalid timestamp".to_string()))?;

    if (now.timestamp() - sent_at).abs() > tolerance_secs {
        return Err(GleanError::WebhookVerification(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mac = signed_mac(secret, &headers.id, &headers.timestamp, body)?;

    let matched = headers
        .signature
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if !matched {
        warn!("Rejected webhook with no matching signature");
        return Err(GleanError::WebhookVerification(
            "no matching signature".to_string(),
        ));
    }

    serde_json::from_slice(body)
        .map_err(|e| GleanError::InvalidInput(format!("malformed webhook payload: {}", e)))
}

impl WebhookEvent {
    /// Interpret the event for the user mirror.
    pub fn user_event(&self) -> Result<UserEvent> {
        match self.event_type.as_str() {
            "user.created" | "user.updated" => {
                let user: UserPayload = serde_json::from_value(self.data.clone())
                    .map_err(|e| GleanError::Internal(format!("malformed user payload: {}", e)))?;

                let primary = user
                    .primary_email_address_id
                    .as_deref()
                    .and_then(|pid| {
                        user.email_addresses
                            .iter()
                            .find(|e| e.id.as_deref() == Some(pid))
                    })
                    .or_else(|| user.email_addresses.first());

                let email = primary
                    .map(|e| e.email_address.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .ok_or_else(|| {
                        GleanError::Internal(format!("user {} has no email address", user.id))
                    })?;

                let name = [user.first_name, user.last_name]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string();

                Ok(UserEvent::Upserted {
                    id: user.id,
                    email,
                    name: (!name.is_empty()).then_some(name),
                })
            }
            "user.deleted" => {
                let user: DeletedPayload = serde_json::from_value(self.data.clone())
                    .map_err(|e| GleanError::Internal(format!("malformed user payload: {}", e)))?;
                Ok(UserEvent::Deleted { id: user.id })
            }
            other => Ok(UserEvent::Ignored(other.to_string())),
        }
    }
}

/// Apply a user event to the store.
#[instrument(skip_all)]
pub fn apply(store: &SqliteStore, event: &UserEvent) -> Result<()> {
    match event {
        UserEvent::Upserted { id, email, name } => {
            store.upsert_user(id, email, name.as_deref())?;
        }
        UserEvent::Deleted { id } => {
            if !store.delete_user(id)? {
                debug!("Deleted user {} was not mirrored", id);
            }
        }
        UserEvent::Ignored(kind) => {
            info!("Ignoring webhook event {}", kind);
        }
    }
    Ok(())
}
