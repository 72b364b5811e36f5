//! Bearer-token claim decoding.
//!
//! Tokens are compact JWTs (`header.payload.signature`). Only the payload is
//! read; the signature is never checked here because a client cannot enforce
//! anything with it. Every decode failure degrades to "unparseable".

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::RoleSet;

/// Standard-alphabet decoder that does not insist on `=` padding.
///
/// The payload is translated from base64url before decoding, so both alphabets
/// end up accepted.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decoded token payload.
///
/// Derived from the token on every decode and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the storefront issues the account email here).
    #[serde(default, deserialize_with = "de_subject", skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Raw role claim: one role, or a comma-delimited list. Splitting is left
    /// to [`RoleSet::parse`].
    #[serde(default, deserialize_with = "de_roles", skip_serializing_if = "Option::is_none")]
    pub roles: Option<String>,

    /// Expiry in epoch seconds.
    #[serde(default, deserialize_with = "de_numeric_date", skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn role_set(&self) -> RoleSet {
        self.roles.as_deref().map(RoleSet::parse).unwrap_or_default()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// A token without `exp` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => exp.saturating_mul(1000) <= now.timestamp_millis(),
            None => true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("expected 3 dot-separated segments, found {0}")]
    Segments(usize),

    #[error("payload segment is not valid base64")]
    Base64,

    #[error("payload is not valid UTF-8")]
    Utf8,

    #[error("payload is not a JSON claims object: {0}")]
    Json(String),
}

/// Three-way view of a token at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(Claims),
    Expired(Claims),
    Unparseable,
}

/// Decode the payload segment of `token` into [`Claims`].
pub fn decode(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    let payload = segments[1].replace('-', "+").replace('_', "/");
    let bytes = PAYLOAD_ENGINE
        .decode(payload.as_bytes())
        .map_err(|_| TokenError::Base64)?;
    let json = String::from_utf8(bytes).map_err(|_| TokenError::Utf8)?;

    // Go through `Value` so that arrays are not accepted positionally.
    let value: Value =
        serde_json::from_str(&json).map_err(|e| TokenError::Json(e.to_string()))?;
    if !value.is_object() {
        return Err(TokenError::Json("payload is not an object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| TokenError::Json(e.to_string()))
}

/// Decode `token`, folding every failure into `None`.
pub fn parse(token: &str) -> Option<Claims> {
    match decode(token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            tracing::debug!(error = %err, "bearer token is unparseable");
            None
        }
    }
}

pub fn subject(token: &str) -> Option<String> {
    parse(token)?.sub
}

/// Raw role claim, unsplit.
pub fn roles(token: &str) -> Option<String> {
    parse(token)?.roles
}

/// `true` when the token is unparseable or `exp` is at or before `now`.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    !matches!(inspect(token, now), TokenStatus::Valid(_))
}

pub fn inspect(token: &str, now: DateTime<Utc>) -> TokenStatus {
    match parse(token) {
        None => TokenStatus::Unparseable,
        Some(claims) if claims.is_expired_at(now) => TokenStatus::Expired(claims),
        Some(claims) => TokenStatus::Valid(claims),
    }
}

// Claim values are read field by field: a claim of an unexpected type reads
// as absent instead of failing the whole payload.

fn de_subject<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(sub)) => Some(sub),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One role string, or an array of them joined with `,`.
fn de_roles<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(role)) => Some(role),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    })
}

/// JWT NumericDate: integral or fractional seconds; fractions are truncated.
/// Anything non-numeric reads as no expiry, which counts as expired.
fn de_numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}
