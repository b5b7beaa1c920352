//! Session token decoding.
//!
//! Tokens are compact three-segment strings (`header.payload.signature`).
//! Only the payload is decoded and the signature is never checked.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// base64url that accepts payloads with or without padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a stored token could not be decoded.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token must have three dot-separated segments")]
    Format,

    #[error("token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not a JSON object: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Claims carried in the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub role: Option<String>,
    /// Expiry in Unix milliseconds, from the `exp` claim (seconds, possibly
    /// fractional).
    #[serde(default, rename = "exp", deserialize_with = "numeric_date_millis")]
    pub exp_millis: Option<i64>,
}

impl Claims {
    /// Whether the token is past its expiry at `now_millis`.
    ///
    /// Tokens without an `exp` claim are not considered expired here; callers
    /// decide how to treat them.
    #[must_use]
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.exp_millis.is_some_and(|exp| exp < now_millis)
    }

    /// The user-facing subset of the claims.
    #[must_use]
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

/// Identity of the signed-in user, as asserted by the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl UserInfo {
    /// Best label for greeting the user: name, then email, then `User`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("User")
    }
}

/// Decode the claims segment of `token` without verifying it.
///
/// # Errors
///
/// Returns [`TokenError`] if the token does not have exactly three segments
/// or its payload is not base64url-encoded JSON.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Format);
    };
    if payload.is_empty() {
        return Err(TokenError::Format);
    }

    let bytes = PAYLOAD_ENGINE.decode(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Accept string claims issued as numbers. Any other type reads as absent.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Read a `NumericDate` of any JSON number type as milliseconds.
///
/// Non-numeric values read as absent. Out-of-range values saturate.
fn numeric_date_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Number(n)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(secs) = n.as_i64() {
        return Ok(Some(secs.saturating_mul(1000)));
    }
    // `as` saturates at the i64 bounds and maps NaN to 0
    #[allow(clippy::cast_possible_truncation)]
    let millis = n.as_f64().map(|secs| (secs * 1000.0) as i64);
    Ok(millis)
}
