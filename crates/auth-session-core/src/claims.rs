//! Unverified decoding of bearer credentials.
//!
//! A credential is three base64url segments joined by dots. Only the middle
//! (payload) segment is read. Signature and issuer are never checked here: the
//! server verifies the credential on every authenticated request, so claims
//! decoded by this module are only fit for display and expiry bookkeeping.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Accepts both padded and unpadded base64url payloads.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a credential could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedToken {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not valid base64url: {0}")]
    Encoding(String),

    #[error("payload is not a JSON object: {0}")]
    Payload(String),

    #[error("required claim `{0}` is missing")]
    MissingClaim(&'static str),
}

/// Claims decoded from a credential payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject identifier (`sub`).
    pub subject: String,
    /// Display name (`name`), if the issuer includes one.
    pub display_name: Option<String>,
    /// Contact identifier (`email`).
    pub email: String,
    /// Expiry (`exp`) as an absolute instant.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default, alias = "display_name")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode a credential into its claims without verifying it.
pub fn decode(token: &str) -> Result<Claims, MalformedToken> {
    let raw = decode_raw(token)?;

    let subject = raw
        .sub
        .filter(|s| !s.is_empty())
        .ok_or(MalformedToken::MissingClaim("sub"))?;
    let email = raw
        .email
        .filter(|s| !s.is_empty())
        .ok_or(MalformedToken::MissingClaim("email"))?;

    Ok(Claims {
        subject,
        display_name: raw.name.filter(|s| !s.is_empty()),
        email,
        expires_at: raw.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
    })
}

/// Extract only the expiry instant.
///
/// Works for credentials that lack identity claims, so it is usable on
/// renewal responses that carry nothing but an access credential.
pub fn expiry_of(token: &str) -> Option<DateTime<Utc>> {
    decode_raw(token)
        .ok()?
        .exp
        .and_then(|exp| DateTime::from_timestamp(exp, 0))
}

fn decode_raw(token: &str) -> Result<RawClaims, MalformedToken> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(MalformedToken::SegmentCount(segments.len()));
    }

    let payload = PAYLOAD_ENGINE
        .decode(segments[1])
        .map_err(|e| MalformedToken::Encoding(e.to_string()))?;

    serde_json::from_slice(&payload).map_err(|e| MalformedToken::Payload(e.to_string()))
}
