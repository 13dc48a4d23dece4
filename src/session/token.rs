//! JWT expiry inspection.
//!
//! Only the `exp` claim is read; signatures are the backend's business.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};

/// Expiry time from a JWT's `exp` claim.
///
/// Returns `None` if the token is not a JWT or carries no numeric `exp`.
#[must_use]
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;

    #[allow(clippy::cast_possible_truncation)]
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    DateTime::<Utc>::from_timestamp(secs, 0)
}

/// True if `token` has expired at `now`.
///
/// Tokens whose expiry cannot be read are treated as expired.
#[must_use]
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    token_expiry(token).map_or(true, |exp| exp < now)
}
