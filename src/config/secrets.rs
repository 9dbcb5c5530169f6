//! Secret handling utilities.
//!
//! The HTTP adapters are the only places a secret is exposed.

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Build a sensitive header value from a secret. The value is marked
/// sensitive so reqwest redacts it from `Debug` output.
pub fn sensitive_header(secret: &SecretString) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(secret.expose_secret().trim())
        .map_err(|_| Error::Config("secret contains characters not allowed in an HTTP header".into()))?;
    value.set_sensitive(true);
    Ok(value)
}
