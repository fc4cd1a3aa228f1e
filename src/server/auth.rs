use axum::http::HeaderMap;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Byte comparison whose running time only depends on the input lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn authorize(provided_key: Option<&str>, settings: &Settings) -> bool {
    match provided_key {
        Some(key) => constant_time_eq(key.as_bytes(), settings.api_key.as_bytes()),
        None => false,
    }
}

/// Reads the configured key header and rejects the request unless it matches.
pub fn check_headers(headers: &HeaderMap, settings: &Settings) -> Result<()> {
    let provided = headers
        .get(settings.api_key_header.as_str())
        .and_then(|value| value.to_str().ok());
    if authorize(provided, settings) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn matching_key_is_accepted() {
        let settings = Settings::default().with_api_key("secret");
        assert!(authorize(Some("secret"), &settings));
    }

    #[test]
    fn wrong_or_missing_key_is_rejected() {
        let settings = Settings::default().with_api_key("secret");
        assert!(!authorize(Some("secreT"), &settings));
        assert!(!authorize(Some("secret2"), &settings));
        assert!(!authorize(Some(""), &settings));
        assert!(!authorize(None, &settings));
    }

    #[test]
    fn header_name_is_configurable() {
        let settings = Settings::default()
            .with_api_key("k")
            .with_api_key_header("X-Token");
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("k"));
        assert!(matches!(check_headers(&headers, &settings), Err(Error::Unauthorized)));
        headers.insert("x-token", HeaderValue::from_static("k"));
        assert!(check_headers(&headers, &settings).is_ok());
    }
}
