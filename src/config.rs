use std::net::SocketAddr;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

#[derive(Clone, Debug)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub host: String,

    /// Port the HTTP server listens on
    pub port: u16,

    /// Verbose logging
    pub debug: bool,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Largest accepted upload, in bytes
    pub max_image_size: usize,

    /// Lowercase file extensions accepted for upload
    pub allowed_extensions: Vec<String>,

    /// Declared output bounds, not enforced anywhere yet
    pub max_width: u32,
    pub max_height: u32,

    /// Request header carrying the API key
    pub api_key_header: String,

    /// Shared secret expected in `api_key_header`
    pub api_key: String,
}

impl Settings {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(host) = lookup("API_HOST") {
            settings.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            settings.port = parse_number("API_PORT", &port)?;
        }
        if let Some(debug) = lookup("DEBUG") {
            settings.debug = parse_bool("DEBUG", &debug)?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            settings.log_level = level;
        }
        if let Some(size) = lookup("MAX_IMAGE_SIZE") {
            settings.max_image_size = parse_number("MAX_IMAGE_SIZE", &size)?;
        }
        if let Some(extensions) = lookup("ALLOWED_EXTENSIONS") {
            settings.allowed_extensions = parse_list("ALLOWED_EXTENSIONS", &extensions)?;
        }
        if let Some(width) = lookup("MAX_WIDTH") {
            settings.max_width = parse_number("MAX_WIDTH", &width)?;
        }
        if let Some(height) = lookup("MAX_HEIGHT") {
            settings.max_height = parse_number("MAX_HEIGHT", &height)?;
        }
        if let Some(header) = lookup("API_KEY_HEADER") {
            settings.api_key_header = header;
        }
        if let Some(key) = lookup("DEFAULT_API_KEY") {
            settings.api_key = key;
        }

        Ok(settings)
    }

    pub fn with_max_image_size(mut self, max_image_size: usize) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    pub fn with_allowed_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.allowed_extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_api_key_header<S: Into<String>>(mut self, header: S) -> Self {
        self.api_key_header = header.into();
        self
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                Error::Config("API_HOST".to_string(), e.to_string())
            })
    }

    /// Filter directive for the log subscriber. Debug mode never logs less
    /// than `debug`.
    pub fn log_filter(&self) -> String {
        let level = self.log_level.trim().to_lowercase();
        match (self.debug, level.as_str()) {
            (true, "info" | "warn" | "warning" | "error" | "critical") => "debug".to_string(),
            (_, "warning") => "warn".to_string(),
            (_, "critical") => "error".to_string(),
            _ => level,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            log_level: "INFO".to_string(),
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_width: 2048,
            max_height: 2048,
            api_key_header: "X-API-Key".to_string(),
            api_key: "development_key_change_me".to_string(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| Error::Config(key.to_string(), e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(key.to_string(), format!("not a boolean: {other}"))),
    }
}

// Accepts a JSON array (`["png","jpg"]`) or a comma separated list.
fn parse_list(key: &str, value: &str) -> Result<Vec<String>> {
    let value = value.trim();
    let items: Vec<String> = if value.starts_with('[') {
        serde_json::from_str(value).map_err(|e| Error::Config(key.to_string(), e.to_string()))?
    } else {
        value.split(',').map(|s| s.to_string()).collect()
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.max_image_size, 10 * 1024 * 1024);
        assert_eq!(settings.allowed_extensions, vec!["jpg", "jpeg", "png", "bmp", "tiff"]);
        assert_eq!(settings.api_key_header, "X-API-Key");
        assert_eq!(settings.api_key, "development_key_change_me");
    }

    #[test]
    fn overrides_are_read() {
        let settings = Settings::from_lookup(lookup(&[
            ("API_PORT", "8001"),
            ("DEBUG", "True"),
            ("DEFAULT_API_KEY", "test_api_key"),
            ("ALLOWED_EXTENSIONS", "PNG, gif"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8001);
        assert!(settings.debug);
        assert_eq!(settings.api_key, "test_api_key");
        assert_eq!(settings.allowed_extensions, vec!["png", "gif"]);
    }

    #[test]
    fn extensions_accept_json_arrays() {
        let settings =
            Settings::from_lookup(lookup(&[("ALLOWED_EXTENSIONS", r#"["jpg", "webp"]"#)])).unwrap();
        assert_eq!(settings.allowed_extensions, vec!["jpg", "webp"]);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("API_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn debug_raises_log_filter() {
        let settings = Settings { debug: true, ..Settings::default() };
        assert_eq!(settings.log_filter(), "debug");
        assert_eq!(Settings::default().log_filter(), "info");
    }
}
