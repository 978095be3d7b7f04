//! Configuration management for the pass service
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Redis connection URL; the in-memory store is used when unset
    pub redis_url: Option<String>,

    /// Base URL the service is reachable at, used for pass links and photo URLs
    pub public_base_url: String,

    /// Site printed in the pass footer
    pub site_url: String,

    /// Root directory of the photo store
    pub photo_dir: PathBuf,

    /// Longest side of a stored photo, in pixels
    pub photo_max_dimension: u32,

    /// Prefix of generated pass identifiers
    pub pass_id_prefix: String,

    /// Upper bound on a single export
    pub export_timeout: Duration,

    /// Quality of JPEG exports (1-100)
    pub jpeg_quality: u8,

    /// Email API endpoint
    pub email_api_url: String,

    /// Email API key; emails are only logged when unset
    pub email_api_key: Option<String>,

    /// Sender address for pass emails
    pub email_from: String,

    /// Upper bound on a single email API call
    pub email_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            api_host: get("API_HOST", "0.0.0.0"),

            api_port: get("API_PORT", "8080")
                .parse()
                .context("Invalid API_PORT")?,

            redis_url: var("REDIS_URL").filter(|v| !v.trim().is_empty()),

            public_base_url: get("PUBLIC_BASE_URL", "http://localhost:8080")
                .trim_end_matches('/')
                .to_string(),

            site_url: get("SITE_URL", "https://www.example.org"),

            photo_dir: get("PHOTO_DIR", "./data/photos").into(),

            photo_max_dimension: get("PHOTO_MAX_DIMENSION", "1080")
                .parse()
                .context("Invalid PHOTO_MAX_DIMENSION")?,

            pass_id_prefix: get("PASS_ID_PREFIX", "KAIROS").to_ascii_uppercase(),

            export_timeout: Duration::from_secs(
                get("EXPORT_TIMEOUT_SECS", "30")
                    .parse()
                    .context("Invalid EXPORT_TIMEOUT_SECS")?,
            ),

            jpeg_quality: get("JPEG_QUALITY", "90")
                .parse()
                .context("Invalid JPEG_QUALITY")?,

            email_api_url: get("EMAIL_API_URL", "https://api.resend.com/emails"),

            email_api_key: var("EMAIL_API_KEY").filter(|v| !v.trim().is_empty()),

            email_from: get("EMAIL_FROM", "Kairos Pass <pass@example.org>"),

            email_timeout: Duration::from_secs(
                get("EMAIL_TIMEOUT_SECS", "10")
                    .parse()
                    .context("Invalid EMAIL_TIMEOUT_SECS")?,
            ),
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if self.photo_max_dimension == 0 {
            anyhow::bail!("PHOTO_MAX_DIMENSION must be greater than 0");
        }

        if self.pass_id_prefix.is_empty()
            || !self.pass_id_prefix.chars().all(|c| c.is_ascii_alphabetic())
        {
            anyhow::bail!("PASS_ID_PREFIX must be non-empty and alphabetic");
        }

        if self.export_timeout.is_zero() {
            anyhow::bail!("EXPORT_TIMEOUT_SECS must be greater than 0");
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            anyhow::bail!("JPEG_QUALITY must be between 1 and 100");
        }

        if !self.public_base_url.starts_with("http://")
            && !self.public_base_url.starts_with("https://")
        {
            anyhow::bail!("PUBLIC_BASE_URL must be an http(s) URL");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Ensure the photo directory exists
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.photo_dir).with_context(|| {
            format!(
                "Failed to create photo directory: {}",
                self.photo_dir.display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load(&[]).expect("Failed to load config");

        assert_eq!(config.api_host, "0.0.0.0");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert_eq!(config.photo_dir, PathBuf::from("./data/photos"));
        assert_eq!(config.photo_max_dimension, 1080);
        assert_eq!(config.pass_id_prefix, "KAIROS");
        assert_eq!(config.export_timeout, Duration::from_secs(30));
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.email_api_key, None);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("API_PORT", "9000"),
            ("REDIS_URL", "redis://cache:6379"),
            ("PUBLIC_BASE_URL", "https://pass.example.org/"),
            ("PASS_ID_PREFIX", "summit"),
            ("EMAIL_API_KEY", "re_123"),
        ])
        .unwrap();

        assert_eq!(config.api_port, 9000);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.public_base_url, "https://pass.example.org");
        assert_eq!(config.pass_id_prefix, "SUMMIT");
        assert_eq!(config.email_api_key.as_deref(), Some("re_123"));
    }

    #[test]
    fn test_blank_optional_values_are_unset() {
        let config = load(&[("REDIS_URL", " "), ("EMAIL_API_KEY", "")]).unwrap();
        assert_eq!(config.redis_url, None);
        assert_eq!(config.email_api_key, None);
    }

    #[test]
    fn test_api_address() {
        let config = load(&[("API_HOST", "127.0.0.1"), ("API_PORT", "9000")]).unwrap();
        assert_eq!(config.api_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_invalid_values() {
        let err = load(&[("API_PORT", "0")]).unwrap_err();
        assert!(err.to_string().contains("API_PORT must be greater than 0"));

        assert!(load(&[("API_PORT", "http")]).is_err());
        assert!(load(&[("JPEG_QUALITY", "0")]).is_err());
        assert!(load(&[("PASS_ID_PREFIX", "KAI-ROS")]).is_err());
        assert!(load(&[("PUBLIC_BASE_URL", "pass.example.org")]).is_err());
    }
}
