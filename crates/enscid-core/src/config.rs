//! Configuration types for enscid
//!
//! The configuration is captured once, before any network call, and passed to
//! the updater explicitly. [`UpdateConfig::from_env`] reads the process
//! environment; [`UpdateConfig::from_lookup`] accepts any key lookup so the
//! same parsing can be exercised without touching the environment.
//!
//! ## Environment variables
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `ENS_NAME` | yes | Dotted name to update |
//! | `IPFS_CID` | yes | CID to publish |
//! | `ETHEREUM_RPC_URL` | yes | Primary JSON-RPC endpoint |
//! | `ETHEREUM_RPC_URLS` | no | Comma-separated endpoints, overrides `ETHEREUM_RPC_URL` |
//! | `ENS_PRIVATE_KEY` | yes | 32-byte hex signing key, `0x` optional |
//! | `ENS_REGISTRY_ADDRESS` | no | Registry override for test networks |
//! | `ENS_RPC_MAX_ATTEMPTS` | no | Attempts per RPC call (1-10, default 5) |
//! | `ENS_RPC_BASE_DELAY_MS` | no | First backoff delay (default 1000) |
//! | `ENS_RPC_MAX_DELAY_MS` | no | Backoff cap (default 10000) |
//! | `ENS_MODE` | no | `dry-run` to skip the write |
//! | `ENS_RECEIPT_TIMEOUT_SECS` | no | Give up waiting for a receipt |
//! | `ENS_RECEIPT_POLL_MS` | no | Receipt polling interval (default 2000) |
//! | `ENS_LOG_LEVEL` | no | trace, debug, info, warn, error |

use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer};

use crate::ens::ENS_REGISTRY_ADDRESS;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// A validated signing key: `0x` followed by 64 hex characters
///
/// The Debug implementation intentionally does NOT expose the key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(String);

impl PrivateKey {
    /// Normalize and validate a raw key
    ///
    /// Surrounding whitespace is trimmed and a missing `0x` prefix is added.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::config(
                "ENS_PRIVATE_KEY must be a 0x-prefixed 64-hex-character string \
                 (no quotes or whitespace).",
            ));
        }

        Ok(Self(format!("0x{}", digits)))
    }

    /// The normalized key (`0x` + 64 hex characters)
    ///
    /// ⚠️ NEVER log this value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<REDACTED>)")
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(Error::config(format!(
                "ENS_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                other
            ))),
        }
    }
}

/// Everything a single contenthash update needs
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfig {
    /// ENS name to update (e.g. "site.eth")
    pub name: String,

    /// IPFS CID to point the name at
    pub cid: String,

    /// JSON-RPC endpoints; reads fail over in order, writes use the first
    pub rpc_urls: Vec<String>,

    /// Signing key for `setContenthash`
    pub private_key: PrivateKey,

    /// ENS registry contract
    #[serde(default = "default_registry_address")]
    pub registry_address: Address,

    /// Retry policy for each RPC call
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Skip signing and submitting the transaction
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum time to wait for a receipt; `None` waits indefinitely
    #[serde(default)]
    pub receipt_timeout_secs: Option<u64>,

    /// How often to poll for the receipt
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Log verbosity
    #[serde(default)]
    pub log_level: LogLevel,
}

impl UpdateConfig {
    /// Create a configuration with defaults for everything optional
    pub fn new(
        name: impl Into<String>,
        cid: impl Into<String>,
        rpc_urls: Vec<String>,
        private_key: PrivateKey,
    ) -> Self {
        Self {
            name: name.into(),
            cid: cid.into(),
            rpc_urls,
            private_key,
            registry_address: default_registry_address(),
            retry: RetryPolicy::default(),
            dry_run: false,
            receipt_timeout_secs: None,
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            log_level: LogLevel::default(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            optional(key).ok_or_else(|| Error::config(format!("Missing required env: {}", key)))
        };

        let name = required("ENS_NAME")?;
        let cid = required("IPFS_CID")?;

        let primary_url = required("ETHEREUM_RPC_URL")?;
        let rpc_urls = split_urls(&optional("ETHEREUM_RPC_URLS").unwrap_or(primary_url));

        let private_key = PrivateKey::parse(&required("ENS_PRIVATE_KEY")?)?;

        let mut config = Self::new(name, cid, rpc_urls, private_key);

        if let Some(registry) = optional("ENS_REGISTRY_ADDRESS") {
            config.registry_address = registry.parse().map_err(|e| {
                Error::config(format!("ENS_REGISTRY_ADDRESS '{}' is not an address: {}", registry, e))
            })?;
        }

        if let Some(v) = optional("ENS_RPC_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_number("ENS_RPC_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = optional("ENS_RPC_BASE_DELAY_MS") {
            config.retry.base_delay_ms = parse_number("ENS_RPC_BASE_DELAY_MS", &v)?;
        }
        if let Some(v) = optional("ENS_RPC_MAX_DELAY_MS") {
            config.retry.max_delay_ms = parse_number("ENS_RPC_MAX_DELAY_MS", &v)?;
        }

        if let Some(mode) = optional("ENS_MODE") {
            config.dry_run = match mode.to_lowercase().as_str() {
                "dry-run" => true,
                "live" => false,
                other => {
                    return Err(Error::config(format!(
                        "ENS_MODE '{}' is not supported. Supported modes: live, dry-run",
                        other
                    )));
                }
            };
        }

        if let Some(v) = optional("ENS_RECEIPT_TIMEOUT_SECS") {
            config.receipt_timeout_secs = Some(parse_number("ENS_RECEIPT_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = optional("ENS_RECEIPT_POLL_MS") {
            config.receipt_poll_interval_ms = parse_number("ENS_RECEIPT_POLL_MS", &v)?;
        }

        if let Some(level) = optional("ENS_LOG_LEVEL") {
            config.log_level = level.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("ENS name cannot be empty"));
        }

        if self.cid.trim().is_empty() {
            return Err(Error::config("IPFS CID cannot be empty"));
        }

        if self.rpc_urls.is_empty() {
            return Err(Error::config(
                "At least one RPC URL is required. Set ETHEREUM_RPC_URL or ETHEREUM_RPC_URLS",
            ));
        }

        for url in &self.rpc_urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "RPC URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        if !(1..=10).contains(&self.retry.max_attempts) {
            return Err(Error::config(format!(
                "ENS_RPC_MAX_ATTEMPTS must be between 1 and 10. Got: {}",
                self.retry.max_attempts
            )));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::config(format!(
                "ENS_RPC_BASE_DELAY_MS ({}) cannot exceed ENS_RPC_MAX_DELAY_MS ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        if self.receipt_poll_interval_ms == 0 {
            return Err(Error::config("ENS_RECEIPT_POLL_MS must be > 0"));
        }

        if self.receipt_timeout_secs == Some(0) {
            return Err(Error::config("ENS_RECEIPT_TIMEOUT_SECS must be > 0"));
        }

        Ok(())
    }
}

fn split_urls(urls: &str) -> Vec<String> {
    urls.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::config(format!("{} '{}' is not a valid number: {}", key, value, e)))
}

fn default_registry_address() -> Address {
    ENS_REGISTRY_ADDRESS
}

fn default_receipt_poll_interval_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_env() -> HashMap<String, String> {
        env(&[
            ("ENS_NAME", "site.eth"),
            ("IPFS_CID", "QmRAQB6YaCyidP37UdDnjFY5vQuiBrcqdyoW1CuDgwxkD4"),
            ("ETHEREUM_RPC_URL", "https://rpc.example.org"),
            ("ENS_PRIVATE_KEY", KEY),
        ])
    }

    fn load(vars: &HashMap<String, String>) -> Result<UpdateConfig> {
        UpdateConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_minimal_env() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.name, "site.eth");
        assert_eq!(config.rpc_urls, vec!["https://rpc.example.org".to_string()]);
        assert_eq!(config.private_key.expose(), format!("0x{}", KEY));
        assert_eq!(config.registry_address, ENS_REGISTRY_ADDRESS);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(!config.dry_run);
        assert_eq!(config.receipt_timeout_secs, None);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_missing_required_var() {
        for key in ["ENS_NAME", "IPFS_CID", "ETHEREUM_RPC_URL", "ENS_PRIVATE_KEY"] {
            let mut vars = base_env();
            vars.remove(key);

            let err = load(&vars).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{key}: {err:?}");
            assert!(err.to_string().contains(key), "{key}: {err}");
        }
    }

    #[test]
    fn test_blank_required_var() {
        let mut vars = base_env();
        vars.insert("ENS_NAME".to_string(), "   ".to_string());
        assert!(matches!(load(&vars), Err(Error::Config(_))));
    }

    #[test]
    fn test_rpc_urls_override_single_url() {
        let mut vars = base_env();
        vars.insert(
            "ETHEREUM_RPC_URLS".to_string(),
            " https://a.example.org, ,https://b.example.org ".to_string(),
        );

        let config = load(&vars).unwrap();
        assert_eq!(
            config.rpc_urls,
            vec![
                "https://a.example.org".to_string(),
                "https://b.example.org".to_string()
            ]
        );
    }

    #[test]
    fn test_rpc_urls_do_not_replace_primary_url() {
        let mut vars = base_env();
        vars.remove("ETHEREUM_RPC_URL");
        vars.insert("ETHEREUM_RPC_URLS".to_string(), "https://a.example.org".to_string());

        match load(&vars) {
            Err(Error::Config(msg)) => assert!(msg.contains("ETHEREUM_RPC_URL"), "{msg}"),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut vars = base_env();
        vars.insert("ETHEREUM_RPC_URL".to_string(), "ws://rpc.example.org".to_string());
        assert!(matches!(load(&vars), Err(Error::Config(_))));
    }

    #[test]
    fn test_private_key_normalization() {
        let bare = PrivateKey::parse(KEY).unwrap();
        let prefixed = PrivateKey::parse(&format!("  0x{}\n", KEY)).unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(bare.expose().len(), 66);
    }

    #[test]
    fn test_private_key_rejects_malformed() {
        let malformed = vec![
            String::new(),
            "0x1234".to_string(),
            KEY[..63].to_string(),
            format!("{}00", KEY),
            format!("\"{}\"", KEY),
            format!("0x{}zz", &KEY[..62]),
        ];
        for bad in &malformed {
            assert!(
                matches!(PrivateKey::parse(bad), Err(Error::Config(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let key = PrivateKey::parse(KEY).unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(&KEY[..8]));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_optional_settings() {
        let mut vars = base_env();
        vars.insert("ENS_MODE".to_string(), "DRY-RUN".to_string());
        vars.insert("ENS_RPC_MAX_ATTEMPTS".to_string(), "3".to_string());
        vars.insert("ENS_RECEIPT_TIMEOUT_SECS".to_string(), "300".to_string());
        vars.insert("ENS_LOG_LEVEL".to_string(), "debug".to_string());
        vars.insert(
            "ENS_REGISTRY_ADDRESS".to_string(),
            "0x0000000000000000000000000000000000001234".to_string(),
        );

        let config = load(&vars).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.receipt_timeout_secs, Some(300));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.registry_address,
            "0x0000000000000000000000000000000000001234".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn test_invalid_optional_settings() {
        for (key, value) in [
            ("ENS_MODE", "yolo"),
            ("ENS_RPC_MAX_ATTEMPTS", "0"),
            ("ENS_RPC_MAX_ATTEMPTS", "many"),
            ("ENS_RECEIPT_POLL_MS", "0"),
            ("ENS_LOG_LEVEL", "verbose"),
            ("ENS_REGISTRY_ADDRESS", "0x1234"),
        ] {
            let mut vars = base_env();
            vars.insert(key.to_string(), value.to_string());
            assert!(matches!(load(&vars), Err(Error::Config(_))), "{key}={value}");
        }
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: UpdateConfig = serde_json::from_value(serde_json::json!({
            "name": "site.eth",
            "cid": "QmRAQB6YaCyidP37UdDnjFY5vQuiBrcqdyoW1CuDgwxkD4",
            "rpc_urls": ["https://rpc.example.org"],
            "private_key": KEY,
            "retry": { "max_attempts": 2 }
        }))
        .unwrap();

        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.registry_address, ENS_REGISTRY_ADDRESS);
        assert_eq!(config.receipt_poll_interval_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_rejects_bad_key() {
        let result: std::result::Result<UpdateConfig, _> = serde_json::from_value(serde_json::json!({
            "name": "site.eth",
            "cid": "Qm",
            "rpc_urls": ["https://rpc.example.org"],
            "private_key": "not-a-key"
        }));
        assert!(result.is_err());
    }
}
