//! dnstxtjwt configuration
//!
//! Loaded from TOML by the command-line tool:
//!
//! ```toml
//! [fetch]
//! fqdn = "device-42.example.com"
//! timeout = "5s"
//! nameservers = ["1.1.1.1:53"]
//!
//! [[fetch.keys]]
//! alg = "ES256"
//! public_key = "BNq..."
//!
//! [record]
//! max_line_length = 254
//! max_size = 15360
//! ```

use crate::fetcher::{FetchTimeout, FetcherOptions};
use crate::jws::{Algorithm, ParseOption, TokenError, VerifyingKey};
use crate::record::{RecordOptions, DEFAULT_MAX_SIZE, MAX_LINE_LENGTH};
use crate::resolver::SystemResolver;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Main dnstxtjwt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Consumer settings
    pub fetch: FetchConfig,

    /// Publisher settings
    pub record: RecordConfig,
}

/// Settings for fetching a token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Name carrying the TXT record
    pub fqdn: Option<String>,

    /// Lookup timeout; unset or zero means 30s
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Wait for the resolver indefinitely
    pub disable_timeout: bool,

    /// Nameservers to query instead of those in /etc/resolv.conf
    pub nameservers: Vec<SocketAddr>,

    /// Trusted token signing keys
    pub keys: Vec<KeyConfig>,

    /// Clock skew tolerated on exp/nbf/iat
    #[serde(with = "humantime_serde")]
    pub acceptable_skew: Option<Duration>,

    /// Validate the token's time claims
    pub validate: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            fqdn: None,
            timeout: None,
            disable_timeout: false,
            nameservers: Vec::new(),
            keys: Vec::new(),
            acceptable_skew: None,
            validate: true,
        }
    }
}

/// A trusted public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Signature algorithm
    pub alg: Algorithm,

    /// Public key, base64url without padding
    pub public_key: String,

    /// Only accept tokens carrying this key id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl KeyConfig {
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, TokenError> {
        let key = VerifyingKey::from_base64url(self.alg, &self.public_key)?;
        Ok(match &self.kid {
            Some(kid) => key.with_kid(kid.clone()),
            None => key,
        })
    }
}

impl FetchConfig {
    /// Effective timeout setting
    pub fn timeout(&self) -> FetchTimeout {
        if self.disable_timeout {
            FetchTimeout::Disabled
        } else {
            self.timeout.map(FetchTimeout::from).unwrap_or_default()
        }
    }

    /// Token parse options derived from the configured keys and checks
    pub fn parse_options(&self) -> Result<Vec<ParseOption>, TokenError> {
        let mut options = self
            .keys
            .iter()
            .map(|key| key.to_verifying_key().map(ParseOption::Key))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(skew) = self.acceptable_skew {
            options.push(ParseOption::AcceptableSkew(skew));
        }
        if !self.validate {
            options.push(ParseOption::Validate(false));
        }
        Ok(options)
    }

    /// Build fetcher options; the FQDN stays empty if unset and is
    /// rejected by [`crate::Fetcher::new`].
    pub fn to_options(&self) -> crate::Result<FetcherOptions> {
        let mut options = FetcherOptions::new(self.fqdn.clone().unwrap_or_default())
            .timeout(self.timeout())
            .parse_options(self.parse_options()?);

        if !self.nameservers.is_empty() {
            options = options.resolver(Arc::new(SystemResolver::with_nameservers(
                self.nameservers.clone(),
            )));
        }
        Ok(options)
    }
}

/// Settings for creating a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Longest frame, 1-254
    pub max_line_length: usize,

    /// Largest total record, 1-65270
    pub max_size: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl RecordConfig {
    pub fn to_options(&self) -> RecordOptions {
        RecordOptions::new(self.max_line_length, self.max_size)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(fqdn) = &self.fetch.fqdn {
            if fqdn.trim().is_empty() {
                return Err(Error::InvalidInput("fetch.fqdn is empty".into()));
            }
        }

        if self.fetch.disable_timeout && self.fetch.timeout.is_some() {
            return Err(Error::InvalidInput(
                "fetch.timeout and fetch.disable_timeout are mutually exclusive".into(),
            ));
        }

        for key in &self.fetch.keys {
            key.to_verifying_key()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.timeout(), FetchTimeout::Default);
        assert!(config.fetch.validate);
        assert_eq!(config.record.to_options(), RecordOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [fetch]
            fqdn = "fqdn.example.org"
            timeout = "200ms"
            nameservers = ["127.0.0.1:5353"]
            acceptable_skew = "1m"
            validate = false

            [[fetch.keys]]
            alg = "EdDSA"
            public_key = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
            kid = "k1"

            [record]
            max_line_length = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.fetch.fqdn.as_deref(), Some("fqdn.example.org"));
        assert_eq!(
            config.fetch.timeout(),
            FetchTimeout::After(Duration::from_millis(200))
        );
        assert_eq!(config.fetch.nameservers.len(), 1);
        assert_eq!(config.fetch.keys[0].alg, Algorithm::EdDsa);
        assert_eq!(config.record.max_line_length, 10);
        assert_eq!(config.record.max_size, DEFAULT_MAX_SIZE);
        assert!(config.validate().is_ok());

        let options = config.fetch.parse_options().unwrap();
        assert_eq!(options.len(), 3);

        let options = config.fetch.to_options().unwrap();
        assert!(options.resolver.is_some());
        assert_eq!(options.fqdn, "fqdn.example.org");
    }

    #[test]
    fn test_timeout_settings() {
        let mut fetch = FetchConfig::default();
        fetch.timeout = Some(Duration::ZERO);
        assert_eq!(fetch.timeout(), FetchTimeout::Default);

        fetch.timeout = None;
        fetch.disable_timeout = true;
        assert_eq!(fetch.timeout(), FetchTimeout::Disabled);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.fetch.fqdn = Some(" ".into());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.disable_timeout = true;
        config.fetch.timeout = Some(Duration::from_secs(1));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.keys.push(KeyConfig {
            alg: Algorithm::Es256,
            public_key: "not base64!".into(),
            kid: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_durations_readable() {
        let mut config = Config::default();
        config.fetch.timeout = Some(Duration::from_secs(5));

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("timeout = \"5s\""));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.fetch.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_to_file_and_from_file() {
        let mut config = Config::default();
        config.fetch.fqdn = Some("fqdn.example.org".into());
        config.fetch.acceptable_skew = Some(Duration::from_secs(30));
        config.record.max_line_length = 64;

        let path = std::env::temp_dir().join(format!("dnstxtjwt-config-{}.toml", std::process::id()));
        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path);
        let _ = std::fs::remove_file(&path);

        let loaded = loaded.unwrap();
        assert_eq!(loaded.fetch.fqdn.as_deref(), Some("fqdn.example.org"));
        assert_eq!(loaded.fetch.acceptable_skew, Some(Duration::from_secs(30)));
        assert_eq!(loaded.record, config.record);
        assert!(loaded.validate().is_ok());

        assert!(Config::from_file(&path).is_err());
    }
}
