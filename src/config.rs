//! Environment-based configuration types for the appauth server runtime settings.

use anyhow::Result;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::oauth::token_authority::TokenSettings;

/// HTTP server port configuration
#[derive(Clone, Debug)]
pub struct HttpPort(u16);

/// Access token lifetime configuration
#[derive(Clone, Debug)]
pub struct AccessTokenTtl(chrono::Duration);

/// Refresh token lifetime configuration
#[derive(Clone, Debug)]
pub struct RefreshTokenTtl(chrono::Duration);

/// Whether token grants include a refresh token
#[derive(Clone, Debug)]
pub struct IssueRefreshTokens(bool);

/// Period of the expired-token sweep
#[derive(Clone, Debug)]
pub struct SweepInterval(Duration);

/// Main application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub access_token_ttl: AccessTokenTtl,
    pub refresh_token_ttl: RefreshTokenTtl,
    pub issue_refresh_tokens: IssueRefreshTokens,
    pub token_sweep_interval: SweepInterval,
    pub client_domain: String,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_env = |name: &str, default_value: &str| {
            lookup(name).unwrap_or_else(|| default_value.to_string())
        };

        let http_port: HttpPort = default_env("HTTP_PORT", "9096").try_into()?;
        let access_token_ttl: AccessTokenTtl =
            default_env("ACCESS_TOKEN_TTL", "1h").try_into()?;
        let refresh_token_ttl: RefreshTokenTtl =
            default_env("REFRESH_TOKEN_TTL", "72h").try_into()?;
        let issue_refresh_tokens: IssueRefreshTokens =
            default_env("ISSUE_REFRESH_TOKENS", "true").try_into()?;
        let token_sweep_interval: SweepInterval =
            default_env("TOKEN_SWEEP_INTERVAL", "5m").try_into()?;
        let client_domain = default_env("CLIENT_DOMAIN", "http://localhost:9094");

        if refresh_token_ttl.0 <= access_token_ttl.0 {
            return Err(ConfigError::TokenLifetimeOrdering {
                access: access_token_ttl.0.num_seconds(),
                refresh: refresh_token_ttl.0.num_seconds(),
            }
            .into());
        }

        Ok(Self {
            version: version()?,
            http_port,
            access_token_ttl,
            refresh_token_ttl,
            issue_refresh_tokens,
            token_sweep_interval,
            client_domain,
        })
    }

    /// Token lifetimes for the token authority.
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_token_ttl: self.access_token_ttl.0,
            refresh_token_ttl: self.issue_refresh_tokens.0.then_some(self.refresh_token_ttl.0),
        }
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn parse_duration(name: &str, value: String) -> Result<Duration, ConfigError> {
    let duration = duration_str::parse(&value)
        .map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))?;
    if duration.is_zero() {
        return Err(ConfigError::NonPositiveDuration(name.to_string()));
    }
    Ok(duration)
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(9096))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<String> for AccessTokenTtl {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let duration = parse_duration("ACCESS_TOKEN_TTL", value)?;
        Ok(Self(chrono::Duration::from_std(duration)?))
    }
}

impl AsRef<chrono::Duration> for AccessTokenTtl {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for RefreshTokenTtl {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let duration = parse_duration("REFRESH_TOKEN_TTL", value)?;
        Ok(Self(chrono::Duration::from_std(duration)?))
    }
}

impl AsRef<chrono::Duration> for RefreshTokenTtl {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl TryFrom<String> for IssueRefreshTokens {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" => Ok(Self(false)),
            _ => Err(ConfigError::BoolParsingFailed(value).into()),
        }
    }
}

impl AsRef<bool> for IssueRefreshTokens {
    fn as_ref(&self) -> &bool {
        &self.0
    }
}

impl TryFrom<String> for SweepInterval {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self(parse_duration("TOKEN_SWEEP_INTERVAL", value)?))
    }
}

impl AsRef<Duration> for SweepInterval {
    fn as_ref(&self) -> &Duration {
        &self.0
    }
}
