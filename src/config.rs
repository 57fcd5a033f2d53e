//! Configuration for [`crate::service::ConsistencyService`].
//!
//! Cache TTL, jitter mode, disable window, and re-enable delay are all
//! fields of [`ConsistencyConfig`], buildable either through
//! [`ConsistencyConfig::builder`] or by parsing a TOML document with
//! [`ConsistencyConfig::from_toml`].
//!
//! Logging is not a config field: every best-effort failure site in
//! [`crate::service`] logs through the ambient `tracing` subscriber via
//! `tracing::warn!` directly.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The cache TTL applied to a value entry, in seconds.
pub const DEFAULT_CACHE_EXPIRE_SECONDS: u64 = 60;
/// The initial TTL applied to a disable entry on `Disable`, in seconds.
pub const DEFAULT_DISABLE_EXPIRE_SECONDS: u64 = 10;
/// The shortened TTL applied to a disable entry on `Enable`, in milliseconds.
pub const DEFAULT_ENABLE_DELAY_MILLIS: u64 = 1000;

/// Configuration for a [`crate::service::ConsistencyService`].
///
/// # Examples
///
/// ```
/// use concache::config::ConsistencyConfig;
///
/// let config = ConsistencyConfig::builder()
///     .cache_expire_seconds(120)
///     .cache_expire_random_mode(true)
///     .build();
/// assert_eq!(config.cache_expire_seconds, 120);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(build_fn(skip, error = std::convert::Infallible))]
#[serde(default)]
pub struct ConsistencyConfig {
    /// TTL, in seconds, of the value entry written by `put_if_enabled`.
    ///
    /// When [`cache_expire_random_mode`](Self::cache_expire_random_mode) is
    /// set, the *effective* TTL used for any individual install is sampled
    /// uniformly from `[cache_expire_seconds, 2 * cache_expire_seconds]`
    /// instead; see [`ConsistencyConfig::effective_cache_expire_seconds`].
    pub cache_expire_seconds: u64,
    /// Enables `[1x, 2x]` jitter on the cache TTL to avoid synchronized mass
    /// expiry across many keys written around the same time.
    pub cache_expire_random_mode: bool,
    /// Initial TTL, in seconds, applied to the disable entry by `Disable`.
    pub disable_expire_seconds: u64,
    /// TTL, in milliseconds, the deferred re-enable task shortens the
    /// disable entry's remaining lifetime to.
    pub enable_delay_millis: u64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            cache_expire_seconds: DEFAULT_CACHE_EXPIRE_SECONDS,
            cache_expire_random_mode: false,
            disable_expire_seconds: DEFAULT_DISABLE_EXPIRE_SECONDS,
            enable_delay_millis: DEFAULT_ENABLE_DELAY_MILLIS,
        }
    }
}

/// An error parsing a [`ConsistencyConfig`] from TOML.
#[derive(Debug, Error)]
#[error("failed to parse consistency cache config: {0}")]
pub struct ConfigParseError(#[from] toml::de::Error);

impl ConsistencyConfig {
    /// Creates a new [`ConsistencyConfigBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use concache::config::ConsistencyConfig;
    ///
    /// let config = ConsistencyConfig::builder().build();
    /// assert_eq!(config, ConsistencyConfig::default());
    /// ```
    #[must_use]
    pub fn builder() -> ConsistencyConfigBuilder {
        ConsistencyConfigBuilder::default()
    }

    /// Parses a [`ConsistencyConfig`] from a TOML document.
    ///
    /// Any field absent from `toml_content` falls back to its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigParseError`] if `toml_content` isn't valid TOML or
    /// doesn't match the shape of [`ConsistencyConfig`].
    ///
    /// # Examples
    ///
    /// ```
    /// use concache::config::ConsistencyConfig;
    ///
    /// let config = ConsistencyConfig::from_toml("cache_expire_seconds = 120").unwrap();
    /// assert_eq!(config.cache_expire_seconds, 120);
    /// ```
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigParseError> {
        let config: Self = toml::from_str(toml_content)?;
        Ok(config)
    }

    /// The disable-window duration, as a [`Duration`].
    #[must_use]
    pub fn disable_window(&self) -> Duration {
        Duration::from_secs(self.disable_expire_seconds)
    }

    /// The re-enable delay, as a [`Duration`].
    #[must_use]
    pub fn enable_delay(&self) -> Duration {
        Duration::from_millis(self.enable_delay_millis)
    }

    /// The cache TTL to use for the *next* `put_if_enabled` call.
    ///
    /// Fixed at [`cache_expire_seconds`](Self::cache_expire_seconds) unless
    /// [`cache_expire_random_mode`](Self::cache_expire_random_mode) is
    /// enabled, in which case it's drawn uniformly from
    /// `[cache_expire_seconds, 2 * cache_expire_seconds]` using the
    /// thread-local RNG, which avoids contention on a single shared
    /// generator without needing an RNG field on this struct.
    #[must_use]
    pub fn effective_cache_expire_seconds(&self) -> u64 {
        if self.cache_expire_random_mode {
            rand::Rng::random_range(&mut rand::rng(), self.cache_expire_seconds..=2 * self.cache_expire_seconds)
        } else {
            self.cache_expire_seconds
        }
    }
}

impl ConsistencyConfigBuilder {
    /// Builds the configuration, applying documented defaults for any field
    /// left unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use concache::config::ConsistencyConfig;
    ///
    /// let config = ConsistencyConfig::builder().disable_expire_seconds(5).build();
    /// assert_eq!(config.disable_expire_seconds, 5);
    /// assert_eq!(config.cache_expire_seconds, 60);
    /// ```
    #[must_use]
    pub fn build(&self) -> ConsistencyConfig {
        let defaults = ConsistencyConfig::default();
        ConsistencyConfig {
            cache_expire_seconds: self.cache_expire_seconds.unwrap_or(defaults.cache_expire_seconds),
            cache_expire_random_mode: self
                .cache_expire_random_mode
                .unwrap_or(defaults.cache_expire_random_mode),
            disable_expire_seconds: self
                .disable_expire_seconds
                .unwrap_or(defaults.disable_expire_seconds),
            enable_delay_millis: self.enable_delay_millis.unwrap_or(defaults.enable_delay_millis),
        }
    }
}
