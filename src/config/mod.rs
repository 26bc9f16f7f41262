//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `LADDER_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::background::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::cache::MokaAnswerCache;
use crate::constants::{ENTITY_TTL, LEADERBOARD_TTL, RANK_TTL};
use crate::lock::KeyedLocks;
use crate::service::{DEFAULT_CACHE_TIMEOUT, DEFAULT_STORE_TIMEOUT, ServiceConfig};

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `LADDER_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Snapshot file for the score store. `None` keeps scores in memory only.
    pub snapshot_path: Option<PathBuf>,

    /// Max entries in the answer cache. Default: `100_000`.
    pub cache_capacity: u64,

    pub entity_ttl: Duration,
    pub rank_ttl: Duration,
    pub leaderboard_ttl: Duration,

    /// Deadline for each score store call. Default: 2s.
    pub store_timeout: Duration,

    /// Deadline for each answer cache call. Default: 250ms.
    pub cache_timeout: Duration,

    pub lock_shards: usize,
    pub queue_capacity: usize,
    pub queue_workers: usize,

    /// Correct ranks of ties split across a page boundary. Default: `true`.
    pub exact_page_boundaries: bool,

    /// Demo entities inserted at startup. Default: `0`.
    pub seed_entities: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            snapshot_path: None,
            cache_capacity: MokaAnswerCache::DEFAULT_CAPACITY,
            entity_ttl: ENTITY_TTL,
            rank_ttl: RANK_TTL,
            leaderboard_ttl: LEADERBOARD_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            lock_shards: KeyedLocks::DEFAULT_SHARDS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_workers: DEFAULT_WORKERS,
            exact_page_boundaries: true,
            seed_entities: 0,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "LADDER_PORT";
    const ENV_BIND_ADDR: &'static str = "LADDER_BIND_ADDR";
    const ENV_SNAPSHOT_PATH: &'static str = "LADDER_SNAPSHOT_PATH";
    const ENV_CACHE_CAPACITY: &'static str = "LADDER_CACHE_CAPACITY";
    const ENV_ENTITY_TTL_SECS: &'static str = "LADDER_ENTITY_TTL_SECS";
    const ENV_RANK_TTL_SECS: &'static str = "LADDER_RANK_TTL_SECS";
    const ENV_LEADERBOARD_TTL_SECS: &'static str = "LADDER_LEADERBOARD_TTL_SECS";
    const ENV_STORE_TIMEOUT_MS: &'static str = "LADDER_STORE_TIMEOUT_MS";
    const ENV_CACHE_TIMEOUT_MS: &'static str = "LADDER_CACHE_TIMEOUT_MS";
    const ENV_LOCK_SHARDS: &'static str = "LADDER_LOCK_SHARDS";
    const ENV_QUEUE_CAPACITY: &'static str = "LADDER_QUEUE_CAPACITY";
    const ENV_QUEUE_WORKERS: &'static str = "LADDER_QUEUE_WORKERS";
    const ENV_EXACT_PAGE_BOUNDARIES: &'static str = "LADDER_EXACT_PAGE_BOUNDARIES";
    const ENV_SEED_ENTITIES: &'static str = "LADDER_SEED_ENTITIES";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            snapshot_path: Self::parse_optional_path_from_env(Self::ENV_SNAPSHOT_PATH),
            cache_capacity: Self::parse_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
            entity_ttl: Self::parse_secs_from_env(Self::ENV_ENTITY_TTL_SECS, defaults.entity_ttl)?,
            rank_ttl: Self::parse_secs_from_env(Self::ENV_RANK_TTL_SECS, defaults.rank_ttl)?,
            leaderboard_ttl: Self::parse_secs_from_env(
                Self::ENV_LEADERBOARD_TTL_SECS,
                defaults.leaderboard_ttl,
            )?,
            store_timeout: Self::parse_millis_from_env(
                Self::ENV_STORE_TIMEOUT_MS,
                defaults.store_timeout,
            )?,
            cache_timeout: Self::parse_millis_from_env(
                Self::ENV_CACHE_TIMEOUT_MS,
                defaults.cache_timeout,
            )?,
            lock_shards: Self::parse_from_env(Self::ENV_LOCK_SHARDS, defaults.lock_shards)?,
            queue_capacity: Self::parse_from_env(
                Self::ENV_QUEUE_CAPACITY,
                defaults.queue_capacity,
            )?,
            queue_workers: Self::parse_from_env(Self::ENV_QUEUE_WORKERS, defaults.queue_workers)?,
            exact_page_boundaries: Self::parse_bool_from_env(
                Self::ENV_EXACT_PAGE_BOUNDARIES,
                defaults.exact_page_boundaries,
            )?,
            seed_entities: Self::parse_from_env(Self::ENV_SEED_ENTITIES, defaults.seed_entities)?,
        })
    }

    /// Validates basic invariants (does not touch the snapshot file).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            (Self::ENV_CACHE_CAPACITY, self.cache_capacity == 0),
            (Self::ENV_LOCK_SHARDS, self.lock_shards == 0),
            (Self::ENV_QUEUE_CAPACITY, self.queue_capacity == 0),
            (Self::ENV_QUEUE_WORKERS, self.queue_workers == 0),
            (Self::ENV_STORE_TIMEOUT_MS, self.store_timeout.is_zero()),
            (Self::ENV_CACHE_TIMEOUT_MS, self.cache_timeout.is_zero()),
        ];
        if let Some((name, _)) = positive.into_iter().find(|(_, zero)| *zero) {
            return Err(ConfigError::ZeroValue { name });
        }

        if let Some(ref path) = self.snapshot_path
            && path.is_dir()
        {
            return Err(ConfigError::IsADirectory { path: path.clone() });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Rank service tunables derived from this configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            entity_ttl: self.entity_ttl,
            rank_ttl: self.rank_ttl,
            leaderboard_ttl: self.leaderboard_ttl,
            store_timeout: self.store_timeout,
            cache_timeout: self.cache_timeout,
            lock_shards: self.lock_shards,
            queue_capacity: self.queue_capacity,
            queue_workers: self.queue_workers,
            exact_page_boundaries: self.exact_page_boundaries,
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        Self::parse_from_env(var_name, default.as_secs()).map(Duration::from_secs)
    }

    fn parse_millis_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        Self::parse_from_env(var_name, default.as_millis() as u64).map(Duration::from_millis)
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                    reason: "expected true or false".to_string(),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}
