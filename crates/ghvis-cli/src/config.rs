//! Runtime configuration.
//!
//! Settings come from `GHVIS_*` environment variables, with a few values
//! overridable by global command-line flags.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use ghvis_core::error::ConfigError;
use ghvis_core::ratelimit::DEFAULT_MAX_REQUESTS;
use ghvis_core::{ApiUrl, BatchPolicy, TenantId};

pub const ENCRYPTION_KEY: &str = "GHVIS_ENCRYPTION_KEY";
pub const DATA_DIR: &str = "GHVIS_DATA_DIR";
pub const API_BASE: &str = "GHVIS_API_BASE";
pub const ADMIN_IDS: &str = "GHVIS_ADMIN_IDS";
pub const USER: &str = "GHVIS_USER";
pub const MAX_REQUESTS_PER_MINUTE: &str = "GHVIS_MAX_REQUESTS_PER_MINUTE";
pub const BATCH_MAX: &str = "GHVIS_BATCH_MAX";
pub const BATCH_CONCURRENCY: &str = "GHVIS_BATCH_CONCURRENCY";
pub const BATCH_PACING_MS: &str = "GHVIS_BATCH_PACING_MS";

/// Resolved configuration for one invocation.
#[derive(Clone)]
pub struct Settings {
    pub encryption_key: String,
    pub data_dir: PathBuf,
    pub api_base: ApiUrl,
    pub admin_ids: Vec<TenantId>,
    pub default_user: Option<TenantId>,
    pub max_requests_per_minute: usize,
    pub batch: BatchPolicy,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through `lookup`, which returns the value of a variable.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let encryption_key = get(ENCRYPTION_KEY).ok_or(ConfigError::Missing {
            name: ENCRYPTION_KEY,
        })?;

        let data_dir = match get(DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let api_base = match get(API_BASE) {
            Some(url) => parse_api_base(&url)?,
            None => ApiUrl::github(),
        };

        let admin_ids = match get(ADMIN_IDS) {
            Some(ids) => parse_admin_ids(&ids)?,
            None => Vec::new(),
        };

        let default_user = get(USER)
            .map(|id| {
                id.parse::<TenantId>().map_err(|e| ConfigError::Invalid {
                    name: USER,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let defaults = BatchPolicy::default();
        let batch = BatchPolicy {
            max_repositories: parse_number(get(BATCH_MAX), BATCH_MAX)?
                .unwrap_or(defaults.max_repositories),
            max_concurrent: parse_number(get(BATCH_CONCURRENCY), BATCH_CONCURRENCY)?
                .unwrap_or(defaults.max_concurrent),
            pacing: parse_number(get(BATCH_PACING_MS), BATCH_PACING_MS)?
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(defaults.pacing),
        };

        let max_requests_per_minute =
            parse_number(get(MAX_REQUESTS_PER_MINUTE), MAX_REQUESTS_PER_MINUTE)?
                .unwrap_or(DEFAULT_MAX_REQUESTS);

        Ok(Self {
            encryption_key,
            data_dir,
            api_base,
            admin_ids,
            default_user,
            max_requests_per_minute,
            batch,
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        api_base: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(url) = api_base {
            self.api_base = parse_api_base(url)?;
        }
        Ok(self)
    }

    pub fn is_admin(&self, tenant: TenantId) -> bool {
        self.admin_ids.contains(&tenant)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("encryption_key", &"[REDACTED]")
            .field("data_dir", &self.data_dir)
            .field("api_base", &self.api_base.as_str())
            .field("admin_ids", &self.admin_ids)
            .field("default_user", &self.default_user)
            .field("max_requests_per_minute", &self.max_requests_per_minute)
            .field("batch", &self.batch)
            .finish()
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("", "", "ghvis")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::Missing { name: DATA_DIR })
}

fn parse_api_base(url: &str) -> Result<ApiUrl, ConfigError> {
    ApiUrl::new(url.trim()).map_err(|e| ConfigError::Invalid {
        name: API_BASE,
        reason: e.to_string(),
    })
}

fn parse_admin_ids(ids: &str) -> Result<Vec<TenantId>, ConfigError> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<TenantId>().map_err(|_| ConfigError::Invalid {
                name: ADMIN_IDS,
                reason: format!("'{}' is not a user id", id),
            })
        })
        .collect()
}

fn parse_number(value: Option<String>, name: &'static str) -> Result<Option<usize>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse::<usize>().map_err(|_| ConfigError::Invalid {
                name,
                reason: format!("'{}' is not a non-negative integer", v),
            })
        })
        .transpose()
}
