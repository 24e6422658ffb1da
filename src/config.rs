//! Configuration types for nayade-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Public Náyade endpoint serving one bathing zone per `codZona`
pub const DEFAULT_BASE_URL: &str =
    "https://nayadeciudadano.sanidad.gob.es/Splayas/ciudadano/ciudadanoVerZonaAction.do";

/// Highest zone code published by the portal
pub const MAX_ZONE_CODE: u32 = 1990;

/// Owner written for sample points without a crowd-sourced attribution
pub const DEFAULT_OWNER: &str = "nayade-harvest";

/// Main configuration for a harvest run
///
/// Resolved once before the run begins; the core never re-reads it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Portal endpoint; zone queries are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of parallel workers, one per slice (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// First zone code to harvest, inclusive (default: 1)
    #[serde(default = "default_first_code")]
    pub first_code: u32,

    /// Last zone code to harvest, inclusive (default: 1990)
    #[serde(default = "default_last_code")]
    pub last_code: u32,

    /// Owner used when the attribution snapshot has no entry for a point
    #[serde(default = "default_owner")]
    pub default_owner: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retry policy for page fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// Where the binary reads the snapshot and writes the payloads
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            workers: default_workers(),
            first_code: default_first_code(),
            last_code: default_last_code(),
            default_owner: default_owner(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Load a configuration from a JSON file, filling missing fields with defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Number of zone codes in the configured range
    pub fn total_codes(&self) -> u32 {
        self.last_code.saturating_sub(self.first_code) + 1
    }

    /// Check the configuration for values the harvester cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::config("at least one worker is required", "workers"));
        }
        if self.first_code == 0 {
            return Err(Error::config("zone codes start at 1", "first_code"));
        }
        if self.first_code > self.last_code {
            return Err(Error::config(
                format!(
                    "first_code ({}) is greater than last_code ({})",
                    self.first_code, self.last_code
                ),
                "first_code",
            ));
        }
        if self.last_code > MAX_ZONE_CODE {
            return Err(Error::config(
                format!(
                    "last_code ({}) is above the highest zone code ({})",
                    self.last_code, MAX_ZONE_CODE
                ),
                "last_code",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "at least one attempt per request is required",
                "retry.max_attempts",
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::config(
                format!("backoff multiplier must be a finite number >= 1.0, got {}", multiplier),
                "retry.backoff_multiplier",
            ));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("invalid base URL: {}", e), "base_url"))?;
        Ok(())
    }
}

/// Retry configuration for page fetches
///
/// The defaults reproduce the portal-friendly policy: five attempts in total,
/// a fixed ten second pause between them, no jitter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts per request, first one included (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 10 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Upper bound for the delay between retries (default: 10 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry (default: 1.0, fixed delay)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_retry_delay(),
            max_delay: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// File locations used by the binary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Latest measurement per sample point
    #[serde(default = "default_latest_path")]
    pub latest: PathBuf,

    /// Every measurement per sample point
    #[serde(default = "default_history_path")]
    pub history: PathBuf,

    /// Zone codes that could not be processed
    #[serde(default = "default_log_path")]
    pub log: PathBuf,

    /// Prior output carrying crowd-sourced owners
    #[serde(default = "default_attribution_path")]
    pub attribution: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            latest: default_latest_path(),
            history: default_history_path(),
            log: default_log_path(),
            attribution: default_attribution_path(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_workers() -> usize {
    4
}

fn default_first_code() -> u32 {
    1
}

fn default_last_code() -> u32 {
    MAX_ZONE_CODE
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("nayade-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_latest_path() -> PathBuf {
    PathBuf::from("ultimas.csv")
}

fn default_history_path() -> PathBuf {
    PathBuf::from("historico.csv")
}

fn default_log_path() -> PathBuf {
    PathBuf::from("log.txt")
}

fn default_attribution_path() -> PathBuf {
    PathBuf::from("crowdsourcing.csv")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
