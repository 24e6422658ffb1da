//! Common test utilities for nayade-harvest integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use nayade_harvest::{HarvestConfig, RetryConfig};
use std::time::Duration;

/// Config pointed at a mock portal, with short retry delays
#[allow(dead_code)]
pub fn test_config(server_uri: &str, first: u32, last: u32, workers: usize) -> HarvestConfig {
    HarvestConfig {
        base_url: format!("{}/zona", server_uri),
        first_code: first,
        last_code: last,
        workers,
        request_timeout: Duration::from_secs(5),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 1.0,
            jitter: false,
        },
        ..Default::default()
    }
}
