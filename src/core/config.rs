/*!
 * Engine Configuration
 *
 * Runtime configuration for a lock ordering engine
 */

use super::limits::{DEFAULT_WAIT_TIMEOUT, INTERACTIVE_WAIT_TIMEOUT};
use super::shards::WorkloadProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable selecting the wait map shard profile
pub const ENV_SHARD_PROFILE: &str = "LOCK_ORDER_SHARD_PROFILE";

/// Environment variable setting the default wait timeout in milliseconds (0 = none)
pub const ENV_WAIT_TIMEOUT_MS: &str = "LOCK_ORDER_WAIT_TIMEOUT_MS";

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Expected local contention, drives wait map sharding
    pub shard_profile: WorkloadProfile,
    /// Timeout applied by `wait_turn` when the caller passes none
    pub wait_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shard_profile: WorkloadProfile::LowContention,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Many local threads racing on the same namespace
    pub const fn contended() -> Self {
        Self {
            shard_profile: WorkloadProfile::HighContention,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// Bounded waits for request-driven callers
    pub const fn interactive() -> Self {
        Self {
            shard_profile: WorkloadProfile::LowContention,
            wait_timeout: Some(INTERACTIVE_WAIT_TIMEOUT),
        }
    }

    /// Defaults overridden by `LOCK_ORDER_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_SHARD_PROFILE) {
            match raw.parse() {
                Ok(profile) => self.shard_profile = profile,
                Err(e) => tracing::warn!(var = ENV_SHARD_PROFILE, error = %e, "ignoring override"),
            }
        }

        if let Some(raw) = lookup(ENV_WAIT_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.wait_timeout = None,
                Ok(ms) => self.wait_timeout = Some(Duration::from_millis(ms)),
                Err(e) => tracing::warn!(var = ENV_WAIT_TIMEOUT_MS, error = %e, "ignoring override"),
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_applied() {
        let config = EngineConfig::default().with_overrides(lookup(&[
            (ENV_SHARD_PROFILE, "high"),
            (ENV_WAIT_TIMEOUT_MS, "250"),
        ]));

        assert_eq!(config.shard_profile, WorkloadProfile::HighContention);
        assert_eq!(config.wait_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let config = EngineConfig::interactive().with_overrides(lookup(&[(ENV_WAIT_TIMEOUT_MS, "0")]));
        assert_eq!(config.wait_timeout, None);
    }

    #[test]
    fn test_bad_overrides_ignored() {
        let config = EngineConfig::contended().with_overrides(lookup(&[
            (ENV_SHARD_PROFILE, "ludicrous"),
            (ENV_WAIT_TIMEOUT_MS, "soon"),
        ]));
        assert_eq!(config, EngineConfig::contended());
    }
}
