/*!
 * Wait Map Shard Sizing
 *
 * CPU-aware shard counts for the engine's concurrent wait map. Power-of-2
 * counts keep dashmap's shard selection a bitwise AND.
 */

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

static CPU_COUNT: OnceLock<usize> = OnceLock::new();

/// Detected parallelism, computed once
pub fn cpu_count() -> usize {
    *CPU_COUNT.get_or_init(|| {
        let count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|_| {
                tracing::warn!("Failed to detect CPU count, defaulting to 8");
                8
            });
        tracing::debug!(cpus = count, "shard sizing initialized");
        count
    })
}

/// How many threads are expected to race on one lock namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadProfile {
    /// Hundreds of local threads per namespace: 4x CPU shards
    HighContention,
    /// A handful of threads per core: 2x CPU shards
    MediumContention,
    /// Few local waiters (the common case for a lock): 1x CPU shards
    #[default]
    LowContention,
}

impl WorkloadProfile {
    /// Shard count for this profile, a power of two in `[4, 256]`
    pub fn shards(self) -> usize {
        let multiplier = match self {
            WorkloadProfile::HighContention => 4,
            WorkloadProfile::MediumContention => 2,
            WorkloadProfile::LowContention => 1,
        };
        (cpu_count() * multiplier).next_power_of_two().clamp(4, 256)
    }
}

impl FromStr for WorkloadProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "high_contention" => Ok(WorkloadProfile::HighContention),
            "medium" | "medium_contention" => Ok(WorkloadProfile::MediumContention),
            "low" | "low_contention" => Ok(WorkloadProfile::LowContention),
            other => Err(format!("unknown workload profile: {}", other)),
        }
    }
}
