/*!
 * Core Module
 * Errors, limits and configuration shared by every component
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod shards;

// Re-export for convenience
pub use config::EngineConfig;
pub use errors::{LockError, LockResult};
pub use shards::WorkloadProfile;
