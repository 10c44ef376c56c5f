//! Configuration file loading for swarm-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SWARM_`-prefixed environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./swarm.toml` or `./.swarm.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/swarm-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBudgetConfig, FileCacheConfig, FileConfig, FileCouncilConfig,
    FileGatewayConfig, FileHealthConfig, FileMissionConfig, FileOutputConfig, FileOutputFormat,
    FileRetryConfig, FileStorageConfig, FileSupervisorConfig, FileTelemetryConfig,
    GatewayProvider,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
