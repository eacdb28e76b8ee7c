//! Configuration file loading for agent-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `RELAY_`-prefixed environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./relay.toml` or `./.relay.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-relay/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    AgentKind, ClassifierKind, ExternalKind, FileAgentEntry, FileCatalogConfig, FileConfig,
    FileDirectoryConfig, FileDispatchConfig, FileExternalAgent, FileJobConfig, FileLoggingConfig,
    FileNoveltyConfig, FileProviderConfig, FileSchedulerConfig, FileSelectionConfig,
    FileServerConfig,
};
pub use loader::ConfigLoader;
