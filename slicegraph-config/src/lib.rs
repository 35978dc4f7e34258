//! Layered configuration for slicegraph
//!
//! Defaults, then `~/.slicegraph/slicegraph.*`, then `./.slicegraph/slicegraph.*`,
//! then `SLICEGRAPH_*` environment variables. Configuration is read fresh on
//! every load.

pub mod discovery;
pub mod error;
pub mod provider;
pub mod types;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::ConfigError;
pub use provider::{ConfigProvider, ENV_PREFIX};
pub use types::{
    validate_type_prefix, FieldNameStyle, ImageSettings, SlicegraphConfig,
    DEFAULT_MAX_CONCURRENT_DOWNLOADS,
};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load configuration from the current directory, home directory and
/// environment.
pub fn load_config() -> ConfigResult<SlicegraphConfig> {
    ConfigProvider::new().load()
}
