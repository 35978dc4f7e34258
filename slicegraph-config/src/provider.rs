//! Configuration provider using Figment

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, trace};

use crate::discovery::{ConfigFile, ConfigFormat, FileDiscovery};
use crate::types::SlicegraphConfig;
use crate::ConfigResult;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SLICEGRAPH_";

/// Loads configuration from every source, later sources overriding earlier
/// ones:
/// 1. defaults
/// 2. global and project configuration files
/// 3. `SLICEGRAPH_` environment variables, `__` separating nested keys
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Load and validate the configuration.
    pub fn load(&self) -> ConfigResult<SlicegraphConfig> {
        let config: SlicegraphConfig = self.build_figment().extract()?;
        config.validate()?;
        debug!(
            type_prefix = %config.type_prefix,
            normalize_images = config.images.normalize,
            "loaded configuration"
        );
        Ok(config)
    }

    fn build_figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SlicegraphConfig::default()));
        for file in self.discovery.discover_all() {
            figment = figment.merge(load_config_file(&file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

fn load_config_file(file: &ConfigFile) -> Figment {
    trace!("Loading config file: {} ({:?})", file.path.display(), file.format);
    match file.format {
        ConfigFormat::Toml => Figment::from(Toml::file(&file.path)),
        ConfigFormat::Yaml => Figment::from(Yaml::file(&file.path)),
        ConfigFormat::Json => Figment::from(Json::file(&file.path)),
    }
}
