// Configuration module entry point
// Loads the site configuration file and turns it into a page registry

mod types;

use std::path::Path;
use std::sync::Arc;

pub use types::{
    AliasEntry, Config, HttpConfig, LoggingConfig, PageEntry, PerformanceConfig, ServerConfig,
    SiteConfig,
};

use crate::error::SiteError;
use crate::page::FilePage;
use crate::site::SiteRegistry;

impl Config {
    /// Load configuration from a file (format picked by extension), then
    /// `SITE_` environment variables, e.g. `SITE_SERVER__PORT=3000`.
    /// A missing file leaves every value at its default.
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::from(config_path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SITE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

impl SiteConfig {
    /// Registry holding one file-backed page per `pages` entry, the
    /// configured aliases and static mounts
    pub fn registry(&self) -> Result<SiteRegistry, SiteError> {
        let mut registry = SiteRegistry::new(self.data());
        for entry in &self.pages {
            registry.add_page(&entry.pattern, Arc::new(FilePage::new(&entry.file)))?;
        }
        for entry in &self.aliases {
            registry.add_alias(&entry.alias, &entry.pattern);
        }
        registry.set_static(self.statics.clone());
        Ok(registry)
    }
}
