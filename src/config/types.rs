// Configuration types
// Sections of the site configuration file and their defaults

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::site::{SiteData, StaticMount};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub site: SiteConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    /// `0` selects the default port
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: crate::server::DEFAULT_PORT,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// combined, common, json, or a custom `$variable` pattern
    pub access_log_format: String,
    /// stdout if not set
    pub access_log_file: Option<String>,
    /// stderr if not set
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Connection tuning, in seconds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub enable_cors: bool,
    pub max_body_size: u64,
    /// Tried in order for directory requests under static mounts
    pub index_files: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enable_cors: false,
            max_body_size: 10_485_760, // 10MB
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
        }
    }
}

/// Site metadata and content
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Output directory for `build`
    pub build_dir: PathBuf,
    pub pages: Vec<PageEntry>,
    pub aliases: Vec<AliasEntry>,
    pub statics: Vec<StaticMount>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            url: String::new(),
            build_dir: PathBuf::from("public"),
            pages: Vec::new(),
            aliases: Vec::new(),
            statics: Vec::new(),
        }
    }
}

impl SiteConfig {
    pub fn data(&self) -> SiteData {
        SiteData {
            title: self.title.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
        }
    }
}

/// A page rendered from a file on disk
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub pattern: String,
    pub file: PathBuf,
}

/// An extra URL for an existing page
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    pub pattern: String,
}
