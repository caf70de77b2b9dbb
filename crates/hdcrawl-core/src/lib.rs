pub mod app_config;
pub mod config;
pub mod products;
pub mod requests;
pub mod stores;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    BrowseScope, PageLayout, ProductRow, ResultSet, ScrapeRequest, StoreId, NO_ITEMS_ON_DISPLAY,
};
pub use requests::{load_requests, RequestsFile};
pub use stores::{load_stores, BrandAliases, StoreDirectory, StoreLocation, StoresFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
