use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::products::StoreId;
use crate::ConfigError;

/// Session cookie that pins the site's "my store" selection to one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub id: StoreId,
    pub name: String,
    pub cookie: SessionCookie,
}

impl StoreLocation {
    /// Value for a `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie.name, self.cookie.value)
    }
}

#[derive(Debug, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreLocation>,
    /// Canonical brand name → label used by the site's brand refinement list.
    #[serde(default)]
    pub brand_aliases: BTreeMap<String, String>,
}

impl StoresFile {
    #[must_use]
    pub fn into_parts(self) -> (StoreDirectory, BrandAliases) {
        let stores = self.stores.into_iter().map(|s| (s.id, s)).collect();
        (
            StoreDirectory { stores },
            BrandAliases {
                aliases: self.brand_aliases,
            },
        )
    }
}

/// Read-only lookup of configured store locations.
#[derive(Debug, Clone, Default)]
pub struct StoreDirectory {
    stores: HashMap<StoreId, StoreLocation>,
}

impl StoreDirectory {
    #[must_use]
    pub fn new(stores: impl IntoIterator<Item = StoreLocation>) -> Self {
        Self {
            stores: stores.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: StoreId) -> Option<&StoreLocation> {
        self.stores.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: StoreId) -> bool {
        self.stores.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// Maps a requested brand onto the key used in a category's brand index.
#[derive(Debug, Clone, Default)]
pub struct BrandAliases {
    aliases: BTreeMap<String, String>,
}

impl BrandAliases {
    #[must_use]
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Lowercases `brand` and applies the alias table.
    ///
    /// `"GE"` becomes `"ge appliances"` when such an alias is configured;
    /// brands without an alias are returned lowercased and trimmed.
    #[must_use]
    pub fn resolve(&self, brand: &str) -> String {
        let key = brand.trim().to_lowercase();
        match self.aliases.get(&key) {
            Some(label) => label.trim().to_lowercase(),
            None => key,
        }
    }
}

/// Load and validate the store configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let stores_file: StoresFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_stores(&stores_file)?;

    Ok(stores_file)
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    if stores_file.stores.is_empty() {
        return Err(ConfigError::Validation(
            "at least one store must be configured".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for store in &stores_file.stores {
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store {} must have a non-empty name",
                store.id
            )));
        }

        if store.cookie.name.trim().is_empty() || store.cookie.value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store {} ('{}') has an empty session cookie",
                store.id, store.name
            )));
        }

        if !seen_ids.insert(store.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: {}",
                store.id
            )));
        }
    }

    for (brand, label) in &stores_file.brand_aliases {
        if brand.trim().is_empty() || label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand aliases must map non-empty names".to_string(),
            ));
        }
        if *brand != brand.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "brand alias key '{brand}' must be lowercase"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
