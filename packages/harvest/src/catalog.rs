//! Report catalog: portal settings, date presets, report types and stores.
//!
//! The default catalog is baked into the binary from `config/*.toml` via
//! [`include_str!`]. [`Catalog::from_dir`] loads the same three files from a
//! directory at runtime instead. Either way the result is immutable and
//! handed to the orchestrator at construction.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use report_harvest_models::{DatePreset, PortalConfig, ReportType, StoreConfig};
use serde::Deserialize;

use crate::ConfigError;
use crate::date_range::validate_preset;

/// Catalog files embedded at compile time.
const PRESETS_TOML: &str = include_str!("../config/presets.toml");
const REPORTS_TOML: &str = include_str!("../config/reports.toml");
const STORES_TOML: &str = include_str!("../config/stores.toml");

#[derive(Deserialize)]
struct PresetsFile {
    #[serde(default)]
    default_presets: Vec<String>,
    presets: Vec<DatePreset>,
}

#[derive(Deserialize)]
struct ReportsFile {
    portal: PortalConfig,
    reports: Vec<ReportType>,
}

#[derive(Deserialize)]
struct StoresFile {
    stores: Vec<StoreConfig>,
}

/// Everything the orchestrator needs to know about the portal.
#[derive(Debug, Clone)]
pub struct Catalog {
    portal: PortalConfig,
    presets: BTreeMap<String, DatePreset>,
    default_presets: Vec<String>,
    reports: Vec<ReportType>,
    stores: Vec<StoreConfig>,
}

impl Catalog {
    /// Builds a catalog, rejecting malformed presets and duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any preset is malformed or any preset key,
    /// report key or store name is duplicated.
    pub fn new(
        portal: PortalConfig,
        presets: Vec<DatePreset>,
        default_presets: Vec<String>,
        reports: Vec<ReportType>,
        stores: Vec<StoreConfig>,
    ) -> Result<Self, ConfigError> {
        let mut preset_map = BTreeMap::new();
        for preset in presets {
            validate_preset(&preset)?;
            if preset_map.contains_key(&preset.key) {
                return Err(ConfigError::Duplicate {
                    kind: "preset",
                    key: preset.key,
                });
            }
            preset_map.insert(preset.key.clone(), preset);
        }

        ensure_unique("report", reports.iter().map(|r| r.key.as_str()))?;
        ensure_unique("store", stores.iter().map(|s| s.name.as_str()))?;

        Ok(Self {
            portal,
            presets: preset_map,
            default_presets,
            reports,
            stores,
        })
    }

    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded files are invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(PRESETS_TOML, REPORTS_TOML, STORES_TOML)
    }

    /// Loads `presets.toml`, `reports.toml` and `stores.toml` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a file cannot be read or is invalid.
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let read = |name: &str| std::fs::read_to_string(dir.join(name));
        Self::from_toml(
            &read("presets.toml")?,
            &read("reports.toml")?,
            &read("stores.toml")?,
        )
    }

    /// Parses the three catalog documents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if a document does not match its
    /// schema, or any error from [`Catalog::new`].
    pub fn from_toml(presets: &str, reports: &str, stores: &str) -> Result<Self, ConfigError> {
        let presets: PresetsFile = parse("presets.toml", presets)?;
        let reports: ReportsFile = parse("reports.toml", reports)?;
        let stores: StoresFile = parse("stores.toml", stores)?;

        Self::new(
            reports.portal,
            presets.presets,
            presets.default_presets,
            reports.reports,
            stores.stores,
        )
    }

    /// Portal location and wait bounds.
    #[must_use]
    pub const fn portal(&self) -> &PortalConfig {
        &self.portal
    }

    /// Report types, in download order.
    #[must_use]
    pub fn reports(&self) -> &[ReportType] {
        &self.reports
    }

    /// Configured stores, in file order.
    #[must_use]
    pub fn stores(&self) -> &[StoreConfig] {
        &self.stores
    }

    /// Names of every configured store.
    #[must_use]
    pub fn store_names(&self) -> Vec<String> {
        self.stores.iter().map(|s| s.name.clone()).collect()
    }

    /// Looks up a store by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownStore`] listing the valid names.
    pub fn store(&self, name: &str) -> Result<&StoreConfig, ConfigError> {
        self.stores
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownStore {
                name: name.to_owned(),
                known: self.store_names(),
            })
    }

    /// Looks up a preset by key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] if no preset has that key.
    pub fn preset(&self, key: &str) -> Result<&DatePreset, ConfigError> {
        self.presets
            .get(key)
            .ok_or_else(|| ConfigError::UnknownPreset(key.to_owned()))
    }

    /// Preset keys to harvest for `store`, falling back to the catalog
    /// default.
    #[must_use]
    pub fn presets_for<'a>(&'a self, store: &'a StoreConfig) -> &'a [String] {
        store.presets.as_deref().unwrap_or(&self.default_presets)
    }
}

fn parse<T: serde::de::DeserializeOwned>(file: &str, text: &str) -> Result<T, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::Parse {
        file: file.to_owned(),
        message: e.to_string(),
    })
}

fn ensure_unique<'a>(
    kind: &'static str,
    keys: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(ConfigError::Duplicate {
                kind,
                key: key.to_owned(),
            });
        }
    }
    Ok(())
}
