//! Configuration for a Repartition Run
//!
//! Read once at startup: an optional TOML file, then environment overrides.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | REPARTITION_CONFIG | - | TOML config file (or first CLI argument) |
//! | REPARTITION_BUCKET | - | Bucket to repartition (required) |
//! | REPARTITION_LAYOUT | flexible_prefix | flexible_prefix or fixed_two_segment |
//! | REPARTITION_PREFIX_DEPTH | 1 | Segments kept verbatim (flexible_prefix only) |
//! | REPARTITION_PAGE_SIZE | 100 | Keys per listing page (1-1000) |
//! | REPARTITION_DRY_RUN | false | Plan and log, but copy/delete nothing |
//! | REPARTITION_STORE_TYPE | s3 | memory, localfs, or s3 |
//! | REPARTITION_DATA_PATH | - | Root directory for localfs (bucket is a subdirectory) |
//! | REPARTITION_S3_ENDPOINT | - | MinIO/LocalStack endpoint URL |
//! | AWS_REGION | us-east-1 | S3 region |

use crate::partition::Layout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_PREFIX_DEPTH: usize = 1;
pub const DEFAULT_S3_REGION: &str = "us-east-1";

// S3 ListObjectsV2 never returns more than 1000 keys per call
pub const PAGE_SIZE_MAX: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
    #[error("bucket name is required")]
    MissingBucket,
    #[error("page_size must be between 1 and 1000, got {0}")]
    PageSize(usize),
    #[error("localfs store requires local_path")]
    MissingLocalPath,
}

/// Which partition layout to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    FlexiblePrefix,
    FixedTwoSegment,
}

/// Type of object store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// In-memory store (starts empty; for rehearsals and tests)
    Memory,
    /// Local directory tree
    LocalFs,
    /// Amazon S3 or compatible
    #[cfg(feature = "s3")]
    S3,
}

impl Default for StoreType {
    fn default() -> Self {
        #[cfg(feature = "s3")]
        {
            StoreType::S3
        }
        #[cfg(not(feature = "s3"))]
        {
            StoreType::LocalFs
        }
    }
}

/// S3 connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// AWS region
    pub region: String,
    /// Custom endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        S3Config {
            region: DEFAULT_S3_REGION.to_string(),
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub store_type: StoreType,
    /// Root directory for the localfs store
    pub local_path: Option<PathBuf>,
    pub s3: S3Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepartitionConfig {
    pub bucket: String,
    pub layout: LayoutKind,
    /// Leading segments preserved verbatim (flexible_prefix only)
    pub prefix_depth: usize,
    pub page_size: usize,
    pub dry_run: bool,
    pub store: StoreConfig,
}

impl Default for RepartitionConfig {
    fn default() -> Self {
        RepartitionConfig {
            bucket: String::new(),
            layout: LayoutKind::FlexiblePrefix,
            prefix_depth: DEFAULT_PREFIX_DEPTH,
            page_size: DEFAULT_PAGE_SIZE,
            dry_run: false,
            store: StoreConfig::default(),
        }
    }
}

impl RepartitionConfig {
    /// Load from an optional TOML file, apply environment overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup("REPARTITION_BUCKET") {
            self.bucket = bucket;
        }
        if let Some(layout) = lookup("REPARTITION_LAYOUT") {
            self.layout = match layout.to_lowercase().as_str() {
                "flexible_prefix" => LayoutKind::FlexiblePrefix,
                "fixed_two_segment" => LayoutKind::FixedTwoSegment,
                _ => return Err(invalid("REPARTITION_LAYOUT", layout)),
            };
        }
        if let Some(depth) = lookup("REPARTITION_PREFIX_DEPTH") {
            self.prefix_depth = depth
                .trim()
                .parse()
                .map_err(|_| invalid("REPARTITION_PREFIX_DEPTH", depth))?;
        }
        if let Some(size) = lookup("REPARTITION_PAGE_SIZE") {
            self.page_size = size
                .trim()
                .parse()
                .map_err(|_| invalid("REPARTITION_PAGE_SIZE", size))?;
        }
        if let Some(dry_run) = lookup("REPARTITION_DRY_RUN") {
            self.dry_run = match dry_run.to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(invalid("REPARTITION_DRY_RUN", dry_run)),
            };
        }
        if let Some(store_type) = lookup("REPARTITION_STORE_TYPE") {
            self.store.store_type = match store_type.to_lowercase().as_str() {
                "memory" => StoreType::Memory,
                "localfs" => StoreType::LocalFs,
                #[cfg(feature = "s3")]
                "s3" => StoreType::S3,
                _ => return Err(invalid("REPARTITION_STORE_TYPE", store_type)),
            };
        }
        if let Some(path) = lookup("REPARTITION_DATA_PATH") {
            self.store.local_path = Some(PathBuf::from(path));
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.store.s3.region = region;
        }
        if let Some(endpoint) = lookup("REPARTITION_S3_ENDPOINT") {
            self.store.s3.endpoint = Some(endpoint);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        if self.page_size == 0 || self.page_size > PAGE_SIZE_MAX {
            return Err(ConfigError::PageSize(self.page_size));
        }
        if self.store.store_type == StoreType::LocalFs && self.store.local_path.is_none() {
            return Err(ConfigError::MissingLocalPath);
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        match self.layout {
            LayoutKind::FlexiblePrefix => Layout::FlexiblePrefix {
                prefix_depth: self.prefix_depth,
            },
            LayoutKind::FixedTwoSegment => Layout::FixedTwoSegment,
        }
    }
}

fn invalid(var: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { var, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RepartitionConfig::default();
        assert_eq!(config.page_size, 100);
        assert_eq!(config.prefix_depth, 1);
        assert!(!config.dry_run);
        assert_eq!(
            config.layout(),
            Layout::FlexiblePrefix { prefix_depth: 1 }
        );
        assert_eq!(config.store.s3.region, "us-east-1");
        assert!(matches!(config.validate(), Err(ConfigError::MissingBucket)));
    }

    #[test]
    fn test_parse_toml() {
        let config = RepartitionConfig::from_toml_str(
            r#"
            bucket = "events"
            layout = "fixed_two_segment"
            page_size = 250
            dry_run = true

            [store]
            store_type = "localfs"
            local_path = "/srv/buckets"
            "#,
        )
        .unwrap();

        assert_eq!(config.bucket, "events");
        assert_eq!(config.layout(), Layout::FixedTwoSegment);
        assert_eq!(config.page_size, 250);
        assert!(config.dry_run);
        assert_eq!(config.store.store_type, StoreType::LocalFs);
        assert_eq!(config.store.local_path, Some(PathBuf::from("/srv/buckets")));
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_rejects_unknown_layout() {
        let err = RepartitionConfig::from_toml_str("layout = \"sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = RepartitionConfig::from_toml_str("bucket = \"from-file\"").unwrap();
        config
            .apply_overrides(env(&[
                ("REPARTITION_BUCKET", "from-env"),
                ("REPARTITION_PREFIX_DEPTH", "3"),
                ("REPARTITION_PAGE_SIZE", "500"),
                ("REPARTITION_DRY_RUN", "1"),
                ("REPARTITION_STORE_TYPE", "memory"),
            ]))
            .unwrap();

        assert_eq!(config.bucket, "from-env");
        assert_eq!(config.layout(), Layout::FlexiblePrefix { prefix_depth: 3 });
        assert_eq!(config.page_size, 500);
        assert!(config.dry_run);
        assert_eq!(config.store.store_type, StoreType::Memory);
        config.validate().unwrap();
    }

    #[test]
    fn test_env_rejects_bad_values() {
        for (var, value) in [
            ("REPARTITION_LAYOUT", "diagonal"),
            ("REPARTITION_PREFIX_DEPTH", "-1"),
            ("REPARTITION_PAGE_SIZE", "lots"),
            ("REPARTITION_DRY_RUN", "maybe"),
            ("REPARTITION_STORE_TYPE", "floppy"),
        ] {
            let mut config = RepartitionConfig::default();
            let err = config.apply_overrides(env(&[(var, value)])).unwrap_err();
            match err {
                ConfigError::InvalidValue { var: v, value: got } => {
                    assert_eq!(v, var);
                    assert_eq!(got, value);
                }
                other => panic!("unexpected error for {}: {:?}", var, other),
            }
        }
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = RepartitionConfig {
            bucket: "b".to_string(),
            store: StoreConfig {
                store_type: StoreType::Memory,
                ..StoreConfig::default()
            },
            ..RepartitionConfig::default()
        };
        for bad in [0, 1001] {
            config.page_size = bad;
            assert!(matches!(config.validate(), Err(ConfigError::PageSize(n)) if n == bad));
        }
        config.page_size = 1000;
        config.validate().unwrap();
    }

    #[test]
    fn test_localfs_requires_path() {
        let config = RepartitionConfig {
            bucket: "b".to_string(),
            store: StoreConfig {
                store_type: StoreType::LocalFs,
                local_path: None,
                ..StoreConfig::default()
            },
            ..RepartitionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingLocalPath)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repartition.toml");
        std::fs::write(
            &path,
            "bucket = \"archive\"\nprefix_depth = 0\n[store]\nstore_type = \"memory\"\n",
        )
        .unwrap();

        let config = RepartitionConfig::from_file(&path).unwrap();
        assert_eq!(config.bucket, "archive");
        assert_eq!(config.layout(), Layout::FlexiblePrefix { prefix_depth: 0 });

        let missing = RepartitionConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
