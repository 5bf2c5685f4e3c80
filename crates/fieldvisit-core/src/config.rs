//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is loaded by the binary
//! beforehand). Paths, the photographer roster, the timezone used to pre-fill the
//! form, the collision policy for visit directories and the remote upload target
//! all live here.

use std::env;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::constants::{DEFAULT_BASE_DIR, DEFAULT_TIMEZONE, LEDGER_FILE_NAME, PHOTOS_DIR};
use crate::models::Roster;
use crate::storage_types::CollisionPolicy;

const DEFAULT_REMOTE_FOLDER: &str = "fieldvisit";

/// Remote upload settings
#[derive(Clone, Debug, Default)]
pub struct UploadConfig {
    pub enabled: bool,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    /// Folder (key prefix) every uploaded file lands in.
    pub remote_folder: String,
}

/// Fieldvisit settings
#[derive(Clone, Debug)]
pub struct FieldVisitConfig {
    pub base_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub roster: Roster,
    pub timezone: Tz,
    pub collision_policy: CollisionPolicy,
    pub upload: UploadConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<FieldVisitConfig>);

impl Config {
    fn inner(&self) -> &FieldVisitConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = FieldVisitConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    /// Defaults rooted at `base_dir`, with uploads disabled.
    pub fn for_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Config(Box::new(FieldVisitConfig {
            ledger_path: base_dir.join(LEDGER_FILE_NAME),
            base_dir,
            roster: Roster::default(),
            timezone: chrono_tz::America::Sao_Paulo,
            collision_policy: CollisionPolicy::default(),
            upload: UploadConfig {
                remote_folder: DEFAULT_REMOTE_FOLDER.to_string(),
                ..UploadConfig::default()
            },
        }))
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.0.collision_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn base_dir(&self) -> &Path {
        &self.inner().base_dir
    }

    /// `<base>/fotos`, parent of every visit directory.
    pub fn photos_dir(&self) -> PathBuf {
        self.inner().base_dir.join(PHOTOS_DIR)
    }

    pub fn ledger_path(&self) -> &Path {
        &self.inner().ledger_path
    }

    pub fn roster(&self) -> &Roster {
        &self.inner().roster
    }

    pub fn timezone(&self) -> Tz {
        self.inner().timezone
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.inner().collision_policy
    }

    pub fn upload_enabled(&self) -> bool {
        self.inner().upload.enabled
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().upload.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().upload.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().upload.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().upload.aws_region.as_deref()
    }

    pub fn remote_folder(&self) -> &str {
        &self.inner().upload.remote_folder
    }
}

impl FieldVisitConfig {
    /// Build the configuration from a key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_dir = PathBuf::from(
            non_empty("FIELDVISIT_BASE_DIR").unwrap_or_else(|| DEFAULT_BASE_DIR.to_string()),
        );
        let ledger_path = non_empty("FIELDVISIT_LEDGER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join(LEDGER_FILE_NAME));

        let roster = match non_empty("FIELDVISIT_ROSTER") {
            Some(list) => Roster::parse(&list).map_err(|e| anyhow::anyhow!(e.to_string()))?,
            None => Roster::default(),
        };

        let tz_name =
            non_empty("FIELDVISIT_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid FIELDVISIT_TIMEZONE '{}': {}", tz_name, e))?;

        let collision_policy = non_empty("FIELDVISIT_COLLISION_POLICY")
            .map(|s| s.parse::<CollisionPolicy>())
            .transpose()?
            .unwrap_or_default();

        let upload = UploadConfig {
            enabled: non_empty("UPLOAD_ENABLED")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            remote_folder: non_empty("REMOTE_FOLDER")
                .unwrap_or_else(|| DEFAULT_REMOTE_FOLDER.to_string()),
        };

        let config = FieldVisitConfig {
            base_dir,
            ledger_path,
            roster,
            timezone,
            collision_policy,
            upload,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.ledger_path.is_dir() {
            return Err(anyhow::anyhow!(
                "FIELDVISIT_LEDGER_PATH points to a directory: {}",
                self.ledger_path.display()
            ));
        }

        let folder = &self.upload.remote_folder;
        if folder.is_empty() || folder.starts_with('/') || folder.contains("..") {
            return Err(anyhow::anyhow!(
                "REMOTE_FOLDER must be a relative folder name without '..'"
            ));
        }

        if self.upload.enabled {
            if self.upload.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when UPLOAD_ENABLED=true"
                ));
            }
            if self.upload.s3_region.is_none() && self.upload.aws_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when UPLOAD_ENABLED=true"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = FieldVisitConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("formulario_campo"));
        assert_eq!(
            config.ledger_path,
            PathBuf::from("formulario_campo").join("dados_campo.xlsx")
        );
        assert_eq!(config.roster.len(), 7);
        assert_eq!(config.timezone, chrono_tz::America::Sao_Paulo);
        assert_eq!(config.collision_policy, CollisionPolicy::Merge);
        assert!(!config.upload.enabled);
    }

    #[test]
    fn overrides_are_applied() {
        let config = FieldVisitConfig::from_lookup(lookup(&[
            ("FIELDVISIT_BASE_DIR", "/srv/campo"),
            ("FIELDVISIT_ROSTER", "Ana;Bruno"),
            ("FIELDVISIT_TIMEZONE", "UTC"),
            ("FIELDVISIT_COLLISION_POLICY", "suffix"),
        ]))
        .unwrap();
        assert_eq!(config.ledger_path, PathBuf::from("/srv/campo/dados_campo.xlsx"));
        assert_eq!(config.roster.default_name(), "Ana");
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.collision_policy, CollisionPolicy::Suffix);
    }

    #[test]
    fn upload_requires_bucket_and_region() {
        let err = FieldVisitConfig::from_lookup(lookup(&[("UPLOAD_ENABLED", "true")]));
        assert!(err.is_err());

        let err = FieldVisitConfig::from_lookup(lookup(&[
            ("UPLOAD_ENABLED", "true"),
            ("S3_BUCKET", "evidence"),
        ]));
        assert!(err.is_err());

        let config = FieldVisitConfig::from_lookup(lookup(&[
            ("UPLOAD_ENABLED", "true"),
            ("S3_BUCKET", "evidence"),
            ("AWS_REGION", "sa-east-1"),
        ]))
        .unwrap();
        assert!(config.upload.enabled);
    }

    #[test]
    fn invalid_timezone_and_policy_are_rejected() {
        assert!(FieldVisitConfig::from_lookup(lookup(&[("FIELDVISIT_TIMEZONE", "Mars/Base")])).is_err());
        assert!(
            FieldVisitConfig::from_lookup(lookup(&[("FIELDVISIT_COLLISION_POLICY", "rename")]))
                .is_err()
        );
    }

    #[test]
    fn for_base_dir_builds_paths() {
        let config = Config::for_base_dir("/tmp/campo");
        assert_eq!(config.photos_dir(), PathBuf::from("/tmp/campo/fotos"));
        assert_eq!(config.ledger_path(), Path::new("/tmp/campo/dados_campo.xlsx"));
        assert!(config.validate().is_ok());
    }
}
