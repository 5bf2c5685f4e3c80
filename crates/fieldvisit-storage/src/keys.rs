//! Shared key generation for visit photos.
//!
//! Key format: `fotos/{YYYY-MM-DD_HH-MM}/{category}/{category}_{n}.jpg`.

use std::path::{Component, Path};

use chrono::{NaiveDate, NaiveTime};
use fieldvisit_core::constants::{ATTACHMENT_EXTENSION, PHOTOS_DIR};
use fieldvisit_core::Category;

use crate::traits::{StorageError, StorageResult};

/// Directory name of a visit, at minute granularity: `YYYY-MM-DD_HH-MM`.
pub fn visit_dir_name(date: NaiveDate, time: NaiveTime) -> String {
    format!("{}_{}", date.format("%Y-%m-%d"), time.format("%H-%M"))
}

/// `name_2`, `name_3`, ... used when same-minute visits must not share a directory.
pub fn suffixed_dir_name(name: &str, n: u32) -> String {
    format!("{}_{}", name, n)
}

/// Key of a visit directory.
pub fn visit_dir_key(dir_name: &str) -> String {
    format!("{}/{}", PHOTOS_DIR, dir_name)
}

/// Key of a category subdirectory of a visit.
pub fn category_key(visit_key: &str, category: Category) -> String {
    format!("{}/{}", visit_key, category.slug())
}

/// Key of the `index`-th (1-based) photo of a category.
pub fn attachment_key(visit_key: &str, category: Category, index: usize) -> String {
    format!(
        "{}/{}_{}.{}",
        category_key(visit_key, category),
        category.slug(),
        index,
        ATTACHMENT_EXTENSION
    )
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }

    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    if !Path::new(key)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key is not a plain relative path: {}",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_dir_name_uses_minute_granularity() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let time = NaiveTime::from_hms_opt(14, 7, 59).unwrap();
        assert_eq!(visit_dir_name(date, time), "2024-03-05_14-07");
    }

    #[test]
    fn attachment_key_layout() {
        let visit = visit_dir_key("2024-03-05_14-07");
        assert_eq!(visit, "fotos/2024-03-05_14-07");
        assert_eq!(
            attachment_key(&visit, Category::Access, 2),
            "fotos/2024-03-05_14-07/access/access_2.jpg"
        );
        assert_eq!(
            attachment_key(&visit, Category::PrintsDna, 1),
            "fotos/2024-03-05_14-07/prints_dna/prints_dna_1.jpg"
        );
    }

    #[test]
    fn suffix_appends_counter() {
        assert_eq!(suffixed_dir_name("2024-03-05_14-07", 2), "2024-03-05_14-07_2");
    }

    #[test]
    fn validate_key_rejects_traversal() {
        assert!(validate_key("fotos/a/b.jpg").is_ok());
        assert!(matches!(validate_key("../etc/passwd"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key("/etc/passwd"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key("./fotos/a"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));
    }
}
