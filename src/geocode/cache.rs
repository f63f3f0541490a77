//! File-based result cache, which doubles as the pipeline's output file.
//!
//! The file is a JSON array of `{address, lat, lng}` rows. Anything that
//! cannot be read back cleanly is treated as an empty cache.

use super::types::{Coordinate, ResolvedRecord};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The persisted address → coordinate store.
pub struct ResultCache {
    path: PathBuf,
}

impl ResultCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read previously resolved coordinates. Never fails.
    pub fn load(&self) -> BTreeMap<String, Coordinate> {
        match Self::read_file(&self.path) {
            Ok(rows) => rows
                .into_iter()
                .map(|row| {
                    let coordinate = row.coordinate();
                    (row.address, coordinate)
                })
                .collect(),
            Err(reason) => {
                log::debug!("Ignoring cache at {}: {}", self.path.display(), reason);
                BTreeMap::new()
            }
        }
    }

    fn read_file(path: &Path) -> Result<Vec<ResolvedRecord>, String> {
        let data = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&data).map_err(|e| e.to_string())
    }

    /// Replace the store with `records`, sorted by address.
    ///
    /// Callers pass the complete merged set; this is not an append.
    pub fn save(&self, records: &[ResolvedRecord]) -> Result<(), CacheError> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| a.address.cmp(&b.address));
        sorted.dedup_by(|a, b| a.address == b.address);

        let json = serde_json::to_string_pretty(&sorted)?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source: io::Error| CacheError::Write {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(&parent).map_err(write_err)?;
        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache() -> (ResultCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocoded_sites.json");
        (ResultCache::new(path), dir)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (cache, _dir) = test_cache();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let (cache, _dir) = test_cache();
        fs::write(cache.path(), "{ not json").unwrap();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_wrong_shape_is_empty() {
        let (cache, _dir) = test_cache();
        fs::write(
            cache.path(),
            r#"[{"address": "A", "lat": 1.0, "lng": 1.0}, {"address": "B"}]"#,
        )
        .unwrap();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let (cache, _dir) = test_cache();
        cache
            .save(&[
                ResolvedRecord::new("B", Coordinate { lat: 2.0, lng: 2.0 }),
                ResolvedRecord::new("A", Coordinate { lat: 1.0, lng: 1.0 }),
            ])
            .unwrap();

        let loaded = cache.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded["A"], Coordinate { lat: 1.0, lng: 1.0 });
        assert_eq!(loaded["B"], Coordinate { lat: 2.0, lng: 2.0 });
    }

    #[test]
    fn test_save_is_sorted_and_formatted() {
        let (cache, _dir) = test_cache();
        cache
            .save(&[
                ResolvedRecord::new("Zeta Rd", Coordinate { lat: 1.5, lng: -3.25 }),
                ResolvedRecord::new("Alpha Ave", Coordinate { lat: 0.5, lng: 2.0 }),
            ])
            .unwrap();

        let text = fs::read_to_string(cache.path()).unwrap();
        let expected = r#"[
  {
    "address": "Alpha Ave",
    "lat": 0.5,
    "lng": 2.0
  },
  {
    "address": "Zeta Rd",
    "lat": 1.5,
    "lng": -3.25
  }
]
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_save_overwrites() {
        let (cache, _dir) = test_cache();
        cache
            .save(&[ResolvedRecord::new("A", Coordinate { lat: 1.0, lng: 1.0 })])
            .unwrap();
        cache
            .save(&[ResolvedRecord::new("B", Coordinate { lat: 2.0, lng: 2.0 })])
            .unwrap();

        let loaded = cache.load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("B"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("out.json");
        let cache = ResultCache::new(&path);
        cache
            .save(&[ResolvedRecord::new("A", Coordinate { lat: 1.0, lng: 1.0 })])
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_addresses_are_case_sensitive() {
        let (cache, _dir) = test_cache();
        cache
            .save(&[
                ResolvedRecord::new("1 main st", Coordinate { lat: 1.0, lng: 1.0 }),
                ResolvedRecord::new("1 Main St", Coordinate { lat: 2.0, lng: 2.0 }),
            ])
            .unwrap();
        assert_eq!(cache.load().len(), 2);
    }
}
