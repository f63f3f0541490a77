//! Site feed reader.
//!
//! The feed is produced upstream from the deployment workbook. Only the
//! `address` of each site matters here; every other field is ignored.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SitesError {
    #[error("site feed not found at {0}")]
    NotFound(PathBuf),
    #[error("cannot read site feed {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed site feed {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct SiteFeed {
    sites: Vec<SiteEntry>,
}

#[derive(Deserialize)]
struct SiteEntry {
    #[serde(default)]
    address: Option<String>,
}

/// Distinct, non-empty addresses from the feed at `path`, sorted.
pub fn load_addresses(path: &Path) -> Result<Vec<String>, SitesError> {
    let data = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => SitesError::NotFound(path.to_path_buf()),
        _ => SitesError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parse_addresses(&data).map_err(|source| SitesError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_addresses(json: &str) -> Result<Vec<String>, serde_json::Error> {
    let feed: SiteFeed = serde_json::from_str(json)?;
    let addresses: BTreeSet<String> = feed
        .sites
        .into_iter()
        .filter_map(|site| site.address)
        .filter(|address| !address.is_empty())
        .collect();
    Ok(addresses.into_iter().collect())
}
