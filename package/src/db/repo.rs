//! Ebuild repository loading from the md5-cache metadata

use crate::types::{parse_iuse, AvailablePackage};
use crate::Result;
use confcheck_config::Cpv;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Parse a `KEY=VALUE` cache entry
pub fn parse_cache_entry(content: &str) -> HashMap<&str, &str> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .collect()
}

/// The repository name from profiles/repo_name, if present
pub fn repo_name(repo: &Path) -> Option<String> {
    std::fs::read_to_string(repo.join("profiles/repo_name"))
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Load every version listed in `metadata/md5-cache`
pub fn load_repository(repo: &Path) -> Result<Vec<AvailablePackage>> {
    let cache_dir = repo.join("metadata/md5-cache");
    if !cache_dir.is_dir() {
        warn!("Repository {} has no metadata cache", repo.display());
        return Ok(Vec::new());
    }

    let name = repo_name(repo);
    let mut packages = Vec::new();

    for entry in WalkDir::new(&cache_dir).min_depth(2).max_depth(2) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') || file_name.starts_with("Manifest") {
            continue;
        }

        let category = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .map(|c| c.to_string_lossy().to_string())
            .unwrap_or_default();

        let cpv: Cpv = match format!("{}/{}", category, file_name).parse() {
            Ok(cpv) => cpv,
            Err(e) => {
                warn!("Skipping cache entry {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let content = std::fs::read_to_string(entry.path())?;
        let fields = parse_cache_entry(&content);

        let mut pkg = AvailablePackage::new(cpv)
            .with_slot(fields.get("SLOT").copied().unwrap_or("0"))
            .with_keywords(fields.get("KEYWORDS").copied().unwrap_or(""));
        pkg.iuse = parse_iuse(fields.get("IUSE").copied().unwrap_or(""));
        pkg.repository = name.clone();
        packages.push(pkg);
    }

    debug!("Read {} cache entries from {}", packages.len(), cache_dir.display());
    Ok(packages)
}
