//! Installed package database (`/var/db/pkg`) loading

use crate::types::InstalledPackage;
use crate::Result;
use confcheck_config::Cpv;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

fn read_field(dir: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(name))
        .ok()
        .map(|value| value.trim().to_string())
}

/// Load every `<category>/<name-version>` entry of the installed database
pub fn load_installed(vdb: &Path) -> Result<Vec<InstalledPackage>> {
    if !vdb.is_dir() {
        warn!("Installed package database {} not found", vdb.display());
        return Ok(Vec::new());
    }

    let mut packages = Vec::new();

    for entry in WalkDir::new(vdb).min_depth(2).max_depth(2) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let pf = entry.file_name().to_string_lossy();
        if pf.starts_with('.') || pf.starts_with("-MERGING-") {
            continue;
        }

        let category = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .map(|c| c.to_string_lossy().to_string())
            .unwrap_or_default();

        let cpv: Cpv = match format!("{}/{}", category, pf).parse() {
            Ok(cpv) => cpv,
            Err(e) => {
                warn!("Skipping installed entry {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let dir = entry.path();
        let mut pkg = InstalledPackage::new(cpv)
            .with_slot(read_field(dir, "SLOT").unwrap_or_else(|| "0".to_string()))
            .with_use(&read_field(dir, "USE").unwrap_or_default());
        pkg.repository = read_field(dir, "repository").filter(|r| !r.is_empty());
        packages.push(pkg);
    }

    debug!("Read {} installed packages from {}", packages.len(), vdb.display());
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_installed() {
        let dir = TempDir::new().unwrap();
        let foo = dir.path().join("app-misc/foo-1.0-r1");
        std::fs::create_dir_all(&foo).unwrap();
        std::fs::create_dir_all(dir.path().join("app-misc/-MERGING-bar-2.0")).unwrap();
        std::fs::write(foo.join("SLOT"), "0\n").unwrap();
        std::fs::write(foo.join("USE"), "amd64 ssl\n").unwrap();
        std::fs::write(foo.join("repository"), "gentoo\n").unwrap();

        let packages = load_installed(dir.path()).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].cpv.to_string(), "app-misc/foo-1.0-r1");
        assert!(packages[0].use_flags.contains("ssl"));
        assert_eq!(packages[0].repository.as_deref(), Some("gentoo"));
    }

    #[test]
    fn test_missing_vdb_is_empty() {
        assert!(load_installed(Path::new("/nonexistent/var/db/pkg")).unwrap().is_empty());
    }
}
