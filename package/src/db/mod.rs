//! Package database for answering override analysis queries
//!
//! Combines the ebuild repository (available versions), the installed
//! package database and the masking state into one in-memory
//! [`PackageQuery`] implementation.

pub mod repo;
pub mod snapshot;
pub mod vdb;

pub use snapshot::Snapshot;

use crate::mask::MaskManager;
use crate::query::PackageQuery;
use crate::types::{AvailablePackage, InstalledPackage};
use crate::{Error, Result};
use confcheck_config::{paths, ConfigLoader, Cpv, KeywordStability, PackageAtom};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where to load the package database from
#[derive(Debug, Clone)]
pub struct DbOptions {
    /// Filesystem root holding the installed package database
    pub root: PathBuf,
    /// Ebuild repository
    pub repository: PathBuf,
    /// Portage configuration root (make.conf, make.profile)
    pub config_root: PathBuf,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            repository: paths::repository(),
            config_root: paths::system_config(),
        }
    }
}

/// Package database
#[derive(Debug, Clone, Default)]
pub struct PackageDb {
    /// Available versions by `category/name`, ascending
    available: BTreeMap<String, Vec<AvailablePackage>>,
    /// Installed versions by `category/name`, ascending
    installed: BTreeMap<String, Vec<InstalledPackage>>,
    /// Masking and keyword state, including simulated overrides
    masks: MaskManager,
}

impl PackageDb {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the repository, profile, make.conf and installed database
    pub fn load(options: &DbOptions) -> Result<Self> {
        info!("Loading package database");

        if !options.repository.is_dir() {
            return Err(Error::RepositoryNotFound(
                options.repository.display().to_string(),
            ));
        }

        let mut db = Self::new();
        let loader = ConfigLoader::new(&options.config_root);

        // Repository masks first so profile `-atom` lines can lift them
        db.masks.load_repo_masks(&options.repository)?;

        if let Some(profile) = loader.profile_dir() {
            db.masks.load_profile(&profile)?;
        } else {
            debug!("No make.profile below {}", options.config_root.display());
        }

        let make_conf = loader.make_conf()?;
        if let Some(arch) = make_conf.get("ARCH") {
            db.masks.set_arch(arch);
        }
        if let Some(keywords) = make_conf.get("ACCEPT_KEYWORDS") {
            db.masks.apply_accept_keywords(keywords);
        }

        for pkg in repo::load_repository(&options.repository)? {
            db.add_available(pkg);
        }
        for pkg in vdb::load_installed(&paths::vdb(&options.root))? {
            db.add_installed(pkg);
        }

        db.infer_arch();
        info!(
            "Loaded {} available and {} installed packages",
            db.available.values().map(Vec::len).sum::<usize>(),
            db.installed.values().map(Vec::len).sum::<usize>()
        );
        Ok(db)
    }

    /// Load from a JSON snapshot file
    pub fn from_snapshot(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        snapshot.into_db()
    }

    /// Mutable access to the masking state
    pub fn masks_mut(&mut self) -> &mut MaskManager {
        &mut self.masks
    }

    /// Add an available version
    pub fn add_available(&mut self, pkg: AvailablePackage) {
        let versions = self.available.entry(pkg.cpv.cp()).or_default();
        versions.push(pkg);
        versions.sort_by(|a, b| a.cpv.version.cmp(&b.cpv.version));
    }

    /// Add an installed version
    pub fn add_installed(&mut self, pkg: InstalledPackage) {
        let versions = self.installed.entry(pkg.cpv.cp()).or_default();
        versions.push(pkg);
        versions.sort_by(|a, b| a.cpv.version.cmp(&b.cpv.version));
    }

    /// Fall back to the first stable accepted keyword when no ARCH is set
    pub fn infer_arch(&mut self) {
        if self.masks.arch().is_some() {
            return;
        }
        let arch = self
            .masks
            .accept_keywords()
            .keywords()
            .into_iter()
            .map(|k| confcheck_config::Keyword::parse(&k))
            .find(|k| k.stability == KeywordStability::Stable && k.arch != "*")
            .map(|k| k.arch);
        if let Some(arch) = arch {
            debug!("Assuming ARCH={}", arch);
            self.masks.set_arch(arch);
        }
    }

    fn find_available(&self, cpv: &Cpv) -> Option<&AvailablePackage> {
        self.available
            .get(&cpv.cp())
            .and_then(|versions| versions.iter().find(|p| &p.cpv == cpv))
    }

    fn find_installed(&self, cpv: &Cpv) -> Option<&InstalledPackage> {
        self.installed
            .get(&cpv.cp())
            .and_then(|versions| versions.iter().find(|p| &p.cpv == cpv))
    }
}

impl PackageQuery for PackageDb {
    fn match_all(&self, atom: &PackageAtom) -> Vec<Cpv> {
        self.available
            .get(&atom.cp())
            .map(|versions| {
                versions
                    .iter()
                    .filter(|p| p.matches(atom))
                    .map(|p| p.cpv.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn match_visible(&self, atom: &PackageAtom) -> Vec<Cpv> {
        self.available
            .get(&atom.cp())
            .map(|versions| {
                versions
                    .iter()
                    .filter(|p| p.matches(atom) && self.masks.masking_reasons(p).is_empty())
                    .map(|p| p.cpv.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn masking_reasons(&self, cpv: &Cpv) -> BTreeSet<String> {
        self.find_available(cpv)
            .map(|p| self.masks.masking_reasons(p))
            .unwrap_or_default()
    }

    fn installed_versions(&self, atom: &PackageAtom) -> Vec<Cpv> {
        self.installed
            .get(&atom.cp())
            .map(|versions| {
                versions
                    .iter()
                    .filter(|p| p.matches(atom))
                    .map(|p| p.cpv.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn declared_use_flags(&self, cpv: &Cpv) -> Result<HashSet<String>> {
        self.find_available(cpv)
            .map(|p| p.iuse.clone())
            .ok_or_else(|| Error::NotAvailable(cpv.to_string()))
    }

    fn current_use_flags(&self, cpv: &Cpv) -> Result<HashSet<String>> {
        self.find_installed(cpv)
            .map(|p| p.use_flags.clone())
            .ok_or_else(|| Error::NotAvailable(cpv.to_string()))
    }

    fn accept_keywords(&self) -> Vec<String> {
        self.masks.accept_keywords().keywords()
    }

    fn accept_package_keywords(&mut self, atom: &PackageAtom, keywords: &[String]) {
        self.masks.add_keyword_override(atom.clone(), keywords.to_vec());
    }

    fn mask(&mut self, atom: &PackageAtom) {
        self.masks.add_mask(atom.clone());
    }

    fn unmask(&mut self, atom: &PackageAtom) {
        self.masks.add_unmask(atom.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PACKAGE_MASK;

    fn cpv(s: &str) -> Cpv {
        s.parse().unwrap()
    }

    fn atom(s: &str) -> PackageAtom {
        s.parse().unwrap()
    }

    fn sample_db() -> PackageDb {
        let mut db = PackageDb::new();
        db.masks_mut().apply_accept_keywords("amd64");
        db.infer_arch();
        db.add_available(AvailablePackage::new(cpv("app-misc/foo-2.0")).with_keywords("~amd64"));
        db.add_available(
            AvailablePackage::new(cpv("app-misc/foo-1.0"))
                .with_keywords("amd64")
                .with_iuse("+ssl debug"),
        );
        db.add_installed(InstalledPackage::new(cpv("app-misc/foo-1.0")).with_use("ssl"));
        db
    }

    #[test]
    fn test_match_sorted_ascending() {
        let db = sample_db();
        assert_eq!(
            db.match_all(&atom("app-misc/foo")),
            vec![cpv("app-misc/foo-1.0"), cpv("app-misc/foo-2.0")]
        );
        assert!(db.match_all(&atom("app-misc/bar")).is_empty());
    }

    #[test]
    fn test_visibility_follows_simulated_keywords() {
        let mut db = sample_db();
        assert_eq!(db.match_visible(&atom("app-misc/foo")), vec![cpv("app-misc/foo-1.0")]);

        db.accept_package_keywords(&atom("app-misc/foo"), &["~amd64".to_string()]);
        assert_eq!(db.match_visible(&atom("app-misc/foo")).len(), 2);
    }

    #[test]
    fn test_simulated_mask() {
        let mut db = sample_db();
        db.mask(&atom(">=app-misc/foo-2.0"));
        assert!(db
            .masking_reasons(&cpv("app-misc/foo-2.0"))
            .contains(PACKAGE_MASK));
        assert!(db.masking_reasons(&cpv("app-misc/foo-1.0")).is_empty());
    }

    #[test]
    fn test_flag_lookups() {
        let db = sample_db();
        let foo = cpv("app-misc/foo-1.0");
        assert!(db.declared_use_flags(&foo).unwrap().contains("ssl"));
        assert!(db.current_use_flags(&foo).unwrap().contains("ssl"));

        let gone = cpv("app-misc/foo-0.9");
        assert!(matches!(db.declared_use_flags(&gone), Err(Error::NotAvailable(_))));
        assert!(matches!(db.current_use_flags(&gone), Err(Error::NotAvailable(_))));
    }

    #[test]
    fn test_missing_repository_is_fatal() {
        let options = DbOptions {
            repository: PathBuf::from("/nonexistent/repo"),
            ..DbOptions::default()
        };
        assert!(matches!(PackageDb::load(&options), Err(Error::RepositoryNotFound(_))));
    }
}
