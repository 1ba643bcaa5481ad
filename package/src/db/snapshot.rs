//! JSON snapshot of a package database
//!
//! A snapshot carries everything the analysis needs without reading a live
//! system: global keyword acceptance, repository masks, and the available
//! and installed versions. It is mostly used for testing and for auditing
//! a configuration on another machine.
//!
//! ```json
//! {
//!   "arch": "amd64",
//!   "accept_keywords": "amd64",
//!   "package_mask": [">=dev-lang/python-3.14"],
//!   "available": [
//!     { "cpv": "app-misc/foo-1.0", "keywords": "amd64", "iuse": "+ssl debug" }
//!   ],
//!   "installed": [
//!     { "cpv": "app-misc/foo-1.0", "use": "ssl" }
//!   ]
//! }
//! ```

use super::PackageDb;
use crate::types::{AvailablePackage, InstalledPackage};
use crate::{Error, Result};
use confcheck_config::{Cpv, PackageAtom};
use serde::{Deserialize, Serialize};

fn default_slot() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub arch: Option<String>,
    /// ACCEPT_KEYWORDS, space separated
    #[serde(default)]
    pub accept_keywords: String,
    /// Repository/profile package.mask atoms
    #[serde(default)]
    pub package_mask: Vec<String>,
    #[serde(default)]
    pub available: Vec<AvailableEntry>,
    #[serde(default)]
    pub installed: Vec<InstalledEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableEntry {
    pub cpv: String,
    #[serde(default = "default_slot")]
    pub slot: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub iuse: String,
    #[serde(default)]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledEntry {
    pub cpv: String,
    #[serde(default = "default_slot")]
    pub slot: String,
    #[serde(default, rename = "use")]
    pub use_flags: String,
    #[serde(default)]
    pub repository: Option<String>,
}

fn parse_cpv(value: &str) -> Result<Cpv> {
    value.parse().map_err(|e: confcheck_config::ConfigError| Error::InvalidEntry {
        path: value.to_string(),
        message: e.to_string(),
    })
}

impl Snapshot {
    /// Build a database from this snapshot
    pub fn into_db(self) -> Result<PackageDb> {
        let mut db = PackageDb::new();
        let masks = db.masks_mut();

        if let Some(arch) = self.arch {
            masks.set_arch(arch);
        }
        masks.apply_accept_keywords(&self.accept_keywords);

        let mut lines = Vec::new();
        for atom in &self.package_mask {
            let atom: PackageAtom = atom.parse()?;
            lines.push(crate::mask::MaskLine::Add(atom));
        }
        masks.apply_mask_lines(lines);

        for entry in self.available {
            let mut pkg = AvailablePackage::new(parse_cpv(&entry.cpv)?)
                .with_slot(entry.slot)
                .with_keywords(&entry.keywords)
                .with_iuse(&entry.iuse);
            pkg.repository = entry.repository;
            db.add_available(pkg);
        }

        for entry in self.installed {
            let mut pkg = InstalledPackage::new(parse_cpv(&entry.cpv)?)
                .with_slot(entry.slot)
                .with_use(&entry.use_flags);
            pkg.repository = entry.repository;
            db.add_installed(pkg);
        }

        db.infer_arch();
        Ok(db)
    }
}
