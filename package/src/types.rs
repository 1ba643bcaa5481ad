//! Core package record types

use confcheck_config::{Cpv, PackageAtom};
use std::collections::HashSet;

/// A package version available from the ebuild repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailablePackage {
    pub cpv: Cpv,
    pub slot: String,
    /// KEYWORDS, e.g. `["amd64", "~arm64"]`
    pub keywords: Vec<String>,
    /// IUSE flag names with `+`/`-` defaults stripped
    pub iuse: HashSet<String>,
    pub repository: Option<String>,
}

impl AvailablePackage {
    pub fn new(cpv: Cpv) -> Self {
        Self {
            cpv,
            slot: "0".to_string(),
            keywords: Vec::new(),
            iuse: HashSet::new(),
            repository: None,
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn with_keywords(mut self, keywords: &str) -> Self {
        self.keywords = keywords.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn with_iuse(mut self, iuse: &str) -> Self {
        self.iuse = parse_iuse(iuse);
        self
    }

    /// Whether an atom's name, version, slot and repository restrictions
    /// select this version
    pub fn matches(&self, atom: &PackageAtom) -> bool {
        atom.matches_with(&self.cpv, Some(&self.slot), self.repository.as_deref())
    }
}

/// A package version recorded in the installed package database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub cpv: Cpv,
    pub slot: String,
    /// Flags the version was built with
    pub use_flags: HashSet<String>,
    pub repository: Option<String>,
}

impl InstalledPackage {
    pub fn new(cpv: Cpv) -> Self {
        Self {
            cpv,
            slot: "0".to_string(),
            use_flags: HashSet::new(),
            repository: None,
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn with_use(mut self, flags: &str) -> Self {
        self.use_flags = flags.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn matches(&self, atom: &PackageAtom) -> bool {
        atom.matches_with(&self.cpv, Some(&self.slot), self.repository.as_deref())
    }
}

/// Parse an IUSE string into flag names, dropping `+`/`-` defaults
pub fn parse_iuse(iuse: &str) -> HashSet<String> {
    iuse.split_whitespace()
        .map(|flag| flag.trim_start_matches(['+', '-']).to_string())
        .filter(|flag| !flag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iuse() {
        let iuse = parse_iuse("+ssl -X  debug");
        assert_eq!(iuse.len(), 3);
        assert!(iuse.contains("ssl"));
        assert!(iuse.contains("X"));
        assert!(iuse.contains("debug"));
    }

    #[test]
    fn test_slot_restricted_match() {
        let pkg =
            AvailablePackage::new("dev-lang/python-3.12.1".parse().unwrap()).with_slot("3.12");
        assert!(pkg.matches(&"dev-lang/python:3.12".parse().unwrap()));
        assert!(!pkg.matches(&"dev-lang/python:3.11".parse().unwrap()));
        assert!(pkg.matches(&">=dev-lang/python-3.12".parse().unwrap()));
    }
}
