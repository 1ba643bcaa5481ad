//! Package database query capability
//!
//! The redundancy analysis only talks to the package database through
//! [`PackageQuery`]. Besides lookups, the trait carries the three mutations
//! the analysis uses to simulate applying an override: accepting extra
//! keywords, masking and unmasking. Implementations start from the state
//! without any user overrides so each override is judged against the ones
//! applied before it.

use crate::Result;
use confcheck_config::{Cpv, PackageAtom};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Masking reason for versions matched by a package.mask entry
pub const PACKAGE_MASK: &str = "package.mask";

pub trait PackageQuery {
    /// Every version matching the atom, ascending
    fn match_all(&self, atom: &PackageAtom) -> Vec<Cpv>;

    /// Versions matching the atom that are currently visible, ascending
    fn match_visible(&self, atom: &PackageAtom) -> Vec<Cpv> {
        self.match_all(atom)
            .into_iter()
            .filter(|cpv| self.masking_reasons(cpv).is_empty())
            .collect()
    }

    /// Canonical version ordering
    fn compare_versions(&self, a: &Cpv, b: &Cpv) -> Ordering {
        a.version.cmp(&b.version)
    }

    /// Why a version is not visible; empty when it is
    fn masking_reasons(&self, cpv: &Cpv) -> BTreeSet<String>;

    /// Installed versions matching the atom, ascending
    fn installed_versions(&self, atom: &PackageAtom) -> Vec<Cpv>;

    /// IUSE of a version; fails with `NotAvailable` when the repository no
    /// longer carries it
    fn declared_use_flags(&self, cpv: &Cpv) -> Result<HashSet<String>>;

    /// USE flags an installed version was built with; fails with
    /// `NotAvailable` when it is not installed
    fn current_use_flags(&self, cpv: &Cpv) -> Result<HashSet<String>>;

    /// Whether a token is an atom this database can resolve. Used as the
    /// record validator when reading override files.
    fn is_valid_atom(token: &str) -> bool
    where
        Self: Sized,
    {
        confcheck_config::is_valid_atom(token)
    }

    /// The system-wide ACCEPT_KEYWORDS
    fn accept_keywords(&self) -> Vec<String>;

    /// Simulate a package.accept_keywords entry
    fn accept_package_keywords(&mut self, atom: &PackageAtom, keywords: &[String]);

    /// Simulate a package.mask entry
    fn mask(&mut self, atom: &PackageAtom);

    /// Simulate a package.unmask entry
    fn unmask(&mut self, atom: &PackageAtom);
}
