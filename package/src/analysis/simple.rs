//! package.features, package.cflags, package.cxxflags and package.ldflags
//! classification
//!
//! These files only add settings, so whether an entry changes anything
//! cannot be told from the package data. Only existence, installation and
//! relevance are checked.

use super::{installed_is_newer, Classification};
use crate::issue::IssueKind;
use crate::query::PackageQuery;
use confcheck_config::PackageAtom;

pub fn classify<Q: PackageQuery + ?Sized>(db: &Q, atom: &PackageAtom) -> Option<Classification> {
    let all = db.match_all(atom);
    if all.is_empty() {
        return Some(Classification::exists());
    }

    let installed = db.installed_versions(&atom.package());
    if installed.is_empty() {
        return Some(Classification::not_installed());
    }

    if installed_is_newer(db, &installed, &all) {
        return Some(Classification::new(
            IssueKind::Irrelevant,
            "only affects irrelevant versions",
        ));
    }

    None
}
