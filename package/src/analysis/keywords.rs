//! package.accept_keywords classification

use super::{installed_is_newer, Classification};
use crate::issue::IssueKind;
use crate::query::PackageQuery;
use confcheck_config::{Cpv, KeywordConfig, PackageAtom};
use std::collections::BTreeSet;
use tracing::debug;

/// Keywords an entry accepts. An entry without keywords accepts the testing
/// branch of every stable keyword in ACCEPT_KEYWORDS.
pub fn override_keywords<Q: PackageQuery + ?Sized>(db: &Q, value: &str) -> Vec<String> {
    let keywords: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    if !keywords.is_empty() {
        return keywords;
    }

    KeywordConfig::from_accept_string(&db.accept_keywords().join(" ")).default_override_keywords()
}

pub fn classify<Q: PackageQuery + ?Sized>(
    db: &mut Q,
    atom: &PackageAtom,
    value: &str,
) -> Option<Classification> {
    let all = db.match_all(atom);
    if all.is_empty() {
        return Some(Classification::exists());
    }

    let installed = db.installed_versions(&atom.package());
    if installed.is_empty() {
        return Some(Classification::not_installed());
    }

    let before: BTreeSet<Cpv> = db.match_visible(atom).into_iter().collect();
    for cpv in all.iter().filter(|cpv| !before.contains(cpv)) {
        debug!("{} masked by {:?}", cpv, db.masking_reasons(cpv));
    }

    let keywords = override_keywords(&*db, value);
    db.accept_package_keywords(atom, &keywords);
    let after: BTreeSet<Cpv> = db.match_visible(atom).into_iter().collect();

    if before == after {
        return Some(Classification::new(IssueKind::Redundant, "no effect"));
    }

    if installed_is_newer(&*db, &installed, &all) {
        return Some(Classification::new(
            IssueKind::Irrelevant,
            "only changes irrelevant versions",
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::types::{AvailablePackage, InstalledPackage};

    #[test]
    fn test_missing_package() {
        let mut db = sample_db();
        let result = classify(&mut db, &atom("app-misc/nope"), "~amd64").unwrap();
        assert_eq!(result.kind, IssueKind::Exists);
    }

    #[test]
    fn test_not_installed() {
        let mut db = sample_db();
        let result = classify(&mut db, &atom("app-misc/baz"), "~amd64").unwrap();
        assert_eq!(result.kind, IssueKind::NotInstalled);
    }

    #[test]
    fn test_versioned_atom_uses_package_for_installed_lookup() {
        let mut db = sample_db();
        // 2.0 is not installed, but 1.0 of the same package is
        assert_eq!(classify(&mut db, &atom("=app-misc/foo-2.0"), "~amd64"), None);
    }

    #[test]
    fn test_unlocking_testing_version() {
        let mut db = sample_db();
        assert_eq!(classify(&mut db, &atom("app-misc/foo"), "~amd64"), None);
    }

    #[test]
    fn test_default_keywords() {
        let mut db = sample_db();
        assert_eq!(override_keywords(&db, ""), vec!["~amd64".to_string()]);
        assert_eq!(override_keywords(&db, "**"), vec!["**".to_string()]);
        assert_eq!(classify(&mut db, &atom("app-misc/foo"), ""), None);
    }

    #[test]
    fn test_redundant_when_visibility_unchanged() {
        let mut db = sample_db();
        let result = classify(&mut db, &atom("app-misc/bar"), "~amd64").unwrap();
        assert_eq!(result.kind, IssueKind::Redundant);
        assert_eq!(result.message, "no effect");
    }

    #[test]
    fn test_earlier_entry_makes_later_redundant() {
        let mut db = sample_db();
        assert_eq!(classify(&mut db, &atom("app-misc/foo"), "~amd64"), None);
        let result = classify(&mut db, &atom("=app-misc/foo-2.0"), "~amd64").unwrap();
        assert_eq!(result.kind, IssueKind::Redundant);
    }

    #[test]
    fn test_irrelevant_when_installed_is_newer() {
        let mut db = sample_db();
        db.add_available(AvailablePackage::new(cpv("app-misc/qux-1.0")).with_keywords("~amd64"));
        db.add_available(AvailablePackage::new(cpv("app-misc/qux-3.0")).with_keywords("~amd64"));
        db.add_installed(InstalledPackage::new(cpv("app-misc/qux-3.0")));

        let result = classify(&mut db, &atom("=app-misc/qux-1.0"), "~amd64").unwrap();
        assert_eq!(result.kind, IssueKind::Irrelevant);
        assert_eq!(result.message, "only changes irrelevant versions");
    }
}
