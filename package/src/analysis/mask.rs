//! package.mask and package.unmask classification

use super::{installed_is_newer, Classification};
use crate::issue::IssueKind;
use crate::query::{PackageQuery, PACKAGE_MASK};
use confcheck_config::PackageAtom;

fn masked_by_package_mask<Q: PackageQuery + ?Sized>(db: &Q, cpv: &confcheck_config::Cpv) -> bool {
    db.masking_reasons(cpv).contains(PACKAGE_MASK)
}

/// Classify a package.mask entry, then apply it to the simulated state
pub fn classify_mask<Q: PackageQuery + ?Sized>(
    db: &mut Q,
    atom: &PackageAtom,
) -> Option<Classification> {
    let result = check_mask(&*db, atom);
    db.mask(atom);
    result
}

fn check_mask<Q: PackageQuery + ?Sized>(db: &Q, atom: &PackageAtom) -> Option<Classification> {
    let all = db.match_all(atom);
    if all.is_empty() {
        return Some(Classification::exists());
    }

    // Masking a package that is not installed is normal; only a
    // version-qualified mask of an absent package is suspicious.
    if atom.has_version() && db.installed_versions(&atom.package()).is_empty() {
        return Some(Classification::not_installed());
    }

    if all.iter().all(|cpv| masked_by_package_mask(db, cpv)) {
        return Some(Classification::new(
            IssueKind::Redundant,
            "already masked by package.mask",
        ));
    }

    None
}

/// Classify a package.unmask entry, then apply it to the simulated state
pub fn classify_unmask<Q: PackageQuery + ?Sized>(
    db: &mut Q,
    atom: &PackageAtom,
) -> Option<Classification> {
    let result = check_unmask(&*db, atom);
    db.unmask(atom);
    result
}

fn check_unmask<Q: PackageQuery + ?Sized>(db: &Q, atom: &PackageAtom) -> Option<Classification> {
    let all = db.match_all(atom);
    if all.is_empty() {
        return Some(Classification::exists());
    }

    let installed = db.installed_versions(&atom.package());
    if installed.is_empty() {
        return Some(Classification::not_installed());
    }

    if !all.iter().any(|cpv| masked_by_package_mask(db, cpv)) {
        return Some(Classification::new(
            IssueKind::Redundant,
            "not masked by package.mask",
        ));
    }

    if installed_is_newer(db, &installed, &all) {
        return Some(Classification::new(
            IssueKind::Irrelevant,
            "only unmasks irrelevant versions",
        ));
    }

    None
}
