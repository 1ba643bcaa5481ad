//! package.use classification

use super::Classification;
use crate::issue::IssueKind;
use crate::query::PackageQuery;
use confcheck_config::{split_use_string, strip_flag, PackageAtom, UseChange};
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

/// Apply a change list to a version's current flags.
///
/// Returns whether the flags end up unchanged, and every token that did not
/// change anything when it was applied (as written).
pub fn has_redundancy(current: &HashSet<String>, changes: &[String]) -> (bool, BTreeSet<String>) {
    let mut working = current.clone();
    let mut redundant = BTreeSet::new();

    for token in changes {
        let changed = match UseChange::parse(token) {
            UseChange::ClearAll => {
                working.clear();
                continue;
            }
            UseChange::ClearGroup(prefix) => {
                working.retain(|flag| !flag.starts_with(&prefix));
                continue;
            }
            UseChange::Disable(flag) => working.remove(&flag),
            UseChange::Enable(flag) => working.insert(flag),
        };
        if !changed {
            redundant.insert(token.clone());
        }
    }

    (working == *current, redundant)
}

pub fn classify<Q: PackageQuery + ?Sized>(
    db: &Q,
    atom: &PackageAtom,
    value: &str,
    warned: &mut HashSet<String>,
) -> Option<Classification> {
    if db.match_all(atom).is_empty() {
        return Some(Classification::exists());
    }

    let installed = db.installed_versions(atom);
    if installed.is_empty() {
        return Some(Classification::not_installed());
    }

    let changes = split_use_string(value);
    let mut unknown: BTreeSet<&str> = changes
        .iter()
        .map(|token| strip_flag(token))
        .filter(|flag| !flag.is_empty() && !flag.ends_with('*'))
        .collect();

    let mut broken = false;
    for cpv in &installed {
        match db.declared_use_flags(cpv) {
            Ok(iuse) => unknown.retain(|flag| !iuse.contains(*flag)),
            Err(e) => {
                broken = true;
                if warned.insert(cpv.to_string()) {
                    warn!("Cannot check USE flags of installed {}: {}", cpv, e);
                }
            }
        }
    }

    if !unknown.is_empty() {
        let flags: Vec<&str> = unknown.into_iter().collect();
        return Some(Classification::new(
            IssueKind::Iuse,
            format!("unknown USE flags: {}", flags.join(", ")),
        ));
    }

    let mut all_redundant = true;
    let mut redundant: Option<BTreeSet<String>> = None;
    for cpv in &installed {
        let current = match db.current_use_flags(cpv) {
            Ok(current) => current,
            Err(e) => {
                broken = true;
                if warned.insert(cpv.to_string()) {
                    warn!("Cannot read USE flags of installed {}: {}", cpv, e);
                }
                continue;
            }
        };

        let (unchanged, tokens) = has_redundancy(&current, &changes);
        all_redundant &= unchanged;
        redundant = Some(match redundant {
            Some(previous) => previous.intersection(&tokens).cloned().collect(),
            None => tokens,
        });
    }

    if broken {
        return None;
    }

    if all_redundant {
        return Some(Classification::new(IssueKind::Redundant, "no change in useflags"));
    }

    match redundant {
        Some(tokens) if !tokens.is_empty() => {
            let tokens: Vec<String> = tokens.into_iter().collect();
            Some(Classification::new(
                IssueKind::Redundant,
                format!("redundant useflags: {}", tokens.join(" ")),
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::types::{AvailablePackage, InstalledPackage};

    fn flags(s: &str) -> HashSet<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn changes(s: &str) -> Vec<String> {
        split_use_string(s)
    }

    fn tokens(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_has_redundancy() {
        assert_eq!(has_redundancy(&flags("a b"), &changes("a")), (true, tokens(&["a"])));
        assert_eq!(has_redundancy(&flags("a b"), &changes("-c")), (true, tokens(&["-c"])));
        assert_eq!(has_redundancy(&flags("a b"), &changes("-a")), (false, tokens(&[])));
        assert_eq!(has_redundancy(&flags("a b"), &changes("-* a b")), (true, tokens(&[])));
        assert_eq!(has_redundancy(&flags("a"), &changes("+a -b")), (true, tokens(&["+a", "-b"])));
        assert_eq!(has_redundancy(&flags(""), &changes("")), (true, tokens(&[])));
        assert_eq!(has_redundancy(&flags("a b"), &changes("-a c")), (false, tokens(&[])));
        assert_eq!(has_redundancy(&flags("a"), &changes("+a")), (true, tokens(&["+a"])));
        assert_eq!(has_redundancy(&flags("a b"), &changes("-* a")), (false, tokens(&[])));
    }

    #[test]
    fn test_group_clear_keeps_other_flags() {
        let current = flags("ssl video_cards_intel");
        assert_eq!(
            has_redundancy(&current, &changes("VIDEO_CARDS: -* intel")),
            (true, tokens(&[]))
        );
        assert_eq!(
            has_redundancy(&current, &changes("VIDEO_CARDS: -*")),
            (false, tokens(&[]))
        );
    }

    #[test]
    fn test_partially_redundant_tokens() {
        assert_eq!(has_redundancy(&flags("a"), &changes("a c")), (false, tokens(&["a"])));
    }

    #[test]
    fn test_exists_and_installed() {
        let db = sample_db();
        let mut warned = HashSet::new();
        let result = classify(&db, &atom("app-misc/nope"), "ssl", &mut warned).unwrap();
        assert_eq!(result.kind, IssueKind::Exists);

        // Installed lookup uses the exact atom
        let result = classify(&db, &atom("=app-misc/foo-2.0"), "ssl", &mut warned).unwrap();
        assert_eq!(result.kind, IssueKind::NotInstalled);
    }

    #[test]
    fn test_unknown_flags() {
        let db = sample_db();
        let mut warned = HashSet::new();
        let result = classify(&db, &atom("app-misc/foo"), "-* ssl gtk +qt5", &mut warned).unwrap();
        assert_eq!(result.kind, IssueKind::Iuse);
        assert_eq!(result.message, "unknown USE flags: gtk, qt5");
    }

    #[test]
    fn test_redundant_override() {
        let db = sample_db();
        let mut warned = HashSet::new();

        let result = classify(&db, &atom("app-misc/foo"), "ssl -debug", &mut warned).unwrap();
        assert_eq!(result.kind, IssueKind::Redundant);
        assert_eq!(result.message, "no change in useflags");

        let result = classify(&db, &atom("app-misc/foo"), "+ssl debug", &mut warned).unwrap();
        assert_eq!(result.message, "redundant useflags: +ssl");

        assert_eq!(classify(&db, &atom("app-misc/foo"), "-ssl debug", &mut warned), None);
    }

    #[test]
    fn test_group_clear_in_use_expand() {
        let mut db = sample_db();
        db.add_available(
            AvailablePackage::new(cpv("media-libs/mesa-24.1"))
                .with_iuse("ssl video_cards_intel video_cards_nouveau"),
        );
        db.add_installed(
            InstalledPackage::new(cpv("media-libs/mesa-24.1")).with_use("ssl video_cards_intel"),
        );

        let mut warned = HashSet::new();
        let mesa = atom("media-libs/mesa");
        let result = classify(&db, &mesa, "VIDEO_CARDS: -* intel", &mut warned).unwrap();
        assert_eq!(result.kind, IssueKind::Redundant);
        assert_eq!(result.message, "no change in useflags");

        assert_eq!(classify(&db, &mesa, "VIDEO_CARDS: -* nouveau", &mut warned), None);
    }

    #[test]
    fn test_tokens_must_be_redundant_for_every_version() {
        let mut db = sample_db();
        db.add_available(AvailablePackage::new(cpv("app-misc/foo-1.0-r1")).with_iuse("ssl debug"));
        db.add_installed(InstalledPackage::new(cpv("app-misc/foo-1.0-r1")).with_use("debug"));

        let mut warned = HashSet::new();
        // ssl is redundant only for 1.0, debug only for 1.0-r1
        assert_eq!(classify(&db, &atom("~app-misc/foo-1.0"), "ssl debug", &mut warned), None);
    }

    #[test]
    fn test_unresolvable_version_hides_redundancy() {
        let mut db = sample_db();
        // Installed but gone from the repository
        db.add_installed(InstalledPackage::new(cpv("app-misc/foo-0.9")).with_use("ssl"));

        let mut warned = HashSet::new();
        assert_eq!(classify(&db, &atom("app-misc/foo"), "ssl", &mut warned), None);
        assert_eq!(classify(&db, &atom("app-misc/foo"), "ssl", &mut warned), None);
        assert_eq!(warned.len(), 1);
        assert!(warned.contains("app-misc/foo-0.9"));
    }
}
