//! Redundancy analysis of override entries
//!
//! Each override category has its own classifier. A classifier runs its
//! checks in a fixed order (existence, then installation, then the
//! category's own redundancy checks) and stops at the first one that
//! fires, so a record yields at most one [`Finding`].
//!
//! Classifiers that correspond to portage state (keywords, mask, unmask)
//! apply the override to the database's simulated state as they go, so
//! every entry is judged against the entries read before it.

pub mod keywords;
pub mod mask;
pub mod simple;
pub mod use_flags;

use crate::issue::{IssueCode, IssueKind};
use crate::query::PackageQuery;
use confcheck_config::{Category, Cpv, OverrideRecord, PackageAtom};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// A reported problem with one override entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub issue: IssueCode,
    /// File the entry was read from
    pub source: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The atom as written
    pub atom: String,
    pub message: String,
}

/// Outcome of classifying one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: IssueKind,
    pub message: String,
}

impl Classification {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn exists() -> Self {
        Self::new(IssueKind::Exists, "does not exist")
    }

    pub(crate) fn not_installed() -> Self {
        Self::new(IssueKind::NotInstalled, "not installed")
    }
}

/// Whether the newest installed version sorts after every matched version.
///
/// Both slices are ascending; the last element is the highest.
pub(crate) fn installed_is_newer<Q: PackageQuery + ?Sized>(
    db: &Q,
    installed: &[Cpv],
    matched: &[Cpv],
) -> bool {
    match (installed.last(), matched.last()) {
        (Some(installed), Some(highest)) => {
            db.compare_versions(installed, highest) == Ordering::Greater
        }
        _ => false,
    }
}

/// Classifies override entries against a package database
pub struct Analyzer<'a, Q: PackageQuery> {
    db: &'a mut Q,
    /// Versions already warned about as missing from the repository
    warned: HashSet<String>,
}

impl<'a, Q: PackageQuery> Analyzer<'a, Q> {
    pub fn new(db: &'a mut Q) -> Self {
        Self {
            db,
            warned: HashSet::new(),
        }
    }

    /// Classify one entry of the given category.
    ///
    /// Entries marked by a skip directive are still applied to the simulated
    /// state but never produce a finding.
    pub fn analyze(&mut self, category: Category, record: &OverrideRecord) -> Option<Finding> {
        let atom: PackageAtom = match record.atom.parse() {
            Ok(atom) => atom,
            Err(e) => {
                debug!("Ignoring {}:{}: {}", record.source.display(), record.line, e);
                return None;
            }
        };

        if record.skip {
            debug!("Skipping {}:{} {}", record.source.display(), record.line, record.atom);
            self.apply(category, &atom, &record.value);
            return None;
        }

        let classification = match category {
            Category::Keywords => keywords::classify(&mut *self.db, &atom, &record.value),
            Category::Mask => mask::classify_mask(&mut *self.db, &atom),
            Category::Unmask => mask::classify_unmask(&mut *self.db, &atom),
            Category::Use => use_flags::classify(&*self.db, &atom, &record.value, &mut self.warned),
            Category::Features | Category::Cflags | Category::Cxxflags | Category::Ldflags => {
                simple::classify(&*self.db, &atom)
            }
        }?;

        let issue = IssueCode::new(category, classification.kind)?;
        Some(Finding {
            issue,
            source: record.source.clone(),
            line: record.line,
            atom: record.atom.clone(),
            message: classification.message,
        })
    }

    /// Classify a stream of records, collecting the findings
    pub fn analyze_all(
        &mut self,
        category: Category,
        records: impl IntoIterator<Item = OverrideRecord>,
    ) -> Vec<Finding> {
        records
            .into_iter()
            .filter_map(|record| self.analyze(category, &record))
            .collect()
    }

    fn apply(&mut self, category: Category, atom: &PackageAtom, value: &str) {
        match category {
            Category::Keywords => {
                let keywords = keywords::override_keywords(&*self.db, value);
                self.db.accept_package_keywords(atom, &keywords);
            }
            Category::Mask => self.db.mask(atom),
            Category::Unmask => self.db.unmask(atom),
            _ => {}
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn record(atom: &str, value: &str, skip: bool) -> OverrideRecord {
        OverrideRecord {
            atom: atom.to_string(),
            value: value.to_string(),
            source: PathBuf::from("/etc/portage/package.accept_keywords"),
            line: 3,
            skip,
        }
    }

    #[test]
    fn test_finding_carries_location() {
        let mut db = sample_db();
        let mut analyzer = Analyzer::new(&mut db);

        let finding = analyzer
            .analyze(Category::Keywords, &record("app-misc/nope", "", false))
            .unwrap();
        assert_eq!(finding.issue.as_str(), "keywords.exists");
        assert_eq!(finding.line, 3);
        assert_eq!(finding.atom, "app-misc/nope");
    }

    #[test]
    fn test_skipped_record_still_applies() {
        let mut db = sample_db();
        let mut analyzer = Analyzer::new(&mut db);

        assert!(analyzer
            .analyze(Category::Keywords, &record("app-misc/foo", "~amd64", true))
            .is_none());
        // The skipped entry already made 2.0 visible
        let finding = analyzer
            .analyze(Category::Keywords, &record("app-misc/foo", "~amd64", false))
            .unwrap();
        assert_eq!(finding.issue.as_str(), "keywords.redundant");
    }

    #[test]
    fn test_installed_is_newer() {
        let db = sample_db();
        let installed = vec![cpv("app-misc/foo-2.1")];
        let changed = [cpv("app-misc/foo-1.0"), cpv("app-misc/foo-2.0")];
        assert!(installed_is_newer(&db, &installed, &changed));
        assert!(!installed_is_newer(&db, &installed, &[cpv("app-misc/foo-2.1")]));
        assert!(!installed_is_newer(&db, &[], &[cpv("app-misc/foo-2.1")]));
    }
}
