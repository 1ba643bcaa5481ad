//! Issue codes and the enabled-issue set
//!
//! Every finding carries an [`IssueCode`] such as `keywords.redundant` or
//! `use.iuse`. Which codes are reported is decided by an
//! [`EnabledIssueSet`], built once from the command line before any
//! analysis runs.

use crate::{Error, Result};
use confcheck_config::Category;
use glob::Pattern;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// What is wrong with an override entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueKind {
    /// The atom matches no package in the repository
    Exists,
    /// The entry only affects versions older than the installed one
    Irrelevant,
    /// No matching version is installed
    NotInstalled,
    /// The entry changes nothing
    Redundant,
    /// The entry names USE flags the package does not declare
    Iuse,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Exists => "exists",
            IssueKind::Irrelevant => "irrelevant",
            IssueKind::NotInstalled => "not_installed",
            IssueKind::Redundant => "redundant",
            IssueKind::Iuse => "iuse",
        }
    }

    /// Kinds that can be reported for a category, in check order
    pub fn for_category(category: Category) -> &'static [IssueKind] {
        use IssueKind::*;
        match category {
            Category::Keywords | Category::Unmask => &[Exists, Irrelevant, NotInstalled, Redundant],
            Category::Mask => &[Exists, Redundant, NotInstalled],
            Category::Use => &[Exists, Iuse, NotInstalled, Redundant],
            Category::Features | Category::Cflags | Category::Cxxflags | Category::Ldflags => {
                &[Exists, Irrelevant, NotInstalled]
            }
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An issue code: override category plus issue kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueCode {
    pub category: Category,
    pub kind: IssueKind,
}

impl IssueCode {
    /// Create a code, if the kind can be reported for the category
    pub fn new(category: Category, kind: IssueKind) -> Option<Self> {
        IssueKind::for_category(category)
            .contains(&kind)
            .then_some(Self { category, kind })
    }

    /// Every valid code, grouped by category
    pub fn all() -> Vec<IssueCode> {
        Category::ALL
            .into_iter()
            .flat_map(|category| {
                IssueKind::for_category(category)
                    .iter()
                    .map(move |&kind| IssueCode { category, kind })
            })
            .collect()
    }

    /// Dotted name, e.g. `keywords.redundant`
    pub fn as_str(&self) -> String {
        format!("{}.{}", self.category, self.kind)
    }

    /// One-line explanation for `--list-issues`
    pub fn description(&self) -> &'static str {
        match (self.category, self.kind) {
            (_, IssueKind::Exists) => "entry matches no package in the repository",
            (_, IssueKind::NotInstalled) => "no matching version is installed",
            (Category::Keywords, IssueKind::Redundant) => {
                "entry does not change which versions are visible"
            }
            (Category::Keywords, IssueKind::Irrelevant) => {
                "entry only changes versions older than the installed one"
            }
            (Category::Mask, IssueKind::Redundant) => "versions are already masked",
            (Category::Unmask, IssueKind::Redundant) => "versions are not masked by package.mask",
            (Category::Unmask, IssueKind::Irrelevant) => {
                "entry only unmasks versions older than the installed one"
            }
            (Category::Use, IssueKind::Iuse) => "package does not declare these USE flags",
            (Category::Use, IssueKind::Redundant) => {
                "USE flags already have the requested state"
            }
            (_, IssueKind::Irrelevant) => {
                "entry only affects versions older than the installed one"
            }
            _ => "",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.kind)
    }
}

impl FromStr for IssueCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IssueCode::all()
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| Error::UnknownIssue(s.to_string()))
    }
}

/// The set of issue codes that get reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledIssueSet {
    enabled: BTreeSet<IssueCode>,
}

impl Default for EnabledIssueSet {
    fn default() -> Self {
        Self::all()
    }
}

impl EnabledIssueSet {
    /// Every issue enabled
    pub fn all() -> Self {
        Self {
            enabled: IssueCode::all().into_iter().collect(),
        }
    }

    /// Enable every code matching one of the comma-separated glob patterns
    pub fn enable(&mut self, patterns: &str) -> Result<()> {
        for code in matching_codes(patterns)? {
            self.enabled.insert(code);
        }
        Ok(())
    }

    /// Disable every code matching one of the comma-separated glob patterns
    pub fn disable(&mut self, patterns: &str) -> Result<()> {
        for code in matching_codes(patterns)? {
            self.enabled.remove(&code);
        }
        Ok(())
    }

    pub fn is_enabled(&self, code: IssueCode) -> bool {
        self.enabled.contains(&code)
    }
}

fn matching_codes(patterns: &str) -> Result<Vec<IssueCode>> {
    let mut codes = Vec::new();

    for raw in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let pattern = Pattern::new(raw)?;
        let before = codes.len();
        codes.extend(
            IssueCode::all()
                .into_iter()
                .filter(|code| pattern.matches(&code.as_str())),
        );
        if codes.len() == before {
            warn!("Issue pattern '{}' matches no issue", raw);
        }
    }

    Ok(codes)
}
