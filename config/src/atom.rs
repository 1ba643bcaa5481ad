//! Package atom parsing and matching
//!
//! Implements the Gentoo-style package atoms accepted in per-package
//! override files:
//! - `category/package`
//! - `>=category/package-1.0`
//! - `=category/package-1.0*`
//! - `category/package:slot`
//! - `category/package::repository`

use crate::version::{Cpv, Version};
use crate::{ConfigError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9+_.-]*$").expect("category pattern is valid")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9+_-]*$").expect("name pattern is valid")
});

static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9+_.-]*$").expect("slot pattern is valid")
});

/// Version comparison operators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VersionOp {
    /// No version constraint
    #[default]
    Any,
    /// Exact version match (=)
    Equal,
    /// Greater than (>)
    Greater,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than (<)
    Less,
    /// Less than or equal (<=)
    LessEqual,
    /// Version glob match (=*), e.g., =category/package-1.0*
    GlobEqual,
    /// Any revision of the version (~)
    RevisionBump,
}

/// A package atom as written in an override file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageAtom {
    /// Version operator
    pub operator: VersionOp,
    /// Package category (e.g., "sys-apps")
    pub category: String,
    /// Package name (e.g., "systemd")
    pub name: String,
    /// Version (present exactly when `operator` is not `Any`)
    pub version: Option<Version>,
    /// Slot restriction (optional)
    pub slot: Option<String>,
    /// Sub-slot restriction (optional)
    pub subslot: Option<String>,
    /// Repository restriction (optional)
    pub repository: Option<String>,
}

impl PackageAtom {
    /// Create a new package atom with just category and name
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            operator: VersionOp::Any,
            category: category.into(),
            name: name.into(),
            version: None,
            slot: None,
            subslot: None,
            repository: None,
        }
    }

    /// Get the fully qualified package name (category/name)
    pub fn cp(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// The bare package atom, without version, slot or repository
    pub fn package(&self) -> PackageAtom {
        PackageAtom::new(self.category.clone(), self.name.clone())
    }

    /// Whether this atom carries a version constraint
    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    /// Check if this atom matches a given category/name
    pub fn matches_cp(&self, category: &str, name: &str) -> bool {
        self.category == category && self.name == name
    }

    /// Check if a package version satisfies this atom's name and version
    /// constraint
    pub fn matches(&self, cpv: &Cpv) -> bool {
        if !self.matches_cp(&cpv.category, &cpv.name) {
            return false;
        }

        let Some(wanted) = &self.version else {
            return true;
        };
        let have = &cpv.version;

        match self.operator {
            VersionOp::Any => true,
            VersionOp::Equal => have == wanted,
            VersionOp::Greater => have > wanted,
            VersionOp::GreaterEqual => have >= wanted,
            VersionOp::Less => have < wanted,
            VersionOp::LessEqual => have <= wanted,
            VersionOp::GlobEqual => have.as_str().starts_with(wanted.as_str()),
            VersionOp::RevisionBump => have.cmp_base(wanted).is_eq(),
        }
    }

    /// Check name, version, slot and repository restrictions at once.
    ///
    /// Restrictions whose candidate value is unknown are treated as met.
    pub fn matches_with(&self, cpv: &Cpv, slot: Option<&str>, repository: Option<&str>) -> bool {
        if !self.matches(cpv) {
            return false;
        }

        if let (Some(wanted), Some(have)) = (&self.slot, slot) {
            let (have_slot, have_subslot) = match have.split_once('/') {
                Some((s, sub)) => (s, Some(sub)),
                None => (have, None),
            };
            if wanted != have_slot {
                return false;
            }
            if let (Some(wanted_sub), Some(have_sub)) = (&self.subslot, have_subslot) {
                if wanted_sub != have_sub {
                    return false;
                }
            }
        }

        if let (Some(wanted), Some(have)) = (&self.repository, repository) {
            if wanted != have {
                return false;
            }
        }

        true
    }
}

/// Check whether a token is a valid override-file atom
pub fn is_valid_atom(token: &str) -> bool {
    token.parse::<PackageAtom>().is_ok()
}

impl FromStr for PackageAtom {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidAtom("empty atom".to_string()));
        }

        let mut remaining = s;

        // Parse operator
        let operator = if let Some(rest) = remaining.strip_prefix(">=") {
            remaining = rest;
            VersionOp::GreaterEqual
        } else if let Some(rest) = remaining.strip_prefix("<=") {
            remaining = rest;
            VersionOp::LessEqual
        } else if let Some(rest) = remaining.strip_prefix('>') {
            remaining = rest;
            VersionOp::Greater
        } else if let Some(rest) = remaining.strip_prefix('<') {
            remaining = rest;
            VersionOp::Less
        } else if let Some(rest) = remaining.strip_prefix('~') {
            remaining = rest;
            VersionOp::RevisionBump
        } else if let Some(rest) = remaining.strip_prefix('=') {
            remaining = rest;
            VersionOp::Equal
        } else {
            VersionOp::Any
        };

        // Extract repository ::repo
        let mut repository = None;
        if let Some(idx) = remaining.find("::") {
            let repo = &remaining[idx + 2..];
            if !NAME_RE.is_match(repo) {
                return Err(ConfigError::InvalidAtom(format!("invalid repository: {}", s)));
            }
            repository = Some(repo.to_string());
            remaining = &remaining[..idx];
        }

        // Extract slot :slot/subslot
        let mut slot = None;
        let mut subslot = None;
        if let Some(idx) = remaining.find(':') {
            let slot_str = &remaining[idx + 1..];
            let (slot_part, sub_part) = match slot_str.split_once('/') {
                Some((a, b)) => (a, Some(b)),
                None => (slot_str, None),
            };
            if !SLOT_RE.is_match(slot_part) || sub_part.is_some_and(|sub| !SLOT_RE.is_match(sub)) {
                return Err(ConfigError::InvalidAtom(format!("invalid slot: {}", s)));
            }
            slot = Some(slot_part.to_string());
            subslot = sub_part.map(str::to_string);
            remaining = &remaining[..idx];
        }

        // Trailing * turns = into a glob match
        let operator = match remaining.strip_suffix('*') {
            Some(rest) if operator == VersionOp::Equal => {
                remaining = rest;
                VersionOp::GlobEqual
            }
            Some(_) => {
                return Err(ConfigError::InvalidAtom(format!("misplaced wildcard: {}", s)));
            }
            None => operator,
        };

        // Parse category/name-version
        let (category, name_version) = remaining
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidAtom(format!("missing category: {}", s)))?;

        if !CATEGORY_RE.is_match(category) {
            return Err(ConfigError::InvalidAtom(format!("invalid category: {}", s)));
        }

        let (name, version) = if operator == VersionOp::Any {
            // An unversioned atom must not look like it carries a version
            if Cpv::split_name_version(name_version).is_some() {
                return Err(ConfigError::InvalidAtom(format!(
                    "version without operator: {}",
                    s
                )));
            }
            (name_version.to_string(), None)
        } else {
            let (name, version) = Cpv::split_name_version(name_version)
                .ok_or_else(|| {
                    ConfigError::InvalidAtom(format!("operator without version: {}", s))
                })?;
            (name.to_string(), Some(version))
        };

        if !NAME_RE.is_match(&name) {
            return Err(ConfigError::InvalidAtom(format!("invalid package name: {}", s)));
        }

        Ok(PackageAtom {
            operator,
            category: category.to_string(),
            name,
            version,
            slot,
            subslot,
            repository,
        })
    }
}

impl fmt::Display for PackageAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Write operator
        match self.operator {
            VersionOp::Any => {}
            VersionOp::Equal | VersionOp::GlobEqual => write!(f, "=")?,
            VersionOp::Greater => write!(f, ">")?,
            VersionOp::GreaterEqual => write!(f, ">=")?,
            VersionOp::Less => write!(f, "<")?,
            VersionOp::LessEqual => write!(f, "<=")?,
            VersionOp::RevisionBump => write!(f, "~")?,
        }

        write!(f, "{}/{}", self.category, self.name)?;

        if let Some(ref ver) = self.version {
            write!(f, "-{}", ver)?;
        }

        if self.operator == VersionOp::GlobEqual {
            write!(f, "*")?;
        }

        if let Some(ref slot) = self.slot {
            write!(f, ":{}", slot)?;
            if let Some(ref subslot) = self.subslot {
                write!(f, "/{}", subslot)?;
            }
        }

        if let Some(ref repo) = self.repository {
            write!(f, "::{}", repo)?;
        }

        Ok(())
    }
}
