//! Package version parsing and ordering
//!
//! Implements Gentoo-style package versions such as `1.2.3`, `2.0b`,
//! `1.0_rc2_p1` and `4.5-r3`, together with the canonical version
//! comparison used by the package manager. Ordering follows PMS:
//!
//! 1. numeric components (the first one as an integer, later ones with the
//!    leading-zero rule)
//! 2. the optional trailing letter
//! 3. suffixes, `_alpha < _beta < _pre < _rc < (none) < _p`
//! 4. the revision

use crate::{ConfigError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*)([a-z])?((?:_(?:alpha|beta|pre|rc|p)\d*)*)(?:-r(\d+))?$")
        .expect("version pattern is valid")
});

static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_(alpha|beta|pre|rc|p)(\d*)").expect("suffix pattern is valid")
});

/// Version suffix kinds, in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    P,
}

impl SuffixKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "alpha" => Some(Self::Alpha),
            "beta" => Some(Self::Beta),
            "pre" => Some(Self::Pre),
            "rc" => Some(Self::Rc),
            "p" => Some(Self::P),
            _ => None,
        }
    }
}

/// A single `_kindN` version suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Suffix {
    pub kind: SuffixKind,
    pub number: String,
}

/// A parsed package version
#[derive(Debug, Clone)]
pub struct Version {
    /// Dot-separated numeric components, kept as strings
    pub numbers: Vec<String>,
    /// Optional letter following the last numeric component
    pub letter: Option<char>,
    /// Version suffixes in order of appearance
    pub suffixes: Vec<Suffix>,
    /// Revision number (`-rN`), `0` when absent
    pub revision: String,
    raw: String,
}

impl Version {
    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self> {
        let caps = VERSION_RE
            .captures(s)
            .ok_or_else(|| ConfigError::InvalidVersion(s.to_string()))?;

        let numbers = caps[1].split('.').map(str::to_string).collect();
        let letter = caps.get(2).and_then(|m| m.as_str().chars().next());

        let suffixes = match caps.get(3) {
            Some(m) => SUFFIX_RE
                .captures_iter(m.as_str())
                .filter_map(|c| {
                    SuffixKind::parse(&c[1]).map(|kind| Suffix {
                        kind,
                        number: c[2].to_string(),
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        let revision = caps
            .get(4)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "0".to_string());

        Ok(Self {
            numbers,
            letter,
            suffixes,
            revision,
            raw: s.to_string(),
        })
    }

    /// The version string as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Compare two versions ignoring revisions
    pub fn cmp_base(&self, other: &Self) -> Ordering {
        compare_numbers(&self.numbers, &other.numbers)
            .then_with(|| self.letter.cmp(&other.letter))
            .then_with(|| compare_suffixes(&self.suffixes, &other.suffixes))
    }
}

/// Compare two decimal strings of arbitrary length as integers
fn compare_integers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_numbers(a: &[String], b: &[String]) -> Ordering {
    let first = compare_integers(&a[0], &b[0]);
    if first != Ordering::Equal {
        return first;
    }

    for (x, y) in a.iter().zip(b.iter()).skip(1) {
        let ord = if x.starts_with('0') || y.starts_with('0') {
            x.trim_end_matches('0').cmp(y.trim_end_matches('0'))
        } else {
            compare_integers(x, y)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.len().cmp(&b.len())
}

fn compare_suffixes(a: &[Suffix], b: &[Suffix]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x
            .kind
            .cmp(&y.kind)
            .then_with(|| compare_integers(&x.number, &y.number));
        if ord != Ordering::Equal {
            return ord;
        }
    }

    // An extra suffix sorts below the bare version unless it is a patch level
    match a.len().cmp(&b.len()) {
        Ordering::Greater if a[b.len()].kind == SuffixKind::P => Ordering::Greater,
        Ordering::Greater => Ordering::Less,
        Ordering::Less if b[a.len()].kind == SuffixKind::P => Ordering::Less,
        Ordering::Less => Ordering::Greater,
        Ordering::Equal => Ordering::Equal,
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_base(other)
            .then_with(|| compare_integers(&self.revision, &other.revision))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A fully qualified package version (`category/name-version`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpv {
    pub category: String,
    pub name: String,
    pub version: Version,
}

impl Cpv {
    /// Create a new cpv
    pub fn new(category: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            version,
        }
    }

    /// Get the package name without version (category/name)
    pub fn cp(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// Split a `name-version` string, as found in package directory names
    pub fn split_name_version(s: &str) -> Option<(&str, Version)> {
        for (idx, _) in s.match_indices('-') {
            let rest = &s[idx + 1..];
            if !rest.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            if let Ok(version) = Version::parse(rest) {
                if idx > 0 {
                    return Some((&s[..idx], version));
                }
            }
        }
        None
    }
}

impl FromStr for Cpv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let (category, name_version) = s
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidAtom(format!("missing category: {}", s)))?;

        if category.is_empty() || name_version.contains('/') {
            return Err(ConfigError::InvalidAtom(s.to_string()));
        }

        let (name, version) = Self::split_name_version(name_version)
            .ok_or_else(|| ConfigError::InvalidVersion(s.to_string()))?;

        Ok(Self::new(category, name, version))
    }
}

impl Ord for Cpv {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for Cpv {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Cpv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}", self.category, self.name, self.version)
    }
}
