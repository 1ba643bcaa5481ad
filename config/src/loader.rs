//! Configuration locations and loading utilities
//!
//! Resolves the configuration root, the override files of each
//! [`Category`], and the variables of `make.conf`.

use crate::reader::ConfigReader;
use crate::{ConfigError, Result};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("variable pattern is valid")
});

/// Override file categories, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Keywords,
    Mask,
    Unmask,
    Use,
    Features,
    Cflags,
    Cxxflags,
    Ldflags,
}

impl Category {
    /// Every category, in processing order
    pub const ALL: [Category; 8] = [
        Category::Keywords,
        Category::Mask,
        Category::Unmask,
        Category::Use,
        Category::Features,
        Category::Cflags,
        Category::Cxxflags,
        Category::Ldflags,
    ];

    /// Name used in issue codes
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Keywords => "keywords",
            Category::Mask => "mask",
            Category::Unmask => "unmask",
            Category::Use => "use",
            Category::Features => "features",
            Category::Cflags => "cflags",
            Category::Cxxflags => "cxxflags",
            Category::Ldflags => "ldflags",
        }
    }

    /// Override file names below the configuration root
    pub fn file_names(&self) -> &'static [&'static str] {
        match self {
            Category::Keywords => &["package.accept_keywords", "package.keywords"],
            Category::Mask => &["package.mask"],
            Category::Unmask => &["package.unmask"],
            Category::Use => &["package.use"],
            Category::Features => &["package.features"],
            Category::Cflags => &["package.cflags"],
            Category::Cxxflags => &["package.cxxflags"],
            Category::Ldflags => &["package.ldflags"],
        }
    }

}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// Environment variable names used by the configuration system
pub mod env_vars {
    /// Configuration root override (the directory holding `etc/portage`)
    pub const PORTAGE_CONFIGROOT: &str = "PORTAGE_CONFIGROOT";
}

/// Default configuration paths
pub mod paths {
    use std::path::PathBuf;

    /// System configuration root
    pub fn system_config() -> PathBuf {
        PathBuf::from("/etc/portage")
    }

    /// Default ebuild repository
    pub fn repository() -> PathBuf {
        PathBuf::from("/var/db/repos/gentoo")
    }

    /// Installed package database, relative to the filesystem root
    pub fn vdb(root: &std::path::Path) -> PathBuf {
        root.join("var/db/pkg")
    }
}

/// Get configuration root from environment or default
pub fn get_config_root() -> PathBuf {
    std::env::var(env_vars::PORTAGE_CONFIGROOT)
        .map(|root| PathBuf::from(root).join("etc/portage"))
        .unwrap_or_else(|_| paths::system_config())
}

/// Locates override files below a configuration root
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a loader for the system configuration
    pub fn system() -> Self {
        Self::new(get_config_root())
    }

    /// Get path to a configuration file
    pub fn config_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Readers for every existing override file of a category
    pub fn readers(&self, category: Category) -> Vec<ConfigReader> {
        category
            .file_names()
            .iter()
            .map(|name| self.config_path(name))
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    debug!("No {} overrides at {}", category, path.display());
                }
                exists
            })
            .map(ConfigReader::new)
            .collect()
    }

    /// Load make.conf, returning empty settings when it is absent
    pub fn make_conf(&self) -> Result<MakeConf> {
        let path = self.config_path("make.conf");
        if path.exists() {
            MakeConf::load(&path)
        } else {
            debug!("No make.conf at {}", path.display());
            Ok(MakeConf::default())
        }
    }

    /// The profile directory `make.profile` points at, if any
    pub fn profile_dir(&self) -> Option<PathBuf> {
        let link = self.config_path("make.profile");
        link.canonicalize().ok().filter(|p| p.is_dir())
    }
}

/// Shell-style variable assignments from make.conf or make.defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeConf {
    vars: IndexMap<String, String>,
}

impl MakeConf {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a file, or every file of a directory in name order
    pub fn load(path: &Path) -> Result<Self> {
        let mut conf = Self::new();
        if path.is_dir() {
            let mut entries: Vec<_> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .filter(|p| !p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.')))
                .collect();
            entries.sort();
            for entry in entries {
                conf.parse_into(&std::fs::read_to_string(entry)?);
            }
        } else {
            conf.parse_into(&std::fs::read_to_string(path)?);
        }
        Ok(conf)
    }

    /// Parse assignments from a string
    pub fn parse(content: &str) -> Self {
        let mut conf = Self::new();
        conf.parse_into(content);
        conf
    }

    /// Parse assignments, expanding references to earlier variables.
    ///
    /// Quoted values may span several lines.
    pub fn parse_into(&mut self, content: &str) {
        // Join continuation lines first
        let joined = content.replace("\\\n", " ");
        let mut pending = String::new();

        for line in joined.lines() {
            if pending.is_empty() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                pending.push_str(line);
            } else {
                pending.push('\n');
                pending.push_str(line);
            }

            if open_quote(&pending).is_none() {
                let statement = std::mem::take(&mut pending);
                self.assign(&statement);
            }
        }

        if !pending.is_empty() {
            debug!("Unterminated quote in assignment: {}", pending);
            self.assign(&pending);
        }
    }

    fn assign(&mut self, statement: &str) {
        let statement = statement.strip_prefix("export ").unwrap_or(statement);

        let Some((key, value)) = statement.split_once('=') else {
            return;
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return;
        }

        let value = match unquote(value.trim()) {
            (inner, Some('\'')) => inner.to_string(),
            (inner, _) => self.expand(inner),
        };
        self.vars.insert(key.to_string(), value);
    }

    /// Expand `${VAR}` and `$VAR` references. Unknown variables expand to
    /// nothing.
    pub fn expand(&self, value: &str) -> String {
        VAR_RE
            .replace_all(value, |caps: &Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                self.get(name).unwrap_or_default().to_string()
            })
            .into_owned()
    }

    /// Get a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// The quote still open at the end of `statement`, if any
fn open_quote(statement: &str) -> Option<char> {
    let mut quote = None;
    let mut escaped = false;
    let mut prev = ' ';

    for c in statement.chars() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '#' && prev.is_whitespace() => break,
            None if c == '"' || c == '\'' => quote = Some(c),
            None => {}
        }
        prev = c;
    }
    quote
}

/// Strip surrounding quotes or a trailing comment, returning the quote used
fn unquote(value: &str) -> (&str, Option<char>) {
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            let inner = rest.find(quote).map_or(rest, |end| &rest[..end]);
            return (inner, Some(quote));
        }
    }
    let bare = match value.find(" #") {
        Some(at) => &value[..at],
        None => value,
    };
    (bare.trim(), None)
}
