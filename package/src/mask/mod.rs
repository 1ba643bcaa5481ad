//! Package masking and keywords system
//!
//! Computes why a package version is not visible:
//! - package.mask entries from the repository and the profile stack
//! - simulated user package.mask / package.unmask entries
//! - ACCEPT_KEYWORDS plus simulated package.accept_keywords entries

use crate::query::PACKAGE_MASK;
use crate::types::AvailablePackage;
use crate::Result;
use confcheck_config::{KeywordConfig, MakeConf, PackageAtom};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A keyword override entry from package.accept_keywords
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    /// Matching versions
    pub atom: PackageAtom,
    /// Keywords to accept (e.g., ["~amd64", "~arm64"])
    pub keywords: Vec<String>,
}

/// One line of a profile or repository package.mask file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskLine {
    /// `atom`: mask the matching versions
    Add(PackageAtom),
    /// `-atom`: drop a mask inherited from a parent profile
    Remove(PackageAtom),
}

/// Parse a package.mask file from a profile or repository
pub fn parse_mask_file(content: &str, source: &Path) -> Vec<MaskLine> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (removal, spec) = match line.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        match spec.parse::<PackageAtom>() {
            Ok(atom) if removal => entries.push(MaskLine::Remove(atom)),
            Ok(atom) => entries.push(MaskLine::Add(atom)),
            Err(_) => warn!("Invalid mask entry in {}: {}", source.display(), line),
        }
    }

    entries
}

/// Package mask and keyword manager
#[derive(Debug, Clone, Default)]
pub struct MaskManager {
    /// System architecture (e.g., "amd64")
    arch: Option<String>,
    /// Global accepted keywords
    accept_keywords: KeywordConfig,
    /// Repository and profile masks
    profile_masks: Vec<PackageAtom>,
    /// Simulated user masks
    masks: Vec<PackageAtom>,
    /// Simulated user unmasks (override masks)
    unmasks: Vec<PackageAtom>,
    /// Simulated keyword overrides
    keyword_overrides: Vec<KeywordEntry>,
}

impl MaskManager {
    /// Create a new mask manager
    pub fn new() -> Self {
        Self::default()
    }

    /// The system architecture, if known
    pub fn arch(&self) -> Option<&str> {
        self.arch.as_deref()
    }

    /// Set the system architecture
    pub fn set_arch(&mut self, arch: impl Into<String>) {
        self.arch = Some(arch.into());
    }

    /// Global accepted keywords
    pub fn accept_keywords(&self) -> &KeywordConfig {
        &self.accept_keywords
    }

    /// Apply an ACCEPT_KEYWORDS value on top of the current one
    pub fn apply_accept_keywords(&mut self, value: &str) {
        self.accept_keywords.apply_tokens(value.split_whitespace());
    }

    /// Apply parsed repository or profile package.mask lines
    pub fn apply_mask_lines(&mut self, lines: Vec<MaskLine>) {
        for line in lines {
            match line {
                MaskLine::Add(atom) => self.profile_masks.push(atom),
                MaskLine::Remove(atom) => self.profile_masks.retain(|m| m != &atom),
            }
        }
    }

    /// Add a simulated user mask
    pub fn add_mask(&mut self, atom: PackageAtom) {
        self.masks.push(atom);
    }

    /// Add a simulated user unmask
    pub fn add_unmask(&mut self, atom: PackageAtom) {
        self.unmasks.push(atom);
    }

    /// Add a simulated keyword override
    pub fn add_keyword_override(&mut self, atom: PackageAtom, keywords: Vec<String>) {
        self.keyword_overrides.push(KeywordEntry { atom, keywords });
    }

    /// Load the repository's own profiles/package.mask
    pub fn load_repo_masks(&mut self, repo: &Path) -> Result<()> {
        let path = repo.join("profiles/package.mask");
        if path.is_file() {
            let content = std::fs::read_to_string(&path)?;
            self.apply_mask_lines(parse_mask_file(&content, &path));
        }
        Ok(())
    }

    /// Load package.mask and make.defaults along a profile's parent chain,
    /// parents first
    pub fn load_profile(&mut self, profile_dir: &Path) -> Result<()> {
        let mut stack = Vec::new();
        let mut seen = HashSet::new();
        collect_profiles(profile_dir, &mut stack, &mut seen)?;

        for dir in stack {
            debug!("Loading profile {}", dir.display());

            let mask_path = dir.join("package.mask");
            if mask_path.is_file() {
                let content = std::fs::read_to_string(&mask_path)?;
                self.apply_mask_lines(parse_mask_file(&content, &mask_path));
            }

            let defaults_path = dir.join("make.defaults");
            if defaults_path.is_file() {
                let defaults = MakeConf::load(&defaults_path)?;
                if let Some(arch) = defaults.get("ARCH") {
                    self.set_arch(arch);
                }
                if let Some(keywords) = defaults.get("ACCEPT_KEYWORDS") {
                    self.apply_accept_keywords(keywords);
                }
            }
        }

        Ok(())
    }

    /// Check if a package is masked by package.mask
    pub fn is_masked(&self, pkg: &AvailablePackage) -> bool {
        let masked = self
            .profile_masks
            .iter()
            .chain(self.masks.iter())
            .any(|mask| pkg.matches(mask));

        masked && !self.unmasks.iter().any(|unmask| pkg.matches(unmask))
    }

    /// Accepted keywords for one package: the global set plus every
    /// matching keyword override
    pub fn effective_keywords(&self, pkg: &AvailablePackage) -> KeywordConfig {
        let mut accepted = self.accept_keywords.clone();
        for entry in &self.keyword_overrides {
            if pkg.matches(&entry.atom) {
                accepted.apply_tokens(entry.keywords.iter().map(String::as_str));
            }
        }
        accepted
    }

    /// Check package keywords; returns the masking reason when not accepted
    pub fn check_keywords(&self, pkg: &AvailablePackage) -> Option<String> {
        if self.effective_keywords(pkg).is_acceptable(&pkg.keywords) {
            return None;
        }

        let reason = self.arch.as_deref().and_then(|arch| {
            let testing = format!("~{}", arch);
            let broken = format!("-{}", arch);
            if pkg.keywords.iter().any(|k| k == &testing) {
                Some(format!("{} keyword", testing))
            } else if pkg.keywords.iter().any(|k| k == &broken || k == "-*") {
                Some(format!("{} keyword", broken))
            } else {
                None
            }
        });

        Some(reason.unwrap_or_else(|| "missing keyword".to_string()))
    }

    /// Every reason a version is not visible
    pub fn masking_reasons(&self, pkg: &AvailablePackage) -> BTreeSet<String> {
        let mut reasons = BTreeSet::new();
        if self.is_masked(pkg) {
            reasons.insert(PACKAGE_MASK.to_string());
        }
        if let Some(reason) = self.check_keywords(pkg) {
            reasons.insert(reason);
        }
        reasons
    }
}

/// Collect a profile and its parents, depth first, parents before children
fn collect_profiles(
    profile_dir: &Path,
    stack: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) -> Result<()> {
    let dir = profile_dir
        .canonicalize()
        .unwrap_or_else(|_| profile_dir.to_path_buf());
    if !seen.insert(dir.clone()) {
        return Ok(());
    }

    let parent_file = dir.join("parent");
    if parent_file.is_file() {
        let content = std::fs::read_to_string(&parent_file)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parent_path = dir.join(line);
            if parent_path.is_dir() {
                collect_profiles(&parent_path, stack, seen)?;
            } else {
                warn!("Parent profile {} does not exist", parent_path.display());
            }
        }
    }

    stack.push(dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pkg(cpv: &str, keywords: &str) -> AvailablePackage {
        AvailablePackage::new(cpv.parse().unwrap()).with_keywords(keywords)
    }

    fn atom(s: &str) -> PackageAtom {
        s.parse().unwrap()
    }

    fn manager() -> MaskManager {
        let mut manager = MaskManager::new();
        manager.set_arch("amd64");
        manager.apply_accept_keywords("amd64");
        manager
    }

    #[test]
    fn test_keyword_reasons() {
        let manager = manager();
        assert!(manager.masking_reasons(&pkg("app-misc/foo-1.0", "amd64 ~x86")).is_empty());
        assert_eq!(
            manager.check_keywords(&pkg("app-misc/foo-1.1", "~amd64")),
            Some("~amd64 keyword".to_string())
        );
        assert_eq!(
            manager.check_keywords(&pkg("app-misc/foo-1.2", "-amd64 x86")),
            Some("-amd64 keyword".to_string())
        );
        assert_eq!(
            manager.check_keywords(&pkg("app-misc/foo-9999", "")),
            Some("missing keyword".to_string())
        );
    }

    #[test]
    fn test_keyword_override_applies_to_matching_versions() {
        let mut manager = manager();
        manager.add_keyword_override(atom("<app-misc/foo-2.0"), vec!["~amd64".to_string()]);

        assert!(manager.check_keywords(&pkg("app-misc/foo-1.1", "~amd64")).is_none());
        assert!(manager.check_keywords(&pkg("app-misc/foo-2.0", "~amd64")).is_some());
        assert!(manager.check_keywords(&pkg("app-misc/bar-1.0", "~amd64")).is_some());
    }

    #[test]
    fn test_mask_and_unmask() {
        let mut manager = manager();
        let foo = pkg("app-misc/foo-1.0", "amd64");
        manager.apply_mask_lines(vec![MaskLine::Add(atom("app-misc/foo"))]);
        assert_eq!(
            manager.masking_reasons(&foo).into_iter().collect::<Vec<_>>(),
            vec![PACKAGE_MASK.to_string()]
        );

        manager.add_unmask(atom("=app-misc/foo-1.0"));
        assert!(!manager.is_masked(&foo));

        manager.add_mask(atom("app-misc/foo"));
        assert!(!manager.is_masked(&foo));
    }

    #[test]
    fn test_parse_mask_file_removals() {
        let lines = parse_mask_file(
            "# comment\n>=dev-lang/rust-2.0\n-dev-lang/go\nnot valid\n",
            Path::new("package.mask"),
        );
        assert_eq!(
            lines,
            vec![
                MaskLine::Add(atom(">=dev-lang/rust-2.0")),
                MaskLine::Remove(atom("dev-lang/go")),
            ]
        );
    }

    #[test]
    fn test_load_profile_chain() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base");
        let arch = dir.path().join("arch/amd64");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::create_dir_all(&arch).unwrap();

        std::fs::write(base.join("package.mask"), "dev-lang/go\ndev-lang/rust\n").unwrap();
        std::fs::write(base.join("make.defaults"), "ACCEPT_KEYWORDS=\"x86\"\n").unwrap();
        std::fs::write(arch.join("parent"), "../../base\n").unwrap();
        std::fs::write(arch.join("package.mask"), "-dev-lang/go\n").unwrap();
        std::fs::write(
            arch.join("make.defaults"),
            "ARCH=\"amd64\"\nACCEPT_KEYWORDS=\"-x86 ${ARCH}\"\n",
        )
        .unwrap();

        let mut manager = MaskManager::new();
        manager.load_profile(&arch).unwrap();

        assert_eq!(manager.arch(), Some("amd64"));
        assert_eq!(manager.accept_keywords().keywords(), vec!["amd64".to_string()]);
        assert!(!manager.is_masked(&pkg("dev-lang/go-1.22", "amd64")));
        assert!(manager.is_masked(&pkg("dev-lang/rust-1.75.0", "amd64")));
    }
}
