//! Keyword acceptance configuration
//!
//! Implements Gentoo-style ACCEPT_KEYWORDS handling:
//! - Architecture keywords (amd64, arm64, etc.)
//! - Stability levels (stable, testing ~, broken -)
//! - Incremental stacking (`-kw` removes, `-*` clears)

/// Accepted keywords for a package, built incrementally
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordConfig {
    /// Accepted keywords, in the order they were first accepted
    accept_keywords: Vec<Keyword>,
}

impl KeywordConfig {
    /// Create an empty configuration that accepts nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from an ACCEPT_KEYWORDS string
    pub fn from_accept_string(s: &str) -> Self {
        let mut config = Self::new();
        config.apply_tokens(s.split_whitespace());
        config
    }

    /// Apply keyword tokens incrementally
    pub fn apply_tokens<'a>(&mut self, tokens: impl IntoIterator<Item = &'a str>) {
        for token in tokens {
            self.apply(token);
        }
    }

    /// Apply a single keyword token
    pub fn apply(&mut self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            return;
        }

        if token == "-*" {
            self.accept_keywords.clear();
            return;
        }

        if let Some(removed) = token.strip_prefix('-') {
            self.accept_keywords.retain(|k| k.value != removed);
            return;
        }

        if !self.accept_keywords.iter().any(|k| k.value == token) {
            self.accept_keywords.push(Keyword::parse(token));
        }
    }

    /// Accepted keywords as strings
    pub fn keywords(&self) -> Vec<String> {
        self.accept_keywords.iter().map(|k| k.value.clone()).collect()
    }

    /// The keyword list assumed by an override line that names no keywords:
    /// the testing form of every stable keyword accepted by default
    pub fn default_override_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for kw in &self.accept_keywords {
            if kw.stability == KeywordStability::Stable && kw.arch != "*" {
                let testing = format!("~{}", kw.arch);
                if !keywords.contains(&testing) {
                    keywords.push(testing);
                }
            }
        }
        keywords
    }

    /// Check if a package with the given KEYWORDS is acceptable
    pub fn is_acceptable(&self, package_keywords: &[String]) -> bool {
        if self.accept_keywords.iter().any(|k| k.value == "**") {
            return true;
        }

        package_keywords
            .iter()
            .any(|pkg_kw| self.accept_keywords.iter().any(|k| k.matches(pkg_kw)))
    }
}

/// A single keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    /// The keyword value (e.g., "amd64", "~amd64", "-amd64")
    pub value: String,
    /// The stability level
    pub stability: KeywordStability,
    /// The base architecture
    pub arch: String,
}

impl Keyword {
    /// Parse a keyword string
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if s == "**" {
            return Self {
                value: s.to_string(),
                stability: KeywordStability::Any,
                arch: "*".to_string(),
            };
        }

        let (stability, arch) = if let Some(arch) = s.strip_prefix('~') {
            (KeywordStability::Testing, arch)
        } else if let Some(arch) = s.strip_prefix('-') {
            (KeywordStability::Broken, arch)
        } else {
            (KeywordStability::Stable, s)
        };

        Self {
            value: s.to_string(),
            stability,
            arch: arch.to_string(),
        }
    }

    /// Check if accepting this keyword accepts a package keyword
    pub fn matches(&self, other: &str) -> bool {
        if self.value == "**" {
            return true;
        }

        if self.arch == "*" {
            match self.stability {
                KeywordStability::Any => true,
                KeywordStability::Stable => !other.starts_with('~') && !other.starts_with('-'),
                KeywordStability::Testing => other.starts_with('~'),
                KeywordStability::Broken => other.starts_with('-'),
            }
        } else {
            self.value == other
                || (self.stability == KeywordStability::Testing && other == self.arch)
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Keyword stability levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordStability {
    /// Stable release
    Stable,
    /// Testing/unstable (~arch)
    Testing,
    /// Known broken (-arch)
    Broken,
    /// Accept any (**)
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_parse() {
        let kw = Keyword::parse("amd64");
        assert_eq!(kw.stability, KeywordStability::Stable);
        assert_eq!(kw.arch, "amd64");

        let kw = Keyword::parse("~amd64");
        assert_eq!(kw.stability, KeywordStability::Testing);
        assert_eq!(kw.arch, "amd64");

        let kw = Keyword::parse("-amd64");
        assert_eq!(kw.stability, KeywordStability::Broken);
        assert_eq!(kw.arch, "amd64");
    }

    #[test]
    fn test_keyword_acceptance() {
        let mut config = KeywordConfig::from_accept_string("amd64");

        // Only stable by default
        assert!(config.is_acceptable(&kws(&["amd64"])));
        assert!(!config.is_acceptable(&kws(&["~amd64"])));
        assert!(!config.is_acceptable(&[]));

        config.apply("~amd64");
        assert!(config.is_acceptable(&kws(&["~amd64"])));
        assert!(config.is_acceptable(&kws(&["amd64"])));
    }

    #[test]
    fn test_incremental_tokens() {
        let mut config = KeywordConfig::from_accept_string("amd64 ~amd64 x86");
        config.apply("-x86");
        assert_eq!(config.keywords(), kws(&["amd64", "~amd64"]));

        config.apply("-*");
        assert!(config.keywords().is_empty());
    }

    #[test]
    fn test_wildcard_keywords() {
        let config = KeywordConfig::from_accept_string("**");
        assert!(config.is_acceptable(&kws(&["~amd64"])));
        assert!(config.is_acceptable(&kws(&["-amd64"])));
        assert!(config.is_acceptable(&[]));

        let config = KeywordConfig::from_accept_string("~*");
        assert!(config.is_acceptable(&kws(&["~arm64"])));
        assert!(!config.is_acceptable(&kws(&["arm64"])));
    }

    #[test]
    fn test_default_override_keywords() {
        let config = KeywordConfig::from_accept_string("amd64 ~amd64 x86 *");
        assert_eq!(config.default_override_keywords(), kws(&["~amd64", "~x86"]));
    }
}
