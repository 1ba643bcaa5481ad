//! Override file reader
//!
//! Reads per-package override files (a single file or a directory tree of
//! them) into [`OverrideRecord`]s. Each line is `<atom> [<value>]`; `#`
//! starts a comment. Two comment directives suppress checking of entries
//! that are known to be intentional:
//!
//! - `SKIP_ENTRY` marks the next content line.
//! - `SKIP_BLOCK` marks every following content line up to the next blank
//!   line. Blank lines seen before the first content line after the
//!   directive do not end the block.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::atom::is_valid_atom;

/// Directive skipping the next entry
pub const SKIP_ENTRY: &str = "SKIP_ENTRY";

/// Directive skipping the next paragraph of entries
pub const SKIP_BLOCK: &str = "SKIP_BLOCK";

/// One entry from an override file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    /// The atom token, as written
    pub atom: String,
    /// Everything after the atom (empty when absent)
    pub value: String,
    /// File the entry was read from
    pub source: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Whether a skip directive applies to this entry
    pub skip: bool,
}

/// Per-file directive state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipState {
    skip_block: bool,
    skip_line: bool,
    wait_for_not_empty: bool,
}

impl SkipState {
    /// Feed one line. Returns the `(atom, value, skip)` triple for content
    /// lines whose atom passes `validator`.
    pub fn feed<'a>(
        &mut self,
        line: &'a str,
        validator: fn(&str) -> bool,
    ) -> Option<(&'a str, &'a str, bool)> {
        let line = line.trim();

        if line.is_empty() {
            if !self.wait_for_not_empty {
                self.skip_block = false;
            }
            return None;
        }

        if line.starts_with('#') {
            if line.contains(SKIP_ENTRY) {
                self.skip_line = true;
                self.wait_for_not_empty = true;
            }
            if line.contains(SKIP_BLOCK) {
                self.skip_block = true;
                self.wait_for_not_empty = true;
            }
            return None;
        }

        self.wait_for_not_empty = false;

        let (atom, value) = match line.split_once(char::is_whitespace) {
            Some((atom, rest)) => (atom, rest.trim()),
            None => (line, ""),
        };

        if !validator(atom) {
            return None;
        }

        let skip = self.skip_block || self.skip_line;
        self.skip_line = false;
        Some((atom, value, skip))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Parse the contents of one override file
pub fn parse_content(
    content: &str,
    source: &Path,
    validator: fn(&str) -> bool,
) -> Vec<OverrideRecord> {
    let mut state = SkipState::default();

    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            state
                .feed(line, validator)
                .map(|(atom, value, skip)| OverrideRecord {
                    atom: atom.to_string(),
                    value: value.to_string(),
                    source: source.to_path_buf(),
                    line: idx + 1,
                    skip,
                })
        })
        .collect()
}

/// Reader for an override file or directory of override files
#[derive(Debug, Clone)]
pub struct ConfigReader {
    path: PathBuf,
    validator: fn(&str) -> bool,
}

impl ConfigReader {
    /// Create a reader for a file or directory
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            validator: is_valid_atom,
        }
    }

    /// Use a different atom validity check
    pub fn with_validator(mut self, validator: fn(&str) -> bool) -> Self {
        self.validator = validator;
        self
    }

    /// The path this reader was created for
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List the files to read, recursing into directories and skipping
    /// hidden entries
    pub fn files(&self) -> Vec<PathBuf> {
        if !self.path.exists() {
            debug!("Override path does not exist: {}", self.path.display());
            return Vec::new();
        }

        WalkDir::new(&self.path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to read override directory entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    /// Lazily read records, one file at a time
    pub fn records(&self) -> Records {
        Records {
            files: self.files().into_iter(),
            current: Vec::new().into_iter(),
            validator: self.validator,
        }
    }
}

/// Iterator over the records of a [`ConfigReader`]
#[derive(Debug)]
pub struct Records {
    files: std::vec::IntoIter<PathBuf>,
    current: std::vec::IntoIter<OverrideRecord>,
    validator: fn(&str) -> bool,
}

impl Iterator for Records {
    type Item = OverrideRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.current.next() {
                return Some(record);
            }

            let file = self.files.next()?;
            match fs::read_to_string(&file) {
                Ok(content) => {
                    debug!("Reading override file {}", file.display());
                    self.current = parse_content(&content, &file, self.validator).into_iter();
                }
                Err(e) => warn!("Failed to read {}: {}", file.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn parse(content: &str) -> Vec<(String, String, usize, bool)> {
        parse_content(content, Path::new("package.use"), is_valid_atom)
            .into_iter()
            .map(|r| (r.atom, r.value, r.line, r.skip))
            .collect()
    }

    fn skips(content: &str) -> Vec<bool> {
        parse(content).into_iter().map(|(_, _, _, skip)| skip).collect()
    }

    #[test]
    fn test_empty_file() {
        assert!(parse("").is_empty());
        assert!(parse("# only a comment\n\n   \n# SKIP_BLOCK\n").is_empty());
    }

    #[test]
    fn test_records_and_line_numbers() {
        let records = parse("# header\napp-editors/vim perl -X\n\ndev-lang/rust\n");
        assert_eq!(
            records,
            vec![
                ("app-editors/vim".to_string(), "perl -X".to_string(), 2, false),
                ("dev-lang/rust".to_string(), String::new(), 4, false),
            ]
        );
    }

    #[test]
    fn test_invalid_atoms_dropped() {
        let records = parse("not-an-atom foo\napp-editors/vim perl\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "app-editors/vim");
    }

    #[test]
    fn test_skip_entry() {
        let content = "# SKIP_ENTRY\napp-editors/vim perl\napp-editors/emacs X\n";
        assert_eq!(skips(content), vec![true, false]);
    }

    #[test]
    fn test_skip_entry_survives_invalid_line() {
        let content = "# SKIP_ENTRY\nbogus\napp-editors/vim perl\napp-editors/emacs X\n";
        assert_eq!(skips(content), vec![true, false]);
    }

    #[test]
    fn test_skip_block() {
        let content = "# SKIP_BLOCK\na/b x\nc/d y\ne/f z\n\ng/h w\n";
        assert_eq!(skips(content), vec![true, true, true, false]);
    }

    #[test]
    fn test_skip_block_waits_for_content() {
        let content = "# SKIP_BLOCK\n\n\na/b x\nc/d y\n\ne/f z\n";
        assert_eq!(skips(content), vec![true, true, false]);
    }

    #[test]
    fn test_skip_entry_and_block_together() {
        let content = "# SKIP_ENTRY\n# SKIP_BLOCK\na/b x\nc/d y\n\ne/f z\n";
        assert_eq!(skips(content), vec![true, true, false]);
    }

    #[test]
    fn test_trailing_skip_block() {
        let content = "a/b x\n# SKIP_BLOCK\n";
        assert_eq!(skips(content), vec![false]);
    }

    #[test]
    fn test_reader_recurses_and_skips_hidden() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("package.use");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("a"), "app-editors/vim perl\n").unwrap();
        fs::write(root.join("sub/b"), "dev-lang/rust clippy\n").unwrap();
        fs::write(root.join(".swap"), "dev-lang/go foo\n").unwrap();
        fs::write(root.join(".hidden/c"), "dev-lang/perl ithreads\n").unwrap();

        let reader = ConfigReader::new(&root);
        let atoms: Vec<String> = reader.records().map(|r| r.atom).collect();
        assert_eq!(atoms, vec!["app-editors/vim", "dev-lang/rust"]);
    }

    #[test]
    fn test_reader_single_file_and_missing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("package.mask");
        fs::write(&file, "=app-editors/vim-9.0\n").unwrap();

        let records: Vec<_> = ConfigReader::new(&file).records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, file);

        assert_eq!(ConfigReader::new(dir.path().join("missing")).records().count(), 0);
    }

    #[test]
    fn test_reader_custom_validator() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("package.use");
        fs::write(&file, "app-editors/vim perl\ndev-lang/rust clippy\n").unwrap();

        fn only_dev_lang(token: &str) -> bool {
            token.starts_with("dev-lang/")
        }

        let reader = ConfigReader::new(&file).with_validator(only_dev_lang);
        let atoms: Vec<String> = reader.records().map(|r| r.atom).collect();
        assert_eq!(atoms, vec!["dev-lang/rust"]);
    }
}
