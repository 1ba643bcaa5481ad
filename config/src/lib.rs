//! confcheck configuration reading
//!
//! This crate reads the user's per-package portage overrides so they can
//! be audited against the package database.
//!
//! # Overview
//!
//! - [`atom`]: Package atoms as written in override files
//! - [`version`]: Package versions and the canonical version ordering
//! - [`keywords`]: Keyword acceptance (ACCEPT_KEYWORDS)
//! - [`use_flags`]: USE flag change lists (package.use values)
//! - [`reader`]: Override file reader with skip directives
//! - [`loader`]: Override file locations and make.conf
//!
//! # Configuration Structure
//!
//! ```text
//! /etc/portage/
//! ├── make.conf                 # ACCEPT_KEYWORDS, ARCH
//! ├── make.profile -> ...       # Active profile
//! ├── package.accept_keywords/  # Per-package keywords
//! ├── package.keywords          # Legacy name of the above
//! ├── package.use/              # Per-package USE flags
//! ├── package.mask/             # Package masks
//! ├── package.unmask/           # Package unmasks
//! ├── package.features          # Per-package FEATURES
//! ├── package.cflags            # Per-package CFLAGS
//! ├── package.cxxflags          # Per-package CXXFLAGS
//! └── package.ldflags           # Per-package LDFLAGS
//! ```
//!
//! # Reading overrides
//!
//! ```rust,no_run
//! use confcheck_config::{Category, ConfigLoader};
//!
//! let loader = ConfigLoader::system();
//! for reader in loader.readers(Category::Use) {
//!     for record in reader.records() {
//!         let source = record.source.display();
//!         println!("{}:{} {} {}", source, record.line, record.atom, record.value);
//!     }
//! }
//! ```

pub mod atom;
pub mod error;
pub mod keywords;
pub mod loader;
pub mod reader;
pub mod use_flags;
pub mod version;

pub use atom::{is_valid_atom, PackageAtom, VersionOp};
pub use error::{ConfigError, Result};
pub use keywords::{Keyword, KeywordConfig, KeywordStability};
pub use loader::{get_config_root, paths, Category, ConfigLoader, MakeConf};
pub use reader::{ConfigReader, OverrideRecord, Records, SkipState, SKIP_BLOCK, SKIP_ENTRY};
pub use use_flags::{split_use_string, strip_flag, UseChange};
pub use version::{Cpv, Version};
