//! confcheck package database and override analysis
//!
//! Audits per-package portage overrides against the package database and
//! reports entries that have no effect or no longer apply.
//!
//! # Architecture
//!
//! - **Query**: the [`PackageQuery`] capability the analysis runs against
//! - **Database**: [`PackageDb`], an in-memory database loaded from the
//!   ebuild repository, the profile and the installed package database,
//!   or from a JSON snapshot
//! - **Mask**: masking status computation (package.mask and keywords)
//! - **Analysis**: per-category classification of override entries
//! - **Issues**: issue codes and the enabled-issue set
//! - **Report**: grouped finding output

pub mod analysis;
pub mod db;
pub mod error;
pub mod issue;
pub mod mask;
pub mod query;
pub mod report;
pub mod types;

pub use analysis::{Analyzer, Classification, Finding};
pub use db::{DbOptions, PackageDb, Snapshot};
pub use error::{Error, Result};
pub use issue::{EnabledIssueSet, IssueCode, IssueKind};
pub use mask::MaskManager;
pub use query::{PackageQuery, PACKAGE_MASK};
pub use report::Reporter;
pub use types::*;
