//! Command-line arguments

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use config::Category;
use std::path::PathBuf;
use std::process::ExitCode;

/// Check portage per-package overrides for redundant and stale entries
#[derive(Parser, Debug)]
#[command(name = "confcheck", version, author, about, long_about = None)]
pub struct Cli {
    /// List all issue codes and exit
    #[arg(short = 'l', long = "list-issues")]
    pub list_issues: bool,

    /// Enable issues matching these comma-separated glob patterns
    #[arg(short, long, value_name = "LIST", action = clap::ArgAction::Append)]
    pub enable: Vec<String>,

    /// Disable issues matching these comma-separated glob patterns
    #[arg(short, long, value_name = "LIST", action = clap::ArgAction::Append)]
    pub disable: Vec<String>,

    /// Disable colored output
    #[arg(short = 'C', long = "no-color")]
    pub no_color: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Portage configuration directory [default: $PORTAGE_CONFIGROOT/etc/portage or /etc/portage]
    #[arg(long, value_name = "PATH")]
    pub config_root: Option<PathBuf>,

    /// Filesystem root holding the installed package database
    #[arg(long, value_name = "PATH", env = "ROOT", default_value = "/")]
    pub root: PathBuf,

    /// Ebuild repository
    #[arg(long, value_name = "PATH", default_value = "/var/db/repos/gentoo")]
    pub repo: PathBuf,

    /// Read the package database from a JSON snapshot instead
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Override categories to check [default: all]
    #[arg(value_name = "CATEGORY")]
    pub categories: Vec<Category>,
}

/// An enable or disable option, in command-line order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueDirective {
    Enable(String),
    Disable(String),
}

/// Parsed arguments plus the ordered issue directives
pub struct Args {
    pub cli: Cli,
    pub directives: Vec<IssueDirective>,
}

impl Cli {
    /// Categories to process, in processing order
    pub fn selected_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.categories.is_empty() || self.categories.contains(c))
            .collect()
    }
}

/// Parse the process arguments.
///
/// Help and version output exit 0, usage errors exit 1.
pub fn parse() -> Result<Args, ExitCode> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<Args, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = match Cli::command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return Err(code);
        }
    };

    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Err(ExitCode::FAILURE);
        }
    };

    Ok(Args {
        directives: issue_directives(&matches),
        cli,
    })
}

/// Enable/disable values ordered by their position on the command line
fn issue_directives(matches: &ArgMatches) -> Vec<IssueDirective> {
    let mut directives: Vec<(usize, IssueDirective)> = Vec::new();

    for (id, make) in [
        ("enable", IssueDirective::Enable as fn(String) -> IssueDirective),
        ("disable", IssueDirective::Disable),
    ] {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<String>(id))
        {
            directives.extend(indices.zip(values.cloned().map(make)));
        }
    }

    directives.sort_by_key(|(index, _)| *index);
    directives.into_iter().map(|(_, d)| d).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        let mut argv = vec!["confcheck"];
        argv.extend_from_slice(list);
        parse_from(argv).ok().unwrap()
    }

    #[test]
    fn test_directives_keep_argument_order() {
        let parsed = args(&["-d", "use.*", "-e", "use.redundant", "--disable", "keywords.*"]);
        assert_eq!(
            parsed.directives,
            vec![
                IssueDirective::Disable("use.*".to_string()),
                IssueDirective::Enable("use.redundant".to_string()),
                IssueDirective::Disable("keywords.*".to_string()),
            ]
        );
    }

    #[test]
    fn test_categories() {
        let parsed = args(&["use", "keywords"]);
        assert_eq!(
            parsed.cli.selected_categories(),
            vec![Category::Keywords, Category::Use]
        );
        assert_eq!(args(&[]).cli.selected_categories().len(), 8);
    }

    #[test]
    fn test_unknown_category_is_usage_error() {
        assert!(parse_from(["confcheck", "package.use"]).is_err());
    }
}
