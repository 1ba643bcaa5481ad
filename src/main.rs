mod cli;

use anyhow::{Context, Result};
use cli::{Args, IssueDirective};
use config::{get_config_root, ConfigLoader};
use console::style;
use package::{
    Analyzer, DbOptions, EnabledIssueSet, IssueCode, PackageDb, PackageQuery, Reporter,
};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match cli::parse() {
        Ok(args) => args,
        Err(code) => return code,
    };

    // Initialize logging
    let filter = match args.cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if args.cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let Args { cli, directives } = args;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list_issues {
        for code in IssueCode::all() {
            writeln!(
                out,
                "{:<24} {}",
                style(code.to_string()).bold(),
                code.description()
            )?;
        }
        return Ok(());
    }

    let enabled = enabled_issues(&directives)?;

    let config_root = cli.config_root.clone().unwrap_or_else(get_config_root);
    debug!("Using configuration root {}", config_root.display());

    let mut db = match &cli.snapshot {
        Some(path) => PackageDb::from_snapshot(path)
            .with_context(|| format!("Failed to load package snapshot {}", path.display()))?,
        None => PackageDb::load(&DbOptions {
            root: cli.root.clone(),
            repository: cli.repo.clone(),
            config_root: config_root.clone(),
        })
        .context("Failed to load package database")?,
    };

    let loader = ConfigLoader::new(&config_root);
    let mut analyzer = Analyzer::new(&mut db);
    let mut reporter = Reporter::new(out, enabled);

    for category in cli.selected_categories() {
        debug!("Checking {} overrides", category);
        for reader in loader.readers(category) {
            debug!("Reading {}", reader.path().display());
            let reader = reader.with_validator(PackageDb::is_valid_atom);
            let findings = analyzer.analyze_all(category, reader.records());
            reporter.report_all(&findings)?;
        }
    }

    debug!("Reported {} issues", reporter.reported());
    Ok(())
}

/// Apply enable/disable patterns in command-line order
fn enabled_issues(directives: &[IssueDirective]) -> Result<EnabledIssueSet> {
    let mut enabled = EnabledIssueSet::all();
    for directive in directives {
        match directive {
            IssueDirective::Enable(patterns) => enabled
                .enable(patterns)
                .with_context(|| format!("Invalid --enable value '{}'", patterns))?,
            IssueDirective::Disable(patterns) => enabled
                .disable(patterns)
                .with_context(|| format!("Invalid --disable value '{}'", patterns))?,
        }
    }
    Ok(enabled)
}
