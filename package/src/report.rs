//! Finding output
//!
//! Findings are printed grouped by source file. A header is written
//! whenever the file changes from the previous finding, so findings
//! must arrive in file-then-line order:
//!
//! ```text
//! /etc/portage/package.use/media
//!   12: media-video/mpv no change in useflags [use.redundant]
//!   14: media-gfx/gimp unknown USE flags: gtk2 [use.iuse]
//! ```

use crate::analysis::Finding;
use crate::issue::{EnabledIssueSet, IssueKind};
use console::{style, StyledObject};
use std::io::{self, Write};
use std::path::PathBuf;

/// Writes enabled findings to an output stream
pub struct Reporter<W: Write> {
    out: W,
    enabled: EnabledIssueSet,
    current_file: Option<PathBuf>,
    reported: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, enabled: EnabledIssueSet) -> Self {
        Self {
            out,
            enabled,
            current_file: None,
            reported: 0,
        }
    }

    /// Report one finding. Returns whether it was written.
    pub fn report(&mut self, finding: &Finding) -> io::Result<bool> {
        if !self.enabled.is_enabled(finding.issue) {
            return Ok(false);
        }

        if self.current_file.as_ref() != Some(&finding.source) {
            writeln!(self.out, "{}", style(finding.source.display()).bold())?;
            self.current_file = Some(finding.source.clone());
        }

        writeln!(
            self.out,
            "  {}: {} {} {}",
            finding.line,
            finding.atom,
            message_style(finding.issue.kind, &finding.message),
            style(format!("[{}]", finding.issue)).dim()
        )?;

        self.reported += 1;
        Ok(true)
    }

    /// Report every finding in order
    pub fn report_all<'a>(
        &mut self,
        findings: impl IntoIterator<Item = &'a Finding>,
    ) -> io::Result<usize> {
        let mut written = 0;
        for finding in findings {
            if self.report(finding)? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Number of findings written so far
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn message_style(kind: IssueKind, message: &str) -> StyledObject<&str> {
    match kind {
        IssueKind::Exists | IssueKind::Iuse => style(message).red(),
        IssueKind::NotInstalled | IssueKind::Irrelevant => style(message).yellow(),
        IssueKind::Redundant => style(message).cyan(),
    }
}
