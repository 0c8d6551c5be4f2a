use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use super::references::ReferenceStyle;
use super::scan::{PageHit, TermFinding, summarize_by_term};
use crate::config::ReportPolicy;
use crate::model::{MatchOrigin, SectionLayout, TeamVocabulary, ViolationMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AuditStatus {
    Audited,
    Incomplete,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnonymityReport {
    pub generated_at: String,
    pub anonymized_pdf: String,
    pub anonymized_sha256: Option<String>,
    pub team_info: String,
    pub report_policy: ReportPolicy,
    pub status: AuditStatus,
    pub total_pages: usize,
    pub layout: Option<SectionLayout>,
    pub reference_style: Option<ReferenceStyle>,
    pub vocabulary: Option<TeamVocabulary>,
    pub matches: Vec<ViolationMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_findings: Option<Vec<TermFinding>>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchReport {
    pub generated_at: String,
    pub anonymized_dir: String,
    pub full_dir: String,
    pub document_count: usize,
    pub failed_count: usize,
    pub documents: Vec<AnonymityReport>,
}

impl AnonymityReport {
    pub fn with_policy_view(mut self) -> Self {
        self.term_findings = match self.report_policy {
            ReportPolicy::PerTerm => Some(summarize_by_term(&self.matches)),
            ReportPolicy::PerPage => None,
        };
        self
    }
}

pub(crate) fn write_json_response<T: Serialize>(report: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize anonymity report")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(crate) fn write_text_response(reports: &[AnonymityReport]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    for report in reports {
        write_text_report(&mut output, report)?;
        if reports.len() > 1 {
            writeln!(output, "\n\t==============")?;
        }
    }
    output.flush()?;
    Ok(())
}

pub(crate) fn write_text_report(output: &mut impl Write, report: &AnonymityReport) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "\tChecking anonymized proposal:\t{}", report.anonymized_pdf)?;
    writeln!(output, "\tAgainst team info:\t\t{}", report.team_info)?;

    match report.status {
        AuditStatus::Failed => {
            writeln!(
                output,
                "\n\tCould not audit proposal: {}",
                report.error.as_deref().unwrap_or("unknown error")
            )?;
            return Ok(());
        }
        AuditStatus::Incomplete => {
            writeln!(
                output,
                "\n\tProposal appears incomplete or withdrawn ({} pages); skipped",
                report.total_pages
            )?;
            return Ok(());
        }
        AuditStatus::Audited => {}
    }

    if let Some(layout) = &report.layout {
        writeln!(output, "\n\tPage Guesses:\n")?;
        writeln!(output, "\t\tSTM = {}", layout.narrative)?;
        match layout.references {
            Some(references) => writeln!(output, "\t\tRef = {references}")?,
            None => writeln!(output, "\t\tRef = unresolved")?,
        }
    }

    if let Some(style) = &report.reference_style {
        writeln!(output, "\n\t# [] refs:\t{}", style.bracket_count)?;
        if style.suggests_parenthetical_style() {
            writeln!(
                output,
                "\tUsed () instead of []? # () refs:\t{}",
                style.parenthetical_count
            )?;
        }
        writeln!(output, "\t# et al. refs:\t{}", style.et_al_count)?;
        if style.uses_et_al_style() {
            writeln!(output, "\tCites by author name (et al.); check DAPR reference style")?;
        }
        writeln!(output)?;
    }

    if report.matches.is_empty() {
        writeln!(output, "\tNo identifying terms found")?;
        return Ok(());
    }

    match &report.term_findings {
        Some(findings) => {
            for finding in findings {
                writeln!(
                    output,
                    "\t\"{}\" found {} times on pages [{}]",
                    finding.term,
                    finding.total_count,
                    format_page_hits(&finding.pages)
                )?;
            }
        }
        None => {
            for found in &report.matches {
                let location = match found.origin {
                    MatchOrigin::Primary => "on page",
                    MatchOrigin::ProjectSummary => "in project summary on page",
                };
                writeln!(
                    output,
                    "\t\"{}\" found {} times {} {} ({})",
                    found.term,
                    found.count,
                    location,
                    found.page + 1,
                    found.section.as_str()
                )?;
            }
        }
    }

    Ok(())
}

/// 1-based pages, with hits from the full proposal's project summary marked.
pub(crate) fn format_page_hits(hits: &[PageHit]) -> String {
    hits.iter()
        .map(|hit| match hit.origin {
            MatchOrigin::Primary => (hit.page + 1).to_string(),
            MatchOrigin::ProjectSummary => format!("{} (summary)", hit.page + 1),
        })
        .collect::<Vec<String>>()
        .join(", ")
}
