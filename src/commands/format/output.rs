use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use super::bounds::ProposalBounds;
use super::cover::ProposalInfo;
use super::metrics::{FormatMetrics, PageSample};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FormatReport {
    pub generated_at: String,
    pub pdf: String,
    pub sha256: String,
    pub proposal: ProposalInfo,
    pub bounds: ProposalBounds,
    pub cpi_max: f64,
    pub lpi_max: f64,
    pub samples: Vec<PageSample>,
    pub metrics: FormatMetrics,
}

pub(crate) fn write_json_response(report: &FormatReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, report)
        .context("failed to serialize format report")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(crate) fn write_text_response(report: &FormatReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    write_text_report(&mut output, report)?;
    output.flush()?;
    Ok(())
}

pub(crate) fn write_text_report(output: &mut impl Write, report: &FormatReport) -> Result<()> {
    let proposal_number = report
        .proposal
        .proposal_number
        .as_deref()
        .unwrap_or(if report.proposal.has_front_matter() {
            "UNKNOWN PROPOSAL NUMBER"
        } else {
            "NO NSPIRES FRONT MATTER FOUND"
        });
    let pi_last = report
        .proposal
        .principal_investigator
        .as_ref()
        .map(|pi| pi.last_name.as_str())
        .unwrap_or("");
    writeln!(output, "\n\t{proposal_number}\t{pi_last}")?;

    writeln!(
        output,
        "\n\tTotal pages = {},  Start page = {},   End page = {}",
        report.bounds.total_pages,
        report.bounds.pages.start + 1,
        report.bounds.pages.end + 1
    )?;

    writeln!(output)?;
    for sample in &report.samples {
        writeln!(output, "\tSample of {} page:\t{}", sample.label, sample.text)?;
    }

    let metrics = &report.metrics;
    match metrics.median_font_size {
        Some(size) if metrics.small_font_warning => {
            writeln!(output, "\n\tMedian font size:\t{size}  (below 12 pt)\n")?
        }
        Some(size) => writeln!(output, "\n\tMedian font size:\t{size}\n")?,
        None => writeln!(output, "\n\tMedian font size:\tunavailable\n")?,
    }
    if let Some(font) = &metrics.dominant_font {
        writeln!(output, "\tMost common font:\t{font}")?;
    }

    if metrics.over_limit_pages.is_empty() {
        writeln!(output, "\tPages w/LPI > {}:\t None", report.lpi_max)?;
    } else {
        let values = metrics
            .over_limit_pages
            .iter()
            .map(|page| page.lpi.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        let pages = metrics
            .over_limit_pages
            .iter()
            .map(|page| (page.page + 1).to_string())
            .collect::<Vec<String>>()
            .join(", ");
        writeln!(
            output,
            "\tPages w/LPI > {}:\tNumber of pages = {}\n\t\t\t\tLPI values = [{}]\n\t\t\t\tPage numbers = [{}]",
            report.lpi_max,
            metrics.over_limit_pages.len(),
            values,
            pages
        )?;
    }

    if metrics.over_limit_lines.is_empty() {
        writeln!(output, "\n\tLines w/CPI > {}:\t None\n", report.cpi_max)?;
    } else {
        writeln!(
            output,
            "\n\tLines w/CPI > {}:\t Number of Lines = {}\n",
            report.cpi_max,
            metrics.over_limit_lines.len()
        )?;
        for line in &metrics.over_limit_lines {
            writeln!(output, "\t\t\t\t {}", line.text)?;
        }
        writeln!(output)?;
    }

    Ok(())
}
