use anyhow::{Context, Result};
use tracing::{info, warn};

use super::bounds::{ProposalBounds, locate_proposal};
use super::cover::{ProposalInfo, read_cover};
use super::metrics::{FormatMetrics, PageSample, measure, page_samples};
use super::output::{FormatReport, write_json_response, write_text_response};
use crate::cli::FormatArgs;
use crate::config::{AuditConfig, FormatConfig};
use crate::document::{FontSpanSource, PageSource, PopplerDocument};
use crate::error::AuditResult;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

#[derive(Debug)]
pub(crate) struct FormatCheck {
    pub proposal: ProposalInfo,
    pub bounds: ProposalBounds,
    pub samples: Vec<PageSample>,
    pub metrics: FormatMetrics,
}

pub fn run(args: FormatArgs) -> Result<()> {
    let mut config = AuditConfig::load(args.output.config.as_deref())?;
    if let Some(page_limit) = args.page_limit {
        config.format.page_limit = page_limit;
    }

    info!(
        pdf = %args.pdf.display(),
        page_limit = config.format.page_limit,
        "starting format check"
    );

    let doc = PopplerDocument::open(&args.pdf)?;
    let check = check(&doc, &config.format)
        .with_context(|| format!("failed to check format of {}", args.pdf.display()))?;

    let report = FormatReport {
        generated_at: now_utc_string(),
        pdf: args.pdf.display().to_string(),
        sha256: sha256_file(&args.pdf)?,
        proposal: check.proposal,
        bounds: check.bounds,
        cpi_max: config.format.cpi_max,
        lpi_max: config.format.lpi_max,
        samples: check.samples,
        metrics: check.metrics,
    };

    if let Some(path) = &args.output.report_path {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote format report");
    }

    if args.output.json {
        write_json_response(&report)
    } else {
        write_text_response(&report)
    }
}

pub(crate) fn check<D>(doc: &D, config: &FormatConfig) -> AuditResult<FormatCheck>
where
    D: PageSource + FontSpanSource + ?Sized,
{
    let proposal = read_cover(doc)?;
    let bounds = locate_proposal(doc, proposal.has_front_matter(), config.page_limit)?;
    let samples = page_samples(doc, bounds.pages)?;
    let metrics = measure(doc, bounds.pages, config)?;

    if metrics.small_font_warning {
        warn!(
            median = ?metrics.median_font_size,
            threshold = config.font_size_warning,
            "median font size is below the limit"
        );
    }
    info!(
        over_limit_lines = metrics.over_limit_lines.len(),
        over_limit_pages = metrics.over_limit_pages.len(),
        "format check complete"
    );

    Ok(FormatCheck {
        proposal,
        bounds,
        samples,
        metrics,
    })
}
