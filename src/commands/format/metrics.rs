use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FormatConfig;
use crate::document::{FontSpanSource, PageSource};
use crate::error::AuditResult;
use crate::model::{FontSample, PageRange};
use crate::util::shorten;

const HISTOGRAM_FIRST_EDGE: f64 = 5.4;
const HISTOGRAM_BIN_WIDTH: f64 = 0.4;
const HISTOGRAM_EDGE_COUNT: usize = 32;
const SAMPLE_CHARS: std::ops::Range<usize> = 300..400;
const SAMPLE_WIDTH: usize = 60;
const MID_PAGE_OFFSET: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseLine {
    pub page: usize,
    pub cpi: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensePage {
    pub page: usize,
    pub lpi: f64,
}

/// Normalized font-size histogram over every span in the measured pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontHistogram {
    pub bin_edges: Vec<f64>,
    pub density: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatMetrics {
    pub span_count: usize,
    pub median_font_size: Option<f64>,
    pub small_font_warning: bool,
    pub dominant_font: Option<String>,
    pub cpi_sample_count: usize,
    pub over_limit_lines: Vec<DenseLine>,
    pub over_limit_pages: Vec<DensePage>,
    pub histogram: FontHistogram,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSample {
    pub label: &'static str,
    pub page: usize,
    pub text: String,
}

pub fn measure<D>(doc: &D, pages: PageRange, config: &FormatConfig) -> AuditResult<FormatMetrics>
where
    D: PageSource + FontSpanSource + ?Sized,
{
    let Some(pages) = pages.clamp_to(doc.page_count()) else {
        warn!("no proposal pages to measure");
        return Ok(FormatMetrics::default());
    };

    let mut samples = Vec::<FontSample>::new();
    let mut cpi_sample_count = 0;
    let mut over_limit_lines = Vec::new();
    let mut over_limit_pages = Vec::new();

    for page in pages.pages() {
        samples.extend(font_samples(doc, page)?);

        let text = doc.page_text(page)?;
        let lines = text
            .split('\n')
            .filter(|line| line.chars().count() > config.min_line_chars)
            .collect::<Vec<&str>>();

        let lpi = round_to(lines.len() as f64 / config.column_height_inches, 2);
        if lpi > config.lpi_max {
            over_limit_pages.push(DensePage { page, lpi });
        }

        for line in body_lines(&lines, config.edge_lines) {
            cpi_sample_count += 1;
            let cpi = round_to(line.chars().count() as f64 / config.column_width_inches, 2);
            if cpi > config.cpi_max {
                over_limit_lines.push(DenseLine {
                    page,
                    cpi,
                    text: shorten(line, SAMPLE_WIDTH),
                });
            }
        }
    }

    if samples.is_empty() {
        warn!(pages = %pages, "no font spans could be read from proposal pages");
        return Ok(FormatMetrics::default());
    }

    let median_font_size = median_font_size(&samples, config.min_line_chars);
    debug!(
        spans = samples.len(),
        cpi_samples = cpi_sample_count,
        "collected format samples"
    );

    Ok(FormatMetrics {
        span_count: samples.len(),
        median_font_size,
        small_font_warning: median_font_size.is_some_and(|size| size <= config.font_size_warning),
        dominant_font: dominant_font(&samples),
        cpi_sample_count,
        over_limit_lines,
        over_limit_pages,
        histogram: histogram(&samples),
    })
}

fn font_samples<D>(doc: &D, page: usize) -> AuditResult<Vec<FontSample>>
where
    D: FontSpanSource + ?Sized,
{
    let samples = doc
        .page_blocks(page)?
        .into_iter()
        .flat_map(|block| block.lines)
        .flat_map(|line| line.spans)
        .map(|span| FontSample {
            page_index: page,
            font_name: span.font,
            size: span.size,
            color: span.color,
            span_text: span.text,
        })
        .collect();
    Ok(samples)
}

/// Lines without the presumed headers and footers at either edge of the page.
fn body_lines<'a>(lines: &'a [&'a str], edge: usize) -> &'a [&'a str] {
    if lines.len() <= edge * 2 {
        return &[];
    }
    &lines[edge..lines.len() - edge]
}

/// Median size of spans long enough to be body text.
pub(crate) fn median_font_size(samples: &[FontSample], min_chars: usize) -> Option<f64> {
    let mut sizes = samples
        .iter()
        .filter(|sample| sample.span_text.chars().count() > min_chars)
        .map(|sample| sample.size)
        .collect::<Vec<f64>>();
    if sizes.is_empty() {
        return None;
    }

    sizes.sort_by(f64::total_cmp);
    let middle = sizes.len() / 2;
    let median = if sizes.len() % 2 == 0 {
        (sizes[middle - 1] + sizes[middle]) / 2.0
    } else {
        sizes[middle]
    };
    Some(round_to(median, 1))
}

fn dominant_font(samples: &[FontSample]) -> Option<String> {
    let mut counts = BTreeMap::<&str, usize>::new();
    for sample in samples {
        *counts.entry(sample.font_name.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(left_name, left), (right_name, right)| {
            left.cmp(right).then_with(|| right_name.cmp(left_name))
        })
        .map(|(name, _)| name.to_string())
}

pub(crate) fn histogram(samples: &[FontSample]) -> FontHistogram {
    let bin_edges = (0..HISTOGRAM_EDGE_COUNT)
        .map(|index| round_to(HISTOGRAM_FIRST_EDGE + HISTOGRAM_BIN_WIDTH * index as f64, 1))
        .collect::<Vec<f64>>();
    let bins = bin_edges.len() - 1;
    let first = bin_edges[0];
    let last = bin_edges[bins];

    let mut counts = vec![0_usize; bins];
    for sample in samples {
        if sample.size < first || sample.size > last {
            continue;
        }
        let index = (bin_edges.partition_point(|edge| *edge <= sample.size) - 1).min(bins - 1);
        counts[index] += 1;
    }

    let in_range = counts.iter().sum::<usize>();
    let density = if in_range == 0 {
        vec![0.0; bins]
    } else {
        counts
            .iter()
            .map(|count| *count as f64 / (in_range as f64 * HISTOGRAM_BIN_WIDTH))
            .collect()
    };

    FontHistogram { bin_edges, density }
}

/// Short excerpts from the first, a middle, and the last proposal page for a
/// reviewer to confirm the located bounds by eye.
pub fn page_samples(
    doc: &(impl PageSource + ?Sized),
    pages: PageRange,
) -> AuditResult<Vec<PageSample>> {
    let picks = [
        ("first", pages.start),
        ("mid", pages.start + MID_PAGE_OFFSET),
        ("last", pages.end),
    ];

    let mut samples = Vec::new();
    for (label, page) in picks {
        if page >= doc.page_count() {
            continue;
        }
        let excerpt = doc
            .page_text(page)?
            .chars()
            .skip(SAMPLE_CHARS.start)
            .take(SAMPLE_CHARS.len())
            .collect::<String>();
        samples.push(PageSample {
            label,
            page,
            text: shorten(&excerpt, SAMPLE_WIDTH),
        });
    }
    Ok(samples)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}
