use super::bounds::locate_proposal;
use super::cover::read_cover;
use super::metrics::{FormatMetrics, histogram, measure, median_font_size, page_samples};
use super::output::{FormatReport, write_text_report};
use super::run::check;
use crate::config::FormatConfig;
use crate::document::MemoryDocument;
use crate::model::{FontSample, PageRange};

const COVER: &str = "PROPOSAL COVER PAGE\n\
Proposal Number\n\
21-XRP21-0042\n\
NASA PROCEDURE FOR HANDLING PROPOSALS\n\
Principal Investigator\n\
Jane Q Doe\n\
E-mail Address\n\
jdoe@example.edu\n";

fn filler() -> String {
    "lorem ipsum dolor sit amet ".repeat(30)
}

/// Cover on page 1, budget section ending on page 7, proposal text after it.
fn full_package(total: usize) -> MemoryDocument {
    let mut doc = MemoryDocument::blank(total)
        .with_page(0, COVER)
        .with_page(6, "SECTION X - Budget\nYear 1 salaries");
    for page in 7..total {
        doc = doc.with_page(page, filler());
    }
    doc
}

fn config_with_limit(page_limit: usize) -> FormatConfig {
    FormatConfig {
        page_limit,
        ..FormatConfig::default()
    }
}

fn sample(size: f64, text: &str) -> FontSample {
    FontSample {
        page_index: 0,
        font_name: "Times".to_string(),
        size,
        color: 0,
        span_text: text.to_string(),
    }
}

#[test]
fn cover_page_yields_pi_and_proposal_number() {
    let info = read_cover(&full_package(30)).expect("cover");

    assert!(info.has_front_matter());
    let pi = info.principal_investigator.expect("pi present");
    assert_eq!(pi.first_name, "jane");
    assert_eq!(pi.last_name, "doe");
    assert_eq!(info.proposal_number.as_deref(), Some("21-xrp21-0042"));
}

#[test]
fn bare_proposal_has_no_front_matter() {
    let doc = MemoryDocument::blank(20).with_page(0, "Science Goals and Objectives");
    let info = read_cover(&doc).expect("cover");

    assert!(!info.has_front_matter());
    assert_eq!(info.proposal_number, None);

    let bounds = locate_proposal(&doc, info.has_front_matter(), 15).expect("bounds");
    assert_eq!(bounds.pages, PageRange { start: 0, end: 14 });
    assert!(!bounds.budget_landmark_found);
}

#[test]
fn proposal_starts_after_budget_section() {
    let doc = full_package(40).with_page(22, "References\n[1] Smith 2020");
    let bounds = locate_proposal(&doc, true, 15).expect("bounds");

    assert!(bounds.budget_landmark_found);
    assert_eq!(bounds.pages, PageRange { start: 7, end: 21 });
    assert_eq!(bounds.total_pages, 40);
}

#[test]
fn short_cover_page_after_budget_is_skipped() {
    let doc = full_package(40)
        .with_page(7, "A Dual-Anonymous Proposal Title")
        .with_page(23, "References");
    let bounds = locate_proposal(&doc, true, 15).expect("bounds");

    assert_eq!(bounds.pages, PageRange { start: 8, end: 22 });
}

#[test]
fn table_of_contents_pages_advance_the_start() {
    let doc = full_package(40)
        .with_page(7, format!("Table of Contents\n{}", filler()))
        .with_page(8, format!("Contents (continued)\n{}", filler()))
        .with_page(24, "Bibliography");
    let bounds = locate_proposal(&doc, true, 15).expect("bounds");

    assert_eq!(bounds.pages, PageRange { start: 9, end: 23 });
}

#[test]
fn end_moves_forward_to_a_late_references_page() {
    let doc = full_package(40).with_page(23, "R E F E R E N C E S");
    let bounds = locate_proposal(&doc, true, 15).expect("bounds");

    assert_eq!(bounds.pages, PageRange { start: 7, end: 22 });
}

#[test]
fn end_moves_back_when_proposal_is_under_the_limit() {
    let doc = full_package(40).with_page(19, "References");
    let bounds = locate_proposal(&doc, true, 15).expect("bounds");

    assert_eq!(bounds.pages, PageRange { start: 7, end: 18 });
}

#[test]
fn missing_budget_landmark_falls_back_to_first_page() {
    let doc = full_package(30).with_page(6, "Budget details withheld");
    let bounds = locate_proposal(&doc, true, 15).expect("bounds");

    assert!(!bounds.budget_landmark_found);
    assert_eq!(bounds.pages.start, 0);
}

#[test]
fn short_lines_yield_no_cpi_samples_and_no_median() {
    let doc = MemoryDocument::new(["Short line\nAnother short line", "Page two"])
        .with_spans(0, vec![("Times", 12.0, "Short heading")]);
    let metrics = measure(&doc, PageRange { start: 0, end: 1 }, &config_with_limit(2))
        .expect("measure");

    assert_eq!(metrics.span_count, 1);
    assert_eq!(metrics.cpi_sample_count, 0);
    assert_eq!(metrics.median_font_size, None);
    assert!(!metrics.small_font_warning);
    assert!(metrics.over_limit_lines.is_empty());
    assert!(metrics.over_limit_pages.is_empty());
    assert_eq!(metrics.dominant_font.as_deref(), Some("Times"));
}

#[test]
fn dense_lines_and_pages_are_flagged() {
    let dense_page = vec!["dense ".repeat(20); 7].join("\n");
    let crowded_page = vec!["w".repeat(60); 60].join("\n");
    let long = "b".repeat(60);
    let doc = MemoryDocument::new([dense_page, crowded_page]).with_spans(
        0,
        vec![
            ("Times", 12.0, long.as_str()),
            ("Times", 11.0, long.as_str()),
            ("Arial", 9.0, "p. 1"),
            ("Times", 12.0, long.as_str()),
        ],
    );

    let metrics = measure(&doc, PageRange { start: 0, end: 1 }, &config_with_limit(2))
        .expect("measure");

    assert_eq!(metrics.cpi_sample_count, 3 + 56);
    assert_eq!(metrics.over_limit_lines.len(), 3);
    assert!(metrics.over_limit_lines.iter().all(|line| line.page == 0));
    assert_eq!(metrics.over_limit_lines[0].cpi, 18.46);

    assert_eq!(metrics.over_limit_pages.len(), 1);
    assert_eq!(metrics.over_limit_pages[0].page, 1);
    assert_eq!(metrics.over_limit_pages[0].lpi, 6.67);

    assert_eq!(metrics.median_font_size, Some(12.0));
    assert!(!metrics.small_font_warning);
    assert_eq!(metrics.dominant_font.as_deref(), Some("Times"));
    assert_eq!(metrics.span_count, 4);
}

#[test]
fn pages_without_spans_give_a_zero_report() {
    let doc = MemoryDocument::new([vec!["x".repeat(80); 10].join("\n")]);
    let metrics = measure(&doc, PageRange { start: 0, end: 0 }, &config_with_limit(1))
        .expect("measure");
    assert_eq!(metrics, FormatMetrics::default());

    let outside = measure(&doc, PageRange { start: 5, end: 9 }, &config_with_limit(5))
        .expect("measure");
    assert_eq!(outside, FormatMetrics::default());
}

#[test]
fn median_is_rounded_to_a_tenth() {
    let long = "t".repeat(51);
    let samples = [
        sample(11.0, &long),
        sample(11.5, &long),
        sample(12.0, &long),
        sample(12.0, &long),
        sample(6.0, "1"),
    ];
    assert_eq!(median_font_size(&samples, 50), Some(11.8));
    assert_eq!(median_font_size(&samples[..2], 50), Some(11.3));
}

#[test]
fn histogram_density_integrates_to_one() {
    let samples = [
        sample(12.0, "a"),
        sample(12.0, "b"),
        sample(10.0, "c"),
        sample(30.0, "out of range"),
    ];
    let histogram = histogram(&samples);

    assert_eq!(histogram.bin_edges.len(), 32);
    assert_eq!(histogram.bin_edges[0], 5.4);
    assert_eq!(histogram.bin_edges[31], 17.8);
    assert_eq!(histogram.density.len(), 31);

    let area = histogram.density.iter().sum::<f64>() * 0.4;
    assert!((area - 1.0).abs() < 1e-9);
}

#[test]
fn sizes_on_a_bin_edge_fall_in_the_bin_that_starts_there() {
    let occupied = |size: f64| {
        histogram(&[sample(size, "x")])
            .density
            .iter()
            .position(|density| *density > 0.0)
    };

    assert_eq!(occupied(7.0), Some(4));
    assert_eq!(occupied(9.0), Some(9));
    assert_eq!(occupied(11.0), Some(14));
    assert_eq!(occupied(12.2), Some(17));
    assert_eq!(occupied(5.4), Some(0));
    assert_eq!(occupied(17.8), Some(30));
    assert_eq!(occupied(18.0), None);
}

#[test]
fn page_samples_skip_missing_pages() {
    let doc = MemoryDocument::new(vec![filler(); 3]);
    let samples = page_samples(&doc, PageRange { start: 0, end: 2 }).expect("samples");

    let labels = samples.iter().map(|sample| sample.label).collect::<Vec<_>>();
    assert_eq!(labels, vec!["first", "last"]);
    assert!(samples.iter().all(|sample| sample.text.chars().count() <= 60));
    assert!(samples[0].text.ends_with("[...]"));
}

#[test]
fn full_check_reports_located_pages() {
    let doc = full_package(40)
        .with_page(7, "A Dual-Anonymous Proposal Title")
        .with_page(23, "References")
        .with_spans(8, vec![("Times", 11.0, filler().as_str())]);

    let check = check(&doc, &FormatConfig::default()).expect("check");
    assert_eq!(check.bounds.pages, PageRange { start: 8, end: 22 });
    assert_eq!(check.samples.len(), 3);
    assert_eq!(check.metrics.median_font_size, Some(11.0));
    assert!(check.metrics.small_font_warning);

    let report = FormatReport {
        generated_at: "2026-01-01T00:00:00Z".to_string(),
        pdf: "full.pdf".to_string(),
        sha256: "0".repeat(64),
        proposal: check.proposal,
        bounds: check.bounds,
        cpi_max: 16.0,
        lpi_max: 5.5,
        samples: check.samples,
        metrics: check.metrics,
    };
    let mut rendered = Vec::new();
    write_text_report(&mut rendered, &report).expect("render");
    let rendered = String::from_utf8(rendered).expect("utf-8");

    assert!(rendered.contains("21-xrp21-0042\tdoe"));
    assert!(rendered.contains("Total pages = 40,  Start page = 9,   End page = 23"));
    assert!(rendered.contains("Pages w/LPI > 5.5:\t None"));
}
