use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, warn};

use super::{FontSpanSource, PageSource, TextBlock, TextLine, TextSpan};
use crate::error::{AuditError, AuditResult};

/// A PDF opened through the Poppler command-line tools.
///
/// Page text is extracted once up front. If the whole-document pass fails the
/// pages are retried one by one so a single bad page does not hide the rest.
#[derive(Debug)]
pub struct PopplerDocument {
    path: PathBuf,
    pages: Vec<std::result::Result<String, String>>,
    patterns: XmlPatterns,
}

#[derive(Debug)]
struct XmlPatterns {
    fontspec: Regex,
    text: Regex,
    markup: Regex,
}

impl XmlPatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            fontspec: Regex::new(
                r##"<fontspec\s+id="(\d+)"\s+size="([-\d.]+)"\s+family="([^"]*)"\s+color="#([0-9a-fA-F]{6})"\s*/>"##,
            )
            .context("failed to compile fontspec regex")?,
            text: Regex::new(
                r#"<text\s+top="([-\d.]+)"\s+left="[-\d.]+"\s+width="[-\d.]+"\s+height="([-\d.]+)"\s+font="(\d+)"\s*>(.*?)</text>"#,
            )
            .context("failed to compile text element regex")?,
            markup: Regex::new(r"<[^>]+>").context("failed to compile markup regex")?,
        })
    }
}

impl PopplerDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let page_count = read_page_count(path)?;
        let pages = match extract_all_pages(path, page_count) {
            Ok(pages) => pages.into_iter().map(Ok).collect(),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "whole-document text extraction failed; extracting page by page"
                );
                (1..=page_count)
                    .map(|page_number| {
                        extract_single_page(path, page_number).map_err(|error| error.to_string())
                    })
                    .collect()
            }
        };

        debug!(path = %path.display(), pages = page_count, "opened pdf");

        Ok(Self {
            path: path.to_path_buf(),
            pages,
            patterns: XmlPatterns::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for PopplerDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> AuditResult<String> {
        match self.pages.get(index) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(reason)) => Err(AuditError::PageExtraction {
                page: index,
                reason: reason.clone(),
            }),
            None => Err(AuditError::PageExtraction {
                page: index,
                reason: format!("page out of range (document has {})", self.pages.len()),
            }),
        }
    }
}

impl FontSpanSource for PopplerDocument {
    fn page_blocks(&self, index: usize) -> AuditResult<Vec<TextBlock>> {
        let page_number = (index + 1).to_string();
        let output = Command::new("pdftohtml")
            .arg("-xml")
            .arg("-i")
            .arg("-zoom")
            .arg("1")
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-stdout")
            .arg(&self.path)
            .output()
            .map_err(|error| AuditError::PageExtraction {
                page: index,
                reason: format!("failed to execute pdftohtml: {error}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AuditError::PageExtraction {
                page: index,
                reason: format!("pdftohtml returned non-zero exit status: {}", stderr.trim()),
            });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        Ok(parse_pdftohtml_xml(&xml, &self.patterns))
    }
}

fn read_page_count(pdf_path: &Path) -> Result<usize> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .with_context(|| format!("failed to execute pdfinfo for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdfinfo returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let info = String::from_utf8_lossy(&output.stdout);
    let pages_regex = Regex::new(r"(?m)^Pages:\s+(\d+)").context("failed to compile pages regex")?;
    pages_regex
        .captures(&info)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
        .with_context(|| format!("pdfinfo did not report a page count for {}", pdf_path.display()))?
        .parse::<usize>()
        .with_context(|| format!("invalid page count for {}", pdf_path.display()))
}

fn run_pdftotext(pdf_path: &Path, first: usize, last: usize) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg(first.to_string())
        .arg("-l")
        .arg(last.to_string())
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {} pages {}-{}: {}",
            pdf_path.display(),
            first,
            last,
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
}

fn extract_all_pages(pdf_path: &Path, page_count: usize) -> Result<Vec<String>> {
    if page_count == 0 {
        return Ok(Vec::new());
    }

    let raw = run_pdftotext(pdf_path, 1, page_count)?;
    let pages = split_form_feed_pages(&raw, page_count);
    if pages.len() != page_count {
        bail!(
            "pdftotext produced {} pages for {} but pdfinfo reported {}",
            pages.len(),
            pdf_path.display(),
            page_count
        );
    }

    Ok(pages)
}

fn extract_single_page(pdf_path: &Path, page_number: usize) -> Result<String> {
    let raw = run_pdftotext(pdf_path, page_number, page_number)?;
    Ok(raw.trim_end_matches('\u{000C}').to_string())
}

/// pdftotext terminates every page with a form feed, so the final chunk after
/// the last page is empty.
fn split_form_feed_pages(raw: &str, page_count: usize) -> Vec<String> {
    raw.split('\u{000C}')
        .take(page_count)
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Clone)]
struct FontSpec {
    family: String,
    size: f64,
    color: u32,
}

fn parse_pdftohtml_xml(xml: &str, patterns: &XmlPatterns) -> Vec<TextBlock> {
    let mut fonts = HashMap::<String, FontSpec>::new();
    for captures in patterns.fontspec.captures_iter(xml) {
        let id = captures[1].to_string();
        fonts.insert(
            id,
            FontSpec {
                size: captures[2].parse::<f64>().unwrap_or_default(),
                family: captures[3].to_string(),
                color: u32::from_str_radix(&captures[4], 16).unwrap_or_default(),
            },
        );
    }

    let mut blocks = Vec::<TextBlock>::new();
    let mut current_block = TextBlock::default();
    let mut current_line = TextLine::default();
    let mut current_top: Option<f64> = None;

    for captures in patterns.text.captures_iter(xml) {
        let top = captures[1].parse::<f64>().unwrap_or_default();
        let height = captures[2].parse::<f64>().unwrap_or_default();
        let Some(font) = fonts.get(&captures[3]) else {
            continue;
        };
        let text = decode_entities(&patterns.markup.replace_all(&captures[4], ""));

        if let Some(previous_top) = current_top {
            if (top - previous_top).abs() > f64::EPSILON {
                current_block.lines.push(std::mem::take(&mut current_line));
                if top - previous_top > height * 2.0 || top < previous_top {
                    blocks.push(std::mem::take(&mut current_block));
                }
            }
        }
        current_top = Some(top);

        current_line.spans.push(TextSpan {
            font: font.family.clone(),
            size: font.size,
            color: font.color,
            text,
        });
    }

    if !current_line.spans.is_empty() {
        current_block.lines.push(current_line);
    }
    if !current_block.lines.is_empty() {
        blocks.push(current_block);
    }

    blocks
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#160;", " ")
        .replace('\u{00a0}', " ")
        .replace("&amp;", "&")
}
