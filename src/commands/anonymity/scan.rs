use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::document::{PageSource, lowercase_page};
use crate::error::AuditResult;
use crate::model::{
    MatchOrigin, Section, SectionLayout, TeamVocabulary, TermKind, ViolationMatch, ViolationTerm,
};

const FRONT_MATTER_PAGES: usize = 5;
const PROJECT_SUMMARY_HEADING: &str = "SECTION VII - Project Summary";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<ViolationTerm>,
}

impl Vocabulary {
    /// Pronouns first so that a roster entry spelled like a pronoun keeps the
    /// pronoun disambiguation rule.
    pub fn new(pronouns: &[String], team: &TeamVocabulary) -> Self {
        let mut terms = BTreeMap::<String, ViolationTerm>::new();

        let tagged = pronouns
            .iter()
            .map(|term| (term, TermKind::Pronoun))
            .chain(
                team.institutions
                    .iter()
                    .chain(&team.surnames)
                    .chain(&team.cities)
                    .map(|term| (term, TermKind::Roster)),
            );

        for (term, kind) in tagged {
            let text = term.trim();
            if text.is_empty() {
                continue;
            }
            terms
                .entry(text.to_lowercase())
                .or_insert_with(|| ViolationTerm {
                    text: text.to_string(),
                    kind,
                });
        }

        Self {
            terms: terms.into_values().collect(),
        }
    }

    pub fn terms(&self) -> &[ViolationTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

#[derive(Debug)]
struct CandidatePage {
    page: usize,
    section: Section,
    origin: MatchOrigin,
    text: String,
}

pub struct ViolationScanner {
    patterns: Vec<(ViolationTerm, Regex)>,
}

impl ViolationScanner {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        let patterns = vocabulary
            .terms()
            .iter()
            .map(|term| {
                Regex::new(&term_pattern(&term.text))
                    .with_context(|| format!("failed to compile pattern for term '{}'", term.text))
                    .map(|regex| (term.clone(), regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn scan(
        &self,
        doc: &(impl PageSource + ?Sized),
        layout: &SectionLayout,
        auxiliary: Option<&dyn PageSource>,
    ) -> AuditResult<Vec<ViolationMatch>> {
        let candidates = candidate_pages(doc, layout, auxiliary)?;
        debug!(
            candidates = candidates.len(),
            terms = self.patterns.len(),
            "scanning for identifying terms"
        );

        let mut matches = Vec::new();
        for (term, regex) in &self.patterns {
            for candidate in &candidates {
                let count = count_matches(term, regex, &candidate.text);
                if count == 0 {
                    continue;
                }
                matches.push(ViolationMatch {
                    term: term.text.clone(),
                    kind: term.kind,
                    count,
                    page: candidate.page,
                    section: candidate.section,
                    origin: candidate.origin,
                });
            }
        }

        info!(matches = matches.len(), "identifying-term scan complete");
        Ok(matches)
    }
}

/// Whole-word pattern for a term. A word boundary is only required on an edge
/// that is a word character, so `(jpl)` or `acme co., inc.` still match.
pub(crate) fn term_pattern(term: &str) -> String {
    let lower = term.to_lowercase();
    let is_word = |character: char| character.is_alphanumeric() || character == '_';
    let leading = if lower.starts_with(is_word) { r"\b" } else { "" };
    let trailing = if lower.ends_with(is_word) { r"\b" } else { "" };
    format!("{leading}{}{trailing}", regex::escape(&lower))
}

fn skips_references(layout: &SectionLayout, page: usize) -> bool {
    layout
        .references
        .is_some_and(|range| range.start > FRONT_MATTER_PAGES && range.contains(page))
}

fn candidate_pages(
    doc: &(impl PageSource + ?Sized),
    layout: &SectionLayout,
    auxiliary: Option<&dyn PageSource>,
) -> AuditResult<Vec<CandidatePage>> {
    let mut candidates = Vec::new();

    for page in layout.narrative.start..doc.page_count() {
        if skips_references(layout, page) {
            continue;
        }
        candidates.push(CandidatePage {
            page,
            section: layout.section_of(page),
            origin: MatchOrigin::Primary,
            text: lowercase_page(doc, page)?,
        });
    }

    if let Some(full) = auxiliary {
        for page in 0..FRONT_MATTER_PAGES.min(full.page_count()) {
            let raw = full.page_text(page)?;
            let Some(index) = raw.find(PROJECT_SUMMARY_HEADING) else {
                continue;
            };
            candidates.push(CandidatePage {
                page,
                section: Section::FrontMatter,
                origin: MatchOrigin::ProjectSummary,
                text: raw[index..].to_lowercase(),
            });
        }
    }

    Ok(candidates)
}

pub(crate) fn count_matches(term: &ViolationTerm, regex: &Regex, text: &str) -> usize {
    regex
        .find_iter(text)
        .filter(|found| {
            term.kind != TermKind::Pronoun || !slash_adjacent(text, found.start(), found.end())
        })
        .count()
}

/// `he/she`, `him/her` and the like are inclusive phrasing, not identification.
fn slash_adjacent(text: &str, start: usize, end: usize) -> bool {
    text[..start].ends_with('/') || text[end..].starts_with('/')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageHit {
    pub page: usize,
    pub count: usize,
    pub section: Section,
    pub origin: MatchOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermFinding {
    pub term: String,
    pub kind: TermKind,
    pub total_count: usize,
    pub pages: Vec<PageHit>,
}

/// Collapse per-page matches into one finding per term, keeping scan order.
pub fn summarize_by_term(matches: &[ViolationMatch]) -> Vec<TermFinding> {
    let mut findings = Vec::<TermFinding>::new();
    for found in matches {
        let hit = PageHit {
            page: found.page,
            count: found.count,
            section: found.section,
            origin: found.origin,
        };
        match findings.iter_mut().find(|finding| finding.term == found.term) {
            Some(finding) => {
                finding.total_count += found.count;
                finding.pages.push(hit);
            }
            None => findings.push(TermFinding {
                term: found.term.clone(),
                kind: found.kind,
                total_count: found.count,
                pages: vec![hit],
            }),
        }
    }
    findings
}
