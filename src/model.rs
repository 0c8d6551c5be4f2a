use std::fmt;

use serde::Serialize;

/// Inclusive range of 0-based page indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, page: usize) -> bool {
        page >= self.start && page <= self.end
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Clamp to the pages that exist in a document of `page_count` pages.
    pub fn clamp_to(&self, page_count: usize) -> Option<Self> {
        let last = page_count.checked_sub(1)?;
        Self::new(self.start, self.end.min(last))
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start + 1, self.end + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Narrative,
    References,
    FrontMatter,
    Other,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::References => "references",
            Self::FrontMatter => "front matter",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionLayout {
    pub narrative: PageRange,
    pub references: Option<PageRange>,
    pub total_pages: usize,
}

impl SectionLayout {
    pub fn section_of(&self, page: usize) -> Section {
        if self.narrative.contains(page) {
            Section::Narrative
        } else if self.references.is_some_and(|range| range.contains(page)) {
            Section::References
        } else if page < self.narrative.start {
            Section::FrontMatter
        } else {
            Section::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub surname: String,
    pub institution: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamVocabulary {
    pub surnames: Vec<String>,
    pub institutions: Vec<String>,
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Pronoun,
    Roster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationTerm {
    pub text: String,
    pub kind: TermKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrigin {
    Primary,
    ProjectSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationMatch {
    pub term: String,
    pub kind: TermKind,
    pub count: usize,
    pub page: usize,
    pub section: Section,
    pub origin: MatchOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSample {
    pub page_index: usize,
    pub font_name: String,
    pub size: f64,
    pub color: u32,
    pub span_text: String,
}
