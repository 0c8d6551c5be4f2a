use tracing::{info, warn};

use crate::document::PageSource;
use crate::error::{AuditError, AuditResult};
use crate::model::{PageRange, SectionLayout};

const FRONT_MATTER_PAGES: usize = 5;
const PREFIX_CHARS: usize = 500;
const BUDGET_SECTION_LANDMARK: &str = "section x - budget";
const REFERENCE_LANDMARKS: [&str; 2] = ["reference", "bibliography"];
const REFERENCES_END_LANDMARKS: [&str; 4] = [
    "budget justification",
    "budget narrative",
    "total budget",
    "table of work effort",
];
const MIN_RESOLVED_NARRATIVE_SPAN: usize = 10;
const SHORT_NARRATIVE_SPAN: usize = 5;
const ASSUMED_NARRATIVE_PAGES: usize = 15;
const MIN_TRAILING_PAGES: usize = 3;

/// 1-based inclusive reference pages supplied by the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceBounds {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateOutcome {
    Resolved(SectionLayout),
    /// Too few pages after the narrative start; the proposal is treated as
    /// withdrawn and skipped.
    Incomplete { total_pages: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    ScanningForNarrativeStart,
    ScanningForReferencesStart,
    ScanningForReferencesEnd,
    Resolved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Boundaries {
    pub narrative_start: usize,
    pub narrative_end: Option<usize>,
    pub references_start: Option<usize>,
    pub references_end: Option<usize>,
}

impl Boundaries {
    fn narrative_span(&self) -> Option<usize> {
        self.narrative_end
            .map(|end| end.saturating_sub(self.narrative_start))
    }
}

pub fn locate(
    doc: &(impl PageSource + ?Sized),
    explicit: Option<ReferenceBounds>,
) -> AuditResult<LocateOutcome> {
    let total_pages = doc.page_count();

    let layout = match explicit {
        Some(bounds) => layout_from_bounds(bounds, total_pages)?,
        None => {
            let boundaries = scan_boundaries(doc)?;
            layout_from_boundaries(repair(boundaries, total_pages), total_pages)
        }
    };

    if total_pages.saturating_sub(layout.narrative.start) < MIN_TRAILING_PAGES {
        return Ok(incomplete(total_pages));
    }

    info!(
        narrative = %layout.narrative,
        references = %layout
            .references
            .map(|range| range.to_string())
            .unwrap_or_else(|| "unresolved".to_string()),
        total_pages,
        "page guesses"
    );

    Ok(LocateOutcome::Resolved(layout))
}

fn incomplete(total_pages: usize) -> LocateOutcome {
    warn!(total_pages, "proposal appears incomplete or withdrawn; skipping");
    LocateOutcome::Incomplete { total_pages }
}

fn layout_from_bounds(bounds: ReferenceBounds, total_pages: usize) -> AuditResult<SectionLayout> {
    let invalid = AuditError::InvalidReferenceBounds {
        start: bounds.start,
        end: bounds.end,
    };
    if bounds.start < 2 {
        return Err(invalid);
    }

    let narrative = PageRange::new(0, bounds.start - 2).ok_or(invalid)?;
    let references =
        PageRange::new(bounds.start - 1, bounds.end.saturating_sub(1)).ok_or_else(|| {
            AuditError::InvalidReferenceBounds {
                start: bounds.start,
                end: bounds.end,
            }
        })?;

    Ok(SectionLayout {
        narrative,
        references: Some(references),
        total_pages,
    })
}

pub(crate) fn normalized_prefix(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .chars()
        .take(PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
}

fn enters(landmark: &str, current: &str, next: &str) -> bool {
    next.contains(landmark) && !current.contains(landmark)
}

fn exits(landmark: &str, current: &str, next: &str) -> bool {
    current.contains(landmark) && !next.contains(landmark)
}

fn scan_boundaries(doc: &(impl PageSource + ?Sized)) -> AuditResult<Boundaries> {
    let total_pages = doc.page_count();
    let mut state = ScanState::ScanningForNarrativeStart;
    let mut boundaries = Boundaries::default();
    let mut next_prefix: Option<String> = None;

    for page in FRONT_MATTER_PAGES..total_pages.saturating_sub(1) {
        let current = match next_prefix.take() {
            Some(prefix) => prefix,
            None => normalized_prefix(&doc.page_text(page)?),
        };
        let next = normalized_prefix(&doc.page_text(page + 1)?);

        (state, boundaries) = step(state, boundaries, page, &current, &next);
        if state == ScanState::Resolved {
            break;
        }
        next_prefix = Some(next);
    }

    if state != ScanState::Resolved {
        warn!(state = ?state, "section boundaries not fully resolved; applying fallbacks");
    }

    Ok(boundaries)
}

/// Advance the boundary scan by one page pair (`page`, `page + 1`).
/// Until the scan resolves, a later references entry replaces the earlier one.
pub(crate) fn step(
    mut state: ScanState,
    mut boundaries: Boundaries,
    page: usize,
    current: &str,
    next: &str,
) -> (ScanState, Boundaries) {
    if state == ScanState::Resolved {
        return (state, boundaries);
    }

    if state == ScanState::ScanningForNarrativeStart
        && exits(BUDGET_SECTION_LANDMARK, current, next)
    {
        boundaries.narrative_start = page + 1;
        return (ScanState::ScanningForReferencesStart, boundaries);
    }

    if REFERENCE_LANDMARKS
        .iter()
        .any(|landmark| enters(landmark, current, next))
    {
        boundaries.narrative_end = Some(page);
        boundaries.references_start = Some(page + 1);
        if boundaries.references_end.is_some_and(|end| end <= page + 1) {
            boundaries.references_end = None;
        }
        state = ScanState::ScanningForReferencesEnd;
    }

    if state == ScanState::ScanningForReferencesEnd
        && REFERENCES_END_LANDMARKS
            .iter()
            .any(|landmark| enters(landmark, current, next))
    {
        boundaries.references_end = Some(page);
        let after_start = boundaries
            .references_start
            .is_some_and(|start| page > start);
        let long_narrative = boundaries
            .narrative_span()
            .is_some_and(|span| span > MIN_RESOLVED_NARRATIVE_SPAN);
        if after_start && long_narrative {
            state = ScanState::Resolved;
        }
    }

    (state, boundaries)
}

pub(crate) fn repair(mut boundaries: Boundaries, total_pages: usize) -> Boundaries {
    let last_page = total_pages.saturating_sub(1);

    if let (Some(start), Some(end)) = (boundaries.references_start, boundaries.references_end) {
        if end < start {
            boundaries.references_end = None;
        }
    }

    let short_narrative = boundaries
        .narrative_span()
        .is_none_or(|span| span <= SHORT_NARRATIVE_SPAN);
    if short_narrative {
        let assumed_end = boundaries.narrative_start + ASSUMED_NARRATIVE_PAGES - 1;
        boundaries.narrative_end = Some(assumed_end.min(last_page));
    }

    if boundaries.references_end.is_some() && boundaries.references_start.is_none() {
        boundaries.references_start = boundaries.narrative_end.map(|end| end + 1);
    }

    if boundaries.references_end.is_none() {
        boundaries.references_end = Some(last_page);
    }

    boundaries
}

fn layout_from_boundaries(boundaries: Boundaries, total_pages: usize) -> SectionLayout {
    let narrative_end = boundaries
        .narrative_end
        .unwrap_or(boundaries.narrative_start)
        .max(boundaries.narrative_start);
    let narrative = PageRange {
        start: boundaries.narrative_start,
        end: narrative_end,
    };

    let references = match (boundaries.references_start, boundaries.references_end) {
        (Some(start), Some(end)) => PageRange::new(start, end),
        _ => None,
    };

    SectionLayout {
        narrative,
        references,
        total_pages,
    }
}
