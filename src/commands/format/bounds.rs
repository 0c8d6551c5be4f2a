use serde::Serialize;
use tracing::{info, warn};

use crate::document::PageSource;
use crate::error::AuditResult;
use crate::model::PageRange;

const BUDGET_SECTION_LANDMARK: &str = "SECTION X - Budget";
const SHORT_PAGE_CHARS: usize = 500;
const FRONT_MATTER_WORDS: [&str; 8] = [
    "contents",
    "c o n t e n t s",
    "budget",
    "cost",
    "costs",
    "submitted to",
    "purposely left blank",
    "restrictive notice",
];
const REFERENCE_WORDS: [&str; 4] = [
    "references",
    "bibliography",
    "r e f e r e n c e s",
    "b i b l i o g r a p h y",
];

/// Pages of the science/technical/management section inside a full proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalBounds {
    pub pages: PageRange,
    pub total_pages: usize,
    /// Whether the end of the budget section was seen. False for bare
    /// proposals and for packages where the landmark is missing.
    pub budget_landmark_found: bool,
}

pub fn locate_proposal(
    doc: &(impl PageSource + ?Sized),
    has_front_matter: bool,
    page_limit: usize,
) -> AuditResult<ProposalBounds> {
    let total_pages = doc.page_count();
    let span = page_limit.saturating_sub(1);

    let (mut start, budget_landmark_found) = if has_front_matter {
        match find_start_after_budget(doc)? {
            Some(start) => (start, true),
            None => {
                warn!("budget section landmark not found; assuming proposal starts on page 1");
                (0, false)
            }
        }
    } else {
        (0, false)
    };
    let mut end = start + span;

    if page_has_any(doc, Some(start), &FRONT_MATTER_WORDS)? {
        start += 1;
        end += 1;
    }

    end = adjust_end_to_references(doc, end)?;

    let pages = PageRange {
        start,
        end: end.max(start),
    };
    info!(
        total_pages,
        start = pages.start + 1,
        end = pages.end + 1,
        "located proposal pages"
    );

    Ok(ProposalBounds {
        pages,
        total_pages,
        budget_landmark_found,
    })
}

fn find_start_after_budget(doc: &(impl PageSource + ?Sized)) -> AuditResult<Option<usize>> {
    let total_pages = doc.page_count();
    let mut next_text: Option<String> = None;

    for page in 0..total_pages.saturating_sub(1) {
        let current = match next_text.take() {
            Some(text) => text,
            None => doc.page_text(page)?,
        };
        let next = doc.page_text(page + 1)?;

        if current.contains(BUDGET_SECTION_LANDMARK) && !next.contains(BUDGET_SECTION_LANDMARK) {
            let mut start = page + 1;
            let mut following = next;

            if following.chars().count() < SHORT_PAGE_CHARS {
                start += 1;
                following = page_text_or_empty(doc, page + 2)?;
            }
            let following = following.to_lowercase();
            if FRONT_MATTER_WORDS.iter().any(|word| following.contains(word)) {
                start += 1;
            }

            return Ok(Some(start));
        }

        next_text = Some(next);
    }

    Ok(None)
}

/// Move `end` so the page after it is the first references page, looking up
/// to two pages forward and four pages back.
fn adjust_end_to_references(doc: &(impl PageSource + ?Sized), mut end: usize) -> AuditResult<usize> {
    if page_has_any(doc, Some(end + 1), &REFERENCE_WORDS)? {
        return Ok(end);
    }

    if page_has_any(doc, Some(end + 2), &REFERENCE_WORDS)? {
        end += 1;
    } else if page_has_any(doc, Some(end + 3), &REFERENCE_WORDS)? {
        end += 2;
    }

    for back in 0..4 {
        if page_has_any(doc, end.checked_sub(back), &REFERENCE_WORDS)? {
            return Ok(end.saturating_sub(back + 1));
        }
    }

    Ok(end)
}

fn page_text_or_empty(doc: &(impl PageSource + ?Sized), page: usize) -> AuditResult<String> {
    if page < doc.page_count() {
        doc.page_text(page)
    } else {
        Ok(String::new())
    }
}

/// Pages outside the document never match.
fn page_has_any(
    doc: &(impl PageSource + ?Sized),
    page: Option<usize>,
    words: &[&str],
) -> AuditResult<bool> {
    let Some(page) = page.filter(|page| *page < doc.page_count()) else {
        return Ok(false);
    };
    let text = doc.page_text(page)?.to_lowercase();
    Ok(words.iter().any(|word| text.contains(word)))
}
