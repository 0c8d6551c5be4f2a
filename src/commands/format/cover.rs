use serde::Serialize;
use tracing::{info, warn};

use crate::document::{PageSource, lowercase_page};
use crate::error::AuditResult;
use crate::landmarks::LandmarkCursor;

const PI_LANDMARK: &str = "principal investigator";
const PI_END_LANDMARK: &str = "e-mail address";
const PROPOSAL_NUMBER_LANDMARK: &str = "proposal number";
const PROPOSAL_NUMBER_END_LANDMARK: &str = "nasa procedure for";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalInvestigator {
    pub first_name: String,
    pub last_name: String,
}

/// Identification read from the submission-system cover page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProposalInfo {
    pub principal_investigator: Option<PrincipalInvestigator>,
    pub proposal_number: Option<String>,
}

impl ProposalInfo {
    /// Without a PI block on page 1 the PDF is a bare proposal, not a full
    /// submission package.
    pub fn has_front_matter(&self) -> bool {
        self.principal_investigator.is_some()
    }
}

pub fn read_cover(doc: &(impl PageSource + ?Sized)) -> AuditResult<ProposalInfo> {
    if doc.page_count() == 0 {
        return Ok(ProposalInfo::default());
    }

    let cover = lowercase_page(doc, 0)?;
    let cursor = LandmarkCursor::new(&cover);

    let principal_investigator = cursor
        .window(PI_LANDMARK, PI_END_LANDMARK)
        .and_then(|window| window.line(1))
        .and_then(|line| {
            let mut names = line.split_whitespace();
            let first_name = names.next()?.to_string();
            let last_name = names
                .last()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| first_name.clone());
            Some(PrincipalInvestigator {
                first_name,
                last_name,
            })
        });

    let Some(principal_investigator) = principal_investigator else {
        info!("no submission front matter found on cover page");
        return Ok(ProposalInfo::default());
    };

    let proposal_number = cursor
        .window(PROPOSAL_NUMBER_LANDMARK, PROPOSAL_NUMBER_END_LANDMARK)
        .and_then(|window| window.line(1))
        .and_then(|line| line.split_whitespace().next())
        .map(ToOwned::to_owned);
    if proposal_number.is_none() {
        warn!("cover page has a PI block but no proposal number");
    }

    Ok(ProposalInfo {
        principal_investigator: Some(principal_investigator),
        proposal_number,
    })
}
