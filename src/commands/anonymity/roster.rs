use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::document::{PageSource, PopplerDocument, lowercase_page};
use crate::error::{AuditError, AuditResult};
use crate::landmarks::LandmarkCursor;
use crate::model::{RosterEntry, TeamVocabulary};

const TEAM_MEMBER_LANDMARK: &str = "team member name";
const CONTACT_PHONE_LANDMARK: &str = "contact phone";
const ORGANIZATION_LANDMARK: &str = "organization/business relationship";
const CAGE_CODE_LANDMARK: &str = "cage code";
const TOTAL_FUNDS_LANDMARK: &str = "total funds requested";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    /// CSV with `First Name`, `Last Name`, `Institution`, `City` columns.
    Tabular(PathBuf),
    /// Full proposal PDF whose cover pages list the team.
    FrontMatter(PathBuf),
}

impl RosterSource {
    pub fn from_path(path: &Path) -> AuditResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Tabular(path.to_path_buf())),
            Some("pdf") => Ok(Self::FrontMatter(path.to_path_buf())),
            _ => Err(AuditError::UnsupportedRosterSource(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "First Name", default)]
    _first_name: Option<String>,
    #[serde(rename = "Last Name", default)]
    last_name: Option<String>,
    #[serde(rename = "Institution", default)]
    institution: Option<String>,
    #[serde(rename = "City", default)]
    city: Option<String>,
}

pub fn build(source: &RosterSource) -> Result<TeamVocabulary> {
    let entries = match source {
        RosterSource::Tabular(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open team roster {}", path.display()))?;
            entries_from_csv(file)
                .with_context(|| format!("failed to read team roster {}", path.display()))?
        }
        RosterSource::FrontMatter(path) => {
            let doc = PopplerDocument::open(path)?;
            entries_from_front_matter(&doc)
                .with_context(|| format!("failed to read team from {}", path.display()))?
        }
    };

    Ok(vocabulary_from_entries(&entries))
}

pub fn entries_from_csv(reader: impl Read) -> AuditResult<Vec<RosterEntry>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for row in csv_reader.deserialize::<RosterRow>() {
        let row = row?;
        entries.push(RosterEntry {
            surname: row.last_name.unwrap_or_default().to_lowercase(),
            institution: row.institution.unwrap_or_default(),
            city: row.city.unwrap_or_default(),
        });
    }

    Ok(entries)
}

pub fn entries_from_front_matter(
    doc: &(impl PageSource + ?Sized),
) -> AuditResult<Vec<RosterEntry>> {
    let mut entries = Vec::new();
    for page in 0..doc.page_count() {
        let text = lowercase_page(doc, page)?;
        entries.extend(parse_team_members(&text)?);
    }

    info!(members = entries.len(), "extracted team members from front matter");
    Ok(entries)
}

pub(crate) fn parse_team_members(text: &str) -> AuditResult<Vec<RosterEntry>> {
    let mut cursor = LandmarkCursor::new(text);
    let mut entries = Vec::new();

    while cursor.find_next(TEAM_MEMBER_LANDMARK).is_some() {
        let name_line = cursor
            .window(TEAM_MEMBER_LANDMARK, CONTACT_PHONE_LANDMARK)
            .ok_or_else(|| {
                AuditError::vocabulary(CONTACT_PHONE_LANDMARK, "no closing landmark after team member name")
            })?
            .line(1)
            .ok_or_else(|| AuditError::vocabulary(TEAM_MEMBER_LANDMARK, "no name line"))?;

        let institution_line = cursor
            .window(ORGANIZATION_LANDMARK, CAGE_CODE_LANDMARK)
            .ok_or_else(|| {
                AuditError::vocabulary(ORGANIZATION_LANDMARK, "organization block not bounded by cage code")
            })?
            .line(1)
            .ok_or_else(|| AuditError::vocabulary(ORGANIZATION_LANDMARK, "no organization line"))?;

        entries.push(RosterEntry {
            surname: name_line
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .to_string(),
            institution: institution_line.trim().to_string(),
            city: String::new(),
        });

        cursor.advance_past(TOTAL_FUNDS_LANDMARK).ok_or_else(|| {
            AuditError::vocabulary(TOTAL_FUNDS_LANDMARK, "team member block is not terminated")
        })?;
    }

    Ok(entries)
}

pub fn vocabulary_from_entries(entries: &[RosterEntry]) -> TeamVocabulary {
    fn unique<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
        values
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    TeamVocabulary {
        surnames: unique(entries.iter().map(|entry| &entry.surname)),
        institutions: unique(entries.iter().map(|entry| &entry.institution)),
        cities: unique(entries.iter().map(|entry| &entry.city)),
    }
}
