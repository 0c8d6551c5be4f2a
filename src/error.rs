use std::path::PathBuf;

pub type AuditResult<T> = std::result::Result<T, AuditError>;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to extract text for page {page}: {reason}")]
    PageExtraction { page: usize, reason: String },

    #[error("team info front matter is malformed near '{landmark}': {detail}")]
    VocabularyExtraction { landmark: String, detail: String },

    #[error("invalid reference page bounds: start={start} end={end} (1-based, start must be >= 2)")]
    InvalidReferenceBounds { start: usize, end: usize },

    #[error("unsupported team info source (expected .csv or .pdf): {}", .0.display())]
    UnsupportedRosterSource(PathBuf),

    #[error(
        "number of anonymized ({anonymized}) and full ({full}) proposals are not equal"
    )]
    DocumentCountMismatch { anonymized: usize, full: usize },

    #[error("failed to read team roster: {0}")]
    Roster(#[from] csv::Error),
}

impl AuditError {
    pub fn vocabulary(landmark: &str, detail: impl Into<String>) -> Self {
        Self::VocabularyExtraction {
            landmark: landmark.to_string(),
            detail: detail.into(),
        }
    }
}
