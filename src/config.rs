use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub anonymity: AnonymityConfig,
    pub format: FormatConfig,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportPolicy {
    /// One finding per term and page, with the number of hits on that page.
    #[default]
    PerPage,
    /// One finding per term, listing every page it was found on.
    PerTerm,
}

impl ReportPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerPage => "per-page",
            Self::PerTerm => "per-term",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymityConfig {
    pub report_policy: ReportPolicy,
    pub pronouns: Vec<String>,
    pub include_project_summary: bool,
}

impl Default for AnonymityConfig {
    fn default() -> Self {
        Self {
            report_policy: ReportPolicy::PerPage,
            pronouns: ["she", "he", "her", "hers", "his", "him"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
            include_project_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub page_limit: usize,
    pub column_width_inches: f64,
    pub column_height_inches: f64,
    pub cpi_max: f64,
    pub lpi_max: f64,
    pub min_line_chars: usize,
    pub edge_lines: usize,
    pub font_size_warning: f64,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            page_limit: 15,
            column_width_inches: 6.5,
            column_height_inches: 9.0,
            cpi_max: 16.0,
            lpi_max: 5.5,
            min_line_chars: 50,
            edge_lines: 2,
            font_size_warning: 11.8,
        }
    }
}

impl AuditConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}
