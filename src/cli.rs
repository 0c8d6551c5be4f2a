use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ReportPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "dapr-audit",
    version,
    about = "Audit proposal PDFs for dual-anonymous review and formatting compliance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check one anonymized proposal for identifying terms and reference style.
    Anonymity(AnonymityArgs),
    /// Check every anonymized proposal in a directory against its full counterpart.
    Batch(BatchArgs),
    /// Check font size and text density of a full proposal.
    Format(FormatArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnonymityArgs {
    /// Anonymized proposal PDF.
    pub anonymized_pdf: PathBuf,

    /// Team roster: a .csv file or the full proposal PDF with team cover pages.
    pub team_info: PathBuf,

    /// First page of the references section (1-based); skips detection.
    #[arg(long, requires = "ref_end")]
    pub ref_start: Option<usize>,

    /// Last page of the references section (1-based).
    #[arg(long, requires = "ref_start")]
    pub ref_end: Option<usize>,

    /// Full proposal PDF whose project summary should also be scanned.
    #[arg(long)]
    pub full_pdf: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub policy: Option<ReportPolicy>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory of anonymized proposal PDFs.
    pub anonymized_dir: PathBuf,

    /// Directory of full proposal PDFs, paired with the anonymized ones by sorted name.
    pub full_dir: PathBuf,

    #[arg(long, value_enum)]
    pub policy: Option<ReportPolicy>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    /// Full proposal PDF.
    pub pdf: PathBuf,

    /// Page limit of the science/technical/management section.
    #[arg(long)]
    pub page_limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// JSON file with threshold and policy overrides.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also write the JSON report to this path.
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}
