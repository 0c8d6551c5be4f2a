use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use super::output::{
    AnonymityReport, AuditStatus, BatchReport, write_json_response, write_text_response,
};
use super::references::{ReferenceStyle, ReferenceStyleClassifier};
use super::roster::{self, RosterSource, entries_from_front_matter, vocabulary_from_entries};
use super::scan::{ViolationScanner, Vocabulary};
use super::sections::{LocateOutcome, ReferenceBounds, locate};
use crate::cli::{AnonymityArgs, BatchArgs, OutputArgs};
use crate::config::{AnonymityConfig, AuditConfig};
use crate::document::{PageSource, PopplerDocument};
use crate::error::AuditError;
use crate::model::{TeamVocabulary, ViolationMatch};
use crate::util::{discover_pdfs, now_utc_string, sha256_file, write_json_pretty};

#[derive(Debug)]
pub(crate) struct DocumentAudit {
    pub outcome: LocateOutcome,
    pub reference_style: Option<ReferenceStyle>,
    pub matches: Vec<ViolationMatch>,
}

pub fn run(args: AnonymityArgs) -> Result<()> {
    let mut config = AuditConfig::load(args.output.config.as_deref())?;
    if let Some(policy) = args.policy {
        config.anonymity.report_policy = policy;
    }

    let bounds = match (args.ref_start, args.ref_end) {
        (Some(start), Some(end)) => Some(ReferenceBounds { start, end }),
        _ => None,
    };

    info!(
        anonymized = %args.anonymized_pdf.display(),
        team_info = %args.team_info.display(),
        policy = config.anonymity.report_policy.as_str(),
        "starting anonymity audit"
    );

    let team = roster::build(&RosterSource::from_path(&args.team_info)?)?;
    let doc = PopplerDocument::open(&args.anonymized_pdf)?;
    let full = args
        .full_pdf
        .as_deref()
        .map(PopplerDocument::open)
        .transpose()?;
    let auxiliary = full
        .as_ref()
        .filter(|_| config.anonymity.include_project_summary)
        .map(|full| full as &dyn PageSource);

    let audit = audit_document(&doc, &team, auxiliary, bounds, &config.anonymity)
        .with_context(|| format!("failed to audit {}", args.anonymized_pdf.display()))?;
    let report = build_report(
        &args.anonymized_pdf,
        &args.team_info,
        &config.anonymity,
        team,
        audit,
    )?;

    emit(&args.output, &report, std::slice::from_ref(&report))
}

pub fn run_batch(args: BatchArgs) -> Result<()> {
    let mut config = AuditConfig::load(args.output.config.as_deref())?;
    if let Some(policy) = args.policy {
        config.anonymity.report_policy = policy;
    }

    let anonymized = discover_pdfs(&args.anonymized_dir)?;
    let full = discover_pdfs(&args.full_dir)?;
    check_pairing(anonymized.len(), full.len())?;

    info!(
        documents = anonymized.len(),
        policy = config.anonymity.report_policy.as_str(),
        "starting batch anonymity audit"
    );

    let mut documents = Vec::with_capacity(anonymized.len());
    for (anonymized_pdf, full_pdf) in anonymized.iter().zip(&full) {
        info!(
            anonymized = %anonymized_pdf.display(),
            full = %full_pdf.display(),
            "checking proposal pair"
        );

        match audit_pair(anonymized_pdf, full_pdf, &config.anonymity) {
            Ok(report) => documents.push(report),
            Err(err) => {
                let message = format!("{err:#}");
                error!(
                    anonymized = %anonymized_pdf.display(),
                    error = %message,
                    "proposal audit failed; continuing"
                );
                documents.push(failed_report(
                    anonymized_pdf,
                    full_pdf,
                    &config.anonymity,
                    &err,
                ));
            }
        }
    }

    let failed_count = documents
        .iter()
        .filter(|report| report.status == AuditStatus::Failed)
        .count();
    let batch = BatchReport {
        generated_at: now_utc_string(),
        anonymized_dir: args.anonymized_dir.display().to_string(),
        full_dir: args.full_dir.display().to_string(),
        document_count: documents.len(),
        failed_count,
        documents,
    };

    info!(
        documents = batch.document_count,
        failed = batch.failed_count,
        "batch anonymity audit complete"
    );

    emit(&args.output, &batch, &batch.documents)
}

pub(crate) fn check_pairing(anonymized: usize, full: usize) -> Result<(), AuditError> {
    if anonymized != full {
        return Err(AuditError::DocumentCountMismatch { anonymized, full });
    }
    Ok(())
}

fn audit_pair(
    anonymized_pdf: &Path,
    full_pdf: &Path,
    config: &AnonymityConfig,
) -> Result<AnonymityReport> {
    let doc = PopplerDocument::open(anonymized_pdf)?;
    let full = PopplerDocument::open(full_pdf)?;

    let team = vocabulary_from_entries(
        &entries_from_front_matter(&full)
            .with_context(|| format!("failed to read team from {}", full_pdf.display()))?,
    );
    let auxiliary = config
        .include_project_summary
        .then_some(&full as &dyn PageSource);

    let audit = audit_document(&doc, &team, auxiliary, None, config)
        .with_context(|| format!("failed to audit {}", anonymized_pdf.display()))?;
    build_report(anonymized_pdf, full.path(), config, team, audit)
}

pub(crate) fn audit_document(
    doc: &(impl PageSource + ?Sized),
    team: &TeamVocabulary,
    auxiliary: Option<&dyn PageSource>,
    bounds: Option<ReferenceBounds>,
    config: &AnonymityConfig,
) -> Result<DocumentAudit> {
    let outcome = locate(doc, bounds)?;
    let LocateOutcome::Resolved(layout) = outcome else {
        return Ok(DocumentAudit {
            outcome,
            reference_style: None,
            matches: Vec::new(),
        });
    };

    let classifier = ReferenceStyleClassifier::new()?;
    let reference_style = classifier.classify(doc, Some(layout.narrative))?;

    let vocabulary = Vocabulary::new(&config.pronouns, team);
    info!(terms = vocabulary.len(), "built identifying-term vocabulary");
    let scanner = ViolationScanner::new(&vocabulary)?;
    let matches = scanner.scan(doc, &layout, auxiliary)?;

    Ok(DocumentAudit {
        outcome,
        reference_style: Some(reference_style),
        matches,
    })
}

fn build_report(
    anonymized_pdf: &Path,
    team_info: &Path,
    config: &AnonymityConfig,
    team: TeamVocabulary,
    audit: DocumentAudit,
) -> Result<AnonymityReport> {
    let (status, total_pages, layout) = match audit.outcome {
        LocateOutcome::Resolved(layout) => (AuditStatus::Audited, layout.total_pages, Some(layout)),
        LocateOutcome::Incomplete { total_pages } => (AuditStatus::Incomplete, total_pages, None),
    };

    let report = AnonymityReport {
        generated_at: now_utc_string(),
        anonymized_pdf: anonymized_pdf.display().to_string(),
        anonymized_sha256: Some(sha256_file(anonymized_pdf)?),
        team_info: team_info.display().to_string(),
        report_policy: config.report_policy,
        status,
        total_pages,
        layout,
        reference_style: audit.reference_style,
        vocabulary: Some(team),
        matches: audit.matches,
        term_findings: None,
        error: None,
    };

    Ok(report.with_policy_view())
}

fn failed_report(
    anonymized_pdf: &Path,
    full_pdf: &Path,
    config: &AnonymityConfig,
    err: &anyhow::Error,
) -> AnonymityReport {
    AnonymityReport {
        generated_at: now_utc_string(),
        anonymized_pdf: anonymized_pdf.display().to_string(),
        anonymized_sha256: sha256_file(anonymized_pdf).ok(),
        team_info: full_pdf.display().to_string(),
        report_policy: config.report_policy,
        status: AuditStatus::Failed,
        total_pages: 0,
        layout: None,
        reference_style: None,
        vocabulary: None,
        matches: Vec::new(),
        term_findings: None,
        error: Some(format!("{err:#}")),
    }
}

fn emit<T: serde::Serialize>(
    output: &OutputArgs,
    json_report: &T,
    reports: &[AnonymityReport],
) -> Result<()> {
    if let Some(path) = &output.report_path {
        write_json_pretty(path, json_report)?;
        info!(path = %path.display(), "wrote anonymity report");
    }

    if output.json {
        write_json_response(json_report)
    } else {
        write_text_response(reports)
    }
}
