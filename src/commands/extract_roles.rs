//! Distinct user/role association extraction.
//!
//! Streams the message array out of every export file in parallel, turns
//! each message author into (user, role) candidates and keeps the first
//! candidate seen for every user/role key across all files.
//!
//! # Usage
//!
//! ```bash
//! # All exports in a directory
//! chat-role-audit extract-roles 'exports/*.json' -o roles.csv
//!
//! # Several directories, four workers, stable row order
//! chat-role-audit extract-roles 2023/*.json 2024/*.json --jobs 4 --sort
//! ```
//!
//! # Output
//!
//! A CSV report with one row per unique association:
//! - `UserID`, `Username`, `DisplayName` (nickname, or username when unset)
//! - `RoleID`, `RoleName` (both empty when the user had no roles)
//!
//! The report is written to `<output>.inprogress` and renamed into place
//! once complete, so a failed run never leaves a partial report.

use crate::archive::extractor::{ExtractSummary, TargetExtractor};
use crate::archive::open_export;
use crate::archive::types::MessageRecord;
use crate::roles::aggregator::RoleAggregator;
use crate::roles::association::{normalize, AssociationCandidate, CSV_HEADER};
use crate::utils::format::format_number;
use crate::utils::inputs::{resolve_inputs, select_json_files};
use crate::utils::parallel::process_files_parallel;
use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What a single file contributed to the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileContribution {
    pub summary: ExtractSummary,
    /// Candidates produced by the normalizer
    pub candidates: usize,
    /// Candidates that were new to the shared result
    pub inserted: usize,
}

/// Statistics for a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_missing_target: usize,
    pub records_decoded: usize,
    pub records_skipped: usize,
    pub candidates: usize,
    pub unique_rows: usize,
    pub output: PathBuf,
}

impl ExtractReport {
    fn add(&mut self, contribution: &FileContribution) {
        self.files_processed += 1;
        if !contribution.summary.target_found {
            self.files_missing_target += 1;
        }
        self.records_decoded += contribution.summary.records_decoded;
        self.records_skipped += contribution.summary.records_skipped;
        self.candidates += contribution.candidates;
    }

    /// Log a summary of the run
    pub fn log_summary(&self) {
        info!(
            "Files: {} processed, {} failed, {} without messages",
            format_number(self.files_processed),
            format_number(self.files_failed),
            format_number(self.files_missing_target)
        );
        info!(
            "Messages: {} decoded, {} skipped; {} candidates",
            format_number(self.records_decoded),
            format_number(self.records_skipped),
            format_number(self.candidates)
        );
        info!(
            "Successfully wrote {} unique user-role entries to {}",
            format_number(self.unique_rows),
            self.output.display()
        );
    }
}

/// Run one file through scanner, extractor, normalizer and aggregator.
///
/// Rows inserted before a failure stay in `aggregator`.
pub fn process_export(
    path: &Path,
    extractor: &TargetExtractor,
    aggregator: &RoleAggregator,
) -> Result<FileContribution> {
    let file = path.display().to_string();
    info!("Processing file: {}", file);

    let mut scanner = match open_export(path) {
        Ok(s) => s,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };

    let mut contribution = FileContribution::default();
    let extracted = extractor.extract(&mut scanner, &file, |record: MessageRecord| {
        for candidate in normalize(&record) {
            contribution.candidates += 1;
            if aggregator.try_insert(candidate) {
                contribution.inserted += 1;
            }
        }
    });

    match extracted {
        Ok(summary) => {
            contribution.summary = summary;
            if !summary.target_found {
                warn!(
                    "'{}' key not found in {}",
                    extractor.target_key(),
                    file
                );
            }
            info!(
                decoded = summary.records_decoded,
                skipped = summary.records_skipped,
                inserted = contribution.inserted,
                "Finished processing file: {}",
                file
            );
            Ok(contribution)
        }
        Err(e) => {
            error!(
                inserted = contribution.inserted,
                "Error processing {} at byte {}: {}",
                file,
                scanner.offset(),
                e
            );
            Err(e).with_context(|| format!("Failed to extract from {}", file))
        }
    }
}

/// Extract all unique associations from `inputs` into a CSV at `output`.
///
/// # Arguments
/// * `inputs` - File paths or glob patterns
/// * `output` - CSV report path
/// * `target_key` - Top-level field holding the message array
/// * `jobs` - Worker count (`None` for one per CPU)
/// * `sorted` - Order rows by user/role key instead of arbitrary order
pub fn run(
    inputs: &[String],
    output: &str,
    target_key: &str,
    jobs: Option<usize>,
    sorted: bool,
) -> Result<ExtractReport> {
    if inputs.is_empty() {
        bail!("No input JSON files provided");
    }

    let candidates = resolve_inputs(inputs);
    if candidates.is_empty() {
        bail!("No valid input JSON files found after processing arguments");
    }
    let files = select_json_files(candidates);
    if files.is_empty() {
        bail!("None of the input paths is a regular .json file");
    }

    // Fail before doing any work if the report cannot be created
    let mut report_writer = ReportWriter::create(Path::new(output))?;

    let aggregator = RoleAggregator::new();
    let extractor = TargetExtractor::new(target_key);

    let results = process_files_parallel(&files, jobs, |path| {
        process_export(path, &extractor, &aggregator)
    })?;

    let mut report = ExtractReport {
        output: PathBuf::from(output),
        ..Default::default()
    };
    for result in &results {
        match &result.outcome {
            Ok(contribution) => report.add(contribution),
            Err(_) => report.files_failed += 1,
        }
    }

    info!("All files processed. Writing to CSV: {}", output);

    let rows = aggregator.into_result_set().into_rows(sorted);
    report.unique_rows = rows.len();
    for row in &rows {
        report_writer.write_row(row)?;
    }
    report_writer.commit()?;

    report.log_summary();
    Ok(report)
}

/// CSV report staged next to its destination and renamed on commit.
/// Dropping it uncommitted removes the staging file.
struct ReportWriter {
    writer: Option<csv::Writer<File>>,
    staging: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl ReportWriter {
    fn create(destination: &Path) -> Result<Self> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }

        let mut staging = OsString::from(destination.as_os_str());
        staging.push(".inprogress");
        let staging = PathBuf::from(staging);

        let writer = csv::Writer::from_path(&staging)
            .with_context(|| format!("Failed to create output file: {}", destination.display()))?;

        let mut report_writer = Self {
            writer: Some(writer),
            staging,
            destination: destination.to_path_buf(),
            committed: false,
        };
        report_writer
            .write_fields(CSV_HEADER)
            .context("Failed to write CSV header")?;
        Ok(report_writer)
    }

    fn write_row(&mut self, row: &AssociationCandidate) -> Result<()> {
        self.write_fields(row.csv_row())
            .context("Failed to write CSV record")
    }

    fn write_fields(&mut self, fields: [&str; 5]) -> csv::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_record(fields),
            None => Ok(()),
        }
    }

    fn commit(mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().context("Failed to flush output file")?;
        }
        fs::rename(&self.staging, &self.destination).with_context(|| {
            format!("Failed to move report into place: {}", self.destination.display())
        })?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for ReportWriter {
    fn drop(&mut self) {
        if !self.committed {
            self.writer.take();
            let _ = fs::remove_file(&self.staging);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_process_export_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        fs::write(
            &path,
            r#"{"messages": [
                {"author": {"id": "1", "name": "a", "roles": [{"id": "10", "name": "x"}, {"id": "11", "name": "y"}]}},
                {"author": {"id": "1", "name": "a", "roles": [{"id": "10", "name": "x"}]}},
                {"author": {"id": "", "name": "ghost"}},
                {"author": "broken"}
            ]}"#,
        )
        .unwrap();

        let aggregator = RoleAggregator::new();
        let contribution =
            process_export(&path, &TargetExtractor::default(), &aggregator).unwrap();
        assert_eq!(contribution.summary.records_decoded, 3);
        assert_eq!(contribution.summary.records_skipped, 1);
        assert_eq!(contribution.candidates, 3);
        assert_eq!(contribution.inserted, 2);
        assert_eq!(aggregator.len(), 2);
    }

    #[test]
    fn test_process_export_keeps_rows_before_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.json");
        fs::write(
            &path,
            r#"{"messages": [{"author": {"id": "1", "name": "a"}}, {"author": {"id": "2""#,
        )
        .unwrap();

        let aggregator = RoleAggregator::new();
        let result = process_export(&path, &TargetExtractor::default(), &aggregator);
        assert!(result.is_err());
        assert_eq!(aggregator.len(), 1);
    }

    #[test]
    fn test_report_writer_discards_uncommitted_output() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.csv");
        {
            let _writer = ReportWriter::create(&destination).unwrap();
            assert!(dir.path().join("out.csv.inprogress").exists());
        }
        assert!(!dir.path().join("out.csv.inprogress").exists());
        assert!(!destination.exists());
    }

    #[test]
    fn test_report_writer_commit() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("nested").join("out.csv");
        let writer = ReportWriter::create(&destination).unwrap();
        writer.commit().unwrap();

        let contents = fs::read_to_string(&destination).unwrap();
        assert_eq!(contents, "UserID,Username,DisplayName,RoleID,RoleName\n");
        assert!(!dir.path().join("nested").join("out.csv.inprogress").exists());
    }
}
