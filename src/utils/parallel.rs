//! Parallel file processing.
//!
//! Runs one independent unit of work per input file on a Rayon pool. Each
//! file is its own failure domain: a processor error is captured in that
//! file's [`FileProcessResult`] and never affects the other files.

use crate::utils::format::format_number;
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of processing a single file
#[derive(Debug)]
pub struct FileProcessResult<T> {
    pub file_path: PathBuf,
    pub outcome: Result<T>,
}

/// Process every file concurrently and wait for all of them.
///
/// Returns only after every `processor` call has finished, successfully
/// or not, with one result per file in input order.
///
/// # Arguments
/// * `files` - Files to process
/// * `jobs` - Worker count; `None` uses the global Rayon pool
/// * `processor` - Work for a single file
pub fn process_files_parallel<T, F>(
    files: &[PathBuf],
    jobs: Option<usize>,
    processor: F,
) -> Result<Vec<FileProcessResult<T>>>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Send + Sync,
{
    if files.is_empty() {
        return Err(anyhow::anyhow!("No files provided for processing"));
    }

    info!(
        "Processing {} files in parallel",
        format_number(files.len())
    );

    let progress = ProgressBar::new(files.len(), "Extracting");

    let work = || {
        files
            .par_iter()
            .map(|file_path| {
                let outcome = processor(file_path.as_path());
                progress.inc();
                FileProcessResult {
                    file_path: file_path.clone(),
                    outcome,
                }
            })
            .collect::<Vec<_>>()
    };

    let results = match jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build worker pool")?
            .install(work),
        None => work(),
    };

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    progress.finish_with_message(&format!(
        "Processed {} files ({} failed)",
        format_number(results.len()),
        format_number(failed)
    ));

    Ok(results)
}
