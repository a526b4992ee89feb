//! Chat-export archive parsing.
//!
//! - [`scanner`] - Pull-based streaming JSON tokenizer
//! - [`extractor`] - Targeted extraction of the message array
//! - [`types`] - Message, author and role records

pub mod extractor;
pub mod scanner;
pub mod types;

use anyhow::{Context, Result};
use scanner::Scanner;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const READ_BUF_BYTES: usize = 1 << 20;

/// Open an export file for streaming.
pub fn open_export(path: impl AsRef<Path>) -> Result<Scanner<BufReader<File>>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    Ok(Scanner::new(BufReader::with_capacity(READ_BUF_BYTES, file)))
}
