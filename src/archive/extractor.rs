//! Targeted extraction of one array field from a large export document.
//!
//! Chat exports are a single top-level object holding channel metadata and
//! one (potentially huge) array of messages. [`TargetExtractor`] walks the
//! top-level keys with a [`Scanner`], skips everything except the target
//! key, and decodes that key's array one element at a time.
//!
//! Only the first occurrence of the target key is honored: once its array
//! closes, the rest of the document is never read.

use super::scanner::{DecodeError, ScanError, Scanner, Token, TokenKind};
use serde::de::DeserializeOwned;
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, warn};

/// Default name of the top-level field holding the message array
pub const DEFAULT_TARGET_KEY: &str = "messages";

/// What one document contributed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Whether the target key was present at the top level
    pub target_found: bool,
    /// Elements decoded and handed to the caller
    pub records_decoded: usize,
    /// Elements that were valid JSON but not a valid record
    pub records_skipped: usize,
}

/// Document-level extraction failure. Records already handed to the
/// caller before the failure remain valid.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("top-level value is {found}, expected an object")]
    NotAnObject { found: TokenKind },

    #[error("value of '{key}' is {found}, expected an array")]
    TargetNotArray { key: String, found: TokenKind },

    #[error("malformed JSON: {0}")]
    Scan(#[from] ScanError),
}

/// Streams the elements of one top-level array field.
#[derive(Debug, Clone)]
pub struct TargetExtractor {
    target_key: String,
}

impl Default for TargetExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_KEY)
    }
}

impl TargetExtractor {
    pub fn new(target_key: impl Into<String>) -> Self {
        Self {
            target_key: target_key.into(),
        }
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Walk the document and call `on_record` for every element of the
    /// target array that decodes as `T`, in document order.
    ///
    /// `source` is only used to label diagnostics.
    pub fn extract<T, R, F>(
        &self,
        scanner: &mut Scanner<R>,
        source: &str,
        mut on_record: F,
    ) -> Result<ExtractSummary, ExtractError>
    where
        T: DeserializeOwned,
        R: BufRead,
        F: FnMut(T),
    {
        let mut summary = ExtractSummary::default();

        match scanner.next_token()? {
            Some(Token::BeginObject) => {}
            Some(other) => return Err(ExtractError::NotAnObject { found: other.kind() }),
            None => return Err(ExtractError::EmptyDocument),
        }

        while scanner.has_more()? {
            // has_more() guarantees a key here; anything else is a ScanError
            let Some(Token::Key(key)) = scanner.next_token()? else {
                break;
            };

            if key != self.target_key {
                debug!(source, key = %key, "skipping top-level field");
                scanner.skip_value()?;
                continue;
            }

            // EOF inside the object is a ScanError, never `None`
            let Some(token) = scanner.next_token()? else {
                break;
            };
            if token != Token::BeginArray {
                return Err(ExtractError::TargetNotArray {
                    key,
                    found: token.kind(),
                });
            }
            summary.target_found = true;

            let mut index = 0usize;
            while scanner.has_more()? {
                match scanner.decode_next::<T>() {
                    Ok(record) => {
                        summary.records_decoded += 1;
                        on_record(record);
                    }
                    Err(DecodeError::Malformed(e)) => {
                        summary.records_skipped += 1;
                        warn!(
                            source,
                            index,
                            error = %e,
                            "skipping malformed element of '{}'",
                            self.target_key
                        );
                    }
                    Err(DecodeError::Scan(e)) => return Err(e.into()),
                }
                index += 1;
            }
            // Closing bracket of the target array
            scanner.next_token()?;
            break;
        }

        Ok(summary)
    }
}
