//! # Chat Role Audit
//!
//! Extracts the distinct (user, role) associations observed across a set
//! of chat-export JSON archives and writes them as one deduplicated CSV
//! report, for auditing community membership and role history.
//!
//! ## Overview
//!
//! Export files are single JSON documents: a top-level object with channel
//! metadata and one large `messages` array. They are routinely too large to
//! parse whole, so each file is streamed:
//!
//! 1. A pull-based scanner walks the top-level object, skipping every
//!    field except the message array
//! 2. Each message is decoded on its own and turned into (user, role)
//!    candidates
//! 3. Candidates from all files, processed in parallel, are merged into
//!    one shared set where the first candidate for each user/role key wins
//!
//! Memory use is bounded by the largest single message, not the file size.
//!
//! ## Failure handling
//!
//! - A message that is valid JSON but not a valid record is skipped
//! - A file with broken JSON stops contributing at the break; other files
//!   are unaffected
//! - A file without a `messages` field contributes nothing and is reported
//! - The run fails only when no usable input file exists or the report
//!   cannot be written
//!
//! ## Architecture
//!
//! - [`archive`] - Streaming scanner, targeted extractor and record types
//! - [`roles`] - Record normalization and concurrent dedup
//! - [`commands`] - Command implementations
//! - [`utils`] - Parallel processing, input resolution, progress, logging
//!
//! ## Example Usage
//!
//! ```bash
//! chat-role-audit extract-roles 'exports/*.json' -o roles.csv
//! chat-role-audit extract-roles a.json b.json --target-key messages --sort
//! chat-role-audit generate-completion bash > chat-role-audit.bash
//! ```

pub mod archive;
pub mod commands;
pub mod roles;
pub mod utils;
