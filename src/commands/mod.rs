//! Command implementations.
//!
//! - [`extract_roles`] - Extract the distinct user/role associations from a
//!   set of chat-export JSON files into one CSV report

pub mod extract_roles;
