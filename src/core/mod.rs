//! Core infrastructure shared by the binary and library consumers.
//!
//! - **config**: settings loading and resolved types.
//! - **error**: error enums.
//! - **paths**: `~` expansion for user-supplied paths.

pub mod config;
pub mod error;
pub mod paths;
