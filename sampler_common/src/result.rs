//! Result type alias shared across the workspace.
//!
//! Defaults the error type to `SamplerError`, so process-level functions can simply
//! return `Result<T>`.
use crate::error::SamplerError;

/// Workspace-wide `Result` alias with `SamplerError` as the default error.
pub type Result<T, E = SamplerError> = std::result::Result<T, E>;
