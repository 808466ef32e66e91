//! Semantic version algebra.
//!
//! This module provides:
//! - [`SemanticVersion`] - parsing, SemVer 2.0 precedence and formatting
//! - [`SemanticVersionRange`] - version intervals in NuGet range notation

mod range;
mod semantic;

pub use range::SemanticVersionRange;
pub use semantic::SemanticVersion;

/// Errors produced while parsing versions, identifiers or ranges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("The version string is empty.")]
    Empty,

    #[error("Invalid version \"{0}\". Expected major.minor.patch[-pre-release][+metadata].")]
    Format(String),

    #[error("Invalid identifier \"{0}\". Identifiers must match [0-9A-Za-z-]+.")]
    Identifier(String),

    #[error("Invalid version range \"{0}\".")]
    Range(String),
}
