//! Parse diagnostics
//!
//! The parser never fails outright; malformed lines are recorded here and
//! parsing continues, so a partially broken program still yields whatever
//! probe sequence could be reconstructed.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A non-fatal, line-referenced problem found while parsing
///
/// Line numbers are 1-based. Unrecognized commands are not diagnostics;
/// they are silently skipped for forward compatibility with G-code this
/// dialect does not model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseDiagnostic {
    /// A G38.2 line carried zero or more than one axis word
    #[error("Line {line_number}: invalid probe command, expected exactly one axis: {line}")]
    InvalidProbeCommand {
        /// 1-based line number of the offending line.
        line_number: usize,
        /// The original line text, trimmed.
        line: String,
    },
}

impl ParseDiagnostic {
    /// The 1-based source line this diagnostic refers to
    pub fn line_number(&self) -> usize {
        match self {
            Self::InvalidProbeCommand { line_number, .. } => *line_number,
        }
    }
}

// Diagnostics travel to the UI as display strings.
impl Serialize for ParseDiagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
