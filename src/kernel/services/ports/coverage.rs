use std::fmt;

use super::runtime::BoxResultFuture;
use crate::kernel::coverage::CoverageDetail;

/// Source of per-file detail records, resolved off the UI thread.
pub trait CoverageDetailsProvider: Send + Sync {
    /// `test` narrows the records to a single test when the tree is filtered.
    fn details(
        &self,
        path: &str,
        test: Option<&str>,
    ) -> BoxResultFuture<Vec<CoverageDetail>, CoverageError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageError {
    Fetch(String),
    UnknownFile(String),
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageError::Fetch(msg) => write!(f, "coverage fetch failed: {msg}"),
            CoverageError::UnknownFile(path) => write!(f, "no coverage for {path}"),
        }
    }
}

impl std::error::Error for CoverageError {}
