//! Operator decision on destructive duplicate removal.

use crate::error::Result;
use std::path::PathBuf;

/// What the operator is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReview {
    /// Side file holding every copy of every duplicated row
    pub path: PathBuf,

    /// Rows written to the side file
    pub rows: usize,

    /// Rows that would be removed on confirmation
    pub surplus: usize,
}

/// Decides whether duplicate rows may be dropped.
///
/// Called after the review file has been written, so an implementation can
/// point the operator at it.
pub trait DuplicateReviewer {
    fn confirm(&self, review: &DuplicateReview) -> Result<bool>;
}

/// Drops duplicates without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDrop;

impl DuplicateReviewer for AlwaysDrop {
    fn confirm(&self, _review: &DuplicateReview) -> Result<bool> {
        Ok(true)
    }
}

/// Never drops duplicates; the rule is waived and the review file kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDrop;

impl DuplicateReviewer for NeverDrop {
    fn confirm(&self, _review: &DuplicateReview) -> Result<bool> {
        Ok(false)
    }
}
