use thiserror::Error;

/// Errors that can occur while building, chaining, or serializing records.
///
/// None of these are fatal to the process — every failure is scoped to one
/// record or one chain link, and callers branch on the variant rather than
/// catching anything.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VerifactuError {
    /// Malformed input (tax id, amount, date) rejected before any record
    /// was produced.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A hash chain failed linkage verification at the given entry index.
    #[error("hash chain broken at entry {broken_at}")]
    Chain { broken_at: usize },

    /// A required field was missing when building XML or a REST payload.
    /// Serialization fails before emitting any partial document.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// XML writer failure.
    #[error("XML error: {0}")]
    Xml(String),
}
