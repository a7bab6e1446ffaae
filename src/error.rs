//! Error taxonomy for mapping validation and compilation.
//!
//! Both variants are per-mapping: the loader logs and skips the offending
//! mapping and continues with the rest. "No match" is not an error; it is the
//! `None` arm of [`crate::index::RuntimeIndex::find_best_match`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockError {
    /// The mapping is structurally invalid (missing id, method, or urlPattern).
    #[error("mapping {id:?}: {reason}")]
    InvalidMapping { id: String, reason: &'static str },

    /// `urlMatch: regex` was requested but the pattern does not compile.
    #[error("mapping {id:?}: invalid urlPattern regex: {source}")]
    InvalidRegex {
        id: String,
        #[source]
        source: regex::Error,
    },
}
