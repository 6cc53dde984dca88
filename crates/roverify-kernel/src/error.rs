//! Error types for read-only verification.
//!
//! Only the two fatal conditions are errors. Detected mutations and
//! misconfigured verbosity are reported through the diagnostic sink and
//! never surface to the caller.

/// Fatal conditions raised while starting a region activation.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The "before" and "after" passes announced different variable counts.
    #[error(
        "fatal configuration in {module}::{region}: pre_count ({pre_count}) does not match post_count ({post_count})"
    )]
    CountMismatch {
        module: String,
        region: String,
        pre_count: usize,
        post_count: usize,
    },

    /// The ledger could not be allocated.
    #[error("fatal resource in {module}::{region}: unable to allocate ledger of {slots} slots")]
    LedgerAllocation {
        module: String,
        region: String,
        slots: usize,
    },
}

/// Classification of conditions the subsystem can encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Verbose confirmation.
    Info,
    /// Recoverable: misconfiguration, protocol slip, detected mutation.
    Warning,
    /// Process-terminating.
    Fatal,
}

impl VerifyError {
    /// Severity of this error. Every variant is fatal.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    /// Short machine-readable class name.
    pub fn class(&self) -> &'static str {
        match self {
            Self::CountMismatch { .. } => "fatal_configuration",
            Self::LedgerAllocation { .. } => "fatal_resource",
        }
    }
}

/// An array view whose shape disagrees with its buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("size arithmetic overflow")]
    Overflow,

    #[error("element count mismatch: shape {shape:?} holds {expected} elements, buffer has {actual}")]
    ElementCount {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}
