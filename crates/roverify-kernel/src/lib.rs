//! # Roverify Kernel
//!
//! Run-time verification that an instrumented numerical region leaves the
//! variables it promises only to read untouched.
//!
//! Generated wrapper code drives one [`RegionSession`] per activation:
//! every read-only variable is checksummed before the region runs and again
//! after it, and any disagreement is reported without interrupting the
//! computation.
//!
//! ## Architecture
//!
//! ```text
//! Checksum          ← bit-pattern fingerprint of scalars and dense buffers
//!     │
//! VerifyValue       ← Scalar | Array | ArrayVector, one dispatch point
//!     │
//! Ledger            ← 1-based checksum slots, positional correlation
//!     │
//! RegionSession     ← start → declare → provide → run → provide → close
//!     │
//! DiagnosticSink    ← stderr text, JSON lines, or in-memory records
//! ```
//!
//! Backends (`roverify-array`, `roverify-field`) compose a session and
//! restrict which argument shapes it accepts.

pub mod checksum;
pub mod config;
pub mod error;
pub mod ledger;
pub mod report;
pub mod session;
pub mod summary;
pub mod value;

pub use checksum::{Checksum, checksum_array, checksum_scalar};
pub use config::{VERBOSITY_ENV, Verbosity};
pub use error::{Severity, ShapeError, VerifyError};
pub use ledger::Ledger;
pub use report::{
    Diagnostic, DiagnosticSink, MemorySink, Observed, RegionLabel, StderrSink, WriterSink,
};
pub use session::{Phase, RegionSession, SessionOptions, VerifyRegion};
pub use summary::{RegionLog, RegionSummary, RegionTotals, RunReport};
pub use value::{
    ArrayData, ArrayView, ElementType, MemoryOrder, ScalarValue, ValueKind, VerifyValue,
    element_count, member_name,
};
