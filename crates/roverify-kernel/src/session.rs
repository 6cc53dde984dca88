//! Region session: the two-pass verification state machine.
//!
//! ```text
//! Uninitialized
//!     │ start / reset
//! AwaitingPreDeclare ──declare*──┐
//!     │ end_declare     ◄────────┘
//! AwaitingPreProvide ──provide*── record(cursor, checksum)
//!     │ pre_end
//! Executing                       (the instrumented region runs)
//!     │ post_start
//! AwaitingPostProvide ─provide*── compare(cursor, checksum)
//!     │ post_end
//! Closed ──reset──► AwaitingPreDeclare
//! ```
//!
//! Both passes must issue the same `provide` calls in the same order; the
//! cursor is the only link between a "before" and an "after" checksum.
//!
//! Nothing after a successful start can fail. Mismatches, slot overflow and
//! out-of-phase calls are reported through the session's sink and the call
//! returns normally.

use crate::checksum::Checksum;
use crate::config::Verbosity;
use crate::error::VerifyError;
use crate::ledger::Ledger;
use crate::report::{Diagnostic, DiagnosticSink, Observed, RegionLabel, StderrSink};
use crate::summary::RegionSummary;
use crate::value::{ScalarValue, ValueKind, VerifyValue, member_name};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, warn};

/// Lifecycle phase of a region activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    AwaitingPreDeclare,
    AwaitingPreProvide,
    Executing,
    AwaitingPostProvide,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::AwaitingPreDeclare => "awaiting declarations",
            Self::AwaitingPreProvide => "awaiting pre-execution values",
            Self::Executing => "executing",
            Self::AwaitingPostProvide => "awaiting post-execution values",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Per-session overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Use this verbosity instead of reading the environment.
    pub verbosity: Option<Verbosity>,
}

impl SessionOptions {
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self {
            verbosity: Some(verbosity),
        }
    }
}

/// Lifecycle half of the call contract shared by every backend.
///
/// `declare` and `provide` are generic over each backend's accepted
/// argument shapes and therefore live on the concrete types.
pub trait VerifyRegion {
    fn label(&self) -> &RegionLabel;
    fn phase(&self) -> Phase;
    fn end_declare(&mut self);
    fn pre_end(&mut self);
    fn post_start(&mut self);
    fn post_end(&mut self) -> RegionSummary;
}

/// One activation of an instrumented region.
#[derive(Debug)]
pub struct RegionSession<S: DiagnosticSink = StderrSink> {
    label: RegionLabel,
    ledger: Ledger,
    phase: Phase,
    verify_checksums: bool,
    next_index: usize,
    verbosity: Verbosity,
    declared: usize,
    checked: usize,
    modified: Vec<String>,
    sink: S,
}

impl RegionSession<StderrSink> {
    /// Start an activation reporting to stderr, verbosity from the environment.
    pub fn start(
        module_name: impl Into<String>,
        region_name: impl Into<String>,
        pre_count: usize,
        post_count: usize,
    ) -> Result<Self, VerifyError> {
        Self::start_with(
            module_name,
            region_name,
            pre_count,
            post_count,
            SessionOptions::default(),
            StderrSink,
        )
    }
}

impl<S: DiagnosticSink> RegionSession<S> {
    /// Start an activation with explicit options and sink.
    ///
    /// Fatal conditions are reported to `sink` before the error is returned.
    pub fn start_with(
        module_name: impl Into<String>,
        region_name: impl Into<String>,
        pre_count: usize,
        post_count: usize,
        options: SessionOptions,
        mut sink: S,
    ) -> Result<Self, VerifyError> {
        let label = RegionLabel::new(module_name, region_name);
        check_counts(&label, pre_count, post_count)
            .inspect_err(|err| report_fatal(&mut sink, err))?;

        let verbosity = match options.verbosity {
            Some(v) => v,
            None => resolve_env_verbosity(&mut sink),
        };

        let ledger = allocate_ledger(&label, pre_count, post_count)
            .inspect_err(|err| report_fatal(&mut sink, err))?;

        debug!(
            module = %label.module,
            region = %label.region,
            slots = ledger.len(),
            verbosity = verbosity.level(),
            "read-only region started"
        );

        Ok(Self {
            label,
            ledger,
            phase: Phase::AwaitingPreDeclare,
            verify_checksums: false,
            next_index: 1,
            verbosity,
            declared: 0,
            checked: 0,
            modified: Vec::new(),
            sink,
        })
    }

    /// Start an activation, terminating the process on a fatal condition.
    ///
    /// Intended for generated wrapper code, which has no error path.
    pub fn start_or_exit(
        module_name: impl Into<String>,
        region_name: impl Into<String>,
        pre_count: usize,
        post_count: usize,
        options: SessionOptions,
        sink: S,
    ) -> Self {
        match Self::start_with(module_name, region_name, pre_count, post_count, options, sink) {
            Ok(session) => session,
            Err(_) => std::process::exit(1),
        }
    }

    /// Prepare a used session for the next activation of the same region.
    ///
    /// Labels, sink and verbosity are kept. On failure the session is left
    /// uninitialized and every further call is ignored.
    pub fn reset(&mut self, pre_count: usize, post_count: usize) -> Result<(), VerifyError> {
        let prepared = check_counts(&self.label, pre_count, post_count)
            .and_then(|()| allocate_ledger(&self.label, pre_count, post_count));
        match prepared {
            Ok(ledger) => {
                self.ledger = ledger;
                self.phase = Phase::AwaitingPreDeclare;
                self.verify_checksums = false;
                self.next_index = 1;
                self.declared = 0;
                self.checked = 0;
                self.modified.clear();
                Ok(())
            }
            Err(err) => {
                self.ledger = Ledger::default();
                self.phase = Phase::Uninitialized;
                report_fatal(&mut self.sink, &err);
                Err(err)
            }
        }
    }

    pub fn label(&self) -> &RegionLabel {
        &self.label
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// 1-based cursor of the next `provide` call.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Whether `provide` compares rather than records.
    pub fn is_verifying(&self) -> bool {
        self.verify_checksums
    }

    /// Number of variables announced by `declare`, vector members included.
    pub fn declared(&self) -> usize {
        self.declared
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Announce a variable. Only counts; the ledger is already sized.
    pub fn declare<'a>(&mut self, name: &str, value: impl Into<VerifyValue<'a>>) {
        if !self.expect_phase("declare", &[Phase::AwaitingPreDeclare]) {
            return;
        }
        let members = match value.into() {
            VerifyValue::Scalar(_) | VerifyValue::Array(_) => 1,
            VerifyValue::ArrayVector(members) => members.len(),
        };
        self.declare_slots(name, members);
    }

    /// Announce `count` variables under `name` without inspecting values.
    ///
    /// Backends whose arguments are not `VerifyValue`s use this directly.
    pub fn declare_slots(&mut self, name: &str, count: usize) {
        if !self.expect_phase("declare", &[Phase::AwaitingPreDeclare]) {
            return;
        }
        self.declared += count;
        debug!(
            module = %self.label.module,
            region = %self.label.region,
            variable = name,
            count,
            "declared read-only variable"
        );
    }

    pub fn end_declare(&mut self) {
        if !self.expect_phase("end_declare", &[Phase::AwaitingPreDeclare]) {
            return;
        }
        self.next_index = 1;
        self.phase = Phase::AwaitingPreProvide;
    }

    /// Record (first pass) or verify (second pass) one value.
    pub fn provide<'a>(&mut self, name: &str, value: impl Into<VerifyValue<'a>>) {
        if !self.expect_phase(
            "provide",
            &[Phase::AwaitingPreProvide, Phase::AwaitingPostProvide],
        ) {
            return;
        }
        match value.into() {
            VerifyValue::Scalar(scalar) => self.provide_scalar(name, scalar),
            VerifyValue::Array(array) => self.provide_checksum(name, array.kind(), &array),
            VerifyValue::ArrayVector(members) => {
                for (i, member) in members.iter().enumerate() {
                    self.provide_checksum(&member_name(name, i), member.kind(), member);
                }
            }
        }
    }

    pub fn provide_scalar(&mut self, name: &str, value: ScalarValue) {
        let kind = ValueKind::Scalar {
            element: value.element(),
        };
        self.provide_checksum(name, kind, &value);
    }

    /// Record or verify the checksum of any [`Checksum`] value.
    ///
    /// This is the single place the cursor advances.
    pub fn provide_checksum<T: Checksum + ?Sized>(
        &mut self,
        name: &str,
        kind: ValueKind,
        value: &T,
    ) {
        if !self.expect_phase(
            "provide",
            &[Phase::AwaitingPreProvide, Phase::AwaitingPostProvide],
        ) {
            return;
        }
        let index = self.next_index;
        self.next_index += 1;

        if !self.ledger.contains(index) {
            warn!(
                module = %self.label.module,
                region = %self.label.region,
                variable = name,
                index,
                capacity = self.ledger.len(),
                "read-only variable past end of ledger"
            );
            self.sink.emit(Diagnostic::LedgerOverflow {
                label: self.label.clone(),
                variable: name.to_string(),
                index,
                capacity: self.ledger.len(),
            });
            return;
        }

        let checksum = value.checksum();
        if !self.verify_checksums {
            self.ledger.record(index, checksum);
            debug!(
                module = %self.label.module,
                region = %self.label.region,
                variable = name,
                index,
                checksum,
                "recorded checksum"
            );
            return;
        }

        self.checked += 1;
        if self.ledger.compare(index, checksum) {
            if self.verbosity >= Verbosity::Variable {
                self.sink.emit(Diagnostic::VariableChecked {
                    label: self.label.clone(),
                    variable: name.to_string(),
                });
            }
            return;
        }

        let original = self.ledger.get(index).unwrap_or_default();
        warn!(
            module = %self.label.module,
            region = %self.label.region,
            variable = name,
            original,
            new = checksum,
            "read-only variable modified"
        );
        let (original, new) = if kind.is_scalar() {
            (
                Observed::scalar(ScalarValue::from_bits(kind.element(), original)),
                Observed::scalar(ScalarValue::from_bits(kind.element(), checksum)),
            )
        } else {
            (Observed::Checksum(original), Observed::Checksum(checksum))
        };
        self.modified.push(name.to_string());
        self.sink.emit(Diagnostic::Modified {
            label: self.label.clone(),
            variable: name.to_string(),
            kind,
            original,
            new,
        });
    }

    pub fn pre_end(&mut self) {
        if !self.expect_phase("pre_end", &[Phase::AwaitingPreProvide]) {
            return;
        }
        if self.next_index - 1 != self.declared {
            debug!(
                module = %self.label.module,
                region = %self.label.region,
                declared = self.declared,
                provided = self.next_index - 1,
                "provide count differs from declarations"
            );
        }
        self.phase = Phase::Executing;
    }

    pub fn post_start(&mut self) {
        if !self.expect_phase("post_start", &[Phase::Executing]) {
            return;
        }
        self.verify_checksums = true;
        self.next_index = 1;
        self.phase = Phase::AwaitingPostProvide;
    }

    /// Close the activation and summarize it.
    pub fn post_end(&mut self) -> RegionSummary {
        if self.expect_phase("post_end", &[Phase::AwaitingPostProvide]) {
            self.phase = Phase::Closed;
            if self.verbosity >= Verbosity::Region {
                self.sink.emit(Diagnostic::RegionVerified {
                    label: self.label.clone(),
                    checked: self.checked,
                    modified: self.modified.len(),
                });
            }
            debug!(
                module = %self.label.module,
                region = %self.label.region,
                checked = self.checked,
                modified = self.modified.len(),
                "read-only region closed"
            );
        }
        self.summary()
    }

    /// Counters of the current activation.
    pub fn summary(&self) -> RegionSummary {
        RegionSummary {
            label: self.label.clone(),
            checked: self.checked,
            modified: self.modified.clone(),
        }
    }

    fn expect_phase(&mut self, operation: &str, allowed: &[Phase]) -> bool {
        if allowed.contains(&self.phase) {
            return true;
        }
        warn!(
            module = %self.label.module,
            region = %self.label.region,
            operation,
            phase = %self.phase,
            "out-of-phase call ignored"
        );
        self.sink.emit(Diagnostic::ProtocolViolation {
            label: self.label.clone(),
            operation: operation.to_string(),
            phase: self.phase,
        });
        false
    }
}

impl<S: DiagnosticSink> VerifyRegion for RegionSession<S> {
    fn label(&self) -> &RegionLabel {
        &self.label
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn end_declare(&mut self) {
        RegionSession::end_declare(self);
    }

    fn pre_end(&mut self) {
        RegionSession::pre_end(self);
    }

    fn post_start(&mut self) {
        RegionSession::post_start(self);
    }

    fn post_end(&mut self) -> RegionSummary {
        RegionSession::post_end(self)
    }
}

fn check_counts(
    label: &RegionLabel,
    pre_count: usize,
    post_count: usize,
) -> Result<(), VerifyError> {
    if pre_count == post_count {
        return Ok(());
    }
    Err(VerifyError::CountMismatch {
        module: label.module.clone(),
        region: label.region.clone(),
        pre_count,
        post_count,
    })
}

fn allocate_ledger(
    label: &RegionLabel,
    pre_count: usize,
    post_count: usize,
) -> Result<Ledger, VerifyError> {
    let overflow = || VerifyError::LedgerAllocation {
        module: label.module.clone(),
        region: label.region.clone(),
        slots: pre_count.saturating_add(post_count),
    };
    let slots = pre_count.checked_add(post_count).ok_or_else(overflow)?;
    Ledger::allocate(slots).map_err(|_| overflow())
}

fn resolve_env_verbosity<S: DiagnosticSink>(sink: &mut S) -> Verbosity {
    let (verbosity, rejected) = Verbosity::from_env();
    if let Some(value) = rejected {
        warn!(value = %value, "unrecognized verbosity, using 0");
        sink.emit(Diagnostic::InvalidVerbosity { value });
    }
    verbosity
}

fn report_fatal<S: DiagnosticSink>(sink: &mut S, err: &VerifyError) {
    error!(class = err.class(), "{err}");
    sink.emit(Diagnostic::Fatal {
        class: err.class().to_string(),
        message: err.to_string(),
    });
}
