//! Diagnostic reporter.
//!
//! Every condition the subsystem reports is a [`Diagnostic`]. Sinks decide
//! where it goes; the default writes the text rendering to stderr. A sink is
//! terminal: it never fails and never aborts, so a write error on the
//! diagnostic stream is dropped rather than propagated into the simulation.

use crate::checksum::Checksum;
use crate::error::Severity;
use crate::session::Phase;
use crate::value::{ScalarValue, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

const BANNER: &str = "------------- read-only verification -------------";
const PREFIX: &str = "read-only verification";

/// `module::region` pair identifying an instrumented region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionLabel {
    pub module: String,
    pub region: String,
}

impl RegionLabel {
    pub fn new(module: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.region)
    }
}

/// What a mismatch report shows for each side of the comparison.
///
/// Scalars are reported by value, arrays by checksum. A scalar also carries
/// its zero-extended bit pattern: JSON has no encoding for NaN or infinity,
/// and NaNs with different payloads print alike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observed {
    Value { value: ScalarValue, bits: u64 },
    Checksum(u64),
}

impl Observed {
    pub fn scalar(value: ScalarValue) -> Self {
        Self::Value {
            value,
            bits: value.checksum(),
        }
    }
}

/// One reportable condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A read-only variable changed between the two passes.
    Modified {
        label: RegionLabel,
        variable: String,
        kind: ValueKind,
        original: Observed,
        new: Observed,
    },

    /// Verbosity 2: a variable compared equal.
    VariableChecked { label: RegionLabel, variable: String },

    /// Verbosity 1: one region activation finished its "after" pass.
    RegionVerified {
        label: RegionLabel,
        checked: usize,
        modified: usize,
    },

    /// The verbosity switch held an unrecognized value.
    InvalidVerbosity { value: String },

    /// A provide call addressed a slot past the end of the ledger.
    LedgerOverflow {
        label: RegionLabel,
        variable: String,
        index: usize,
        capacity: usize,
    },

    /// A lifecycle call arrived in the wrong phase and was ignored.
    ProtocolViolation {
        label: RegionLabel,
        operation: String,
        phase: Phase,
    },

    /// End-of-run summary for a region with modified activations.
    RegionModifiedSummary {
        label: RegionLabel,
        activations: usize,
        modified_activations: usize,
        variables: Vec<String>,
    },

    /// A fatal condition, emitted when an activation cannot start.
    Fatal { class: String, message: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::VariableChecked { .. } => Severity::Info,
            Self::RegionVerified { modified, .. } if *modified == 0 => Severity::Info,
            Self::Fatal { .. } => Severity::Fatal,
            _ => Severity::Warning,
        }
    }

    /// Multi-line text form written to the diagnostic stream.
    pub fn render(&self) -> String {
        match self {
            Self::Modified {
                label,
                variable,
                kind,
                original,
                new,
            } => {
                let (original_line, new_line) = match (original, new) {
                    (
                        Observed::Value { value: o, bits: ob },
                        Observed::Value { value: n, bits: nb },
                    ) => {
                        let (o, n) = (o.to_string(), n.to_string());
                        if o == n {
                            (
                                format!("Original value: {o} (bits {ob:#018x})"),
                                format!("New value:      {n} (bits {nb:#018x})"),
                            )
                        } else {
                            (format!("Original value: {o}"), format!("New value:      {n}"))
                        }
                    }
                    _ => (
                        format!("Original checksum: {}", observed_checksum(original)),
                        format!("New checksum:      {}", observed_checksum(new)),
                    ),
                };
                format!(
                    "{BANNER}\n{kind} variable {variable} has been modified in {label}\n{original_line}\n{new_line}\n{BANNER}"
                )
            }
            Self::VariableChecked { label, variable } => {
                format!("{PREFIX}: checked variable {variable} in {label}")
            }
            Self::RegionVerified {
                label,
                checked,
                modified,
            } => {
                if *modified == 0 {
                    format!(
                        "{PREFIX}: region {label} was not modified ({checked} variables checked)"
                    )
                } else {
                    format!(
                        "{PREFIX}: region {label} had {modified} of {checked} variables modified"
                    )
                }
            }
            Self::InvalidVerbosity { value } => format!(
                "{PREFIX}: warning: invalid value '{value}' for {}, using 0",
                crate::config::VERBOSITY_ENV
            ),
            Self::LedgerOverflow {
                label,
                variable,
                index,
                capacity,
            } => format!(
                "{PREFIX}: warning: variable {variable} in {label} maps to ledger slot {index} of {capacity}, not checked"
            ),
            Self::ProtocolViolation {
                label,
                operation,
                phase,
            } => format!("{PREFIX}: warning: {operation} called while {phase} in {label}, ignored"),
            Self::RegionModifiedSummary {
                label,
                activations,
                modified_activations,
                variables,
            } => format!(
                "{PREFIX}: region {label} modified read-only data in {modified_activations} of {activations} activations: {}",
                variables.join(", ")
            ),
            Self::Fatal { class, message } => format!("{PREFIX}: {class}: {message}"),
        }
    }

    /// Single-line JSON form.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!("{{\"diagnostic\":\"unserializable\",\"error\":{:?}}}", err.to_string())
        })
    }
}

fn observed_checksum(observed: &Observed) -> u64 {
    match observed {
        Observed::Value { bits, .. } => *bits,
        Observed::Checksum(c) => *c,
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Destination for diagnostics.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Writes rendered diagnostics to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", diagnostic.render());
    }
}

/// Writes rendered diagnostics to any writer.
#[derive(Debug, Default)]
pub struct WriterSink<W: Write> {
    writer: W,
    json: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn text(writer: W) -> Self {
        Self {
            writer,
            json: false,
        }
    }

    /// One JSON object per line instead of the text rendering.
    pub fn json_lines(writer: W) -> Self {
        Self { writer, json: true }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let line = if self.json {
            diagnostic.to_json()
        } else {
            diagnostic.render()
        };
        let _ = writeln!(self.writer, "{line}");
        let _ = self.writer.flush();
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<Diagnostic>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Names of variables reported as modified, in report order.
    pub fn modified_variables(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|d| match d {
                Diagnostic::Modified { variable, .. } => Some(variable.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of variables confirmed unmodified, in report order.
    pub fn checked_variables(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|d| match d {
                Diagnostic::VariableChecked { variable, .. } => Some(variable.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ElementType;

    fn label() -> RegionLabel {
        RegionLabel::new("mod", "loop")
    }

    #[test]
    fn scalar_modification_renders_values() {
        let d = Diagnostic::Modified {
            label: label(),
            variable: "b".into(),
            kind: ValueKind::Scalar {
                element: ElementType::F64,
            },
            original: Observed::scalar(ScalarValue::F64(2.0)),
            new: Observed::scalar(ScalarValue::F64(99.0)),
        };
        insta::assert_snapshot!(d.render(), @r"
        ------------- read-only verification -------------
        f64 variable b has been modified in mod::loop
        Original value: 2.0
        New value:      99.0
        ------------- read-only verification -------------
        ");
    }

    #[test]
    fn array_modification_renders_checksums() {
        let d = Diagnostic::Modified {
            label: label(),
            variable: "grid".into(),
            kind: ValueKind::Array {
                element: ElementType::I32,
                rank: 2,
            },
            original: Observed::Checksum(10),
            new: Observed::Checksum(11),
        };
        insta::assert_snapshot!(d.render(), @r"
        ------------- read-only verification -------------
        i32 array (rank 2) variable grid has been modified in mod::loop
        Original checksum: 10
        New checksum:      11
        ------------- read-only verification -------------
        ");
    }

    fn modified_f64(original: f64, new: f64) -> Diagnostic {
        Diagnostic::Modified {
            label: label(),
            variable: "a".into(),
            kind: ValueKind::Scalar {
                element: ElementType::F64,
            },
            original: Observed::scalar(ScalarValue::F64(original)),
            new: Observed::scalar(ScalarValue::F64(new)),
        }
    }

    #[test]
    fn non_finite_values_keep_their_bits_in_json() {
        let mut sink = WriterSink::json_lines(Vec::new());
        sink.emit(modified_f64(f64::NAN, f64::INFINITY));
        let out = String::from_utf8(sink.into_inner()).expect("utf8 output");
        assert_eq!(out.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&out).expect("diagnostic json parses");
        assert_eq!(value["diagnostic"], "modified");
        assert_eq!(value["variable"], "a");
        assert_eq!(
            value["original"]["value"]["bits"].as_u64(),
            Some(f64::NAN.to_bits())
        );
        assert_eq!(
            value["new"]["value"]["bits"].as_u64(),
            Some(f64::INFINITY.to_bits())
        );
    }

    #[test]
    fn nan_to_infinity_renders_values() {
        insta::assert_snapshot!(modified_f64(f64::NAN, f64::INFINITY).render(), @r"
        ------------- read-only verification -------------
        f64 variable a has been modified in mod::loop
        Original value: NaN
        New value:      inf
        ------------- read-only verification -------------
        ");
    }

    #[test]
    fn nan_payload_change_renders_bits() {
        let quiet = f64::from_bits(0x7ff8_0000_0000_0000);
        let tagged = f64::from_bits(0x7ff8_0000_0000_0001);
        let d = modified_f64(tagged, quiet);
        insta::assert_snapshot!(d.render(), @r"
        ------------- read-only verification -------------
        f64 variable a has been modified in mod::loop
        Original value: NaN (bits 0x7ff8000000000001)
        New value:      NaN (bits 0x7ff8000000000000)
        ------------- read-only verification -------------
        ");
    }

    #[test]
    fn confirmations_are_single_lines() {
        let checked = Diagnostic::VariableChecked {
            label: label(),
            variable: "a".into(),
        };
        assert_eq!(
            checked.render(),
            "read-only verification: checked variable a in mod::loop"
        );
        assert_eq!(checked.severity(), Severity::Info);

        let region = Diagnostic::RegionVerified {
            label: label(),
            checked: 2,
            modified: 0,
        };
        assert_eq!(
            region.render(),
            "read-only verification: region mod::loop was not modified (2 variables checked)"
        );
    }

    #[test]
    fn json_lines_are_tagged() {
        let d = Diagnostic::InvalidVerbosity { value: "x".into() };
        let value: serde_json::Value =
            serde_json::from_str(&d.to_json()).expect("diagnostic json parses");
        assert_eq!(value["diagnostic"], "invalid_verbosity");
        assert_eq!(value["value"], "x");
    }

    #[test]
    fn writer_sink_appends_rendered_lines() {
        let mut sink = WriterSink::text(Vec::new());
        sink.emit(Diagnostic::InvalidVerbosity { value: "x".into() });
        let out = String::from_utf8(sink.into_inner()).expect("utf8 output");
        assert_eq!(
            out,
            "read-only verification: warning: invalid value 'x' for READ_ONLY_VERIFY_VERBOSE, using 0\n"
        );
    }

    #[test]
    fn failing_writer_is_swallowed() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::other("closed"))
            }
        }
        let mut sink = WriterSink::text(Broken);
        sink.emit(Diagnostic::InvalidVerbosity { value: "x".into() });
    }
}
