//! Per-activation summaries and the caller-owned end-of-run log.

use crate::report::{Diagnostic, DiagnosticSink, RegionLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one region activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub label: RegionLabel,
    /// Variables compared in the "after" pass.
    pub checked: usize,
    /// Variables whose checksum changed, in provide order.
    pub modified: Vec<String>,
}

impl RegionSummary {
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty()
    }
}

/// Aggregate over every activation of one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTotals {
    pub activations: usize,
    pub modified_activations: usize,
    pub checked: usize,
    /// Distinct modified variable names, sorted.
    pub variables: Vec<String>,
}

/// Totals returned by [`RegionLog::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub regions: BTreeMap<String, RegionTotals>,
    pub activations: usize,
    pub modified_activations: usize,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.modified_activations == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Collection of region summaries owned by the caller.
///
/// The caller pushes each activation's summary and hands the log to
/// [`RegionLog::shutdown`] once at the end of the run.
#[derive(Debug, Clone, Default)]
pub struct RegionLog {
    regions: BTreeMap<RegionLabel, RegionTotals>,
}

impl RegionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: RegionSummary) {
        let totals = self.regions.entry(summary.label).or_default();
        totals.activations += 1;
        totals.checked += summary.checked;
        if !summary.modified.is_empty() {
            totals.modified_activations += 1;
            totals.variables.extend(summary.modified);
            totals.variables.sort();
            totals.variables.dedup();
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn totals(&self, label: &RegionLabel) -> Option<&RegionTotals> {
        self.regions.get(label)
    }

    /// Emit one summary line per region with modified activations and
    /// return the run totals.
    pub fn shutdown<S: DiagnosticSink>(self, sink: &mut S) -> RunReport {
        let mut report = RunReport::default();
        for (label, totals) in self.regions {
            report.activations += totals.activations;
            report.modified_activations += totals.modified_activations;
            if totals.modified_activations > 0 {
                sink.emit(Diagnostic::RegionModifiedSummary {
                    label: label.clone(),
                    activations: totals.activations,
                    modified_activations: totals.modified_activations,
                    variables: totals.variables.clone(),
                });
            }
            report.regions.insert(label.to_string(), totals);
        }
        report
    }
}
