//! Field-structured verifier.
//!
//! Uses the kernel session for scalars, ledger and cursor, and adds only
//! field-shaped arguments. A vector of fields is checked as one variable per
//! member, `name(1)`, `name(2)`, ..., each taking exactly one ledger slot.

use crate::field::{Field, IntegerField};
use roverify_kernel::{
    ArrayView, DiagnosticSink, Phase, RegionLabel, RegionSession, RegionSummary, SessionOptions,
    StderrSink, VerifyError, VerifyRegion, VerifyValue,
};

mod sealed {
    pub trait Sealed {}
}

/// Argument shapes accepted by [`FieldVerifier`].
pub trait FieldArg<'a>: sealed::Sealed {
    fn into_value(self) -> VerifyValue<'a>;
}

macro_rules! scalar_arg {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl<'a> FieldArg<'a> for $t {
                fn into_value(self) -> VerifyValue<'a> {
                    VerifyValue::from(self)
                }
            }
        )*
    };
}

scalar_arg!(i32, f32, f64);

fn field_view(field: &Field) -> ArrayView<'_> {
    ArrayView::flat(field.proxy().data())
}

fn integer_field_view(field: &IntegerField) -> ArrayView<'_> {
    ArrayView::flat(field.proxy().data())
}

impl sealed::Sealed for &Field {}

impl<'a> FieldArg<'a> for &'a Field {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::Array(field_view(self))
    }
}

impl sealed::Sealed for &IntegerField {}

impl<'a> FieldArg<'a> for &'a IntegerField {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::Array(integer_field_view(self))
    }
}

impl<const N: usize> sealed::Sealed for &[Field; N] {}

impl<'a, const N: usize> FieldArg<'a> for &'a [Field; N] {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::ArrayVector(self.iter().map(field_view).collect())
    }
}

impl sealed::Sealed for &[Field] {}

impl<'a> FieldArg<'a> for &'a [Field] {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::ArrayVector(self.iter().map(field_view).collect())
    }
}

impl<const N: usize> sealed::Sealed for &[IntegerField; N] {}

impl<'a, const N: usize> FieldArg<'a> for &'a [IntegerField; N] {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::ArrayVector(self.iter().map(integer_field_view).collect())
    }
}

/// Read-only verifier over scalars and fields.
#[derive(Debug)]
pub struct FieldVerifier<S: DiagnosticSink = StderrSink> {
    session: RegionSession<S>,
}

impl FieldVerifier<StderrSink> {
    pub fn start(
        module_name: impl Into<String>,
        region_name: impl Into<String>,
        pre_count: usize,
        post_count: usize,
    ) -> Result<Self, VerifyError> {
        RegionSession::start(module_name, region_name, pre_count, post_count)
            .map(|session| Self { session })
    }
}

impl<S: DiagnosticSink> FieldVerifier<S> {
    pub fn start_with(
        module_name: impl Into<String>,
        region_name: impl Into<String>,
        pre_count: usize,
        post_count: usize,
        options: SessionOptions,
        sink: S,
    ) -> Result<Self, VerifyError> {
        RegionSession::start_with(module_name, region_name, pre_count, post_count, options, sink)
            .map(|session| Self { session })
    }

    /// Start, terminating the process on a fatal condition.
    pub fn start_or_exit(
        module_name: impl Into<String>,
        region_name: impl Into<String>,
        pre_count: usize,
        post_count: usize,
        options: SessionOptions,
        sink: S,
    ) -> Self {
        Self {
            session: RegionSession::start_or_exit(
                module_name,
                region_name,
                pre_count,
                post_count,
                options,
                sink,
            ),
        }
    }

    pub fn reset(&mut self, pre_count: usize, post_count: usize) -> Result<(), VerifyError> {
        self.session.reset(pre_count, post_count)
    }

    /// Count a variable. The ledger cursor is left alone.
    pub fn declare<'a>(&mut self, name: &str, value: impl FieldArg<'a>) {
        self.session.declare(name, value.into_value());
    }

    pub fn end_declare(&mut self) {
        self.session.end_declare();
    }

    pub fn provide<'a>(&mut self, name: &str, value: impl FieldArg<'a>) {
        self.session.provide(name, value.into_value());
    }

    pub fn pre_end(&mut self) {
        self.session.pre_end();
    }

    pub fn post_start(&mut self) {
        self.session.post_start();
    }

    pub fn post_end(&mut self) -> RegionSummary {
        self.session.post_end()
    }

    pub fn session(&self) -> &RegionSession<S> {
        &self.session
    }

    pub fn into_session(self) -> RegionSession<S> {
        self.session
    }
}

impl<S: DiagnosticSink> VerifyRegion for FieldVerifier<S> {
    fn label(&self) -> &RegionLabel {
        self.session.label()
    }

    fn phase(&self) -> Phase {
        self.session.phase()
    }

    fn end_declare(&mut self) {
        self.session.end_declare();
    }

    fn pre_end(&mut self) {
        self.session.pre_end();
    }

    fn post_start(&mut self) {
        self.session.post_start();
    }

    fn post_end(&mut self) -> RegionSummary {
        self.session.post_end()
    }
}
