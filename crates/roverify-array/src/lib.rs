//! # roverify-array
//!
//! Generic read-only verification backend.
//!
//! Accepts exactly the argument shapes generated wrappers pass for plain
//! arrays:
//! - `i32`, `f32` and `f64` scalars
//! - [`Grid2D`]: a dense column-major 2D `f64` array
//! - slices or vectors of [`Grid2D`], checked as `name(1)`, `name(2)`, ...
//!
//! Anything else is rejected at compile time by [`GenericArg`].

use roverify_kernel::{
    ArrayView, Checksum, DiagnosticSink, Phase, RegionLabel, RegionSession, RegionSummary,
    SessionOptions, ShapeError, StderrSink, VerifyError, VerifyRegion, VerifyValue,
};

/// Dense 2D `f64` array, column-major, `nx` rows by `ny` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D<'a> {
    data: &'a [f64],
    view: ArrayView<'a>,
}

impl<'a> Grid2D<'a> {
    pub fn new(data: &'a [f64], nx: usize, ny: usize) -> Result<Self, ShapeError> {
        let view = ArrayView::new(data, &[nx, ny])?;
        Ok(Self { data, view })
    }

    pub fn nx(&self) -> usize {
        self.view.shape()[0]
    }

    pub fn ny(&self) -> usize {
        self.view.shape()[1]
    }

    pub fn data(&self) -> &'a [f64] {
        self.data
    }

    /// Element at 0-based row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.nx() || j >= self.ny() {
            return None;
        }
        self.data.get(j * self.nx() + i).copied()
    }

    pub fn view(&self) -> &ArrayView<'a> {
        &self.view
    }
}

impl Checksum for Grid2D<'_> {
    fn checksum(&self) -> u64 {
        self.data.checksum()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Argument shapes accepted by [`ArrayVerifier`].
pub trait GenericArg<'a>: sealed::Sealed {
    fn into_value(self) -> VerifyValue<'a>;
}

macro_rules! scalar_arg {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl<'a> GenericArg<'a> for $t {
                fn into_value(self) -> VerifyValue<'a> {
                    VerifyValue::from(self)
                }
            }
        )*
    };
}

scalar_arg!(i32, f32, f64);

impl sealed::Sealed for Grid2D<'_> {}

impl<'a> GenericArg<'a> for Grid2D<'a> {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::Array(self.view)
    }
}

impl sealed::Sealed for &Grid2D<'_> {}

impl<'a> GenericArg<'a> for &Grid2D<'a> {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::Array(self.view.clone())
    }
}

impl sealed::Sealed for &[Grid2D<'_>] {}

impl<'a> GenericArg<'a> for &[Grid2D<'a>] {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::ArrayVector(self.iter().map(|grid| grid.view.clone()).collect())
    }
}

impl sealed::Sealed for Vec<Grid2D<'_>> {}

impl<'a> GenericArg<'a> for Vec<Grid2D<'a>> {
    fn into_value(self) -> VerifyValue<'a> {
        VerifyValue::ArrayVector(self.iter().map(|grid| grid.view.clone()).collect())
    }
}

/// Read-only verifier over scalars and [`Grid2D`] arrays.
#[derive(Debug)]
pub struct ArrayVerifier<S: DiagnosticSink = StderrSink> {
    session: RegionSession<S>,
}

impl ArrayVerifier<StderrSink> {
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

impl<S: DiagnosticSink> ArrayVerifier<S> {
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

    pub fn declare<'a>(&mut self, name: &str, value: impl GenericArg<'a>) {
        self.session.declare(name, value.into_value());
    }

    pub fn end_declare(&mut self) {
        self.session.end_declare();
    }

    pub fn provide<'a>(&mut self, name: &str, value: impl GenericArg<'a>) {
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

impl<S: DiagnosticSink> VerifyRegion for ArrayVerifier<S> {
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
