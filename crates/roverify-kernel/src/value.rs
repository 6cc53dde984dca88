//! Values a region can promise not to modify.
//!
//! ```text
//! VerifyValue
//!   ├── Scalar(ScalarValue)          i32 | i64 | f32 | f64
//!   ├── Array(ArrayView)             borrowed dense buffer + shape
//!   └── ArrayVector(Vec<ArrayView>)  checked as name(1), name(2), ...
//! ```
//!
//! Backends translate their own argument shapes into a `VerifyValue`; the
//! session dispatches on the variant exactly once.

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a scalar or array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    I32,
    I64,
    F32,
    F64,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}

/// Printable kind of a verified variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    Scalar { element: ElementType },
    Array { element: ElementType, rank: usize },
}

impl ValueKind {
    pub fn element(&self) -> ElementType {
        match self {
            Self::Scalar { element } | Self::Array { element, .. } => *element,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar { .. })
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { element } => write!(f, "{element}"),
            Self::Array { element, rank } => write!(f, "{element} array (rank {rank})"),
        }
    }
}

/// A scalar argument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScalarValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    pub fn element(&self) -> ElementType {
        match self {
            Self::I32(_) => ElementType::I32,
            Self::I64(_) => ElementType::I64,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }

    /// Rebuild a scalar from the checksum recorded for it.
    ///
    /// Scalar checksums are the zero-extended bit pattern, so the original
    /// value is recoverable by truncating back to the element width.
    pub fn from_bits(element: ElementType, bits: u64) -> Self {
        match element {
            ElementType::I32 => Self::I32(bits as u32 as i32),
            ElementType::I64 => Self::I64(bits as i64),
            ElementType::F32 => Self::F32(f32::from_bits(bits as u32)),
            ElementType::F64 => Self::F64(f64::from_bits(bits)),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            // Debug keeps the trailing `.0` so floats never print as integers.
            Self::F32(v) => write!(f, "{v:?}"),
            Self::F64(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f32> for ScalarValue {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

/// Storage order of a multi-dimensional buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryOrder {
    /// Row-major.
    C,
    /// Column-major.
    F,
}

/// Borrowed element buffer of one element type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrayData<'a> {
    I32(&'a [i32]),
    I64(&'a [i64]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl ArrayData<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::I32(d) => d.len(),
            Self::I64(d) => d.len(),
            Self::F32(d) => d.len(),
            Self::F64(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element(&self) -> ElementType {
        match self {
            Self::I32(_) => ElementType::I32,
            Self::I64(_) => ElementType::I64,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }
}

impl<'a> From<&'a [i32]> for ArrayData<'a> {
    fn from(d: &'a [i32]) -> Self {
        Self::I32(d)
    }
}

impl<'a> From<&'a [i64]> for ArrayData<'a> {
    fn from(d: &'a [i64]) -> Self {
        Self::I64(d)
    }
}

impl<'a> From<&'a [f32]> for ArrayData<'a> {
    fn from(d: &'a [f32]) -> Self {
        Self::F32(d)
    }
}

impl<'a> From<&'a [f64]> for ArrayData<'a> {
    fn from(d: &'a [f64]) -> Self {
        Self::F64(d)
    }
}

/// Number of elements described by `shape`.
pub fn element_count(shape: &[usize]) -> Result<usize, ShapeError> {
    shape.iter().try_fold(1usize, |acc, &dim| {
        acc.checked_mul(dim).ok_or(ShapeError::Overflow)
    })
}

/// A dense buffer together with its logical shape.
///
/// Checksums walk the buffer in storage order whatever `order` says, so two
/// views of one buffer that differ only in order have the same checksum.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayView<'a> {
    data: ArrayData<'a>,
    shape: Vec<usize>,
    order: MemoryOrder,
}

impl<'a> ArrayView<'a> {
    /// View `data` as an array of `shape` in column-major order.
    pub fn new(data: impl Into<ArrayData<'a>>, shape: &[usize]) -> Result<Self, ShapeError> {
        Self::with_order(data, shape, MemoryOrder::F)
    }

    pub fn with_order(
        data: impl Into<ArrayData<'a>>,
        shape: &[usize],
        order: MemoryOrder,
    ) -> Result<Self, ShapeError> {
        let data = data.into();
        let expected = element_count(shape)?;
        if expected != data.len() {
            return Err(ShapeError::ElementCount {
                shape: shape.to_vec(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            order,
        })
    }

    /// Rank-1 view over the whole buffer.
    pub fn flat(data: impl Into<ArrayData<'a>>) -> Self {
        let data = data.into();
        Self {
            shape: vec![data.len()],
            data,
            order: MemoryOrder::F,
        }
    }

    pub fn data(&self) -> ArrayData<'a> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// How the shape maps onto the buffer. Descriptive only; it never
    /// changes a checksum.
    pub fn order(&self) -> MemoryOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::Array {
            element: self.data.element(),
            rank: self.rank(),
        }
    }
}

/// The tagged argument accepted by the session engine.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyValue<'a> {
    Scalar(ScalarValue),
    Array(ArrayView<'a>),
    ArrayVector(Vec<ArrayView<'a>>),
}

macro_rules! scalar_into_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for VerifyValue<'_> {
                fn from(v: $t) -> Self {
                    Self::Scalar(v.into())
                }
            }
        )*
    };
}

scalar_into_value!(i32, i64, f32, f64);

impl From<ScalarValue> for VerifyValue<'_> {
    fn from(v: ScalarValue) -> Self {
        Self::Scalar(v)
    }
}

impl<'a> From<ArrayView<'a>> for VerifyValue<'a> {
    fn from(v: ArrayView<'a>) -> Self {
        Self::Array(v)
    }
}

impl<'a> From<Vec<ArrayView<'a>>> for VerifyValue<'a> {
    fn from(v: Vec<ArrayView<'a>>) -> Self {
        Self::ArrayVector(v)
    }
}

/// Name under which the `index`-th (0-based) member of a vector is checked.
pub fn member_name(name: &str, index: usize) -> String {
    format!("{name}({})", index + 1)
}
