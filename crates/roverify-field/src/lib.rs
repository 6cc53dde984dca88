//! # roverify-field
//!
//! Read-only verification for models whose arrays are fields: storage owned
//! by the model, reached only through a proxy accessor.
//!
//! The protocol and checksums are the kernel's. This crate contributes the
//! field abstraction and a verifier that accepts:
//! - `i32`, `f32` and `f64` scalars
//! - `&Field` and `&IntegerField`
//! - field vectors (`&[Field; N]`, `&[Field]`, `&[IntegerField; N]`),
//!   checked member by member as `name(1)`, `name(2)`, ...

pub mod field;
pub mod verifier;

pub use field::{Field, FieldError, FieldProxy, FunctionSpace, IntegerField, IntegerFieldProxy};
pub use verifier::{FieldArg, FieldVerifier};
