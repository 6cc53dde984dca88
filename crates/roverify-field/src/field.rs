//! Fields: dense arrays owned by a model and reached through proxies.
//!
//! A field's storage is private. Code that needs the raw values asks for a
//! proxy and reads through it, which is the only route the verifier uses.

use serde::{Deserialize, Serialize};

/// Errors raised while building a field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("field {field}: {len} values do not fill function space {space} ({undf} dofs)")]
    SpaceSize {
        field: String,
        space: String,
        len: usize,
        undf: usize,
    },
}

/// Discrete function space a field's degrees of freedom live on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpace {
    pub name: String,
    /// Degrees of freedom per cell.
    pub ndf: usize,
    /// Unique degrees of freedom on this partition.
    pub undf: usize,
}

impl FunctionSpace {
    pub fn new(name: impl Into<String>, ndf: usize, undf: usize) -> Self {
        Self {
            name: name.into(),
            ndf,
            undf,
        }
    }

    fn check<T>(&self, field: &str, data: &[T]) -> Result<(), FieldError> {
        if data.len() == self.undf {
            return Ok(());
        }
        Err(FieldError::SpaceSize {
            field: field.to_string(),
            space: self.name.clone(),
            len: data.len(),
            undf: self.undf,
        })
    }
}

/// Real-valued field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    space: FunctionSpace,
    data: Vec<f64>,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        space: FunctionSpace,
        data: Vec<f64>,
    ) -> Result<Self, FieldError> {
        let name = name.into();
        space.check(&name, &data)?;
        Ok(Self { name, space, data })
    }

    /// Field of `value` repeated over every dof of `space`.
    pub fn filled(name: impl Into<String>, space: FunctionSpace, value: f64) -> Self {
        let data = vec![value; space.undf];
        Self {
            name: name.into(),
            space,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn proxy(&self) -> FieldProxy<'_> {
        FieldProxy { field: self }
    }

    /// Write access for the model code that owns the field.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Read accessor for a [`Field`].
#[derive(Debug, Clone, Copy)]
pub struct FieldProxy<'a> {
    field: &'a Field,
}

impl<'a> FieldProxy<'a> {
    pub fn data(&self) -> &'a [f64] {
        &self.field.data
    }

    pub fn vspace(&self) -> &'a FunctionSpace {
        &self.field.space
    }

    pub fn name(&self) -> &'a str {
        &self.field.name
    }
}

/// Integer-valued field.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerField {
    name: String,
    space: FunctionSpace,
    data: Vec<i32>,
}

impl IntegerField {
    pub fn new(
        name: impl Into<String>,
        space: FunctionSpace,
        data: Vec<i32>,
    ) -> Result<Self, FieldError> {
        let name = name.into();
        space.check(&name, &data)?;
        Ok(Self { name, space, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn proxy(&self) -> IntegerFieldProxy<'_> {
        IntegerFieldProxy { field: self }
    }

    pub fn data_mut(&mut self) -> &mut [i32] {
        &mut self.data
    }
}

/// Read accessor for an [`IntegerField`].
#[derive(Debug, Clone, Copy)]
pub struct IntegerFieldProxy<'a> {
    field: &'a IntegerField,
}

impl<'a> IntegerFieldProxy<'a> {
    pub fn data(&self) -> &'a [i32] {
        &self.field.data
    }

    pub fn vspace(&self) -> &'a FunctionSpace {
        &self.field.space
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_must_fill_function_space() {
        let w3 = FunctionSpace::new("w3", 1, 4);
        assert!(Field::new("rho", w3.clone(), vec![0.0; 4]).is_ok());
        let err = Field::new("rho", w3, vec![0.0; 3]).expect_err("3 != 4");
        assert_eq!(
            err.to_string(),
            "field rho: 3 values do not fill function space w3 (4 dofs)"
        );
    }

    #[test]
    fn proxy_reads_current_values() {
        let mut f = Field::filled("theta", FunctionSpace::new("wtheta", 2, 3), 1.0);
        f.data_mut()[1] = 7.0;
        let proxy = f.proxy();
        assert_eq!(proxy.data(), &[1.0, 7.0, 1.0]);
        assert_eq!(proxy.vspace().ndf, 2);
        assert_eq!(proxy.name(), "theta");
    }

    #[test]
    fn integer_fields_check_size_too() {
        let w0 = FunctionSpace::new("w0", 1, 2);
        assert!(IntegerField::new("mask", w0.clone(), vec![1, 0]).is_ok());
        assert!(IntegerField::new("mask", w0, vec![1]).is_err());
    }
}
