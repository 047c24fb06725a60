//! Owned cell and face fields.
//!
//! A [`Field`] is a flat, `Vec`-backed container of per-location values.
//! The `Location` marker distinguishes cell-centred fields ([`VolField`]) from
//! face fields ([`SurfaceField`]) at the type level, so a face flux cannot be
//! combined with a cell volume fraction by accident.
//!
//! Arithmetic that combines two fields checks their lengths and returns a
//! [`FieldError`] on mismatch.
//! Results are always freshly allocated and returned by value.
//!
//! ```
//! use twine_multiphase::support::field::VolField;
//!
//! let alpha = VolField::new(vec![0.2, 0.5]);
//! let rho = VolField::new(vec![1000.0, 1.2]);
//! let weighted = rho.weighted_by(&alpha).unwrap();
//! assert_eq!(weighted.values(), &[200.0, 0.6]);
//! ```

mod interpolation;
mod vector;

use std::{
    marker::PhantomData,
    ops::{Add, Div, Mul, Sub},
};

use num_traits::Zero;
use thiserror::Error;

pub use interpolation::{FaceAddressing, FaceAddressingError, FaceInterpolation};
pub use vector::Vector;

/// Values that can be stored in a field and combined by volume-fraction weighting.
///
/// Implemented for `f64`, every `uom` quantity, and [`Vector`] of those.
pub trait FieldValue:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + Zero
{
}

impl<T> FieldValue for T where
    T: Copy
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<f64, Output = T>
        + Div<f64, Output = T>
        + Zero
{
}

/// Marker for cell-centred fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cells;

/// Marker for face fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Faces;

/// A field of values stored by cell.
pub type VolField<T> = Field<T, Cells>;

/// A field of values stored by face.
pub type SurfaceField<T> = Field<T, Faces>;

/// Errors from combining fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Two fields that must share a layout have different lengths.
    #[error("field size mismatch: expected {expected}, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

/// An owned field of values at one kind of mesh location.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T, Location> {
    values: Vec<T>,
    _location: PhantomData<Location>,
}

impl<T, Location> Field<T, Location> {
    /// Creates a field from per-location values.
    #[must_use]
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            _location: PhantomData,
        }
    }

    /// Number of locations in the field.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Applies `f` to every value, producing a new field at the same locations.
    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Field<U, Location> {
        Field::new(self.values.iter().map(f).collect())
    }

    /// Combines two fields location by location.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the fields differ in length.
    pub fn zip_with<U, R>(
        &self,
        other: &Field<U, Location>,
        mut f: impl FnMut(&T, &U) -> R,
    ) -> Result<Field<R, Location>, FieldError> {
        other.check_len(self.len())?;
        Ok(Field::new(
            self.values
                .iter()
                .zip(other.values.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        ))
    }

    /// Returns an error unless the field has `expected` locations.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the lengths differ.
    pub fn check_len(&self, expected: usize) -> Result<(), FieldError> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(FieldError::SizeMismatch {
                expected,
                found: self.values.len(),
            })
        }
    }
}

impl<T: Clone, Location> Field<T, Location> {
    /// Creates a field with the same value at every location.
    #[must_use]
    pub fn uniform(len: usize, value: T) -> Self {
        Self::new(vec![value; len])
    }
}

impl<T: FieldValue, Location> Field<T, Location> {
    /// Creates a field of zeros.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::uniform(len, T::zero())
    }

    /// Multiplies every value by the matching scalar weight.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the fields differ in length.
    pub fn weighted_by(&self, weights: &Field<f64, Location>) -> Result<Self, FieldError> {
        self.zip_with(weights, |&value, &weight| value * weight)
    }

    /// Divides every value by the matching scalar divisor.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the fields differ in length.
    pub fn divided_by(&self, divisors: &Field<f64, Location>) -> Result<Self, FieldError> {
        self.zip_with(divisors, |&value, &divisor| value / divisor)
    }

    /// Adds `other` into this field in place.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the fields differ in length.
    pub fn accumulate(&mut self, other: &Self) -> Result<(), FieldError> {
        other.check_len(self.len())?;
        for (value, &increment) in self.values.iter_mut().zip(other.values.iter()) {
            *value = *value + increment;
        }
        Ok(())
    }

    /// Adds `weight * other` into this field in place.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if any field differs in length.
    pub fn accumulate_weighted(
        &mut self,
        other: &Self,
        weights: &Field<f64, Location>,
    ) -> Result<(), FieldError> {
        other.check_len(self.len())?;
        weights.check_len(self.len())?;
        for ((value, &increment), &weight) in self
            .values
            .iter_mut()
            .zip(other.values.iter())
            .zip(weights.values.iter())
        {
            *value = *value + increment * weight;
        }
        Ok(())
    }

    /// Returns `self - other` location by location.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the fields differ in length.
    pub fn difference(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, |&a, &b| a - b)
    }
}

impl<T, Location> std::ops::Index<usize> for Field<T, Location> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<T, Location> FromIterator<T> for Field<T, Location> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::MassDensity, mass_density::kilogram_per_cubic_meter};

    #[test]
    fn weighted_accumulation() {
        let alpha = VolField::new(vec![0.25, 0.75]);
        let rho = VolField::uniform(2, MassDensity::new::<kilogram_per_cubic_meter>(1000.0));

        let mut sum = VolField::<MassDensity>::zeros(2);
        sum.accumulate_weighted(&rho, &alpha).unwrap();
        sum.accumulate_weighted(&rho, &alpha).unwrap();

        assert_relative_eq!(sum[0].get::<kilogram_per_cubic_meter>(), 500.0);
        assert_relative_eq!(sum[1].get::<kilogram_per_cubic_meter>(), 1500.0);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let a = VolField::new(vec![1.0, 2.0, 3.0]);
        let b = VolField::new(vec![1.0, 2.0]);

        assert_eq!(
            a.weighted_by(&b),
            Err(FieldError::SizeMismatch {
                expected: 3,
                found: 2
            })
        );

        let mut c = a.clone();
        assert_eq!(
            c.accumulate(&b),
            Err(FieldError::SizeMismatch {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(c, a, "failed accumulation must leave the field untouched");

        let mut sum = VolField::<f64>::zeros(2);
        assert_eq!(
            sum.accumulate_weighted(&b, &a),
            Err(FieldError::SizeMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn division_by_scalar_field() {
        let values = VolField::new(vec![0.4, 0.9]);
        let divisors = VolField::new(vec![0.8, 0.9]);
        let ratio_field = values.divided_by(&divisors).unwrap();
        assert_relative_eq!(ratio_field[0], 0.5);
        assert_relative_eq!(ratio_field[1], 1.0);
    }
}
