//! Time-step scaling for explicit rate terms.
//!
//! A [`TimeStep`] is either a single global Δt or a per-cell reciprocal Δt
//! (local time stepping, used for pseudo-transient steady runs).
//! [`TimeStep::by_dt`] turns an increment into a rate in either case.

use std::ops::{Div, Mul};

use uom::si::f64::{Frequency, Time};

use crate::support::{
    constraint::{Constrained, ConstraintResult, StrictlyPositive},
    field::{FieldError, FieldValue, VolField},
};

/// The time step in effect for the current step.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeStep {
    /// One Δt for every cell.
    Global(Constrained<Time, StrictlyPositive>),

    /// Local Euler time stepping: a reciprocal Δt per cell.
    Local(VolField<Frequency>),
}

impl TimeStep {
    /// Creates a global time step.
    ///
    /// # Errors
    ///
    /// Returns an error if `delta_t` is not strictly positive.
    pub fn global(delta_t: Time) -> ConstraintResult<Self> {
        Ok(Self::Global(StrictlyPositive::new(delta_t)?))
    }

    /// Creates a local time step from per-cell reciprocal time steps.
    #[must_use]
    pub fn local(reciprocal_delta_t: VolField<Frequency>) -> Self {
        Self::Local(reciprocal_delta_t)
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Divides a cell field by the time step.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if a local reciprocal Δt field does
    /// not match the size of `field`.
    pub fn by_dt<Q, R>(&self, field: &VolField<Q>) -> Result<VolField<R>, FieldError>
    where
        Q: Copy + Div<Time, Output = R> + Mul<Frequency, Output = R>,
    {
        match self {
            Self::Global(delta_t) => {
                let delta_t = delta_t.get();
                Ok(field.map(|&value| value / delta_t))
            }
            Self::Local(reciprocal) => field.zip_with(reciprocal, |&value, &rdt| value * rdt),
        }
    }

    /// First-order Euler time derivative `(current − old) / Δt`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SizeMismatch`] if the fields do not share a size.
    pub fn ddt<Q, R>(
        &self,
        current: &VolField<Q>,
        old: &VolField<Q>,
    ) -> Result<VolField<R>, FieldError>
    where
        Q: FieldValue + Div<Time, Output = R> + Mul<Frequency, Output = R>,
    {
        self.by_dt(&current.difference(old)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::Pressure, frequency::hertz, pressure::pascal, time::second};

    use crate::support::units::PressureRate;

    fn pressures(values: &[f64]) -> VolField<Pressure> {
        values.iter().map(|&p| Pressure::new::<pascal>(p)).collect()
    }

    #[test]
    fn global_pressure_rate() {
        let time = TimeStep::global(Time::new::<second>(0.5)).unwrap();
        let rate: VolField<PressureRate> = time
            .ddt(&pressures(&[101_325.0, 2.0e5]), &pressures(&[101_300.0, 2.0e5]))
            .unwrap();

        assert_relative_eq!(rate[0].value, 50.0, epsilon = 1e-9);
        assert_relative_eq!(rate[1].value, 0.0);
    }

    #[test]
    fn local_pressure_rate() {
        let time = TimeStep::local(VolField::new(vec![
            Frequency::new::<hertz>(10.0),
            Frequency::new::<hertz>(2.0),
        ]));
        assert!(time.is_local());

        let rate: VolField<PressureRate> = time
            .ddt(&pressures(&[11.0, 11.0]), &pressures(&[10.0, 10.0]))
            .unwrap();

        assert_relative_eq!(rate[0].value, 10.0);
        assert_relative_eq!(rate[1].value, 2.0);
    }

    #[test]
    fn local_size_mismatch() {
        let time = TimeStep::local(VolField::new(vec![Frequency::new::<hertz>(1.0)]));
        let result: Result<VolField<PressureRate>, _> = time.by_dt(&pressures(&[1.0, 2.0]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_positive_global_step() {
        assert!(TimeStep::global(Time::new::<second>(0.0)).is_err());
    }
}
