use crate::support::{
    constraint::{Constrained, UnitInterval},
    field::{FieldError, VolField},
};

use super::{
    super::{error::SetupError, phase::Ensemble},
    BlendingMethod,
};

/// A linear ramp between a partly and a fully continuous volume fraction.
///
/// The weight of a model with continuous phase `c` is zero at or below
/// `min_partly_continuous_alpha[c]`, one at or above
/// `min_fully_continuous_alpha[c]`, and linear in between.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    min_fully_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
    min_partly_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
}

impl Linear {
    /// Creates the method from per-phase bounds, indexed by phase.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Configuration`] if the two vectors differ in
    /// length or a fully continuous bound lies below its partly continuous one.
    pub fn new(
        min_fully_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
        min_partly_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
    ) -> Result<Self, SetupError> {
        if min_fully_continuous_alpha.len() != min_partly_continuous_alpha.len() {
            return Err(SetupError::configuration(
                "linear blending bounds must cover the same phases",
            ));
        }

        for (phase, (fully, partly)) in min_fully_continuous_alpha
            .iter()
            .zip(&min_partly_continuous_alpha)
            .enumerate()
        {
            if fully.get() < partly.get() {
                return Err(SetupError::configuration(format!(
                    "phase {phase}: minFullyContinuousAlpha ({}) is below minPartlyContinuousAlpha ({})",
                    fully.get(),
                    partly.get()
                )));
            }
        }

        Ok(Self {
            min_fully_continuous_alpha,
            min_partly_continuous_alpha,
        })
    }
}

impl BlendingMethod for Linear {
    fn dispersed_weight(
        &self,
        _dispersed: usize,
        continuous: usize,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<f64>, FieldError> {
        let fully = self.min_fully_continuous_alpha[continuous].get();
        let partly = self.min_partly_continuous_alpha[continuous].get();
        let span = fully - partly;

        Ok(ensemble.volume_fraction(continuous).map(|&alpha| {
            if span > 0.0 {
                ((alpha - partly) / span).clamp(0.0, 1.0)
            } else if alpha >= fully {
                1.0
            } else {
                0.0
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use super::super::super::test_support::{TestPhase, ensemble_of};

    fn bounds(values: &[f64]) -> Vec<Constrained<f64, UnitInterval>> {
        values
            .iter()
            .map(|&value| UnitInterval::new(value).unwrap())
            .collect()
    }

    #[test]
    fn ramps_between_bounds() {
        let phases = [
            TestPhase::moving("air", &[0.9, 0.6, 0.5, 0.4, 0.1]),
            TestPhase::moving("water", &[0.1, 0.4, 0.5, 0.6, 0.9]),
        ];
        let ensemble = ensemble_of(&phases);
        let method = Linear::new(bounds(&[0.6, 0.6]), bounds(&[0.4, 0.4])).unwrap();

        let air_in_water = method.dispersed_weight(0, 1, &ensemble).unwrap();
        let expected = [0.0, 0.0, 0.5, 1.0, 1.0];
        for (actual, expected) in air_in_water.iter().zip(expected) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn equal_bounds_act_as_a_step() {
        let phases = [
            TestPhase::moving("air", &[0.6, 0.4]),
            TestPhase::moving("water", &[0.4, 0.6]),
        ];
        let ensemble = ensemble_of(&phases);
        let method = Linear::new(bounds(&[0.5, 0.5]), bounds(&[0.5, 0.5])).unwrap();

        let air_in_water = method.dispersed_weight(0, 1, &ensemble).unwrap();
        assert_eq!(air_in_water.values(), &[0.0, 1.0]);
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(matches!(
            Linear::new(bounds(&[0.3, 0.7]), bounds(&[0.5, 0.5])),
            Err(SetupError::Configuration { .. })
        ));
    }
}
