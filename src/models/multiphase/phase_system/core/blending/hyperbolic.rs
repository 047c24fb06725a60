use crate::support::{
    constraint::{Constrained, StrictlyPositive, UnitInterval},
    field::{FieldError, VolField},
};

use super::{super::phase::Ensemble, BlendingMethod};

/// A smooth transition: `(1 + tanh((4 / scale) (α_c − α_min,c))) / 2`.
///
/// The weight is one half when the continuous fraction equals its
/// threshold and changes over roughly `scale` on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperbolic {
    min_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
    transition_alpha_scale: Constrained<f64, StrictlyPositive>,
}

impl Hyperbolic {
    /// Creates the method from per-phase thresholds, indexed by phase, and a
    /// transition width.
    #[must_use]
    pub fn new(
        min_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
        transition_alpha_scale: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        Self {
            min_continuous_alpha,
            transition_alpha_scale,
        }
    }
}

impl BlendingMethod for Hyperbolic {
    fn dispersed_weight(
        &self,
        _dispersed: usize,
        continuous: usize,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<f64>, FieldError> {
        let threshold = self.min_continuous_alpha[continuous].get();
        let slope = 4.0 / self.transition_alpha_scale.get();
        Ok(ensemble
            .volume_fraction(continuous)
            .map(|&alpha| 0.5 * (1.0 + (slope * (alpha - threshold)).tanh())))
    }
}
