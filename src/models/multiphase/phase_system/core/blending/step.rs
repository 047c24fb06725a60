use crate::support::{
    constraint::{Constrained, UnitInterval},
    field::{FieldError, VolField},
};

use super::{super::phase::Ensemble, BlendingMethod};

/// A sharp switch: a phase is continuous once its volume fraction reaches
/// its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    min_continuous_alpha: Vec<Constrained<f64, UnitInterval>>,
}

impl Step {
    /// Creates the method from per-phase thresholds, indexed by phase.
    #[must_use]
    pub fn new(min_continuous_alpha: Vec<Constrained<f64, UnitInterval>>) -> Self {
        Self {
            min_continuous_alpha,
        }
    }
}

impl BlendingMethod for Step {
    fn dispersed_weight(
        &self,
        _dispersed: usize,
        continuous: usize,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<f64>, FieldError> {
        let threshold = self.min_continuous_alpha[continuous].get();
        Ok(ensemble
            .volume_fraction(continuous)
            .map(|&alpha| if alpha >= threshold { 1.0 } else { 0.0 }))
    }
}
