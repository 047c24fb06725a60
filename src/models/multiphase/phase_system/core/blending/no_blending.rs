use crate::support::field::{FieldError, VolField};

use super::{super::phase::Ensemble, BlendingMethod};

/// A fixed regime: one phase is continuous everywhere.
///
/// Only models describing a phase dispersed in the continuous phase apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoBlending {
    continuous: usize,
}

impl NoBlending {
    /// Creates the method with the phase at index `continuous` as the
    /// continuous phase.
    #[must_use]
    pub fn new(continuous: usize) -> Self {
        Self { continuous }
    }

    #[must_use]
    pub fn continuous(&self) -> usize {
        self.continuous
    }
}

impl BlendingMethod for NoBlending {
    fn dispersed_weight(
        &self,
        _dispersed: usize,
        continuous: usize,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<f64>, FieldError> {
        let weight = if continuous == self.continuous {
            1.0
        } else {
            0.0
        };
        Ok(VolField::uniform(ensemble.n_cells(), weight))
    }
}
