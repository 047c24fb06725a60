//! Volume-fraction-weighted mixture quantities.

use uom::si::f64::{MassDensity, Velocity, VolumeRate};

use crate::support::field::{FaceInterpolation, FieldValue, SurfaceField, Vector, VolField};

use super::{
    error::{MixtureError, SetupError},
    phase::{Ensemble, PhaseFields, PhaseGroups},
};

/// Mixture density, velocity, and flux at one field state.
///
/// Recomputed on request, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureSnapshot {
    pub density: VolField<MassDensity>,
    pub velocity: VolField<Vector<Velocity>>,
    pub flux: SurfaceField<VolumeRate>,
}

/// Combines per-phase fields into mixture fields.
///
/// Flux sums over every phase.
/// Density and velocity sum over the moving phases only; when any phase is
/// stationary the sum is divided by the total moving volume fraction, so the
/// immobile holdup does not dilute the average.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixtureAggregator {
    n_phases: usize,
    moving: Vec<usize>,
    renormalize: bool,
}

impl MixtureAggregator {
    /// Creates an aggregator for the given phase partition.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Configuration`] if no phase is moving.
    pub fn new(groups: &PhaseGroups) -> Result<Self, SetupError> {
        if groups.moving().is_empty() {
            return Err(SetupError::configuration(
                "at least one phase must be moving to form mixture quantities",
            ));
        }

        Ok(Self {
            n_phases: groups.moving().len() + groups.stationary().len(),
            moving: groups.moving().to_vec(),
            renormalize: !groups.stationary().is_empty(),
        })
    }

    /// True if density and velocity are divided by the moving volume fraction.
    #[must_use]
    pub fn renormalizes(&self) -> bool {
        self.renormalize
    }

    /// Mixture face flux: `Σ_all interpolate(α_i) φ_i`.
    ///
    /// # Errors
    ///
    /// Returns a [`MixtureError`] if the ensemble does not match the phase
    /// count or any field has the wrong size.
    pub fn flux(
        &self,
        ensemble: &Ensemble<'_>,
        interpolation: &dyn FaceInterpolation,
    ) -> Result<SurfaceField<VolumeRate>, MixtureError> {
        self.check_phase_count(ensemble)?;

        let mut flux = SurfaceField::zeros(interpolation.n_faces());
        for phase in ensemble.iter() {
            let alpha = interpolation.interpolate(phase.volume_fraction())?;
            flux.accumulate_weighted(phase.flux(), &alpha)?;
        }
        Ok(flux)
    }

    /// Mixture density over the moving phases.
    ///
    /// # Errors
    ///
    /// Returns a [`MixtureError`] if the ensemble does not match the phase
    /// count or any field has the wrong size.
    pub fn density(&self, ensemble: &Ensemble<'_>) -> Result<VolField<MassDensity>, MixtureError> {
        self.moving_average(ensemble, |phase| phase.density())
    }

    /// Mixture velocity over the moving phases.
    ///
    /// # Errors
    ///
    /// Returns a [`MixtureError`] if the ensemble does not match the phase
    /// count or any field has the wrong size.
    pub fn velocity(
        &self,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<Vector<Velocity>>, MixtureError> {
        self.moving_average(ensemble, |phase| phase.velocity())
    }

    /// All three mixture quantities.
    ///
    /// # Errors
    ///
    /// Returns a [`MixtureError`] if any of them fails.
    pub fn snapshot(
        &self,
        ensemble: &Ensemble<'_>,
        interpolation: &dyn FaceInterpolation,
    ) -> Result<MixtureSnapshot, MixtureError> {
        Ok(MixtureSnapshot {
            density: self.density(ensemble)?,
            velocity: self.velocity(ensemble)?,
            flux: self.flux(ensemble, interpolation)?,
        })
    }

    fn moving_average<'e, T: FieldValue + 'e>(
        &self,
        ensemble: &Ensemble<'e>,
        field: impl Fn(&'e dyn PhaseFields) -> &'e VolField<T>,
    ) -> Result<VolField<T>, MixtureError> {
        self.check_phase_count(ensemble)?;
        let n_cells = ensemble.n_cells();

        let mut sum = VolField::zeros(n_cells);
        let mut alpha_moving = VolField::<f64>::zeros(n_cells);
        for &index in &self.moving {
            let phase = ensemble.phase(index);
            let alpha = phase.volume_fraction();
            sum.accumulate_weighted(field(phase), alpha)?;
            alpha_moving.accumulate(alpha)?;
        }

        if !self.renormalize {
            return Ok(sum);
        }

        let mut empty = 0;
        let average = sum.zip_with(&alpha_moving, |&value, &alpha| {
            if alpha > 0.0 {
                value / alpha
            } else {
                empty += 1;
                T::zero()
            }
        })?;
        if empty > 0 {
            log::warn!(
                "{empty} of {n_cells} cells hold no moving phase; mixture value set to zero there"
            );
        }
        Ok(average)
    }

    fn check_phase_count(&self, ensemble: &Ensemble<'_>) -> Result<(), MixtureError> {
        if ensemble.len() == self.n_phases {
            Ok(())
        } else {
            Err(MixtureError::PhaseCount {
                expected: self.n_phases,
                found: ensemble.len(),
            })
        }
    }
}
