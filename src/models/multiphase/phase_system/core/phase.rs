//! The per-phase collaborator interface and phase groupings.

use uom::si::f64::{MassDensity, Pressure, Velocity, VolumeRate};

use crate::support::{
    field::{SurfaceField, Vector, VolField},
    units::MassTransferRate,
};

use super::error::ClosureResult;

/// Static classification of a phase, read once when the system is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseFlags {
    /// The phase velocity is held fixed (packed beds, porous solids).
    pub stationary: bool,

    /// The phase energy equation is not solved.
    pub isothermal: bool,

    /// The phase is a single component (no species transport).
    pub pure: bool,
}

impl PhaseFlags {
    /// Flags for a moving, anisothermal, single-component phase.
    #[must_use]
    pub fn moving() -> Self {
        Self::default()
    }

    /// Flags for a stationary, anisothermal, single-component phase.
    #[must_use]
    pub fn stationary() -> Self {
        Self {
            stationary: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_isothermal(self, isothermal: bool) -> Self {
        Self { isothermal, ..self }
    }

    #[must_use]
    pub fn with_pure(self, pure: bool) -> Self {
        Self { pure, ..self }
    }
}

/// Read-only access to the fields of one phase.
///
/// This is everything mixture aggregation, blending, and interfacial
/// sub-models need to know about a phase.
pub trait PhaseFields {
    /// Unique phase identifier.
    fn name(&self) -> &str;

    /// Cell volume fraction `α`.
    fn volume_fraction(&self) -> &VolField<f64>;

    /// Cell velocity.
    fn velocity(&self) -> &VolField<Vector<Velocity>>;

    /// Cell density.
    fn density(&self) -> &VolField<MassDensity>;

    /// Volumetric face flux of the phase.
    fn flux(&self) -> &SurfaceField<VolumeRate>;
}

/// Coerces a concrete phase into a `&dyn PhaseFields`.
///
/// Implemented for every sized [`PhaseFields`] type; phase models never
/// implement it by hand.
pub trait AsPhaseFields {
    fn as_fields(&self) -> &dyn PhaseFields;
}

impl<T: PhaseFields> AsPhaseFields for T {
    fn as_fields(&self) -> &dyn PhaseFields {
        self
    }
}

/// A phase owned by a phase system.
///
/// Implementations hold the phase's fields and its thermophysical,
/// transport, and reaction closures.
/// The correction hooks are called once per step in registration order and
/// mutate the phase in place.
pub trait PhaseModel: PhaseFields + AsPhaseFields {
    /// Static classification of the phase.
    ///
    /// The phase system reads this once at construction and expects it to
    /// stay constant afterwards.
    fn flags(&self) -> PhaseFlags;

    /// True if the phase density does not depend on pressure.
    fn incompressible(&self) -> bool;

    /// True if the phase thermo needs the pressure time derivative.
    fn uses_pressure_rate(&self) -> bool;

    /// Current thermodynamic pressure.
    fn pressure(&self) -> &VolField<Pressure>;

    /// Thermodynamic pressure at the previous time level.
    fn pressure_old(&self) -> &VolField<Pressure>;

    /// General correction of the phase closures.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct(&mut self) -> ClosureResult;

    /// Updates the velocity-dependent fields (kinetic energy, fluxes).
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_kinematics(&mut self) -> ClosureResult;

    /// Updates the thermophysical properties.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_thermo(&mut self) -> ClosureResult;

    /// Updates reaction rates.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_reactions(&mut self) -> ClosureResult;

    /// Updates species mass fractions.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_species(&mut self) -> ClosureResult;

    /// Updates the turbulence model.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_turbulence(&mut self) -> ClosureResult;

    /// Updates the energy transport model.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_energy_transport(&mut self) -> ClosureResult;

    /// Corrects the continuity error given the phase mass source.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`](super::ClosureError) if the closure fails.
    fn correct_continuity_error(&mut self, source: &VolField<MassTransferRate>) -> ClosureResult;

    /// Re-reads run-time modifiable settings. Returns false if the read failed.
    fn read(&mut self) -> bool;
}

/// Owned snapshot of the fields of one phase.
///
/// Used as input to the [`Mixture`](crate::models::multiphase::phase_system::Mixture)
/// model, where no live phase model is involved.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseState {
    pub name: String,
    pub volume_fraction: VolField<f64>,
    pub velocity: VolField<Vector<Velocity>>,
    pub density: VolField<MassDensity>,
    pub flux: SurfaceField<VolumeRate>,
}

impl PhaseFields for PhaseState {
    fn name(&self) -> &str {
        &self.name
    }

    fn volume_fraction(&self) -> &VolField<f64> {
        &self.volume_fraction
    }

    fn velocity(&self) -> &VolField<Vector<Velocity>> {
        &self.velocity
    }

    fn density(&self) -> &VolField<MassDensity> {
        &self.density
    }

    fn flux(&self) -> &SurfaceField<VolumeRate> {
        &self.flux
    }
}

/// A borrowed view of every phase in registration order.
///
/// Phase indices used by pairs and blending methods index into this view.
pub struct Ensemble<'a> {
    phases: Vec<&'a dyn PhaseFields>,
}

impl<'a> Ensemble<'a> {
    #[must_use]
    pub fn new(phases: Vec<&'a dyn PhaseFields>) -> Self {
        Self { phases }
    }

    /// Number of phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Number of cells, taken from the first phase's volume fraction.
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.phases
            .first()
            .map_or(0, |phase| phase.volume_fraction().len())
    }

    /// Returns the phase at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn phase(&self, index: usize) -> &'a dyn PhaseFields {
        self.phases[index]
    }

    /// Volume fraction of the phase at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn volume_fraction(&self, index: usize) -> &'a VolField<f64> {
        self.phases[index].volume_fraction()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a dyn PhaseFields> + '_ {
        self.phases.iter().copied()
    }
}

impl<'a> FromIterator<&'a dyn PhaseFields> for Ensemble<'a> {
    fn from_iter<I: IntoIterator<Item = &'a dyn PhaseFields>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Phase indices partitioned by their static flags.
///
/// Computed once when the system is built; every phase appears in exactly
/// one of the moving or stationary groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseGroups {
    moving: Vec<usize>,
    stationary: Vec<usize>,
    anisothermal: Vec<usize>,
    multicomponent: Vec<usize>,
}

impl PhaseGroups {
    /// Partitions phases, given their flags in registration order.
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = &'a PhaseFlags>) -> Self {
        let mut groups = Self::default();
        for (index, flags) in flags.into_iter().enumerate() {
            if flags.stationary {
                groups.stationary.push(index);
            } else {
                groups.moving.push(index);
            }
            if !flags.isothermal {
                groups.anisothermal.push(index);
            }
            if !flags.pure {
                groups.multicomponent.push(index);
            }
        }
        groups
    }

    #[must_use]
    pub fn moving(&self) -> &[usize] {
        &self.moving
    }

    #[must_use]
    pub fn stationary(&self) -> &[usize] {
        &self.stationary
    }

    #[must_use]
    pub fn anisothermal(&self) -> &[usize] {
        &self.anisothermal
    }

    #[must_use]
    pub fn multicomponent(&self) -> &[usize] {
        &self.multicomponent
    }
}
