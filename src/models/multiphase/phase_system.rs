//! Multiphase phase system.
//!
//! A [`PhaseSystem`] owns an ensemble of phases sharing one domain and the
//! interfacial sub-models that couple each pair of them.
//! It is built from a [`PhaseSystemConfig`]:
//!
//! - Pair identities ([`PairKey`]) are canonicalized and registered once in a
//!   [`PairRegistry`].
//! - Each sub-model family (surface tension, aspect ratio, drag, or any
//!   caller-defined [`ModelFamily`]) gets a [`SubModelRegistry`] that returns
//!   the neutral value for undeclared pairs and blends multiple declared
//!   models with a [`BlendingMethod`].
//! - Mixture density, velocity, and flux are volume-fraction-weighted sums
//!   computed by a [`MixtureAggregator`], excluding stationary phases from
//!   density and velocity.
//!
//! Each step runs the correction cycle described by [`StepStage`] over every
//! phase in registration order.
//!
//! The [`Mixture`] type exposes mixture aggregation as a
//! [`twine_core::Model`] over owned [`PhaseState`] snapshots.

mod core;

use twine_core::Model;

use crate::support::field::FaceInterpolation;

pub use self::core::{
    AsPhaseFields, AspectRatioFamily, BlendRole, BlendWeights, BlendingConfig, BlendingMethod,
    BlendingMethods, ClosureError, ClosureResult, ConfigError, Constant, DragFamily, Ensemble,
    Hyperbolic, InterfacialModel, Linear, MixtureAggregator, MixtureError, MixtureSnapshot,
    ModelConstructor, ModelEntryConfig, ModelFactory, ModelFamily, NoBlending, PairDescriptor,
    PairError, PairKey, PairRegistry, ParameterError, Parameters, PhaseFields, PhaseFlags,
    PhaseGroups, PhaseModel, PhaseState, PhaseSystem, PhaseSystemBuilder, PhaseSystemConfig,
    SetupError, Step, StepError, StepStage, SubModelRegistry, SurfaceTensionFamily,
};

/// Mixture aggregation as a [`Model`].
///
/// The input lists one [`PhaseState`] per phase, in the order of the flags
/// the model was created with.
///
/// ```
/// use twine_core::Model;
/// use twine_multiphase::{
///     models::multiphase::phase_system::{Mixture, PhaseFlags, PhaseState},
///     support::field::{FaceAddressing, SurfaceField, Vector, VolField},
/// };
/// use uom::si::{
///     f64::{MassDensity, Velocity, VolumeRate},
///     mass_density::kilogram_per_cubic_meter,
///     velocity::meter_per_second,
/// };
///
/// let phase = |name: &str, alpha: f64, rho: f64| PhaseState {
///     name: name.into(),
///     volume_fraction: VolField::new(vec![alpha]),
///     velocity: VolField::new(vec![Vector::new(
///         Velocity::new::<meter_per_second>(1.0),
///         Velocity::new::<meter_per_second>(0.0),
///         Velocity::new::<meter_per_second>(0.0),
///     )]),
///     density: VolField::new(vec![MassDensity::new::<kilogram_per_cubic_meter>(rho)]),
///     flux: SurfaceField::<VolumeRate>::zeros(1),
/// };
///
/// let addressing = FaceAddressing::new(1, vec![0], vec![None], vec![1.0]).unwrap();
/// let mixture = Mixture::new(&[PhaseFlags::moving(), PhaseFlags::stationary()], addressing)
///     .unwrap();
///
/// let snapshot = mixture
///     .call(&vec![phase("water", 0.4, 1000.0), phase("sand", 0.6, 2650.0)])
///     .unwrap();
///
/// // Only the water moves, so the mixture density is the water density.
/// let rho = snapshot.density[0].get::<kilogram_per_cubic_meter>();
/// assert!((rho - 1000.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct Mixture<I> {
    aggregator: MixtureAggregator,
    interpolation: I,
}

impl<I: FaceInterpolation> Mixture<I> {
    /// Creates the model for phases with the given flags.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Configuration`] if no phase is moving.
    pub fn new(flags: &[PhaseFlags], interpolation: I) -> Result<Self, SetupError> {
        Ok(Self {
            aggregator: MixtureAggregator::new(&PhaseGroups::from_flags(flags))?,
            interpolation,
        })
    }
}

impl<I: FaceInterpolation> Model for Mixture<I> {
    type Input = Vec<PhaseState>;
    type Output = MixtureSnapshot;
    type Error = MixtureError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let ensemble: Ensemble<'_> = input
            .iter()
            .map(|phase| phase as &dyn PhaseFields)
            .collect();
        self.aggregator.snapshot(&ensemble, &self.interpolation)
    }
}
