//! The phase system: phase ownership, setup, and the step cycle.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
    fmt,
};

use uom::si::f64::{MassDensity, Ratio, Velocity, VolumeRate};

use crate::support::{
    field::{FaceInterpolation, SurfaceField, Vector, VolField},
    time::TimeStep,
    units::{DragCoefficient, MassTransferRate, PressureRate, SurfaceTension},
};

use super::{
    blending::BlendingMethods,
    config::{ModelEntryConfig, PhaseSystemConfig},
    error::{ClosureResult, SetupError, StepError},
    mixture::{MixtureAggregator, MixtureSnapshot},
    pair::PairKey,
    pair_registry::PairRegistry,
    phase::{Ensemble, PhaseFlags, PhaseGroups, PhaseModel},
    sub_model::{
        AspectRatioFamily, DragFamily, ModelFactory, ModelFamily, SubModelRegistry,
        SurfaceTensionFamily,
    },
};

/// Position in the per-step correction cycle.
///
/// The cycle runs `Idle → CorrectKinematics → CorrectThermo →
/// CorrectReactions → CorrectSpecies → CorrectTurbulence →
/// CorrectEnergyTransport → Idle`.
/// A stage is entered once its correction has run on every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepStage {
    #[default]
    Idle,
    CorrectKinematics,
    CorrectThermo,
    CorrectReactions,
    CorrectSpecies,
    CorrectTurbulence,
    CorrectEnergyTransport,
}

impl StepStage {
    /// The stage that follows this one.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::CorrectKinematics,
            Self::CorrectKinematics => Self::CorrectThermo,
            Self::CorrectThermo => Self::CorrectReactions,
            Self::CorrectReactions => Self::CorrectSpecies,
            Self::CorrectSpecies => Self::CorrectTurbulence,
            Self::CorrectTurbulence => Self::CorrectEnergyTransport,
            Self::CorrectEnergyTransport => Self::Idle,
        }
    }

    /// Name of the phase hook run on entering this stage.
    #[must_use]
    pub fn hook(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CorrectKinematics => "correctKinematics",
            Self::CorrectThermo => "correctThermo",
            Self::CorrectReactions => "correctReactions",
            Self::CorrectSpecies => "correctSpecies",
            Self::CorrectTurbulence => "correctTurbulence",
            Self::CorrectEnergyTransport => "correctEnergyTransport",
        }
    }
}

impl fmt::Display for StepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hook())
    }
}

/// Builds one sub-model family's registry with its factory.
trait FamilyBuilder {
    fn build(
        &self,
        entries: &[ModelEntryConfig],
        blending: &BlendingMethods,
        pairs: &mut PairRegistry,
    ) -> Result<(TypeId, Box<dyn Any + Send + Sync>, usize), SetupError>;
}

struct Family<F: ModelFamily>(ModelFactory<F>);

impl<F: ModelFamily> FamilyBuilder for Family<F> {
    fn build(
        &self,
        entries: &[ModelEntryConfig],
        blending: &BlendingMethods,
        pairs: &mut PairRegistry,
    ) -> Result<(TypeId, Box<dyn Any + Send + Sync>, usize), SetupError> {
        let registry = SubModelRegistry::<F>::build(entries, &self.0, blending, pairs)?;
        let count = registry.len();
        Ok((TypeId::of::<F>(), Box::new(registry), count))
    }
}

/// Configures and builds a [`PhaseSystem`].
///
/// The surface tension, aspect ratio, and drag families are always built,
/// with the built-in model types unless replaced through
/// [`with_factory`](Self::with_factory).
pub struct PhaseSystemBuilder {
    config: PhaseSystemConfig,
    families: BTreeMap<&'static str, Box<dyn FamilyBuilder>>,
}

impl PhaseSystemBuilder {
    fn new(config: PhaseSystemConfig) -> Self {
        Self {
            config,
            families: BTreeMap::new(),
        }
        .with_factory(ModelFactory::<SurfaceTensionFamily>::with_builtins())
        .with_factory(ModelFactory::<AspectRatioFamily>::with_builtins())
        .with_factory(ModelFactory::<DragFamily>::with_builtins())
    }

    /// Registers the model types of family `F`, replacing any factory
    /// previously registered under the same family name.
    #[must_use]
    pub fn with_factory<F: ModelFamily>(mut self, factory: ModelFactory<F>) -> Self {
        self.families.insert(F::NAME, Box::new(Family(factory)));
        self
    }

    /// Builds the system around the given phases.
    ///
    /// `phases` must match the configured phase identifiers in order. Once
    /// constructed, the system runs the kinematic correction once with `time`.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] if the phases do not match the configuration or
    /// the mesh, no phase is moving, a sub-model table is invalid, or the
    /// initial kinematic correction fails.
    pub fn build(
        self,
        phases: Vec<Box<dyn PhaseModel>>,
        interpolation: Box<dyn FaceInterpolation>,
        time: &TimeStep,
    ) -> Result<PhaseSystem, SetupError> {
        let Self { config, families } = self;

        let mut pairs = PairRegistry::new(config.phases.iter().cloned())?;
        check_phases(&config, &phases, interpolation.as_ref())?;

        let flags: Vec<PhaseFlags> = phases.iter().map(|phase| phase.flags()).collect();
        let groups = PhaseGroups::from_flags(&flags);
        let mixture = MixtureAggregator::new(&groups)?;

        let blending = BlendingMethods::from_config(&config.blending, &pairs)?;

        if let Some(unknown) = config
            .models
            .keys()
            .find(|name| !families.contains_key(name.as_str()))
        {
            return Err(SetupError::configuration(format!(
                "no model factory for sub-model family `{unknown}`"
            )));
        }

        let mut registries = HashMap::with_capacity(families.len());
        let mut counts = Vec::with_capacity(families.len());
        for (name, family) in &families {
            let (type_id, registry, count) =
                family.build(config.entries(name), &blending, &mut pairs)?;
            registries.insert(type_id, registry);
            counts.push(format!("{name}: {count}"));
        }

        let n_cells = interpolation.n_cells();
        let mut system = PhaseSystem {
            phases,
            flags,
            groups,
            pairs,
            mixture,
            interpolation,
            families: registries,
            dpdt: VolField::zeros(n_cells),
            stage: StepStage::Idle,
        };

        system
            .correct_kinematics(time)
            .map_err(|err| SetupError::InitialCorrection(Box::new(err)))?;

        log::info!(
            "phase system with {} phases ({} moving, {} stationary, {} anisothermal, {} multicomponent), {} pairs, models per family [{}]",
            system.phases.len(),
            system.groups.moving().len(),
            system.groups.stationary().len(),
            system.groups.anisothermal().len(),
            system.groups.multicomponent().len(),
            system.pairs.len(),
            counts.join(", ")
        );

        Ok(system)
    }
}

/// Checks that the phases match the configured identifiers and the mesh.
fn check_phases(
    config: &PhaseSystemConfig,
    phases: &[Box<dyn PhaseModel>],
    interpolation: &dyn FaceInterpolation,
) -> Result<(), SetupError> {
    let names: Vec<&str> = phases.iter().map(|phase| phase.name()).collect();
    if names != config.phases {
        return Err(SetupError::configuration(format!(
            "phases {names:?} do not match the configured phases {:?}",
            config.phases
        )));
    }

    let (n_cells, n_faces) = (interpolation.n_cells(), interpolation.n_faces());
    for phase in phases {
        let sizes = [
            ("volume fraction", phase.volume_fraction().len(), n_cells),
            ("velocity", phase.velocity().len(), n_cells),
            ("density", phase.density().len(), n_cells),
            ("pressure", phase.pressure().len(), n_cells),
            ("flux", phase.flux().len(), n_faces),
        ];
        if let Some((field, found, expected)) =
            sizes.into_iter().find(|(_, found, expected)| found != expected)
        {
            return Err(SetupError::configuration(format!(
                "phase `{}`: {field} has {found} values, the mesh needs {expected}",
                phase.name()
            )));
        }
    }

    Ok(())
}

/// An ensemble of phases sharing one domain, with its pair sub-models.
///
/// Owns the phases and runs their corrections in registration order.
/// Mixture quantities are available between step cycles, once every phase
/// has completed all of its corrections.
///
/// A failed correction aborts the step: the cycle returns to
/// [`StepStage::Idle`] without retrying, and the phases may be partially
/// updated.
pub struct PhaseSystem {
    phases: Vec<Box<dyn PhaseModel>>,
    flags: Vec<PhaseFlags>,
    groups: PhaseGroups,
    pairs: PairRegistry,
    mixture: MixtureAggregator,
    interpolation: Box<dyn FaceInterpolation>,
    families: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    dpdt: VolField<PressureRate>,
    stage: StepStage,
}

impl PhaseSystem {
    /// Starts building a system from `config`.
    #[must_use]
    pub fn builder(config: PhaseSystemConfig) -> PhaseSystemBuilder {
        PhaseSystemBuilder::new(config)
    }

    /// Runs the next stage of the step cycle and returns the stage entered.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Closure`] if a phase hook fails; the cycle is then
    /// reset to [`StepStage::Idle`].
    pub fn advance(&mut self, time: &TimeStep) -> Result<StepStage, StepError> {
        let stage = self.stage.next();
        log::debug!("phase system: entering {stage}");

        let result = match stage {
            StepStage::Idle => Ok(()),
            StepStage::CorrectKinematics => self.correct_kinematics(time),
            StepStage::CorrectThermo => {
                self.for_each_phase(stage.hook(), |phase| phase.correct_thermo())
            }
            StepStage::CorrectReactions => {
                self.for_each_phase(stage.hook(), |phase| phase.correct_reactions())
            }
            StepStage::CorrectSpecies => {
                self.for_each_phase(stage.hook(), |phase| phase.correct_species())
            }
            StepStage::CorrectTurbulence => {
                self.for_each_phase(stage.hook(), |phase| phase.correct_turbulence())
            }
            StepStage::CorrectEnergyTransport => {
                self.for_each_phase(stage.hook(), |phase| phase.correct_energy_transport())
            }
        };

        match result {
            Ok(()) => {
                self.stage = stage;
                Ok(stage)
            }
            Err(err) => {
                log::error!("phase system step aborted during {stage}: {err}");
                self.stage = StepStage::Idle;
                Err(err)
            }
        }
    }

    /// Completes the current step cycle, starting a new one if idle.
    ///
    /// # Errors
    ///
    /// Returns the first [`StepError`] raised by [`advance`](Self::advance).
    pub fn step(&mut self, time: &TimeStep) -> Result<(), StepError> {
        while self.advance(time)? != StepStage::Idle {}
        Ok(())
    }

    /// General correction of every phase.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Closure`] for the first phase that fails.
    pub fn correct(&mut self) -> Result<(), StepError> {
        self.for_each_phase("correct", |phase| phase.correct())
    }

    /// Corrects the continuity error of every moving phase, passing each its
    /// interfacial mass source (zero when unset).
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Closure`] for the first phase that fails.
    pub fn correct_continuity_error(&mut self) -> Result<(), StepError> {
        let sources = self.mass_transfer_rates();
        let n_cells = self.n_cells();

        for &index in self.groups.moving() {
            let source = sources[index]
                .clone()
                .unwrap_or_else(|| VolField::zeros(n_cells));
            let phase = &mut self.phases[index];
            phase
                .correct_continuity_error(&source)
                .map_err(|source| StepError::Closure {
                    phase: phase.name().to_owned(),
                    hook: "correctContinuityError",
                    source,
                })?;
        }
        Ok(())
    }

    /// Re-reads run-time settings of every phase.
    ///
    /// Every phase is read even after one fails. Returns true only if all
    /// reads succeeded.
    pub fn read(&mut self) -> bool {
        let mut ok = true;
        for phase in &mut self.phases {
            let read = phase.read();
            if !read {
                log::warn!("failed to re-read settings of phase `{}`", phase.name());
            }
            ok &= read;
        }
        ok
    }

    fn correct_kinematics(&mut self, time: &TimeStep) -> Result<(), StepError> {
        self.for_each_phase(StepStage::CorrectKinematics.hook(), |phase| {
            phase.correct_kinematics()
        })?;

        if !self.phases.iter().any(|phase| phase.uses_pressure_rate()) {
            return Ok(());
        }

        // The pressure rate follows the first phase's pressure only.
        if let Some(first) = self.phases.first() {
            let dpdt = time.ddt(first.pressure(), first.pressure_old())?;
            dpdt.check_len(self.n_cells())?;
            self.dpdt = dpdt;
        }
        Ok(())
    }

    fn for_each_phase(
        &mut self,
        hook: &'static str,
        mut correct: impl FnMut(&mut dyn PhaseModel) -> ClosureResult,
    ) -> Result<(), StepError> {
        for phase in &mut self.phases {
            correct(phase.as_mut()).map_err(|source| StepError::Closure {
                phase: phase.name().to_owned(),
                hook,
                source,
            })?;
        }
        Ok(())
    }

    /// Current position in the step cycle.
    #[must_use]
    pub fn stage(&self) -> StepStage {
        self.stage
    }

    /// Number of cells in the mesh.
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.interpolation.n_cells()
    }

    /// Borrowed view of every phase in registration order.
    #[must_use]
    pub fn ensemble(&self) -> Ensemble<'_> {
        self.phases.iter().map(|phase| phase.as_fields()).collect()
    }

    pub fn phases(&self) -> impl Iterator<Item = &dyn PhaseModel> {
        self.phases.iter().map(|phase| {
            let phase: &dyn PhaseModel = phase.as_ref();
            phase
        })
    }

    /// Returns the phase with identifier `name`.
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&dyn PhaseModel> {
        self.phases().find(|phase| phase.name() == name)
    }

    /// Flags of every phase, read once at construction.
    #[must_use]
    pub fn flags(&self) -> &[PhaseFlags] {
        &self.flags
    }

    #[must_use]
    pub fn groups(&self) -> &PhaseGroups {
        &self.groups
    }

    #[must_use]
    pub fn pairs(&self) -> &PairRegistry {
        &self.pairs
    }

    /// True if every phase is incompressible.
    #[must_use]
    pub fn incompressible(&self) -> bool {
        self.phases.iter().all(|phase| phase.incompressible())
    }

    /// Pressure time derivative from the last kinematic correction.
    ///
    /// Zero unless some phase uses it.
    #[must_use]
    pub fn dpdt(&self) -> &VolField<PressureRate> {
        &self.dpdt
    }

    fn check_idle(&self) -> Result<(), StepError> {
        if self.stage == StepStage::Idle {
            Ok(())
        } else {
            Err(StepError::StepInProgress { stage: self.stage })
        }
    }

    /// Mixture density.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::StepInProgress`] during a step cycle, or a
    /// [`StepError::Mixture`] if the phase fields are inconsistent.
    pub fn mixture_density(&self) -> Result<VolField<MassDensity>, StepError> {
        self.check_idle()?;
        Ok(self.mixture.density(&self.ensemble())?)
    }

    /// Mixture velocity.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::StepInProgress`] during a step cycle, or a
    /// [`StepError::Mixture`] if the phase fields are inconsistent.
    pub fn mixture_velocity(&self) -> Result<VolField<Vector<Velocity>>, StepError> {
        self.check_idle()?;
        Ok(self.mixture.velocity(&self.ensemble())?)
    }

    /// Mixture face flux.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::StepInProgress`] during a step cycle, or a
    /// [`StepError::Mixture`] if the phase fields are inconsistent.
    pub fn mixture_flux(&self) -> Result<SurfaceField<VolumeRate>, StepError> {
        self.check_idle()?;
        Ok(self
            .mixture
            .flux(&self.ensemble(), self.interpolation.as_ref())?)
    }

    /// Mixture density, velocity, and flux together.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::StepInProgress`] during a step cycle, or a
    /// [`StepError::Mixture`] if the phase fields are inconsistent.
    pub fn mixture(&self) -> Result<MixtureSnapshot, StepError> {
        self.check_idle()?;
        Ok(self
            .mixture
            .snapshot(&self.ensemble(), self.interpolation.as_ref())?)
    }

    /// The registry of family `F`, if it was built.
    #[must_use]
    pub fn sub_models<F: ModelFamily>(&self) -> Option<&SubModelRegistry<F>> {
        self.families
            .get(&TypeId::of::<F>())
            .and_then(|registry| registry.downcast_ref())
    }

    /// Evaluates the effective model of family `F` for the pair `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Pair`] if `key` references an unknown phase,
    /// [`StepError::UnknownFamily`] if `F` was never registered, or the
    /// evaluation error of the model.
    pub fn model_for<F: ModelFamily>(&self, key: &PairKey) -> Result<VolField<F::Value>, StepError> {
        self.pairs.resolve(key)?;
        self.sub_models::<F>()
            .ok_or(StepError::UnknownFamily { family: F::NAME })?
            .model_for(key, &self.ensemble())
    }

    /// Surface tension of a pair.
    ///
    /// # Errors
    ///
    /// See [`model_for`](Self::model_for).
    pub fn surface_tension(&self, key: &PairKey) -> Result<VolField<SurfaceTension>, StepError> {
        self.model_for::<SurfaceTensionFamily>(key)
    }

    /// Aspect ratio of a pair.
    ///
    /// # Errors
    ///
    /// See [`model_for`](Self::model_for).
    pub fn aspect_ratio(&self, key: &PairKey) -> Result<VolField<Ratio>, StepError> {
        self.model_for::<AspectRatioFamily>(key)
    }

    /// Drag coefficient of a pair.
    ///
    /// # Errors
    ///
    /// See [`model_for`](Self::model_for).
    pub fn drag_coefficient(&self, key: &PairKey) -> Result<VolField<DragCoefficient>, StepError> {
        self.model_for::<DragFamily>(key)
    }

    /// Interfacial mass transfer rate of a pair; zero, since this system
    /// exchanges no mass between phases.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Pair`] if `key` references an unknown phase.
    pub fn mass_transfer_rate(&self, key: &PairKey) -> Result<VolField<MassTransferRate>, StepError> {
        self.pairs.resolve(key)?;
        Ok(VolField::zeros(self.n_cells()))
    }

    /// Per-phase interfacial mass sources; all unset.
    #[must_use]
    pub fn mass_transfer_rates(&self) -> Vec<Option<VolField<MassTransferRate>>> {
        vec![None; self.phases.len()]
    }
}

impl fmt::Debug for PhaseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseSystem")
            .field(
                "phases",
                &self.phases.iter().map(|phase| phase.name()).collect::<Vec<_>>(),
            )
            .field("groups", &self.groups)
            .field("pairs", &self.pairs.len())
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::Time, mass_density::kilogram_per_cubic_meter, ratio::ratio, time::second,
        velocity::meter_per_second,
    };

    use super::super::{
        error::PairError,
        test_support::{CallLog, TestPhase, face_per_cell},
    };

    fn time() -> TimeStep {
        TimeStep::global(Time::new::<second>(0.01)).unwrap()
    }

    fn config() -> PhaseSystemConfig {
        PhaseSystemConfig::from_json_str(
            r#"{
                "phases": ["gas", "liquid", "bed"],
                "models": {
                    "surfaceTension": [
                        { "pair": "gas-liquid", "type": "constant", "value": 0.072 }
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    fn three_phases(log: &CallLog) -> Vec<Box<dyn PhaseModel>> {
        vec![
            Box::new(
                TestPhase::moving("gas", &[0.5])
                    .with_velocity(2.0)
                    .with_density(1.0)
                    .with_log(log),
            ),
            Box::new(
                TestPhase::moving("liquid", &[0.3])
                    .with_velocity(1.0)
                    .with_density(1000.0)
                    .with_log(log),
            ),
            Box::new(TestPhase::stationary("bed", &[0.2]).with_log(log)),
        ]
    }

    fn build(phases: Vec<Box<dyn PhaseModel>>) -> Result<PhaseSystem, SetupError> {
        PhaseSystem::builder(config()).build(phases, Box::new(face_per_cell(1)), &time())
    }

    fn hooks(log: &CallLog) -> Vec<(String, &'static str)> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn setup_partitions_phases_and_corrects_kinematics_once() {
        let log = CallLog::default();
        let system = build(three_phases(&log)).unwrap();

        assert_eq!(system.groups().moving(), &[0, 1]);
        assert_eq!(system.groups().stationary(), &[2]);
        assert_eq!(system.stage(), StepStage::Idle);
        assert_eq!(
            hooks(&log),
            [
                ("gas".to_owned(), "correctKinematics"),
                ("liquid".to_owned(), "correctKinematics"),
                ("bed".to_owned(), "correctKinematics"),
            ]
        );
        assert!(system.pairs().contains(&PairKey::unordered("liquid", "gas")));
    }

    #[test]
    fn step_runs_every_stage_in_phase_order() {
        let log = CallLog::default();
        let mut system = build(three_phases(&log)).unwrap();
        hooks(&log);

        system.step(&time()).unwrap();

        let expected: Vec<(String, &str)> = [
            "correctKinematics",
            "correctThermo",
            "correctReactions",
            "correctSpecies",
            "correctTurbulence",
            "correctEnergyTransport",
        ]
        .into_iter()
        .flat_map(|hook| {
            ["gas", "liquid", "bed"]
                .into_iter()
                .map(move |phase| (phase.to_owned(), hook))
        })
        .collect();
        assert_eq!(hooks(&log), expected);
        assert_eq!(system.stage(), StepStage::Idle);
    }

    #[test]
    fn mixture_excludes_stationary_phases() {
        let log = CallLog::default();
        let system = build(three_phases(&log)).unwrap();

        let velocity = system.mixture_velocity().unwrap();
        assert_relative_eq!(
            velocity[0].x.get::<meter_per_second>(),
            (0.5 * 2.0 + 0.3 * 1.0) / 0.8
        );

        let snapshot = system.mixture().unwrap();
        assert_relative_eq!(
            snapshot.density[0].get::<kilogram_per_cubic_meter>(),
            (0.5 * 1.0 + 0.3 * 1000.0) / 0.8
        );
        assert_eq!(snapshot.flux.len(), 1);
    }

    #[test]
    fn mixture_queries_wait_for_the_cycle_to_finish() {
        let log = CallLog::default();
        let mut system = build(three_phases(&log)).unwrap();

        assert_eq!(
            system.advance(&time()).unwrap(),
            StepStage::CorrectKinematics
        );
        assert!(matches!(
            system.mixture_density(),
            Err(StepError::StepInProgress {
                stage: StepStage::CorrectKinematics
            })
        ));

        system.step(&time()).unwrap();
        assert!(system.mixture_density().is_ok());
    }

    #[test]
    fn closure_failure_aborts_the_step() {
        let log = CallLog::default();
        let mut phases = three_phases(&log);
        phases[1] = Box::new(
            TestPhase::moving("liquid", &[0.3])
                .failing_at("correctSpecies")
                .with_log(&log),
        );
        let mut system = build(phases).unwrap();
        hooks(&log);

        let err = system.step(&time()).unwrap_err();

        assert!(matches!(
            &err,
            StepError::Closure { phase, hook: "correctSpecies", .. } if phase == "liquid"
        ));
        assert_eq!(system.stage(), StepStage::Idle);

        // The failing phase is not retried and later phases are not corrected.
        let calls = hooks(&log);
        assert_eq!(
            calls.last(),
            Some(&("liquid".to_owned(), "correctSpecies"))
        );
        assert!(!calls.contains(&("bed".to_owned(), "correctSpecies")));
        assert!(!calls.iter().any(|(_, hook)| *hook == "correctTurbulence"));
    }

    #[test]
    fn failed_initial_correction_is_a_setup_error() {
        let log = CallLog::default();
        let mut phases = three_phases(&log);
        phases[0] = Box::new(TestPhase::moving("gas", &[0.5]).failing_at("correctKinematics"));

        assert!(matches!(
            build(phases),
            Err(SetupError::InitialCorrection(_))
        ));
    }

    #[test]
    fn dpdt_follows_the_first_phase_pressure() {
        let log = CallLog::default();
        let mut phases = three_phases(&log);
        phases[0] = Box::new(TestPhase::moving("gas", &[0.5]).with_pressure(1.0e5 + 50.0, 1.0e5));
        phases[1] = Box::new(TestPhase::moving("liquid", &[0.3]).with_pressure(9.0e5, 1.0e5));

        let system = build(phases).unwrap();

        assert_relative_eq!(system.dpdt()[0].value, 5000.0, epsilon = 1e-6);
        assert!(!system.incompressible());
    }

    #[test]
    fn dpdt_stays_zero_when_unused() {
        let log = CallLog::default();
        let system = build(three_phases(&log)).unwrap();

        assert_relative_eq!(system.dpdt()[0].value, 0.0);
        assert!(system.incompressible());
    }

    #[test]
    fn sub_model_queries() {
        let log = CallLog::default();
        let system = build(three_phases(&log)).unwrap();

        let sigma = system
            .surface_tension(&PairKey::unordered("liquid", "gas"))
            .unwrap();
        assert_relative_eq!(sigma[0].value, 0.072);

        let undeclared = system
            .surface_tension(&PairKey::unordered("gas", "bed"))
            .unwrap();
        assert_relative_eq!(undeclared[0].value, 0.0);

        let aspect = system.aspect_ratio(&PairKey::ordered("gas", "liquid")).unwrap();
        assert_relative_eq!(aspect[0].get::<ratio>(), 1.0);

        let drag = system
            .drag_coefficient(&PairKey::unordered("gas", "liquid"))
            .unwrap();
        assert_relative_eq!(drag[0].value, 0.0);

        assert_eq!(
            system
                .sub_models::<SurfaceTensionFamily>()
                .map(SubModelRegistry::len),
            Some(1)
        );

        assert!(matches!(
            system.surface_tension(&PairKey::unordered("gas", "steam")),
            Err(StepError::Pair(PairError::UnknownPhase { .. }))
        ));
    }

    #[test]
    fn mass_transfer_is_zero() {
        let log = CallLog::default();
        let mut system = build(three_phases(&log)).unwrap();
        hooks(&log);

        let rate = system
            .mass_transfer_rate(&PairKey::ordered("liquid", "gas"))
            .unwrap();
        assert_relative_eq!(rate[0].value, 0.0);
        assert!(system.mass_transfer_rates().iter().all(Option::is_none));
        assert!(
            system
                .mass_transfer_rate(&PairKey::ordered("liquid", "oil"))
                .is_err()
        );

        system.correct_continuity_error().unwrap();
        assert_eq!(
            hooks(&log),
            [
                ("gas".to_owned(), "correctContinuityError"),
                ("liquid".to_owned(), "correctContinuityError"),
            ]
        );
    }

    #[test]
    fn read_visits_every_phase() {
        let log = CallLog::default();
        let mut phases = three_phases(&log);
        phases[0] = Box::new(TestPhase::moving("gas", &[0.5]).failing_read().with_log(&log));
        let mut system = build(phases).unwrap();
        hooks(&log);

        assert!(!system.read());
        assert_eq!(hooks(&log).len(), 3);
    }

    #[test]
    fn correct_visits_every_phase() {
        let log = CallLog::default();
        let mut system = build(three_phases(&log)).unwrap();
        hooks(&log);

        system.correct().unwrap();
        assert!(hooks(&log).iter().all(|(_, hook)| *hook == "correct"));
    }

    #[test]
    fn no_moving_phase_is_rejected() {
        let phases: Vec<Box<dyn PhaseModel>> = vec![
            Box::new(TestPhase::stationary("gas", &[0.5])),
            Box::new(TestPhase::stationary("liquid", &[0.3])),
            Box::new(TestPhase::stationary("bed", &[0.2])),
        ];
        assert!(matches!(
            build(phases),
            Err(SetupError::Configuration { .. })
        ));
    }

    #[test]
    fn phases_must_match_the_configuration_and_mesh() {
        let log = CallLog::default();
        let mut phases = three_phases(&log);
        phases.swap(0, 1);
        assert!(matches!(
            build(phases),
            Err(SetupError::Configuration { .. })
        ));

        let mut phases = three_phases(&log);
        phases[2] = Box::new(TestPhase::stationary("bed", &[0.2, 0.2]));
        assert!(matches!(
            build(phases),
            Err(SetupError::Configuration { .. })
        ));
    }

    #[test]
    fn ambiguous_models_fail_setup() {
        let log = CallLog::default();
        let config = config().with_model(
            "surfaceTension",
            ModelEntryConfig::new("liquid-gas", "constant").with_parameter("value", 0.05),
        );

        let result = PhaseSystem::builder(config).build(
            three_phases(&log),
            Box::new(face_per_cell(1)),
            &time(),
        );

        assert!(matches!(result, Err(SetupError::AmbiguousModel { .. })));
        assert!(log.borrow().is_empty(), "no step may run");
    }

    #[test]
    fn families_need_a_factory() {
        let log = CallLog::default();
        let config = config().with_model(
            "virtualMass",
            ModelEntryConfig::new("gas-liquid", "constant").with_parameter("value", 0.5),
        );

        let result = PhaseSystem::builder(config).build(
            three_phases(&log),
            Box::new(face_per_cell(1)),
            &time(),
        );
        assert!(matches!(result, Err(SetupError::Configuration { .. })));
    }

    #[test]
    fn custom_factories_replace_builtins() {
        let log = CallLog::default();
        let config = config().with_model(
            "drag",
            ModelEntryConfig::new("gas_to_liquid", "fixed"),
        );
        let factory = ModelFactory::<DragFamily>::empty().with("fixed", |_pair, _parameters| {
            Ok(Box::new(super::super::sub_model::Constant::<DragFamily>::new(
                DragFamily::value_from_si(250.0),
            )))
        });

        let system = PhaseSystem::builder(config)
            .with_factory(factory)
            .build(three_phases(&log), Box::new(face_per_cell(1)), &time())
            .unwrap();

        let drag = system
            .drag_coefficient(&PairKey::ordered("gas", "liquid"))
            .unwrap();
        assert_relative_eq!(drag[0].value, 250.0);

        let reverse = system
            .drag_coefficient(&PairKey::ordered("liquid", "gas"))
            .unwrap();
        assert_relative_eq!(reverse[0].value, 0.0);
        assert!(system.pairs().contains(&PairKey::ordered("gas", "liquid")));
    }
}
