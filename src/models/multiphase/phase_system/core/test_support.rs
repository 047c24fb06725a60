//! Scriptable phases and closures for unit tests.

use std::{cell::RefCell, rc::Rc};

use uom::si::{
    f64::{MassDensity, Pressure, Velocity, VolumeRate},
    mass_density::kilogram_per_cubic_meter,
    pressure::pascal,
    velocity::meter_per_second,
    volume_rate::cubic_meter_per_second,
};

use crate::support::{
    field::{FaceAddressing, SurfaceField, Vector, VolField},
    units::MassTransferRate,
};

use super::{
    error::{ClosureError, ClosureResult},
    pair::PairDescriptor,
    phase::{Ensemble, PhaseFields, PhaseFlags, PhaseModel},
    sub_model::{InterfacialModel, ModelFamily},
};

/// Shared record of `(phase, hook)` calls, in call order.
pub(crate) type CallLog = Rc<RefCell<Vec<(String, &'static str)>>>;

/// A phase with uniform fields whose hooks record their calls.
pub(crate) struct TestPhase {
    name: String,
    flags: PhaseFlags,
    alpha: VolField<f64>,
    velocity: VolField<Vector<Velocity>>,
    density: VolField<MassDensity>,
    flux: SurfaceField<VolumeRate>,
    pressure: VolField<Pressure>,
    pressure_old: VolField<Pressure>,
    incompressible: bool,
    uses_pressure_rate: bool,
    read_ok: bool,
    fail_at: Option<&'static str>,
    log: CallLog,
}

impl TestPhase {
    /// A moving phase with the given volume fractions and one face per cell.
    pub(crate) fn moving(name: &str, alpha: &[f64]) -> Self {
        let n = alpha.len();
        Self {
            name: name.to_owned(),
            flags: PhaseFlags::moving(),
            alpha: VolField::new(alpha.to_vec()),
            velocity: VolField::zeros(n),
            density: VolField::uniform(n, MassDensity::new::<kilogram_per_cubic_meter>(1.0)),
            flux: SurfaceField::zeros(n),
            pressure: VolField::uniform(n, Pressure::new::<pascal>(1.0e5)),
            pressure_old: VolField::uniform(n, Pressure::new::<pascal>(1.0e5)),
            incompressible: true,
            uses_pressure_rate: false,
            read_ok: true,
            fail_at: None,
            log: CallLog::default(),
        }
    }

    pub(crate) fn stationary(name: &str, alpha: &[f64]) -> Self {
        Self::moving(name, alpha).with_flags(PhaseFlags::stationary())
    }

    pub(crate) fn with_flags(self, flags: PhaseFlags) -> Self {
        Self { flags, ..self }
    }

    /// Uniform velocity along x, in m/s.
    pub(crate) fn with_velocity(self, u: f64) -> Self {
        let u = Vector::new(
            Velocity::new::<meter_per_second>(u),
            Velocity::new::<meter_per_second>(0.0),
            Velocity::new::<meter_per_second>(0.0),
        );
        Self {
            velocity: VolField::uniform(self.alpha.len(), u),
            ..self
        }
    }

    /// Uniform density, in kg/m³.
    pub(crate) fn with_density(self, rho: f64) -> Self {
        Self {
            density: VolField::uniform(
                self.alpha.len(),
                MassDensity::new::<kilogram_per_cubic_meter>(rho),
            ),
            ..self
        }
    }

    /// Uniform face flux, in m³/s.
    pub(crate) fn with_flux(self, phi: f64) -> Self {
        Self {
            flux: SurfaceField::uniform(
                self.flux.len(),
                VolumeRate::new::<cubic_meter_per_second>(phi),
            ),
            ..self
        }
    }

    /// Uniform current and previous pressures, in Pa; the phase then
    /// reports compressible thermo that needs `dp/dt`.
    pub(crate) fn with_pressure(self, current: f64, old: f64) -> Self {
        let n = self.alpha.len();
        Self {
            pressure: VolField::uniform(n, Pressure::new::<pascal>(current)),
            pressure_old: VolField::uniform(n, Pressure::new::<pascal>(old)),
            incompressible: false,
            uses_pressure_rate: true,
            ..self
        }
    }

    /// Makes the named hook fail.
    pub(crate) fn failing_at(self, hook: &'static str) -> Self {
        Self {
            fail_at: Some(hook),
            ..self
        }
    }

    pub(crate) fn failing_read(self) -> Self {
        Self {
            read_ok: false,
            ..self
        }
    }

    pub(crate) fn with_log(self, log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            ..self
        }
    }

    fn hook(&self, hook: &'static str) -> ClosureResult {
        self.log.borrow_mut().push((self.name.clone(), hook));
        if self.fail_at == Some(hook) {
            Err(ClosureError::new(format!("{hook} diverged")))
        } else {
            Ok(())
        }
    }
}

impl PhaseFields for TestPhase {
    fn name(&self) -> &str {
        &self.name
    }

    fn volume_fraction(&self) -> &VolField<f64> {
        &self.alpha
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

impl PhaseModel for TestPhase {
    fn flags(&self) -> PhaseFlags {
        self.flags
    }

    fn incompressible(&self) -> bool {
        self.incompressible
    }

    fn uses_pressure_rate(&self) -> bool {
        self.uses_pressure_rate
    }

    fn pressure(&self) -> &VolField<Pressure> {
        &self.pressure
    }

    fn pressure_old(&self) -> &VolField<Pressure> {
        &self.pressure_old
    }

    fn correct(&mut self) -> ClosureResult {
        self.hook("correct")
    }

    fn correct_kinematics(&mut self) -> ClosureResult {
        self.hook("correctKinematics")
    }

    fn correct_thermo(&mut self) -> ClosureResult {
        self.hook("correctThermo")
    }

    fn correct_reactions(&mut self) -> ClosureResult {
        self.hook("correctReactions")
    }

    fn correct_species(&mut self) -> ClosureResult {
        self.hook("correctSpecies")
    }

    fn correct_turbulence(&mut self) -> ClosureResult {
        self.hook("correctTurbulence")
    }

    fn correct_energy_transport(&mut self) -> ClosureResult {
        self.hook("correctEnergyTransport")
    }

    fn correct_continuity_error(&mut self, source: &VolField<MassTransferRate>) -> ClosureResult {
        if source.iter().any(|rate| rate.value != 0.0) {
            return Err(ClosureError::new("unexpected interfacial mass source"));
        }
        self.hook("correctContinuityError")
    }

    fn read(&mut self) -> bool {
        self.log.borrow_mut().push((self.name.clone(), "read"));
        self.read_ok
    }
}

/// Borrows test phases as an ensemble.
pub(crate) fn ensemble_of(phases: &[TestPhase]) -> Ensemble<'_> {
    phases
        .iter()
        .map(|phase| phase as &dyn PhaseFields)
        .collect()
}

/// Face addressing with one boundary face per cell.
pub(crate) fn face_per_cell(n_cells: usize) -> FaceAddressing {
    FaceAddressing::new(
        n_cells,
        (0..n_cells).collect(),
        vec![None; n_cells],
        vec![1.0; n_cells],
    )
    .expect("valid addressing")
}

/// An interfacial model that always fails.
pub(crate) struct FailingModel;

impl<F: ModelFamily> InterfacialModel<F> for FailingModel {
    fn evaluate(
        &self,
        _pair: &PairDescriptor,
        _ensemble: &Ensemble<'_>,
    ) -> Result<VolField<F::Value>, ClosureError> {
        Err(ClosureError::new("correlation out of range"))
    }
}
