use std::{fmt, marker::PhantomData};

use uom::si::{f64::Ratio, ratio::ratio};

use crate::support::{
    field::VolField,
    units::{DragCoefficient, SurfaceTension, from_si},
};

use super::{
    super::{config::Parameters, error::ClosureError, pair::PairDescriptor, phase::Ensemble},
    InterfacialModel, ModelFamily,
};

/// Surface tension between two phases; zero when no model is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTensionFamily;

impl ModelFamily for SurfaceTensionFamily {
    type Value = SurfaceTension;
    const NAME: &'static str = "surfaceTension";

    fn neutral() -> SurfaceTension {
        from_si(0.0)
    }

    fn value_from_si(value: f64) -> SurfaceTension {
        from_si(value)
    }
}

/// Aspect ratio of dispersed particles; spherical (one) when no model is
/// declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatioFamily;

impl ModelFamily for AspectRatioFamily {
    type Value = Ratio;
    const NAME: &'static str = "aspectRatio";

    fn neutral() -> Ratio {
        Ratio::new::<ratio>(1.0)
    }

    fn value_from_si(value: f64) -> Ratio {
        Ratio::new::<ratio>(value)
    }
}

/// Interphase momentum exchange coefficient; zero when no model is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragFamily;

impl ModelFamily for DragFamily {
    type Value = DragCoefficient;
    const NAME: &'static str = "drag";

    fn neutral() -> DragCoefficient {
        from_si(0.0)
    }

    fn value_from_si(value: f64) -> DragCoefficient {
        from_si(value)
    }
}

/// A uniform value, read from the `value` parameter in SI units.
pub struct Constant<F: ModelFamily> {
    value: F::Value,
    _family: PhantomData<F>,
}

impl<F: ModelFamily> Constant<F> {
    #[must_use]
    pub fn new(value: F::Value) -> Self {
        Self {
            value,
            _family: PhantomData,
        }
    }

    /// Builds the model from entry parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`] if `value` is missing, not a number, or not
    /// finite.
    pub fn from_parameters(parameters: &Parameters) -> Result<Self, ClosureError> {
        let value = parameters.get_f64("value")?;
        if !value.is_finite() {
            return Err(ClosureError::new(format!(
                "constant {} value must be finite",
                F::NAME
            )));
        }
        Ok(Self::new(F::value_from_si(value)))
    }

    #[must_use]
    pub fn value(&self) -> F::Value {
        self.value
    }
}

impl<F: ModelFamily> fmt::Debug for Constant<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constant")
            .field("family", &F::NAME)
            .field("value", &self.value)
            .finish()
    }
}

impl<F: ModelFamily> InterfacialModel<F> for Constant<F> {
    fn evaluate(
        &self,
        _pair: &PairDescriptor,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<F::Value>, ClosureError> {
        Ok(VolField::uniform(ensemble.n_cells(), self.value))
    }
}
