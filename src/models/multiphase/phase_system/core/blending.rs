//! Fraction-dependent blending of interfacial models.
//!
//! A pair of phases `a` and `b` can carry up to three candidate models of one
//! family: `a` dispersed in `b` (declared as `a_to_b`), `b` dispersed in `a`
//! (`b_to_a`), and a segregated model for the fully mixed regime (`a-b`).
//! A [`BlendingMethod`] supplies the local weight of each dispersed model from
//! the volume fractions; the segregated model takes the remainder, so the
//! three weights always sum to one.
//!
//! # Methods
//!
//! | `type`       | Functional form                                          |
//! |--------------|----------------------------------------------------------|
//! | `none`       | Fixed: one named phase is always continuous              |
//! | `step`       | Sharp switch when `α_continuous` reaches a threshold     |
//! | `linear`     | Linear ramp between partly and fully continuous fractions|
//! | `hyperbolic` | Smooth `tanh` transition around a continuous fraction    |

mod hyperbolic;
mod linear;
mod no_blending;
mod step;

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::Deserialize;

use crate::support::{
    constraint::{Constrained, StrictlyPositive, UnitInterval},
    field::{FieldError, VolField},
};

use super::{
    error::SetupError,
    pair::{PairDescriptor, PairKey},
    pair_registry::PairRegistry,
    phase::Ensemble,
};

pub use hyperbolic::Hyperbolic;
pub use linear::Linear;
pub use no_blending::NoBlending;
pub use step::Step;

/// Strategy producing the local weight of a dispersed-phase model.
///
/// Implementations must return finite values in `[0, 1]` that reach one when
/// the continuous phase fills the cell and zero when it is absent.
/// Phases are identified by their registration index.
pub trait BlendingMethod: fmt::Debug + Send + Sync {
    /// Weight of the model describing `dispersed` dispersed in `continuous`.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if the volume fraction fields are inconsistent.
    fn dispersed_weight(
        &self,
        dispersed: usize,
        continuous: usize,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<f64>, FieldError>;
}

/// Which regime a candidate model describes, relative to its pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendRole {
    /// The first phase of the pair dispersed in the second.
    FirstDispersed,
    /// The second phase of the pair dispersed in the first.
    SecondDispersed,
    /// Neither phase dispersed.
    Segregated,
}

impl BlendRole {
    /// Role of a model declared under `entry`, on the unordered pair `pair`.
    ///
    /// An ordered entry `a_to_b` describes `a` dispersed in `b`.
    #[must_use]
    pub fn of(entry: &PairKey, pair: &PairDescriptor) -> Self {
        if !entry.is_ordered() {
            Self::Segregated
        } else if entry.first() == pair.key().first() {
            Self::FirstDispersed
        } else {
            Self::SecondDispersed
        }
    }
}

/// Local weights of the three candidate regimes of one pair.
///
/// In every cell the weights are non-negative and sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendWeights {
    pub first_dispersed: VolField<f64>,
    pub second_dispersed: VolField<f64>,
    pub segregated: VolField<f64>,
}

impl BlendWeights {
    /// Computes the weights for `pair` with `method`.
    ///
    /// Dispersed weights are clamped to `[0, 1]` (non-finite values count as
    /// zero) and scaled down together if their sum exceeds one.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if the method's fields are inconsistent.
    pub fn compute(
        method: &dyn BlendingMethod,
        pair: &PairDescriptor,
        ensemble: &Ensemble<'_>,
    ) -> Result<Self, FieldError> {
        let f1 = method.dispersed_weight(pair.first(), pair.second(), ensemble)?;
        let f2 = method.dispersed_weight(pair.second(), pair.first(), ensemble)?;
        f1.check_len(ensemble.n_cells())?;
        f2.check_len(f1.len())?;

        let (mut first, mut second, mut segregated) = (
            Vec::with_capacity(f1.len()),
            Vec::with_capacity(f1.len()),
            Vec::with_capacity(f1.len()),
        );
        for (&a, &b) in f1.iter().zip(f2.iter()) {
            let (a, b) = (sanitize(a), sanitize(b));
            let (a, b) = if a + b > 1.0 {
                (a / (a + b), b / (a + b))
            } else {
                (a, b)
            };
            first.push(a);
            second.push(b);
            segregated.push((1.0 - a - b).max(0.0));
        }

        Ok(Self {
            first_dispersed: VolField::new(first),
            second_dispersed: VolField::new(second),
            segregated: VolField::new(segregated),
        })
    }

    /// The weight field for `role`.
    #[must_use]
    pub fn weight(&self, role: BlendRole) -> &VolField<f64> {
        match role {
            BlendRole::FirstDispersed => &self.first_dispersed,
            BlendRole::SecondDispersed => &self.second_dispersed,
            BlendRole::Segregated => &self.segregated,
        }
    }
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Named blending methods, selected by sub-model entries.
#[derive(Debug, Clone, Default)]
pub struct BlendingMethods {
    methods: BTreeMap<String, Arc<dyn BlendingMethod>>,
}

impl BlendingMethods {
    /// Builds every configured method.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] if a method references an unknown phase, omits
    /// a phase, or carries invalid parameters.
    pub fn from_config(
        config: &BTreeMap<String, BlendingConfig>,
        pairs: &PairRegistry,
    ) -> Result<Self, SetupError> {
        let mut methods = Self::default();
        for (name, method) in config {
            let method = method.build(pairs).map_err(|err| match err {
                SetupError::Configuration { context } => SetupError::configuration(format!(
                    "blending method `{name}`: {context}"
                )),
                other => other,
            })?;
            methods.insert(name.clone(), method);
        }
        Ok(methods)
    }

    /// Adds or replaces a method.
    pub fn insert(&mut self, name: impl Into<String>, method: Arc<dyn BlendingMethod>) {
        self.methods.insert(name.into(), method);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn BlendingMethod>> {
        self.methods.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Configuration of one blending method, tagged by `type`.
///
/// Per-phase parameters are maps from phase identifier to value and must
/// cover every registered phase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlendingConfig {
    /// No blending: `continuous_phase` is always the continuous one.
    #[serde(rename_all = "camelCase")]
    None { continuous_phase: String },

    /// Sharp switch at `min_continuous_alpha`.
    #[serde(rename_all = "camelCase")]
    Step {
        min_continuous_alpha: BTreeMap<String, f64>,
    },

    /// Linear ramp from `min_partly_continuous_alpha` to
    /// `min_fully_continuous_alpha`.
    #[serde(rename_all = "camelCase")]
    Linear {
        min_fully_continuous_alpha: BTreeMap<String, f64>,
        min_partly_continuous_alpha: BTreeMap<String, f64>,
    },

    /// Hyperbolic tangent transition centred on `min_continuous_alpha`.
    #[serde(rename_all = "camelCase")]
    Hyperbolic {
        min_continuous_alpha: BTreeMap<String, f64>,
        transition_alpha_scale: f64,
    },
}

impl BlendingConfig {
    /// Builds the configured method against the registered phases.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] on unknown or missing phases and on
    /// parameters outside their valid range.
    pub fn build(&self, pairs: &PairRegistry) -> Result<Arc<dyn BlendingMethod>, SetupError> {
        let method: Arc<dyn BlendingMethod> = match self {
            Self::None { continuous_phase } => {
                Arc::new(NoBlending::new(pairs.phase_index(continuous_phase)?))
            }
            Self::Step {
                min_continuous_alpha,
            } => Arc::new(Step::new(per_phase_fractions(
                pairs,
                "minContinuousAlpha",
                min_continuous_alpha,
            )?)),
            Self::Linear {
                min_fully_continuous_alpha,
                min_partly_continuous_alpha,
            } => Arc::new(Linear::new(
                per_phase_fractions(pairs, "minFullyContinuousAlpha", min_fully_continuous_alpha)?,
                per_phase_fractions(
                    pairs,
                    "minPartlyContinuousAlpha",
                    min_partly_continuous_alpha,
                )?,
            )?),
            Self::Hyperbolic {
                min_continuous_alpha,
                transition_alpha_scale,
            } => {
                let scale: Constrained<f64, StrictlyPositive> =
                    StrictlyPositive::new(*transition_alpha_scale).map_err(|err| {
                        SetupError::configuration(format!("transitionAlphaScale: {err}"))
                    })?;
                Arc::new(Hyperbolic::new(
                    per_phase_fractions(pairs, "minContinuousAlpha", min_continuous_alpha)?,
                    scale,
                ))
            }
        };
        Ok(method)
    }
}

/// Resolves a per-phase parameter map into a vector indexed by phase.
fn per_phase_fractions(
    pairs: &PairRegistry,
    parameter: &str,
    values: &BTreeMap<String, f64>,
) -> Result<Vec<Constrained<f64, UnitInterval>>, SetupError> {
    for phase in values.keys() {
        pairs.phase_index(phase)?;
    }

    pairs
        .phase_names()
        .iter()
        .map(|phase| {
            let value = values.get(phase).ok_or_else(|| {
                SetupError::configuration(format!("{parameter} missing for phase `{phase}`"))
            })?;
            UnitInterval::new(*value).map_err(|err| {
                SetupError::configuration(format!("{parameter} for phase `{phase}`: {err}"))
            })
        })
        .collect()
}
