//! Per-pair tables of interfacial sub-models.
//!
//! A [`ModelFamily`] names one kind of interfacial quantity (surface tension,
//! aspect ratio, drag) and its neutral value.
//! A [`SubModelRegistry`] holds, for every pair that declares one, the models
//! of that family together with the blending method that combines them.
//! Pairs without any declared model evaluate to the family's neutral value.

mod families;

use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use crate::support::field::{FieldValue, VolField};

use super::{
    blending::{BlendRole, BlendWeights, BlendingMethod, BlendingMethods},
    config::{ModelEntryConfig, Parameters},
    error::{ClosureError, MixtureError, SetupError, StepError},
    pair::{PairDescriptor, PairKey},
    pair_registry::PairRegistry,
    phase::Ensemble,
};

pub use families::{AspectRatioFamily, Constant, DragFamily, SurfaceTensionFamily};

/// A kind of interfacial quantity.
pub trait ModelFamily: Send + Sync + 'static {
    /// Value type of the family's fields.
    type Value: FieldValue + fmt::Debug + Send + Sync;

    /// Name of the family's table in configuration.
    const NAME: &'static str;

    /// Value used for pairs that declare no model.
    fn neutral() -> Self::Value;

    /// Converts a plain number in SI units into a family value.
    fn value_from_si(value: f64) -> Self::Value;
}

/// An interfacial closure evaluated for one pair.
pub trait InterfacialModel<F: ModelFamily>: Send + Sync {
    /// Evaluates the model in every cell.
    ///
    /// # Errors
    ///
    /// Returns a [`ClosureError`] if the closure cannot be evaluated.
    fn evaluate(
        &self,
        pair: &PairDescriptor,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<F::Value>, ClosureError>;
}

/// Boxed constructor for one model type of family `F`.
pub type ModelConstructor<F> = Box<
    dyn Fn(&PairDescriptor, &Parameters) -> Result<Box<dyn InterfacialModel<F>>, ClosureError>
        + Send
        + Sync,
>;

/// Model types of one family, by configuration name.
///
/// Built once and passed to the registry that needs it.
pub struct ModelFactory<F: ModelFamily> {
    constructors: BTreeMap<String, ModelConstructor<F>>,
}

impl<F: ModelFamily> ModelFactory<F> {
    /// Creates a factory with no model types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Creates a factory with the built-in `constant` model.
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::empty().with("constant", |_pair, parameters| {
            Ok(Box::new(Constant::<F>::from_parameters(parameters)?))
        })
    }

    /// Registers a model type, replacing any existing one with the same name.
    #[must_use]
    pub fn with<C>(mut self, name: impl Into<String>, constructor: C) -> Self
    where
        C: Fn(&PairDescriptor, &Parameters) -> Result<Box<dyn InterfacialModel<F>>, ClosureError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Constructs a model of type `name`, or `None` if the type is unknown.
    fn construct(
        &self,
        name: &str,
        pair: &PairDescriptor,
        parameters: &Parameters,
    ) -> Option<Result<Box<dyn InterfacialModel<F>>, ClosureError>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor(pair, parameters))
    }
}

impl<F: ModelFamily> Default for ModelFactory<F> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<F: ModelFamily> fmt::Debug for ModelFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("family", &F::NAME)
            .field("models", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct ModelSlot<F: ModelFamily> {
    role: BlendRole,
    key: PairKey,
    model: Box<dyn InterfacialModel<F>>,
}

/// A declared ordered or unordered pair with its model, or an unordered pair
/// whose several regime models are combined through a blending method.
struct ModelGroup<F: ModelFamily> {
    pair: PairDescriptor,
    slots: Vec<ModelSlot<F>>,
    blending: Option<Arc<dyn BlendingMethod>>,
}

/// The models of family `F` declared for each pair.
///
/// An unblended model answers only for the exact key it was declared under,
/// so `a_to_b` and `b_to_a` are distinct pairs.
/// Models declared with a blending method are grouped by unordered pair, one
/// per regime: `a_to_b` (a dispersed in b), `b_to_a`, and the segregated
/// `a-b`. Such a group answers for the unordered pair and both orderings.
/// A single model is returned as is.
pub struct SubModelRegistry<F: ModelFamily> {
    groups: Vec<ModelGroup<F>>,
    lookup: HashMap<PairKey, usize>,
    n_phases: usize,
}

/// Entries sharing one unordered pair, in declaration order.
type Declared<'c> = Vec<(PairKey, Vec<(PairKey, &'c ModelEntryConfig)>)>;

impl<F: ModelFamily> SubModelRegistry<F> {
    /// A registry with no models: every pair evaluates to the neutral value.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            lookup: HashMap::new(),
            n_phases: 0,
        }
    }

    /// Builds the registry from the configured entries of family `F`.
    ///
    /// Every entry is validated and constructed before `pairs` is touched, so
    /// a failure leaves the pair registry unchanged.
    /// On success, the pair of every entry and of every blended group is
    /// generated in `pairs`.
    ///
    /// # Errors
    ///
    /// - [`SetupError::Pair`] if an entry references an unknown phase.
    /// - [`SetupError::AmbiguousModel`] if two unblended entries share a key,
    ///   blended and unblended entries mix on one pair, or two blended
    ///   entries describe the same regime.
    /// - [`SetupError::Configuration`] for malformed specifiers, unknown model
    ///   types, and unknown or conflicting blending methods.
    /// - [`SetupError::ModelConstruction`] if a constructor rejects its
    ///   parameters.
    pub fn build(
        entries: &[ModelEntryConfig],
        factory: &ModelFactory<F>,
        blending: &BlendingMethods,
        pairs: &mut PairRegistry,
    ) -> Result<Self, SetupError> {
        let mut declared: Declared<'_> = Vec::new();
        let mut index: HashMap<PairKey, usize> = HashMap::new();
        for entry in entries {
            let key = PairKey::parse(&entry.pair)?;
            pairs.resolve(&key)?;

            let group = key.to_unordered();
            let slot = *index.entry(group.clone()).or_insert_with(|| {
                declared.push((group, Vec::new()));
                declared.len() - 1
            });
            declared[slot].1.push((key, entry));
        }

        let mut groups = Vec::new();
        let mut generated: Vec<PairKey> = Vec::new();
        for (group_key, members) in &declared {
            match Self::group_blending(group_key, members, blending)? {
                Some(method) => {
                    let pair = pairs.describe(group_key)?;
                    let slots = members
                        .iter()
                        .map(|(key, entry)| {
                            Self::construct(factory, pairs, key, entry).map(|model| ModelSlot {
                                role: BlendRole::of(key, &pair),
                                key: key.clone(),
                                model,
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    generated.push(group_key.clone());
                    generated.extend(members.iter().map(|(key, _)| key.clone()));
                    groups.push(ModelGroup {
                        pair,
                        slots,
                        blending: Some(method),
                    });
                }
                None => {
                    for (key, entry) in members {
                        let pair = pairs.describe(key)?;
                        let model = Self::construct(factory, pairs, key, entry)?;
                        generated.push(key.clone());
                        groups.push(ModelGroup {
                            slots: vec![ModelSlot {
                                role: BlendRole::Segregated,
                                key: key.clone(),
                                model,
                            }],
                            pair,
                            blending: None,
                        });
                    }
                }
            }
        }

        for group in &groups {
            log::debug!(
                "{} models for `{}`: {}",
                F::NAME,
                group.pair.name(),
                group
                    .slots
                    .iter()
                    .map(|slot| slot.key.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        pairs.generate_pairs(&generated)?;

        let mut lookup = HashMap::with_capacity(groups.len());
        for (slot, group) in groups.iter().enumerate() {
            let key = group.pair.key();
            lookup.insert(key.clone(), slot);
            if group.blending.is_some() {
                lookup.insert(PairKey::ordered(key.first(), key.second()), slot);
                lookup.insert(PairKey::ordered(key.second(), key.first()), slot);
            }
        }

        Ok(Self {
            groups,
            lookup,
            n_phases: pairs.phase_names().len(),
        })
    }

    fn construct(
        factory: &ModelFactory<F>,
        pairs: &PairRegistry,
        key: &PairKey,
        entry: &ModelEntryConfig,
    ) -> Result<Box<dyn InterfacialModel<F>>, SetupError> {
        let descriptor = pairs.describe(key)?;
        factory
            .construct(&entry.model, &descriptor, &entry.parameters)
            .ok_or_else(|| {
                SetupError::configuration(format!(
                    "unknown {} model type `{}` for pair `{key}`",
                    F::NAME,
                    entry.model
                ))
            })?
            .map_err(|source| SetupError::ModelConstruction {
                family: F::NAME,
                model: entry.model.clone(),
                pair: key.to_string(),
                source,
            })
    }

    /// Checks the blending declarations of the entries on one unordered pair
    /// and returns the method that combines them, if there are several
    /// blended entries.
    fn group_blending(
        group: &PairKey,
        members: &[(PairKey, &ModelEntryConfig)],
        blending: &BlendingMethods,
    ) -> Result<Option<Arc<dyn BlendingMethod>>, SetupError> {
        let ambiguous = |count| SetupError::AmbiguousModel {
            family: F::NAME,
            pair: group.to_string(),
            count,
        };

        for (i, (key, _)) in members.iter().enumerate() {
            let count = members.iter().filter(|(other, _)| other == key).count();
            if count > 1 && !members[..i].iter().any(|(other, _)| other == key) {
                return Err(ambiguous(count));
            }
        }

        let blended = members
            .iter()
            .filter(|(_, entry)| entry.blending.is_some())
            .count();
        if blended > 0 && blended < members.len() {
            return Err(ambiguous(members.len()));
        }

        let mut names = members
            .iter()
            .filter_map(|(_, entry)| entry.blending.as_deref());
        let Some(name) = names.next() else {
            return Ok(None);
        };
        if let Some(other) = names.find(|other| *other != name) {
            return Err(SetupError::configuration(format!(
                "{} models for pair `{group}` use different blending methods `{name}` and `{other}`",
                F::NAME
            )));
        }

        let method = blending.get(name).cloned().ok_or_else(|| {
            SetupError::configuration(format!(
                "{} models for pair `{group}` reference unknown blending method `{name}`",
                F::NAME
            ))
        })?;

        Ok((members.len() > 1).then_some(method))
    }

    /// Evaluates the effective model for the pair `key`.
    ///
    /// Unblended models answer only for their exact key. Blended groups
    /// answer for either ordering as well as the unordered pair.
    /// Returns the neutral value in every cell if the pair declares no model,
    /// the single model's value if it declares one, and otherwise the blended
    /// combination of its models, with missing regimes contributing the
    /// neutral value.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Mixture`] if `ensemble` does not hold one phase
    /// per registered phase, [`StepError::SubModel`] if a model fails to
    /// evaluate, or [`StepError::Field`] if its result has the wrong size.
    pub fn model_for(
        &self,
        key: &PairKey,
        ensemble: &Ensemble<'_>,
    ) -> Result<VolField<F::Value>, StepError> {
        let n_cells = ensemble.n_cells();
        let Some(group) = self.lookup.get(key).map(|&slot| &self.groups[slot]) else {
            return Ok(VolField::uniform(n_cells, F::neutral()));
        };

        if ensemble.len() != self.n_phases {
            return Err(MixtureError::PhaseCount {
                expected: self.n_phases,
                found: ensemble.len(),
            }
            .into());
        }

        let evaluate = |slot: &ModelSlot<F>| -> Result<VolField<F::Value>, StepError> {
            let value = slot
                .model
                .evaluate(&group.pair, ensemble)
                .map_err(|source| StepError::SubModel {
                    family: F::NAME,
                    pair: slot.key.to_string(),
                    source,
                })?;
            value.check_len(n_cells)?;
            Ok(value)
        };

        match &group.blending {
            Some(method) => Self::blend(group, method.as_ref(), ensemble, evaluate),
            None => match group.slots.first() {
                Some(slot) => evaluate(slot),
                None => Ok(VolField::uniform(n_cells, F::neutral())),
            },
        }
    }

    fn blend(
        group: &ModelGroup<F>,
        method: &dyn BlendingMethod,
        ensemble: &Ensemble<'_>,
        evaluate: impl Fn(&ModelSlot<F>) -> Result<VolField<F::Value>, StepError>,
    ) -> Result<VolField<F::Value>, StepError> {
        let n_cells = ensemble.n_cells();
        let weights = BlendWeights::compute(method, &group.pair, ensemble)?;

        let mut result = VolField::zeros(n_cells);
        for role in [
            BlendRole::FirstDispersed,
            BlendRole::SecondDispersed,
            BlendRole::Segregated,
        ] {
            let value = match group.slots.iter().find(|slot| slot.role == role) {
                Some(slot) => evaluate(slot)?,
                None => VolField::uniform(n_cells, F::neutral()),
            };
            result.accumulate_weighted(&value, weights.weight(role))?;
        }
        Ok(result)
    }

    /// True if a model answers for the pair `key`.
    #[must_use]
    pub fn contains(&self, key: &PairKey) -> bool {
        self.lookup.contains_key(key)
    }

    /// Number of models declared for the pair `key`.
    #[must_use]
    pub fn model_count(&self, key: &PairKey) -> usize {
        self.lookup
            .get(key)
            .map_or(0, |&slot| self.groups[slot].slots.len())
    }

    /// Pairs with at least one model, in declaration order.
    pub fn pairs(&self) -> impl Iterator<Item = &PairDescriptor> {
        self.groups.iter().map(|group| &group.pair)
    }

    /// Number of pairs with at least one model.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<F: ModelFamily> Default for SubModelRegistry<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: ModelFamily> fmt::Debug for SubModelRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubModelRegistry")
            .field("family", &F::NAME)
            .field(
                "pairs",
                &self.groups.iter().map(|g| g.pair.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
