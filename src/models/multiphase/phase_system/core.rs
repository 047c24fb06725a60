mod blending;
mod config;
mod error;
mod mixture;
mod pair;
mod pair_registry;
mod phase;
mod sub_model;
mod system;

#[cfg(test)]
mod test_support;

pub use blending::{
    BlendRole, BlendWeights, BlendingConfig, BlendingMethod, BlendingMethods, Hyperbolic, Linear,
    NoBlending, Step,
};
pub use config::{ConfigError, ModelEntryConfig, ParameterError, Parameters, PhaseSystemConfig};
pub use error::{ClosureError, ClosureResult, MixtureError, PairError, SetupError, StepError};
pub use mixture::{MixtureAggregator, MixtureSnapshot};
pub use pair::{PairDescriptor, PairKey};
pub use pair_registry::PairRegistry;
pub use phase::{
    AsPhaseFields, Ensemble, PhaseFields, PhaseFlags, PhaseGroups, PhaseModel, PhaseState,
};
pub use sub_model::{
    AspectRatioFamily, Constant, DragFamily, InterfacialModel, ModelConstructor, ModelFactory,
    ModelFamily, SubModelRegistry, SurfaceTensionFamily,
};
pub use system::{PhaseSystem, PhaseSystemBuilder, StepStage};
