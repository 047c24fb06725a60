//! Error types for setup, pair resolution, mixture aggregation, and stepping.

use std::error::Error as StdError;

use thiserror::Error;

use crate::support::field::FieldError;

use super::{StepStage, config::ParameterError};

/// Result of a per-phase correction hook.
pub type ClosureResult = Result<(), ClosureError>;

/// Errors from resolving phase-pair identities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    /// A pair references a phase identifier that was never registered.
    #[error("unknown phase `{phase}`")]
    UnknownPhase { phase: String },

    /// The same identifier appears twice in the phase list.
    #[error("duplicate phase `{phase}`")]
    DuplicatePhase { phase: String },

    /// A pair names the same phase on both sides.
    #[error("phase `{phase}` cannot be paired with itself")]
    SelfPair { phase: String },

    /// A pair specifier string does not follow `a-b` or `a_to_b`.
    #[error("malformed pair specifier `{specifier}`: {reason}")]
    MalformedSpecifier {
        specifier: String,
        reason: &'static str,
    },
}

/// A failure reported by an external closure (a phase model hook or an
/// interfacial sub-model).
#[derive(Debug, Error)]
#[error("{context}")]
pub struct ClosureError {
    context: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ClosureError {
    /// Creates a closure error with a description and no underlying cause.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a closure error wrapping an underlying cause.
    pub fn with_source(
        context: impl Into<String>,
        err: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            context: context.into(),
            source: Some(Box::new(err)),
        }
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl From<ParameterError> for ClosureError {
    fn from(err: ParameterError) -> Self {
        Self::with_source("invalid model parameters", err)
    }
}

/// Errors raised while building a phase system from configuration.
///
/// All of these are fatal: no simulation step can run until the
/// configuration is fixed.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A pair references an unknown phase, or the phase list is inconsistent.
    #[error(transparent)]
    Pair(PairError),

    /// Several entries of one sub-model family target the same pair without
    /// all of them declaring a blending method.
    #[error("ambiguous {family} models for pair `{pair}`: {count} entries without a common blending method")]
    AmbiguousModel {
        family: &'static str,
        pair: String,
        count: usize,
    },

    /// The configuration is inconsistent or incomplete.
    #[error("configuration error: {context}")]
    Configuration { context: String },

    /// A model factory rejected the parameters of a configured entry.
    #[error("failed to construct {family} model `{model}` for pair `{pair}`")]
    ModelConstruction {
        family: &'static str,
        model: String,
        pair: String,
        #[source]
        source: ClosureError,
    },

    /// The kinematic correction run at the end of setup failed.
    #[error("initial kinematic correction failed")]
    InitialCorrection(#[source] Box<StepError>),
}

impl SetupError {
    pub(crate) fn configuration(context: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
        }
    }
}

/// Malformed specifiers and duplicate phase identifiers are configuration
/// errors; everything else keeps its pair-level identity.
impl From<PairError> for SetupError {
    fn from(err: PairError) -> Self {
        match err {
            PairError::MalformedSpecifier { .. } | PairError::DuplicatePhase { .. } => {
                Self::configuration(err.to_string())
            }
            other => Self::Pair(other),
        }
    }
}

/// Errors from combining per-phase fields into mixture quantities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixtureError {
    #[error("expected {expected} phases, found {found}")]
    PhaseCount { expected: usize, found: usize },

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors raised while stepping the phase system or querying it.
#[derive(Debug, Error)]
pub enum StepError {
    /// A per-phase correction hook failed; the current step is aborted.
    #[error("`{hook}` failed for phase `{phase}`")]
    Closure {
        phase: String,
        hook: &'static str,
        #[source]
        source: ClosureError,
    },

    /// An interfacial sub-model failed to evaluate.
    #[error("{family} model for pair `{pair}` failed")]
    SubModel {
        family: &'static str,
        pair: String,
        #[source]
        source: ClosureError,
    },

    /// Mixture quantities were requested before the step cycle completed.
    #[error("mixture queried during {stage}; complete the step cycle first")]
    StepInProgress { stage: StepStage },

    /// The requested sub-model family was never registered.
    #[error("no {family} models are registered")]
    UnknownFamily { family: &'static str },

    #[error(transparent)]
    Pair(#[from] PairError),

    #[error(transparent)]
    Mixture(#[from] MixtureError),

    #[error(transparent)]
    Field(#[from] FieldError),
}
