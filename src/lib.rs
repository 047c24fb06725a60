//! # Twine Multiphase
//!
//! Multiphase ensemble coordination for
//! [Twine](https://github.com/isentropic-dev/twine).
//!
//! Several material phases share one spatial domain.
//! This crate owns the bookkeeping that couples them: phase-pair identities,
//! per-pair interfacial sub-model tables with fraction-dependent blending,
//! volume-fraction-weighted mixture properties, and the per-phase correction
//! cycle.
//! Physical closures, meshes, and transport solvers are external collaborators
//! reached through narrow traits.
//!
//! ## Crate layout
//!
//! - [`models`]: Domain-specific models, including the phase system and its
//!   [`twine_core::Model`] mixture adapter.
//! - [`support`]: Fields, units, constraints, and time-step utilities used by
//!   models.
//!
//! Only utilities at the crate level (in [`support`]) and the re-exports of
//! each model module are part of the public API.

pub mod models;
pub mod support;
