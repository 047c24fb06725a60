//! Public Twine models.
//!
//! # Model structure
//!
//! Each model lives in its own module and contains an internal `core`
//! submodule where the computation and domain logic live.
//! The model module re-exports the parts of `core` callers need and adds the
//! [`twine_core::Model`] adapters.

pub mod multiphase;
