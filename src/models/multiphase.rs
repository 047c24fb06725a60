//! Multiphase models.
//!
//! This module contains models for ensembles of coexisting phases that share
//! one spatial domain.

pub mod phase_system;
