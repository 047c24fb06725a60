//! Extensions to [`uom`].
//!
//! This crate uses [`uom`] for all physical quantities carried by fields.
//! Quantities that appear in multiphase coupling but have no named type in
//! [`uom`] are declared here as dimension aliases.
//!
//! Values of these aliases are usually produced by arithmetic on named
//! quantities (for example `Pressure / Time`), or constructed from SI base
//! values with [`from_si`]:
//!
//! ```
//! use twine_multiphase::support::units::{SurfaceTension, from_si};
//! use uom::si::{f64::{Force, Length}, force::newton, length::meter};
//!
//! let sigma: SurfaceTension = Force::new::<newton>(0.072) / Length::new::<meter>(1.0);
//! assert_eq!(sigma, from_si(0.072));
//! ```

mod quantities;

use std::marker::PhantomData;

use uom::si::{Dimension, Quantity, SI};

pub use quantities::{DragCoefficient, MassTransferRate, PressureRate, SurfaceTension};

/// Constructs a quantity from its value in SI base units.
#[must_use]
pub fn from_si<D>(value: f64) -> Quantity<D, SI<f64>, f64>
where
    D: Dimension + ?Sized,
{
    Quantity {
        dimension: PhantomData,
        units: PhantomData,
        value,
    }
}
