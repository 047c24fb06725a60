use uom::{
    si::{ISQ, Quantity, SI},
    typenum::{N1, N2, N3, P1, Z0},
};

/// Time rate of change of pressure, Pa/s in SI.
pub type PressureRate = Quantity<ISQ<N1, P1, N3, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Interfacial mass transfer rate per unit volume, kg/m³·s in SI.
pub type MassTransferRate = Quantity<ISQ<N3, P1, N1, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Surface tension, N/m in SI.
pub type SurfaceTension = Quantity<ISQ<Z0, P1, N2, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Momentum exchange coefficient used by drag closures, kg/m³·s in SI.
pub type DragCoefficient = Quantity<ISQ<N3, P1, N1, Z0, Z0, Z0, Z0>, SI<f64>, f64>;
