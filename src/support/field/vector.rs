use std::ops::{Add, Div, Mul, Sub};

use num_traits::Zero;

/// A three-component vector of quantities.
///
/// Velocity fields store `Vector<Velocity>` per cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vector<T> {
    #[must_use]
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Applies `f` to each component.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Vector<U> {
        Vector {
            x: f(self.x),
            y: f(self.y),
            z: f(self.z),
        }
    }
}

impl<T: Add<Output = T>> Add for Vector<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Sub<Output = T>> Sub for Vector<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Mul<f64, Output = T>> Mul<f64> for Vector<T> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|c| c * rhs)
    }
}

impl<T: Div<f64, Output = T>> Div<f64> for Vector<T> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        self.map(|c| c / rhs)
    }
}

impl<T: Zero> Zero for Vector<T> {
    fn zero() -> Self {
        Self::new(T::zero(), T::zero(), T::zero())
    }

    fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero() && self.z.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{f64::Velocity, velocity::meter_per_second};

    fn mps(value: f64) -> Velocity {
        Velocity::new::<meter_per_second>(value)
    }

    #[test]
    fn weighted_velocity_sum() {
        let u1 = Vector::new(mps(1.0), mps(0.0), mps(-2.0));
        let u2 = Vector::new(mps(3.0), mps(1.0), mps(0.0));

        let sum = u1 * 0.5 + u2 * 0.25;
        assert_eq!(sum, Vector::new(mps(1.25), mps(0.25), mps(-1.0)));
        assert!(!sum.is_zero());
        assert!(Vector::<Velocity>::zero().is_zero());
    }
}
