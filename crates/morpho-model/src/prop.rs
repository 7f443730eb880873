//! Rigid box props placed alongside the robot (floors, obstacles).

use nalgebra::Vector3;

/// A rigid box. Density 0 marks a static, immovable body.
#[derive(Debug, Clone)]
pub struct Prop {
    /// Density in kg/m^3; `0.0` means static.
    pub density: f32,
    /// Contact friction coefficient.
    pub friction: f32,
    /// Box half-extents along x/y/z, in meters.
    pub half_extents: Vector3<f32>,
}

impl Prop {
    /// Create a prop. Immutable once built.
    pub const fn new(density: f32, friction: f32, half_extents: Vector3<f32>) -> Self {
        Self {
            density,
            friction,
            half_extents,
        }
    }

    /// Whether this prop is static (never moves).
    pub fn is_static(&self) -> bool {
        self.density == 0.0
    }
}
