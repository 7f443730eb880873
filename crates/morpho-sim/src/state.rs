//! Snapshot and motor-target types shared across backends.

use nalgebra::{Isometry3, Vector3};

// ---------------------------------------------------------------------------
// MotorTarget
// ---------------------------------------------------------------------------

/// PD motor target for one actuated joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorTarget {
    /// Target joint position (radians for hinges).
    pub position: f32,
    /// Target joint velocity (rad/s for hinges).
    pub velocity: f32,
}

impl MotorTarget {
    /// A pure position target (zero target velocity).
    pub const fn position(position: f32) -> Self {
        Self {
            position,
            velocity: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationState
// ---------------------------------------------------------------------------

/// Dynamic state of one rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyState {
    /// World pose.
    pub position: Isometry3<f32>,
    /// Linear velocity in world frame.
    pub linvel: Vector3<f32>,
    /// Angular velocity in world frame.
    pub angvel: Vector3<f32>,
}

/// Full dynamic state of one simulation instance: every rigid body's pose
/// and velocities, in the scene's body creation order.
///
/// A snapshot is only restorable into an instance built from the same static
/// scene; body counts are checked on restore.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationState {
    /// Per-body dynamic state, in creation order.
    pub bodies: Vec<RigidBodyState>,
}

impl SimulationState {
    /// Number of bodies captured in this snapshot.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
