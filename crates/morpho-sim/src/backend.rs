//! The simulation capability seam consumed by the MPC controller.
//!
//! The controller never touches a physics engine directly; it drives any
//! backend through [`Simulation`] and forks fresh instances through
//! [`SimulationFactory`]. These are explicit port objects passed by
//! reference, so no hidden mutable state crosses thread boundaries.

use nalgebra::Isometry3;

use morpho_core::error::{ConfigError, SimError};
use morpho_model::RobotModel;

use crate::state::{MotorTarget, SimulationState};

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// One scene instance: a set of robots and props advanced by a fixed
/// timestep.
///
/// The timestep is set at construction; [`step`](Self::step) takes no
/// argument. Instances are `Send` (each rollout owns one exclusively for the
/// task's lifetime) but deliberately not `Sync`: a scene is never shared
/// between threads.
pub trait Simulation: Send {
    /// Fixed timestep in seconds.
    fn time_step(&self) -> f32;

    /// Advance the scene by one timestep.
    fn step(&mut self);

    /// Number of robots in the scene.
    fn robot_count(&self) -> usize;

    /// Find the index of a robot by model identity (the same shared model
    /// instance, not a structural comparison).
    fn find_robot_index(&self, model: &RobotModel) -> Option<usize>;

    /// Number of links of the given robot.
    fn link_count(&self, robot: usize) -> Result<usize, SimError>;

    /// World transform of one link of one robot.
    fn link_transform(&self, robot: usize, link: usize) -> Result<Isometry3<f32>, SimError>;

    /// Number of actuated joints of the given robot.
    fn joint_count(&self, robot: usize) -> Result<usize, SimError>;

    /// Set PD targets for every actuated joint of the given robot. The
    /// slice length must equal [`joint_count`](Self::joint_count), ordered
    /// by link id.
    fn set_motor_targets(&mut self, robot: usize, targets: &[MotorTarget])
    -> Result<(), SimError>;

    /// Currently applied motor targets of the given robot.
    fn motor_targets(&self, robot: usize) -> Result<Vec<MotorTarget>, SimError>;

    /// Copy out the full dynamic state of the scene.
    fn save_state(&self) -> SimulationState;

    /// Overwrite the scene's dynamic state from a snapshot taken from an
    /// identically constructed instance.
    fn restore_state(&mut self, state: &SimulationState) -> Result<(), SimError>;
}

// ---------------------------------------------------------------------------
// SimulationFactory
// ---------------------------------------------------------------------------

/// Produces fresh, fully independent scene instances.
///
/// Every instance reproduces the same static scene (same robots, same props,
/// same placements), so a [`SimulationState`] snapshot taken from one
/// instance restores cleanly into any other from the same factory.
pub trait SimulationFactory: Send + Sync {
    /// Create a new scene instance.
    fn create(&self) -> Result<Box<dyn Simulation>, ConfigError>;

    /// Human-readable name for this factory.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
