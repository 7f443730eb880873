//! Declarative scene descriptions.
//!
//! A [`SceneDescription`] records everything needed to build a scene
//! (timestep, gravity, robots, props) and implements [`SimulationFactory`],
//! so cloning live state into forked instances is just `create()` plus
//! `restore_state()`.

use std::sync::Arc;

use nalgebra::{Isometry3, Vector3};

use morpho_core::error::ConfigError;
use morpho_model::{Prop, RobotModel};

use crate::backend::{Simulation, SimulationFactory};
use crate::rapier::RapierSimulation;

/// Default gravity, Y-up.
pub const DEFAULT_GRAVITY: Vector3<f32> = Vector3::new(0.0, -9.81, 0.0);

// ---------------------------------------------------------------------------
// SceneDescription
// ---------------------------------------------------------------------------

/// A reproducible scene recipe: every `create()` call builds an identical
/// scene, with robots and props instantiated in the order they were added.
#[derive(Clone)]
pub struct SceneDescription {
    time_step: f32,
    gravity: Vector3<f32>,
    robots: Vec<(Arc<RobotModel>, Isometry3<f32>)>,
    props: Vec<(Prop, Isometry3<f32>)>,
    name: String,
}

impl SceneDescription {
    /// Start an empty scene with the given fixed timestep.
    pub fn new(time_step: f32) -> Self {
        Self {
            time_step,
            gravity: DEFAULT_GRAVITY,
            robots: Vec::new(),
            props: Vec::new(),
            name: "scene".to_string(),
        }
    }

    /// Override gravity (default is -9.81 on Y).
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f32>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set a human-readable name reported by [`SimulationFactory::name`].
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a robot at the given base pose.
    #[must_use]
    pub fn with_robot(mut self, model: Arc<RobotModel>, base_pose: Isometry3<f32>) -> Self {
        self.robots.push((model, base_pose));
        self
    }

    /// Add a box prop at the given pose.
    #[must_use]
    pub fn with_prop(mut self, prop: Prop, pose: Isometry3<f32>) -> Self {
        self.props.push((prop, pose));
        self
    }

    /// Fixed timestep this scene steps at.
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Build one scene instance. Props are inserted before robots so body
    /// ordering (and therefore snapshot layout) is stable.
    pub fn build(&self) -> Result<RapierSimulation, ConfigError> {
        let mut sim = RapierSimulation::new(self.time_step, self.gravity)?;
        for (prop, pose) in &self.props {
            sim.add_prop(prop, *pose);
        }
        for (model, base_pose) in &self.robots {
            sim.add_robot(model, *base_pose)?;
        }
        Ok(sim)
    }
}

impl SimulationFactory for SceneDescription {
    fn create(&self) -> Result<Box<dyn Simulation>, ConfigError> {
        Ok(Box::new(self.build()?))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
