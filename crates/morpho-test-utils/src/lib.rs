// morpho-test-utils: Mock backends and objectives for deterministic tests.
//
// `MockSimulation` replaces physics with trivial arithmetic: each step adds
// the sum of the commanded positions (scaled by the timestep) to a single
// "base height" scalar, which `link_transform` reports as world Y. That
// makes rollout scores an exact, cheap function of the candidate, so
// controller tests assert on selection behavior instead of physics.

use std::sync::Arc;

use nalgebra::{Isometry3, Translation3, Vector3};

use morpho_core::error::{ConfigError, SimError};
use morpho_model::{JointKind, Link, RobotModel};
use morpho_sim::backend::{Simulation, SimulationFactory};
use morpho_sim::objective::{Objective, OptimizationDirection};
use morpho_sim::state::{MotorTarget, RigidBodyState, SimulationState};

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// A free base with one motorized hinge link. The smallest model with an
/// actuated joint.
pub fn single_hinge_model() -> Arc<RobotModel> {
    let mut model = RobotModel::new(1.0, 0.05, 0.9, 10.0, 0.1);
    model.add_link(Link::free_base(0.4)).expect("valid root");
    model
        .add_link(Link {
            parent: Some(0),
            joint_kind: JointKind::Hinge,
            joint_pos: 1.0,
            joint_rot: nalgebra::UnitQuaternion::identity(),
            joint_axis: Vector3::z(),
            length: 0.2,
        })
        .expect("valid hinge link");
    Arc::new(model)
}

// ---------------------------------------------------------------------------
// MockSimulation
// ---------------------------------------------------------------------------

/// Physics-free scene: one robot, one scalar of dynamic state.
pub struct MockSimulation {
    model: Arc<RobotModel>,
    time_step: f32,
    base_height: f32,
    targets: Vec<MotorTarget>,
}

impl MockSimulation {
    pub fn new(model: Arc<RobotModel>, time_step: f32) -> Self {
        let dof = model.dof();
        Self {
            model,
            time_step,
            base_height: 0.0,
            targets: vec![MotorTarget::default(); dof],
        }
    }

    /// The accumulated base height.
    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    fn check_robot(&self, robot: usize) -> Result<(), SimError> {
        if robot == 0 {
            Ok(())
        } else {
            Err(SimError::RobotNotFound)
        }
    }
}

impl Simulation for MockSimulation {
    fn time_step(&self) -> f32 {
        self.time_step
    }

    fn step(&mut self) {
        let drive: f32 = self.targets.iter().map(|t| t.position).sum();
        self.base_height += drive * self.time_step;
    }

    fn robot_count(&self) -> usize {
        1
    }

    fn find_robot_index(&self, model: &RobotModel) -> Option<usize> {
        std::ptr::eq(Arc::as_ptr(&self.model), model).then_some(0)
    }

    fn link_count(&self, robot: usize) -> Result<usize, SimError> {
        self.check_robot(robot)?;
        Ok(self.model.link_count())
    }

    fn link_transform(&self, robot: usize, link: usize) -> Result<Isometry3<f32>, SimError> {
        self.check_robot(robot)?;
        if link >= self.model.link_count() {
            return Err(SimError::LinkOutOfRange { robot, link });
        }
        Ok(Translation3::new(0.0, self.base_height, 0.0).into())
    }

    fn joint_count(&self, robot: usize) -> Result<usize, SimError> {
        self.check_robot(robot)?;
        Ok(self.targets.len())
    }

    fn set_motor_targets(&mut self, robot: usize, targets: &[MotorTarget]) -> Result<(), SimError> {
        self.check_robot(robot)?;
        if targets.len() != self.targets.len() {
            return Err(SimError::MotorTargetCount {
                expected: self.targets.len(),
                got: targets.len(),
            });
        }
        self.targets.copy_from_slice(targets);
        Ok(())
    }

    fn motor_targets(&self, robot: usize) -> Result<Vec<MotorTarget>, SimError> {
        self.check_robot(robot)?;
        Ok(self.targets.clone())
    }

    fn save_state(&self) -> SimulationState {
        SimulationState {
            bodies: vec![RigidBodyState {
                position: Translation3::new(0.0, self.base_height, 0.0).into(),
                linvel: Vector3::zeros(),
                angvel: Vector3::zeros(),
            }],
        }
    }

    fn restore_state(&mut self, state: &SimulationState) -> Result<(), SimError> {
        if state.bodies.len() != 1 {
            return Err(SimError::StateSizeMismatch {
                expected: 1,
                got: state.bodies.len(),
            });
        }
        self.base_height = state.bodies[0].position.translation.y;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Produces [`MockSimulation`] instances for one shared model.
pub struct MockFactory {
    model: Arc<RobotModel>,
    time_step: f32,
}

impl MockFactory {
    /// Mock scenes default to a unit timestep so scores are easy to read.
    pub fn new(model: Arc<RobotModel>) -> Self {
        Self {
            model,
            time_step: 1.0,
        }
    }

    #[must_use]
    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }
}

impl SimulationFactory for MockFactory {
    fn create(&self) -> Result<Box<dyn Simulation>, ConfigError> {
        Ok(Box::new(MockSimulation::new(
            Arc::clone(&self.model),
            self.time_step,
        )))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Always fails to create a scene.
pub struct FailingFactory;

impl SimulationFactory for FailingFactory {
    fn create(&self) -> Result<Box<dyn Simulation>, ConfigError> {
        Err(ConfigError::SceneCreation(
            "factory configured to fail".into(),
        ))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

/// Scores every state with the same value.
pub struct ConstantObjective(pub f64);

impl Objective for ConstantObjective {
    fn score(&self, _sim: &dyn Simulation) -> f64 {
        self.0
    }

    fn name(&self) -> &str {
        "constant"
    }
}

/// Always returns NaN.
pub struct NonFiniteObjective;

impl Objective for NonFiniteObjective {
    fn score(&self, _sim: &dyn Simulation) -> f64 {
        f64::NAN
    }

    fn name(&self) -> &str {
        "non-finite"
    }
}

/// Panics on every evaluation.
pub struct PanickingObjective;

impl Objective for PanickingObjective {
    fn score(&self, _sim: &dyn Simulation) -> f64 {
        panic!("objective configured to panic");
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Maximize
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_integrates_position_targets() {
        let model = single_hinge_model();
        let mut sim = MockSimulation::new(model, 1.0);
        sim.set_motor_targets(0, &[MotorTarget::position(0.5)])
            .unwrap();
        sim.step();
        sim.step();
        assert!((sim.base_height() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mock_snapshot_roundtrip() {
        let model = single_hinge_model();
        let mut sim = MockSimulation::new(Arc::clone(&model), 1.0);
        sim.set_motor_targets(0, &[MotorTarget::position(1.0)])
            .unwrap();
        sim.step();
        let snapshot = sim.save_state();

        let mut other = MockSimulation::new(model, 1.0);
        other.restore_state(&snapshot).unwrap();
        assert_eq!(other.base_height(), sim.base_height());
    }

    #[test]
    fn mock_lookup_is_identity_based() {
        let model = single_hinge_model();
        let sim = MockSimulation::new(Arc::clone(&model), 1.0);
        assert_eq!(sim.find_robot_index(&model), Some(0));
        assert_eq!(sim.find_robot_index(&single_hinge_model()), None);
    }

    #[test]
    fn mock_enforces_target_count() {
        let model = single_hinge_model();
        let mut sim = MockSimulation::new(model, 1.0);
        assert!(matches!(
            sim.set_motor_targets(0, &[MotorTarget::default(); 3]),
            Err(SimError::MotorTargetCount { expected: 1, got: 3 })
        ));
    }

    #[test]
    fn failing_factory_fails() {
        assert!(FailingFactory.create().is_err());
    }
}
