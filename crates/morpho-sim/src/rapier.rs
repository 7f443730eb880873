//! Rapier3D backend: builds a [`RobotModel`] into rigid bodies, capsule
//! colliders, and motorized impulse joints, and implements the
//! [`Simulation`] contract on top of the physics pipeline.
//!
//! All pipeline state lives in one struct because `PhysicsPipeline::step()`
//! requires mutable access to every set simultaneously. Rigid bodies are
//! created in a deterministic order (props and robots in insertion order,
//! links in id order), so two instances built from the same scene
//! description have identical body orderings and snapshots transfer between
//! them directly.

use std::sync::Arc;

use nalgebra::{Isometry3, Point3, Unit, Vector3};
use rapier3d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, FixedJointBuilder, GenericJoint,
    Group, ImpulseJointHandle, ImpulseJointSet, IntegrationParameters, InteractionGroups,
    InteractionTestMode, IslandManager, JointAxis, MotorModel, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, RevoluteJointBuilder, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};

use morpho_core::error::{ConfigError, SimError};
use morpho_model::{JointKind, Prop, RobotModel};

use crate::backend::Simulation;
use crate::state::{MotorTarget, RigidBodyState, SimulationState};

/// Robot links collide with props only, never with each other.
const ROBOT_GROUP: Group = Group::GROUP_1;
const PROP_GROUP: Group = Group::GROUP_2;

/// Force ceiling for every hinge motor.
const MOTOR_MAX_FORCE: f32 = 1000.0;

// ---------------------------------------------------------------------------
// RobotInstance
// ---------------------------------------------------------------------------

/// Per-robot bookkeeping: the shared model plus rapier handles.
struct RobotInstance {
    model: Arc<RobotModel>,
    /// One rigid body per link, in link id order.
    link_bodies: Vec<RigidBodyHandle>,
    /// Hinge joint handles, in actuated (link id) order.
    motor_joints: Vec<ImpulseJointHandle>,
    /// Last applied motor targets, in actuated order.
    targets: Vec<MotorTarget>,
}

// ---------------------------------------------------------------------------
// RapierSimulation
// ---------------------------------------------------------------------------

/// One rapier-backed scene instance.
pub struct RapierSimulation {
    // -- Rapier sets --
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,

    // -- Pipeline objects --
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,

    // -- Parameters --
    integration_parameters: IntegrationParameters,
    gravity: Vector3<f32>,
    time_step: f32,

    robots: Vec<RobotInstance>,
}

impl RapierSimulation {
    /// Create an empty scene with the given timestep and gravity.
    pub fn new(time_step: f32, gravity: Vector3<f32>) -> Result<Self, ConfigError> {
        if !(time_step > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "time_step".into(),
                message: format!("must be > 0, got {time_step}"),
            });
        }
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = time_step;

        Ok(Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters,
            gravity,
            time_step,
            robots: Vec::new(),
        })
    }

    /// Add a box prop at the given pose.
    pub fn add_prop(&mut self, prop: &Prop, pose: Isometry3<f32>) {
        let body = if prop.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let handle = self.bodies.insert(body.position(pose).build());

        let groups = InteractionGroups::new(
            PROP_GROUP,
            ROBOT_GROUP | PROP_GROUP,
            InteractionTestMode::And,
        );
        let mut collider =
            ColliderBuilder::cuboid(prop.half_extents.x, prop.half_extents.y, prop.half_extents.z)
                .friction(prop.friction)
                .restitution(0.0)
                .collision_groups(groups);
        if !prop.is_static() {
            collider = collider.density(prop.density);
        }
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);
    }

    /// Add a robot at the given base pose, returning its robot index.
    ///
    /// Walks the link tree in id order, accumulating world poses: each
    /// child's frame sits at its joint anchor on the parent (a fraction
    /// `joint_pos` along the parent capsule), rotated by the joint rotation.
    /// Capsules extend along each link's local X axis.
    pub fn add_robot(
        &mut self,
        model: &Arc<RobotModel>,
        base_pose: Isometry3<f32>,
    ) -> Result<usize, ConfigError> {
        if model.links().is_empty() {
            return Err(ConfigError::SceneCreation(
                "robot model has no links".into(),
            ));
        }

        let groups = InteractionGroups::new(ROBOT_GROUP, PROP_GROUP, InteractionTestMode::And);
        let mut link_bodies = Vec::with_capacity(model.link_count());
        let mut link_poses: Vec<Isometry3<f32>> = Vec::with_capacity(model.link_count());
        let mut motor_joints = Vec::new();

        for link in model.links() {
            let (pose, parent_anchor) = match link.parent {
                None => (base_pose, Point3::origin()),
                Some(parent_id) => {
                    let parent = &model.links()[parent_id];
                    let anchor = Point3::new(link.joint_pos * parent.length, 0.0, 0.0);
                    let parent_pose = link_poses[parent_id];
                    let origin = parent_pose * anchor;
                    let rotation = parent_pose.rotation * link.joint_rot;
                    (Isometry3::from_parts(origin.coords.into(), rotation), anchor)
                }
            };
            link_poses.push(pose);

            let body = if link.parent.is_none() && link.joint_kind == JointKind::Fixed {
                RigidBodyBuilder::fixed()
            } else {
                RigidBodyBuilder::dynamic()
            };
            let body_handle = self
                .bodies
                .insert(body.position(pose).can_sleep(false).build());
            link_bodies.push(body_handle);

            // Capsule from the link frame origin (tail) to its tip.
            let collider = ColliderBuilder::capsule_x(link.length / 2.0, model.link_radius)
                .position(Isometry3::translation(link.length / 2.0, 0.0, 0.0))
                .density(model.link_density)
                .friction(model.friction)
                .restitution(0.0)
                .collision_groups(groups);
            self.colliders
                .insert_with_parent(collider.build(), body_handle, &mut self.bodies);

            let Some(parent_id) = link.parent else {
                continue;
            };
            let parent_handle = link_bodies[parent_id];

            match link.joint_kind {
                JointKind::Free => {}
                JointKind::Fixed => {
                    let joint: GenericJoint = FixedJointBuilder::new()
                        .local_frame1(Isometry3::from_parts(
                            parent_anchor.coords.into(),
                            link.joint_rot,
                        ))
                        .build()
                        .into();
                    self.impulse_joints
                        .insert(parent_handle, body_handle, joint, true);
                }
                JointKind::Hinge => {
                    let axis = Unit::new_normalize(link.joint_axis);
                    let mut joint: GenericJoint = RevoluteJointBuilder::new(axis)
                        .local_anchor1(parent_anchor)
                        .local_anchor2(Point3::origin())
                        .build()
                        .into();
                    joint.set_local_axis1(Unit::new_normalize(link.joint_rot * link.joint_axis));
                    joint.set_motor_model(JointAxis::AngX, MotorModel::ForceBased);
                    joint.set_motor(JointAxis::AngX, 0.0, 0.0, model.motor_kp, model.motor_kd);
                    joint.set_motor_max_force(JointAxis::AngX, MOTOR_MAX_FORCE);

                    let handle = self
                        .impulse_joints
                        .insert(parent_handle, body_handle, joint, true);
                    motor_joints.push(handle);
                }
            }
        }

        let dof = motor_joints.len();
        tracing::debug!(
            links = link_bodies.len(),
            dof,
            robot = self.robots.len(),
            "robot added to scene"
        );
        self.robots.push(RobotInstance {
            model: Arc::clone(model),
            link_bodies,
            motor_joints,
            targets: vec![MotorTarget::default(); dof],
        });
        Ok(self.robots.len() - 1)
    }

    fn robot(&self, robot: usize) -> Result<&RobotInstance, SimError> {
        self.robots.get(robot).ok_or(SimError::RobotNotFound)
    }
}

// ---------------------------------------------------------------------------
// Simulation impl
// ---------------------------------------------------------------------------

impl Simulation for RapierSimulation {
    fn time_step(&self) -> f32 {
        self.time_step
    }

    fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn robot_count(&self) -> usize {
        self.robots.len()
    }

    fn find_robot_index(&self, model: &RobotModel) -> Option<usize> {
        self.robots
            .iter()
            .position(|r| std::ptr::eq(Arc::as_ptr(&r.model), model))
    }

    fn link_count(&self, robot: usize) -> Result<usize, SimError> {
        Ok(self.robot(robot)?.link_bodies.len())
    }

    fn link_transform(&self, robot: usize, link: usize) -> Result<Isometry3<f32>, SimError> {
        let instance = self.robot(robot)?;
        let &handle = instance
            .link_bodies
            .get(link)
            .ok_or(SimError::LinkOutOfRange { robot, link })?;
        let body = self
            .bodies
            .get(handle)
            .ok_or(SimError::LinkOutOfRange { robot, link })?;
        Ok(*body.position())
    }

    fn joint_count(&self, robot: usize) -> Result<usize, SimError> {
        Ok(self.robot(robot)?.motor_joints.len())
    }

    fn set_motor_targets(
        &mut self,
        robot: usize,
        targets: &[MotorTarget],
    ) -> Result<(), SimError> {
        let instance = self.robots.get_mut(robot).ok_or(SimError::RobotNotFound)?;
        if targets.len() != instance.motor_joints.len() {
            return Err(SimError::MotorTargetCount {
                expected: instance.motor_joints.len(),
                got: targets.len(),
            });
        }
        let kp = instance.model.motor_kp;
        let kd = instance.model.motor_kd;
        for (&handle, target) in instance.motor_joints.iter().zip(targets) {
            if let Some(joint) = self.impulse_joints.get_mut(handle, true) {
                joint
                    .data
                    .set_motor(JointAxis::AngX, target.position, target.velocity, kp, kd);
            }
        }
        instance.targets.copy_from_slice(targets);
        Ok(())
    }

    fn motor_targets(&self, robot: usize) -> Result<Vec<MotorTarget>, SimError> {
        Ok(self.robot(robot)?.targets.clone())
    }

    fn save_state(&self) -> SimulationState {
        let bodies = self
            .bodies
            .iter()
            .map(|(_, body)| RigidBodyState {
                position: *body.position(),
                linvel: *body.linvel(),
                angvel: *body.angvel(),
            })
            .collect();
        SimulationState { bodies }
    }

    fn restore_state(&mut self, state: &SimulationState) -> Result<(), SimError> {
        if state.bodies.len() != self.bodies.len() {
            return Err(SimError::StateSizeMismatch {
                expected: self.bodies.len(),
                got: state.bodies.len(),
            });
        }
        for ((_, body), saved) in self.bodies.iter_mut().zip(&state.bodies) {
            body.set_position(saved.position, true);
            body.set_linvel(saved.linvel, true);
            body.set_angvel(saved.angvel, true);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};
    use morpho_model::Link;

    const DT: f32 = 1.0 / 240.0;
    const GRAVITY: Vector3<f32> = Vector3::new(0.0, -9.81, 0.0);

    /// Free base + fixed spacer + one motorized hinge.
    fn three_link_model() -> Arc<RobotModel> {
        let mut model = RobotModel::new(1.0, 0.05, 0.9, 10.0, 0.1);
        model.add_link(Link::free_base(0.4)).unwrap();
        model
            .add_link(Link {
                parent: Some(0),
                joint_kind: JointKind::Fixed,
                joint_pos: 1.0,
                joint_rot: UnitQuaternion::identity(),
                joint_axis: Vector3::z(),
                length: 0.2,
            })
            .unwrap();
        model
            .add_link(Link {
                parent: Some(1),
                joint_kind: JointKind::Hinge,
                joint_pos: 1.0,
                joint_rot: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.4),
                joint_axis: Vector3::z(),
                length: 0.2,
            })
            .unwrap();
        Arc::new(model)
    }

    fn build_scene(model: &Arc<RobotModel>) -> RapierSimulation {
        let mut sim = RapierSimulation::new(DT, GRAVITY).unwrap();
        sim.add_prop(
            &Prop::new(0.0, 0.9, Vector3::new(10.0, 1.0, 10.0)),
            Translation3::new(0.0, -1.0, 0.0).into(),
        );
        sim.add_robot(model, Translation3::new(0.0, 0.6, 0.0).into())
            .unwrap();
        sim
    }

    fn assert_isometry_close(a: &Isometry3<f32>, b: &Isometry3<f32>) {
        assert_relative_eq!(a.translation.vector, b.translation.vector, epsilon = 1e-6);
        assert_relative_eq!(
            a.rotation.into_inner().coords,
            b.rotation.into_inner().coords,
            epsilon = 1e-6
        );
    }

    #[test]
    fn zero_time_step_rejected() {
        assert!(RapierSimulation::new(0.0, GRAVITY).is_err());
    }

    #[test]
    fn empty_model_rejected() {
        let model = Arc::new(RobotModel::new(1.0, 0.05, 0.9, 10.0, 0.1));
        let mut sim = RapierSimulation::new(DT, GRAVITY).unwrap();
        assert!(
            sim.add_robot(&model, Isometry3::identity())
                .is_err()
        );
    }

    #[test]
    fn scene_construction_is_reproducible() {
        let model = three_link_model();
        let a = build_scene(&model);
        let b = build_scene(&model);
        for link in 0..model.link_count() {
            let pa = a.link_transform(0, link).unwrap();
            let pb = b.link_transform(0, link).unwrap();
            assert_isometry_close(&pa, &pb);
        }
    }

    #[test]
    fn find_robot_index_is_identity_based() {
        let model = three_link_model();
        let sim = build_scene(&model);
        assert_eq!(sim.find_robot_index(&model), Some(0));

        // A structurally identical but distinct model is a different robot.
        let other = three_link_model();
        assert_eq!(sim.find_robot_index(&other), None);
    }

    #[test]
    fn snapshot_restores_into_fresh_instance() {
        let model = three_link_model();
        let mut live = build_scene(&model);

        // Drive the live scene into a nontrivial state first.
        live.set_motor_targets(0, &[MotorTarget::position(0.8)])
            .unwrap();
        for _ in 0..120 {
            live.step();
        }
        let snapshot = live.save_state();

        let mut fork = build_scene(&model);
        fork.restore_state(&snapshot).unwrap();

        // Without stepping, the fork's link transforms match the live scene.
        for link in 0..model.link_count() {
            let live_pose = live.link_transform(0, link).unwrap();
            let fork_pose = fork.link_transform(0, link).unwrap();
            assert_isometry_close(&live_pose, &fork_pose);
        }
    }

    #[test]
    fn restore_rejects_mismatched_snapshot() {
        let model = three_link_model();
        let live = build_scene(&model);
        let snapshot = live.save_state();

        // A scene with an extra prop has a different body count.
        let mut other = build_scene(&model);
        other.add_prop(
            &Prop::new(500.0, 0.5, Vector3::new(0.1, 0.1, 0.1)),
            Translation3::new(1.0, 0.5, 0.0).into(),
        );
        assert!(matches!(
            other.restore_state(&snapshot),
            Err(SimError::StateSizeMismatch { .. })
        ));
    }

    #[test]
    fn motor_target_count_enforced() {
        let model = three_link_model();
        let mut sim = build_scene(&model);
        assert_eq!(sim.joint_count(0).unwrap(), 1);
        let result = sim.set_motor_targets(0, &[MotorTarget::default(); 3]);
        assert!(matches!(
            result,
            Err(SimError::MotorTargetCount {
                expected: 1,
                got: 3
            })
        ));
    }

    #[test]
    fn motor_targets_are_readable_back() {
        let model = three_link_model();
        let mut sim = build_scene(&model);
        let targets = [MotorTarget {
            position: 0.5,
            velocity: -0.1,
        }];
        sim.set_motor_targets(0, &targets).unwrap();
        assert_eq!(sim.motor_targets(0).unwrap(), targets.to_vec());
    }

    #[test]
    fn gravity_pulls_base_down() {
        let model = three_link_model();
        let mut sim = build_scene(&model);
        let before = sim.link_transform(0, 0).unwrap().translation.y;
        for _ in 0..60 {
            sim.step();
        }
        let after = sim.link_transform(0, 0).unwrap().translation.y;
        assert!(after < before, "base should fall: {before} -> {after}");
    }

    #[test]
    fn link_out_of_range_reported() {
        let model = three_link_model();
        let sim = build_scene(&model);
        assert!(matches!(
            sim.link_transform(0, 13),
            Err(SimError::LinkOutOfRange { robot: 0, link: 13 })
        ));
        assert!(matches!(
            sim.link_transform(3, 0),
            Err(SimError::RobotNotFound)
        ));
    }
}
