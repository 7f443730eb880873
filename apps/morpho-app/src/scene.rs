//! Shared quadruped scene setup.
//!
//! A 13-link quadruped: one free base, then fixed hip + motorized thigh +
//! motorized shin per leg (8 actuated joints total). Legs fan out at 90
//! degree increments around the base's vertical axis; the front pair mounts
//! at the base tip, the rear pair at the base tail. The demo drops it onto a
//! static floor and asks the MPC to keep the base high.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_8};
use std::sync::Arc;

use nalgebra::{Translation3, UnitQuaternion, Vector3};

use morpho_model::{JointKind, Link, Prop, RobotModel};
use morpho_sim::SceneDescription;

/// Physics timestep of the demo, in seconds.
pub const TIME_STEP: f32 = 1.0 / 240.0;

/// Base spawn height: legs just touching the floor.
const SPAWN_HEIGHT: f32 = 0.425;

/// Build the 13-link quadruped model.
pub fn quadruped() -> Arc<RobotModel> {
    let mut model = RobotModel::new(1.0, 0.05, 0.9, 10.0, 0.1);
    let base = model.add_link(Link::free_base(0.4)).expect("valid root");

    for leg in 0..4u32 {
        // Legs at -45, 45, 135, 225 degrees around the base's Y axis.
        let leg_rot = UnitQuaternion::from_axis_angle(
            &Vector3::y_axis(),
            (leg as f32 - 0.5) * FRAC_PI_2,
        );
        // Front pair at the base tip, rear pair at the tail.
        let hip_pos = if leg < 2 { 1.0 } else { 0.0 };

        let hip = model
            .add_link(Link {
                parent: Some(base),
                joint_kind: JointKind::Fixed,
                joint_pos: hip_pos,
                joint_rot: leg_rot,
                joint_axis: Vector3::z(),
                length: 0.2,
            })
            .expect("valid hip link");
        let thigh = model
            .add_link(Link {
                parent: Some(hip),
                joint_kind: JointKind::Hinge,
                joint_pos: 1.0,
                joint_rot: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
                joint_axis: Vector3::z(),
                length: 0.2,
            })
            .expect("valid thigh link");
        model
            .add_link(Link {
                parent: Some(thigh),
                joint_kind: JointKind::Hinge,
                joint_pos: 1.0,
                joint_rot: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_8),
                joint_axis: Vector3::z(),
                length: 0.2,
            })
            .expect("valid shin link");
    }

    Arc::new(model)
}

/// Quadruped on a static floor: the demo's full scene recipe.
pub fn quadruped_scene(time_step: f32) -> (Arc<RobotModel>, SceneDescription) {
    let model = quadruped();
    let scene = SceneDescription::new(time_step)
        .with_name("quadruped")
        .with_prop(
            Prop::new(0.0, 0.9, Vector3::new(10.0, 1.0, 10.0)),
            Translation3::new(0.0, -1.0, 0.0).into(),
        )
        .with_robot(
            Arc::clone(&model),
            Translation3::new(0.0, SPAWN_HEIGHT, 0.0).into(),
        );
    (model, scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morpho_sim::Simulation;

    #[test]
    fn quadruped_has_thirteen_links_and_eight_motors() {
        let model = quadruped();
        assert_eq!(model.link_count(), 13);
        assert_eq!(model.dof(), 8);
    }

    #[test]
    fn scene_builds_with_full_robot() {
        let (_, scene) = quadruped_scene(TIME_STEP);
        let sim = scene.build().unwrap();
        assert_eq!(sim.robot_count(), 1);
        assert_eq!(sim.link_count(0).unwrap(), 13);
        assert_eq!(sim.joint_count(0).unwrap(), 8);
    }
}
