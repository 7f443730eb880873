//! In-memory representation of a robot morphology: an ordered kinematic tree
//! of capsule links joined by free, fixed, or hinge joints.
//!
//! A link's id is its position in the model's link vector. The parent
//! relation is validated at construction time: every non-root link must name
//! a parent with a strictly smaller id, so the vector order is always a
//! valid topological order of the tree. Models are immutable once built and
//! shared by reference (`Arc`) across every simulation instance.

use nalgebra::{UnitQuaternion, Vector3};

use morpho_core::error::ConfigError;

// ---------------------------------------------------------------------------
// JointKind
// ---------------------------------------------------------------------------

/// The joint connecting a link to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    /// Unconstrained 6-DOF joint. Used for a floating base.
    Free,
    /// No relative motion between parent and child.
    Fixed,
    /// Rotation about a single axis, driven by a PD motor.
    Hinge,
}

impl JointKind {
    /// Whether this joint kind carries a motor the controller can target.
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Hinge)
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// One capsule link of a robot, plus the joint attaching it to its parent.
#[derive(Debug, Clone)]
pub struct Link {
    /// Parent link id. `None` marks the root (allowed only for link 0).
    pub parent: Option<usize>,
    /// Joint kind connecting this link to its parent.
    pub joint_kind: JointKind,
    /// Attachment point along the parent link, as a fraction in `[0, 1]`
    /// from the parent's tail to its tip.
    pub joint_pos: f32,
    /// Rotation of this link's frame relative to the parent frame at the
    /// joint.
    pub joint_rot: UnitQuaternion<f32>,
    /// Joint axis in this link's local frame (hinge rotation axis).
    pub joint_axis: Vector3<f32>,
    /// Capsule length along the link's local X axis, in meters.
    pub length: f32,
}

impl Link {
    /// A root link (floating base) of the given length.
    pub fn free_base(length: f32) -> Self {
        Self {
            parent: None,
            joint_kind: JointKind::Free,
            joint_pos: 0.0,
            joint_rot: UnitQuaternion::identity(),
            joint_axis: Vector3::z(),
            length,
        }
    }
}

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

/// Immutable description of a robot: the link tree plus scene-wide material
/// and motor parameters shared by all links.
#[derive(Debug, Clone)]
pub struct RobotModel {
    /// Density of every link, in kg/m^3.
    pub link_density: f32,
    /// Capsule radius of every link, in meters.
    pub link_radius: f32,
    /// Contact friction coefficient for every link.
    pub friction: f32,
    /// Proportional gain of every hinge motor.
    pub motor_kp: f32,
    /// Derivative gain of every hinge motor.
    pub motor_kd: f32,
    links: Vec<Link>,
}

impl RobotModel {
    /// Create an empty model with the given scene-wide parameters.
    pub const fn new(
        link_density: f32,
        link_radius: f32,
        friction: f32,
        motor_kp: f32,
        motor_kd: f32,
    ) -> Self {
        Self {
            link_density,
            link_radius,
            friction,
            motor_kp,
            motor_kd,
            links: Vec::new(),
        }
    }

    /// Append a link, returning its id.
    ///
    /// The first link must be the root (`parent == None`); every later link
    /// must reference a parent id strictly smaller than its own. Violations
    /// fail here, at construction time, never later.
    pub fn add_link(&mut self, link: Link) -> Result<usize, ConfigError> {
        let id = self.links.len();
        match link.parent {
            None if id != 0 => return Err(ConfigError::UnexpectedRoot { link: id }),
            Some(_) if id == 0 => return Err(ConfigError::MissingRoot),
            Some(parent) if parent >= id => {
                return Err(ConfigError::ParentOutOfOrder { link: id, parent });
            }
            _ => {}
        }
        self.links.push(link);
        Ok(id)
    }

    /// All links, in id order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Ids of actuated (hinge) links, in id order. The controller's motor
    /// target vector follows this ordering.
    pub fn actuated_links(&self) -> impl Iterator<Item = usize> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, link)| link.joint_kind.is_actuated())
            .map(|(id, _)| id)
    }

    /// Number of actuated degrees of freedom.
    pub fn dof(&self) -> usize {
        self.actuated_links().count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn hinge(parent: usize) -> Link {
        Link {
            parent: Some(parent),
            joint_kind: JointKind::Hinge,
            joint_pos: 1.0,
            joint_rot: UnitQuaternion::identity(),
            joint_axis: Vector3::z(),
            length: 0.2,
        }
    }

    fn model() -> RobotModel {
        RobotModel::new(1.0, 0.05, 0.9, 10.0, 0.1)
    }

    // -- JointKind --

    #[test]
    fn joint_kind_is_actuated() {
        assert!(JointKind::Hinge.is_actuated());
        assert!(!JointKind::Fixed.is_actuated());
        assert!(!JointKind::Free.is_actuated());
    }

    // -- add_link validation --

    #[test]
    fn root_then_chain_is_valid() {
        let mut m = model();
        assert_eq!(m.add_link(Link::free_base(0.4)).unwrap(), 0);
        assert_eq!(m.add_link(hinge(0)).unwrap(), 1);
        assert_eq!(m.add_link(hinge(1)).unwrap(), 2);
        assert_eq!(m.link_count(), 3);
    }

    #[test]
    fn first_link_must_be_root() {
        let mut m = model();
        assert!(matches!(
            m.add_link(hinge(0)),
            Err(ConfigError::MissingRoot)
        ));
    }

    #[test]
    fn second_root_rejected() {
        let mut m = model();
        m.add_link(Link::free_base(0.4)).unwrap();
        assert!(matches!(
            m.add_link(Link::free_base(0.4)),
            Err(ConfigError::UnexpectedRoot { link: 1 })
        ));
    }

    #[test]
    fn self_parent_rejected() {
        let mut m = model();
        m.add_link(Link::free_base(0.4)).unwrap();
        assert!(matches!(
            m.add_link(hinge(1)),
            Err(ConfigError::ParentOutOfOrder { link: 1, parent: 1 })
        ));
    }

    #[test]
    fn forward_parent_rejected() {
        let mut m = model();
        m.add_link(Link::free_base(0.4)).unwrap();
        m.add_link(hinge(0)).unwrap();
        assert!(matches!(
            m.add_link(hinge(5)),
            Err(ConfigError::ParentOutOfOrder { link: 2, parent: 5 })
        ));
    }

    #[test]
    fn rejected_link_is_not_appended() {
        let mut m = model();
        m.add_link(Link::free_base(0.4)).unwrap();
        let _ = m.add_link(hinge(3));
        assert_eq!(m.link_count(), 1);
    }

    #[test]
    fn parent_ordering_invariant_holds() {
        let mut m = model();
        m.add_link(Link::free_base(0.4)).unwrap();
        for parent in 0..5 {
            m.add_link(hinge(parent)).unwrap();
        }
        for (id, link) in m.links().iter().enumerate() {
            match link.parent {
                None => assert_eq!(id, 0),
                Some(parent) => assert!(parent < id),
            }
        }
    }

    // -- dof / actuated ordering --

    #[test]
    fn dof_counts_hinges_only() {
        let mut m = model();
        m.add_link(Link::free_base(0.4)).unwrap();
        m.add_link(Link {
            joint_kind: JointKind::Fixed,
            ..hinge(0)
        })
        .unwrap();
        m.add_link(hinge(1)).unwrap();
        m.add_link(hinge(2)).unwrap();
        assert_eq!(m.dof(), 2);
        let ids: Vec<usize> = m.actuated_links().collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
