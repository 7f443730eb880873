//! Objective seam: scores a simulation's current state with a scalar.

use std::sync::Arc;

use morpho_model::RobotModel;

use crate::backend::Simulation;

// ---------------------------------------------------------------------------
// OptimizationDirection
// ---------------------------------------------------------------------------

/// Whether higher or lower objective scores win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationDirection {
    /// Higher scores win (the default).
    #[default]
    Maximize,
    /// Lower scores win.
    Minimize,
}

impl OptimizationDirection {
    /// The worst representable score for this direction. Failed rollouts
    /// are recorded with this value so a round always produces a result.
    pub const fn worst(self) -> f64 {
        match self {
            Self::Maximize => f64::NEG_INFINITY,
            Self::Minimize => f64::INFINITY,
        }
    }

    /// Whether `a` is strictly better than `b`. Ties are not better, so a
    /// scan keeps the earliest candidate on equal scores.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Self::Maximize => a > b,
            Self::Minimize => a < b,
        }
    }
}

// ---------------------------------------------------------------------------
// Objective
// ---------------------------------------------------------------------------

/// Scores a scene's current state. Evaluated at the endpoint of every
/// rollout; must be cheap relative to `horizon` physics steps.
///
/// A non-finite return value marks the rollout as failed; the round
/// continues with that candidate scored worst.
pub trait Objective: Send + Sync {
    /// Score the scene's current state.
    fn score(&self, sim: &dyn Simulation) -> f64;

    /// Whether higher or lower scores win.
    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Maximize
    }

    /// Human-readable name for this objective.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// BaseHeightObjective
// ---------------------------------------------------------------------------

/// Height of a robot's base link above the ground plane (world Y).
///
/// Returns NaN if the robot is absent from the scene, which the rollout
/// layer records as a failed evaluation.
pub struct BaseHeightObjective {
    model: Arc<RobotModel>,
    direction: OptimizationDirection,
}

impl BaseHeightObjective {
    /// Maximize the base height of the given robot.
    pub fn new(model: Arc<RobotModel>) -> Self {
        Self {
            model,
            direction: OptimizationDirection::Maximize,
        }
    }

    /// Override the optimization direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: OptimizationDirection) -> Self {
        self.direction = direction;
        self
    }
}

impl Objective for BaseHeightObjective {
    fn score(&self, sim: &dyn Simulation) -> f64 {
        let Some(robot) = sim.find_robot_index(&self.model) else {
            return f64::NAN;
        };
        match sim.link_transform(robot, 0) {
            Ok(pose) => f64::from(pose.translation.y),
            Err(_) => f64::NAN,
        }
    }

    fn direction(&self) -> OptimizationDirection {
        self.direction
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "BaseHeight"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_worst_is_neg_infinity() {
        assert_eq!(OptimizationDirection::Maximize.worst(), f64::NEG_INFINITY);
    }

    #[test]
    fn minimize_worst_is_infinity() {
        assert_eq!(OptimizationDirection::Minimize.worst(), f64::INFINITY);
    }

    #[test]
    fn maximize_prefers_higher() {
        let dir = OptimizationDirection::Maximize;
        assert!(dir.is_better(2.0, 1.0));
        assert!(!dir.is_better(1.0, 2.0));
    }

    #[test]
    fn minimize_prefers_lower() {
        let dir = OptimizationDirection::Minimize;
        assert!(dir.is_better(1.0, 2.0));
        assert!(!dir.is_better(2.0, 1.0));
    }

    #[test]
    fn ties_are_not_better() {
        assert!(!OptimizationDirection::Maximize.is_better(1.0, 1.0));
        assert!(!OptimizationDirection::Minimize.is_better(1.0, 1.0));
    }

    #[test]
    fn everything_beats_worst() {
        for dir in [
            OptimizationDirection::Maximize,
            OptimizationDirection::Minimize,
        ] {
            assert!(dir.is_better(0.0, dir.worst()));
        }
    }

    #[test]
    fn default_direction_is_maximize() {
        assert_eq!(
            OptimizationDirection::default(),
            OptimizationDirection::Maximize
        );
    }
}
