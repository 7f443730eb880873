//! Candidate generation for the sampling MPC.
//!
//! Sampling happens on the controller thread before any rollout is
//! dispatched, seeded per round, so the candidate set is a pure function of
//! the root seed and round index. Worker scheduling cannot change it.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use morpho_core::error::ConfigError;
use morpho_core::seed::round_rng;
use morpho_sim::MotorTarget;

use crate::types::ActionSequence;

// ---------------------------------------------------------------------------
// ActionSampler
// ---------------------------------------------------------------------------

/// Produces the candidate batch for one recomputation round.
pub trait ActionSampler: Send {
    /// Generate candidates for a round.
    ///
    /// `previous` is the plan selected last round (if any), available for
    /// warm starting. Every returned sequence must have `horizon` steps of
    /// `dof` targets.
    fn generate(
        &mut self,
        previous: Option<&ActionSequence>,
        horizon: usize,
        dof: usize,
        round: u64,
    ) -> Vec<ActionSequence>;
}

// ---------------------------------------------------------------------------
// ShiftPerturbSampler
// ---------------------------------------------------------------------------

/// Shift-and-perturb sampling.
///
/// Candidate 0 is the warm start: the previous plan shifted by one step, or
/// an all-zero hold when no plan exists yet. The remaining candidates add
/// Gaussian noise to the warm start, independently per step and joint.
pub struct ShiftPerturbSampler {
    samples: usize,
    position_noise: Normal<f32>,
    velocity_noise: Normal<f32>,
    seed: u64,
}

impl ShiftPerturbSampler {
    /// Create a sampler producing `samples` candidates per round.
    pub fn new(
        samples: usize,
        position_stddev: f32,
        velocity_stddev: f32,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "samples".into(),
                message: "must be >= 1".into(),
            });
        }
        let position_noise =
            Normal::new(0.0, position_stddev).map_err(|e| ConfigError::InvalidValue {
                field: "position_stddev".into(),
                message: e.to_string(),
            })?;
        let velocity_noise =
            Normal::new(0.0, velocity_stddev).map_err(|e| ConfigError::InvalidValue {
                field: "velocity_stddev".into(),
                message: e.to_string(),
            })?;
        Ok(Self {
            samples,
            position_noise,
            velocity_noise,
            seed,
        })
    }

    fn perturb(&self, base: &ActionSequence, rng: &mut impl Rng) -> ActionSequence {
        let steps = base
            .steps()
            .iter()
            .map(|step| {
                step.iter()
                    .map(|t| MotorTarget {
                        position: t.position + self.position_noise.sample(rng),
                        velocity: t.velocity + self.velocity_noise.sample(rng),
                    })
                    .collect()
            })
            .collect();
        ActionSequence::new(steps)
    }
}

impl ActionSampler for ShiftPerturbSampler {
    fn generate(
        &mut self,
        previous: Option<&ActionSequence>,
        horizon: usize,
        dof: usize,
        round: u64,
    ) -> Vec<ActionSequence> {
        let warm_start = match previous {
            Some(plan) if plan.len() == horizon => plan.shifted(),
            _ => ActionSequence::zeros(horizon, dof),
        };

        let mut rng = round_rng(self.seed, round);
        let mut candidates = Vec::with_capacity(self.samples);
        candidates.push(warm_start.clone());
        for _ in 1..self.samples {
            candidates.push(self.perturb(&warm_start, &mut rng));
        }
        candidates
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_samples() {
        assert!(ShiftPerturbSampler::new(0, 0.4, 0.0, 0).is_err());
    }

    #[test]
    fn rejects_negative_stddev() {
        assert!(ShiftPerturbSampler::new(4, -0.1, 0.0, 0).is_err());
    }

    #[test]
    fn first_round_warm_start_is_zero_hold() {
        let mut sampler = ShiftPerturbSampler::new(4, 0.4, 0.0, 7).unwrap();
        let candidates = sampler.generate(None, 5, 8, 0);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], ActionSequence::zeros(5, 8));
    }

    #[test]
    fn warm_start_shifts_previous_plan() {
        let mut sampler = ShiftPerturbSampler::new(2, 0.4, 0.0, 7).unwrap();
        let previous = ActionSequence::new(vec![
            vec![MotorTarget::position(1.0)],
            vec![MotorTarget::position(2.0)],
        ]);
        let candidates = sampler.generate(Some(&previous), 2, 1, 1);
        assert_eq!(candidates[0], previous.shifted());
    }

    #[test]
    fn horizon_mismatch_falls_back_to_zero_hold() {
        let mut sampler = ShiftPerturbSampler::new(2, 0.4, 0.0, 7).unwrap();
        let previous = ActionSequence::zeros(3, 1);
        let candidates = sampler.generate(Some(&previous), 5, 1, 1);
        assert_eq!(candidates[0], ActionSequence::zeros(5, 1));
    }

    #[test]
    fn same_round_same_candidates() {
        let mut a = ShiftPerturbSampler::new(8, 0.4, 0.1, 42).unwrap();
        let mut b = ShiftPerturbSampler::new(8, 0.4, 0.1, 42).unwrap();
        assert_eq!(a.generate(None, 5, 8, 3), b.generate(None, 5, 8, 3));
    }

    #[test]
    fn different_rounds_differ() {
        let mut sampler = ShiftPerturbSampler::new(8, 0.4, 0.1, 42).unwrap();
        let round0 = sampler.generate(None, 5, 8, 0);
        let round1 = sampler.generate(None, 5, 8, 1);
        assert_ne!(round0[1], round1[1]);
    }

    #[test]
    fn zero_stddev_clones_warm_start() {
        let mut sampler = ShiftPerturbSampler::new(4, 0.0, 0.0, 42).unwrap();
        let candidates = sampler.generate(None, 3, 2, 0);
        for candidate in &candidates {
            assert_eq!(candidate, &candidates[0]);
        }
    }

    #[test]
    fn candidate_shape_matches_request() {
        let mut sampler = ShiftPerturbSampler::new(6, 0.4, 0.0, 1).unwrap();
        for candidate in sampler.generate(None, 5, 8, 0) {
            assert_eq!(candidate.len(), 5);
            for i in 0..5 {
                assert_eq!(candidate.step(i).unwrap().len(), 8);
            }
        }
    }
}
