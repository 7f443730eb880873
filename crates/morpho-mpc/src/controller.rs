//! Receding-horizon sampling MPC controller.
//!
//! Every `interval` control steps the controller snapshots the live scene,
//! samples a candidate batch, scores every candidate on forked scenes in
//! the worker pool, and installs the best candidate as the active plan. In
//! between it replays the plan step by step, holding the final step if the
//! plan runs out before the next recomputation.

use std::sync::Arc;

use morpho_core::config::ControllerConfig;
use morpho_core::error::{ConfigError, MorphoError, RolloutError, SimError};
use morpho_core::seed::derive_seed;
use morpho_model::RobotModel;
use morpho_sim::backend::{Simulation, SimulationFactory};
use morpho_sim::objective::Objective;

use crate::pool::RolloutPool;
use crate::sampler::{ActionSampler, ShiftPerturbSampler};
use crate::types::{Plan, RoundStats};

// ---------------------------------------------------------------------------
// ControllerPhase
// ---------------------------------------------------------------------------

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerPhase {
    /// Replaying the installed plan (or waiting for the first round).
    #[default]
    Idle,
    /// A recomputation round is in flight.
    Planning,
}

// ---------------------------------------------------------------------------
// MpcController
// ---------------------------------------------------------------------------

/// Sampling MPC controller for one robot.
///
/// The caller owns the live scene and passes it into every
/// [`update`](Self::update); the controller only ever forks fresh instances
/// through its factory, never mutates scene structure.
pub struct MpcController {
    model: Arc<RobotModel>,
    factory: Arc<dyn SimulationFactory>,
    objective: Arc<dyn Objective>,
    sampler: Box<dyn ActionSampler>,
    pool: RolloutPool,
    horizon: usize,
    interval: u32,
    phase: ControllerPhase,
    plan: Option<Plan>,
    step_count: u64,
    rounds: u64,
    last_round: Option<RoundStats>,
}

impl MpcController {
    /// Create a controller with the default shift-and-perturb sampler,
    /// seeded with the `"sampler"` child of `config.seed`.
    pub fn new(
        model: Arc<RobotModel>,
        factory: Arc<dyn SimulationFactory>,
        objective: Arc<dyn Objective>,
        config: &ControllerConfig,
    ) -> Result<Self, ConfigError> {
        let sampler = Box::new(ShiftPerturbSampler::new(
            config.samples,
            config.position_stddev,
            config.velocity_stddev,
            derive_seed(config.seed, "sampler"),
        )?);
        Self::with_sampler(model, factory, objective, sampler, config)
    }

    /// Create a controller with a custom candidate sampler.
    pub fn with_sampler(
        model: Arc<RobotModel>,
        factory: Arc<dyn SimulationFactory>,
        objective: Arc<dyn Objective>,
        sampler: Box<dyn ActionSampler>,
        config: &ControllerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            model,
            factory,
            objective,
            sampler,
            pool: RolloutPool::new(config.effective_thread_count()),
            horizon: config.horizon,
            interval: config.interval,
            phase: ControllerPhase::Idle,
            plan: None,
            step_count: 0,
            rounds: 0,
            last_round: None,
        })
    }

    /// One control step: recompute the plan if the interval elapsed, then
    /// apply the current plan step and advance the cursor.
    ///
    /// The caller steps the live scene itself after this returns, so a
    /// controller can be layered over an externally driven loop.
    pub fn update(&mut self, sim: &mut dyn Simulation) -> Result<(), MorphoError> {
        if self.step_count % u64::from(self.interval) == 0 {
            self.replan(sim)?;
        }
        self.apply_current(sim)?;
        self.step_count += 1;
        Ok(())
    }

    /// Run one recomputation round against the live scene's current state.
    ///
    /// On a fatal error the previous plan is retained and the controller
    /// returns to [`ControllerPhase::Idle`], so a later round can retry.
    pub fn replan(&mut self, sim: &mut dyn Simulation) -> Result<(), MorphoError> {
        self.phase = ControllerPhase::Planning;
        let result = self.run_round(sim);
        self.phase = ControllerPhase::Idle;
        result
    }

    fn run_round(&mut self, sim: &mut dyn Simulation) -> Result<(), MorphoError> {
        let started = std::time::Instant::now();
        let snapshot = sim.save_state();
        let round = self.rounds;
        let previous = self.plan.as_ref().map(Plan::actions);
        let mut candidates = self
            .sampler
            .generate(previous, self.horizon, self.model.dof(), round);
        if candidates.is_empty() {
            return Err(RolloutError::EmptyBatch.into());
        }

        let batch = self.pool.evaluate(
            &candidates,
            &snapshot,
            &self.model,
            self.factory.as_ref(),
            self.objective.as_ref(),
        )?;

        // Strict comparison keeps the earliest candidate on ties, so the
        // selection is a pure function of the score vector.
        let direction = self.objective.direction();
        let mut best_index = 0;
        for (index, &score) in batch.scores.iter().enumerate() {
            if direction.is_better(score, batch.scores[best_index]) {
                best_index = index;
            }
        }
        let best_score = batch.scores[best_index];
        let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

        tracing::debug!(
            round,
            candidates = candidates.len(),
            failed = batch.failed,
            best_index,
            best_score,
            elapsed_us,
            "recomputation round complete"
        );

        self.plan = Some(Plan::new(candidates.swap_remove(best_index)));
        self.last_round = Some(RoundStats {
            round,
            candidates: batch.scores.len(),
            best_index,
            best_score,
            failed: batch.failed,
            elapsed_us,
        });
        self.rounds += 1;
        Ok(())
    }

    fn apply_current(&mut self, sim: &mut dyn Simulation) -> Result<(), MorphoError> {
        let Some(plan) = self.plan.as_mut() else {
            return Ok(());
        };
        if plan.is_empty() {
            return Ok(());
        }
        let robot = sim
            .find_robot_index(&self.model)
            .ok_or(SimError::RobotNotFound)?;
        sim.set_motor_targets(robot, plan.current())?;
        plan.advance();
        Ok(())
    }

    // ---- Accessors ----

    /// Current lifecycle phase.
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Whether a recomputation round is in flight.
    pub fn is_planning(&self) -> bool {
        self.phase == ControllerPhase::Planning
    }

    /// The currently installed plan, if any round has completed.
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Number of completed recomputation rounds.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds
    }

    /// Number of control steps executed.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Stats of the most recent completed round.
    pub fn last_round(&self) -> Option<&RoundStats> {
        self.last_round.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
