//! Fixed-size rollout worker pool.
//!
//! One recomputation round is a synchronous barrier: the caller hands over
//! the full candidate batch, every candidate is scored on a forked scene,
//! and control returns only after the last result is in. Workers pull
//! candidate indices from a shared atomic cursor and post results over a
//! channel into index-addressed slots, so the returned score vector is
//! independent of thread scheduling.
//!
//! Failure policy: a factory that cannot produce a scene is fatal and aborts
//! the round. Everything else (a panicking objective, a non-finite score, a
//! backend contract violation) is recovered by scoring that candidate with
//! the worst possible value.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;

use morpho_core::error::{ConfigError, RolloutError};
use morpho_model::RobotModel;
use morpho_sim::backend::{Simulation, SimulationFactory};
use morpho_sim::objective::Objective;
use morpho_sim::state::SimulationState;

use crate::types::ActionSequence;

// ---------------------------------------------------------------------------
// BatchScores
// ---------------------------------------------------------------------------

/// Result of one evaluation round.
#[derive(Debug, Clone)]
pub struct BatchScores {
    /// Per-candidate scores, in candidate order. Failed candidates hold the
    /// worst value for the objective's direction.
    pub scores: Vec<f64>,
    /// How many candidates failed and were scored worst.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// RolloutPool
// ---------------------------------------------------------------------------

enum Outcome {
    Scored {
        index: usize,
        result: Result<f64, RolloutError>,
    },
    Fatal(ConfigError),
}

/// Evaluates candidate batches across a fixed number of scoped threads.
///
/// Each task creates a fresh scene instance from the factory, restores the
/// snapshot into it, and drops it when the rollout completes. No instance
/// outlives its task, so no scene is ever touched by two threads.
pub struct RolloutPool {
    thread_count: usize,
}

impl RolloutPool {
    /// Create a pool with the given worker count (clamped to at least 1).
    pub fn new(thread_count: usize) -> Self {
        Self {
            thread_count: thread_count.max(1),
        }
    }

    /// Number of worker threads used per round.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Score every candidate from the given live-state snapshot.
    pub fn evaluate(
        &self,
        candidates: &[ActionSequence],
        snapshot: &SimulationState,
        model: &Arc<RobotModel>,
        factory: &dyn SimulationFactory,
        objective: &dyn Objective,
    ) -> Result<BatchScores, ConfigError> {
        let direction = objective.direction();
        if candidates.is_empty() {
            return Ok(BatchScores {
                scores: Vec::new(),
                failed: 0,
            });
        }

        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<Outcome>();
        let workers = self.thread_count.min(candidates.len());

        let mut scores = vec![direction.worst(); candidates.len()];
        let mut failed = 0usize;
        let mut fatal: Option<ConfigError> = None;

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let stop = &stop;
                scope.spawn(move || {
                    loop {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        if index >= candidates.len() {
                            break;
                        }
                        let mut sim = match factory.create() {
                            Ok(sim) => sim,
                            Err(e) => {
                                stop.store(true, Ordering::Relaxed);
                                let _ = tx.send(Outcome::Fatal(e));
                                return;
                            }
                        };
                        let result = catch_unwind(AssertUnwindSafe(|| {
                            rollout(sim.as_mut(), snapshot, model, &candidates[index], objective)
                        }))
                        .unwrap_or_else(|payload| {
                            Err(RolloutError::WorkerPanic(panic_message(&payload)))
                        });
                        let _ = tx.send(Outcome::Scored { index, result });
                    }
                });
            }
            drop(tx);

            for outcome in rx {
                match outcome {
                    Outcome::Scored { index, result } => match result {
                        Ok(score) => scores[index] = score,
                        Err(e) => {
                            tracing::warn!(candidate = index, error = %e, "rollout failed, scored worst");
                            failed += 1;
                        }
                    },
                    Outcome::Fatal(e) => {
                        stop.store(true, Ordering::Relaxed);
                        if fatal.is_none() {
                            fatal = Some(e);
                        }
                    }
                }
            }
        });

        match fatal {
            Some(e) => Err(e),
            None => Ok(BatchScores { scores, failed }),
        }
    }
}

/// Restore the snapshot, play one candidate through, score the endpoint.
fn rollout(
    sim: &mut dyn Simulation,
    snapshot: &SimulationState,
    model: &Arc<RobotModel>,
    candidate: &ActionSequence,
    objective: &dyn Objective,
) -> Result<f64, RolloutError> {
    sim.restore_state(snapshot)
        .map_err(|e| RolloutError::Evaluation(e.to_string()))?;
    let robot = sim
        .find_robot_index(model)
        .ok_or_else(|| RolloutError::Evaluation("robot not present in forked scene".into()))?;

    for step in candidate.steps() {
        sim.set_motor_targets(robot, step)
            .map_err(|e| RolloutError::Evaluation(e.to_string()))?;
        sim.step();
    }

    let score = objective.score(sim);
    if score.is_finite() {
        Ok(score)
    } else {
        Err(RolloutError::NonFiniteScore(score))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
