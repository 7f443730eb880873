//! Plan and candidate types for the sampling MPC pipeline.

use morpho_sim::MotorTarget;

// ---------------------------------------------------------------------------
// ActionSequence
// ---------------------------------------------------------------------------

/// A candidate control sequence: one motor-target vector per horizon step.
///
/// All steps have the same width (one target per actuated joint, in link id
/// order), fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSequence {
    steps: Vec<Vec<MotorTarget>>,
}

impl ActionSequence {
    /// Wrap a pre-built sequence of steps.
    pub fn new(steps: Vec<Vec<MotorTarget>>) -> Self {
        Self { steps }
    }

    /// An all-default sequence: `horizon` steps of zero position/velocity
    /// targets for `dof` joints.
    pub fn zeros(horizon: usize, dof: usize) -> Self {
        Self {
            steps: vec![vec![MotorTarget::default(); dof]; horizon],
        }
    }

    /// Number of horizon steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Targets at horizon step `index`, or `None` past the end.
    pub fn step(&self, index: usize) -> Option<&[MotorTarget]> {
        self.steps.get(index).map(Vec::as_slice)
    }

    /// All steps.
    pub fn steps(&self) -> &[Vec<MotorTarget>] {
        &self.steps
    }

    /// Warm-start shift: drop the first step and duplicate the last, so the
    /// sequence stays aligned with a plan whose first step has already been
    /// executed.
    #[must_use]
    pub fn shifted(&self) -> Self {
        let mut steps = self.steps.clone();
        if steps.len() > 1 {
            steps.remove(0);
            let last = steps[steps.len() - 1].clone();
            steps.push(last);
        }
        Self { steps }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The currently installed control plan plus an execution cursor.
///
/// The cursor clamps at the final step, so a controller that outlives its
/// horizon keeps holding the last targets until the next recomputation.
#[derive(Debug, Clone)]
pub struct Plan {
    actions: ActionSequence,
    cursor: usize,
}

impl Plan {
    /// Install a fresh plan with the cursor at the first step.
    pub fn new(actions: ActionSequence) -> Self {
        Self { actions, cursor: 0 }
    }

    /// Plan length in horizon steps.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The action sequence this plan executes.
    pub fn actions(&self) -> &ActionSequence {
        &self.actions
    }

    /// Targets at the cursor. Empty slice for an empty plan.
    pub fn current(&self) -> &[MotorTarget] {
        self.actions.step(self.cursor).unwrap_or(&[])
    }

    /// Move the cursor one step forward, clamped to the final step.
    pub fn advance(&mut self) {
        if self.cursor + 1 < self.actions.len() {
            self.cursor += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// RoundStats
// ---------------------------------------------------------------------------

/// Summary of one recomputation round.
#[derive(Debug, Clone)]
pub struct RoundStats {
    /// Zero-based round index.
    pub round: u64,
    /// Number of candidates evaluated.
    pub candidates: usize,
    /// Index of the selected candidate.
    pub best_index: usize,
    /// Score of the selected candidate.
    pub best_score: f64,
    /// Number of candidates that failed and were scored worst.
    pub failed: usize,
    /// Wall-clock duration of the round, in microseconds.
    pub elapsed_us: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_has_requested_shape() {
        let seq = ActionSequence::zeros(5, 8);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.step(0).unwrap().len(), 8);
        assert_eq!(seq.step(4).unwrap(), &[MotorTarget::default(); 8]);
        assert!(seq.step(5).is_none());
    }

    #[test]
    fn shifted_drops_first_and_duplicates_last() {
        let seq = ActionSequence::new(vec![
            vec![MotorTarget::position(1.0)],
            vec![MotorTarget::position(2.0)],
            vec![MotorTarget::position(3.0)],
        ]);
        let shifted = seq.shifted();
        assert_eq!(shifted.len(), 3);
        assert_eq!(shifted.step(0).unwrap()[0].position, 2.0);
        assert_eq!(shifted.step(1).unwrap()[0].position, 3.0);
        assert_eq!(shifted.step(2).unwrap()[0].position, 3.0);
    }

    #[test]
    fn shifted_single_step_is_unchanged() {
        let seq = ActionSequence::new(vec![vec![MotorTarget::position(1.0)]]);
        assert_eq!(seq.shifted(), seq);
    }

    #[test]
    fn plan_cursor_clamps_at_last_step() {
        let mut plan = Plan::new(ActionSequence::zeros(3, 1));
        assert_eq!(plan.cursor(), 0);
        plan.advance();
        plan.advance();
        assert_eq!(plan.cursor(), 2);
        // Further advances hold at the final step.
        plan.advance();
        plan.advance();
        assert_eq!(plan.cursor(), 2);
        assert_eq!(plan.current().len(), 1);
    }

    #[test]
    fn empty_plan_current_is_empty() {
        let mut plan = Plan::new(ActionSequence::new(Vec::new()));
        assert!(plan.is_empty());
        assert!(plan.current().is_empty());
        plan.advance();
        assert_eq!(plan.cursor(), 0);
    }
}
