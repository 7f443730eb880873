// morpho-mpc: Sampling-based receding-horizon MPC for articulated robots.
//
// The controller snapshots the live scene, scores sampled action sequences
// on forked scene instances across a fixed worker pool, and replays the
// winning plan until the next recomputation round.

pub mod controller;
pub mod pool;
pub mod sampler;
pub mod types;

pub mod prelude {
    pub use crate::controller::{ControllerPhase, MpcController};
    pub use crate::pool::{BatchScores, RolloutPool};
    pub use crate::sampler::{ActionSampler, ShiftPerturbSampler};
    pub use crate::types::{ActionSequence, Plan, RoundStats};
}

pub use controller::{ControllerPhase, MpcController};
pub use pool::RolloutPool;
pub use sampler::{ActionSampler, ShiftPerturbSampler};
pub use types::{ActionSequence, Plan, RoundStats};
