// morpho-sim: Simulation backend abstraction for the morpho design-search stack.
//
// Provides the `Simulation` / `SimulationFactory` / `Objective` seam the MPC
// controller consumes, so the concrete physics engine can be swapped without
// changing the controller. A rapier3d backend makes the workspace runnable
// end to end.

pub mod backend;
pub mod objective;
pub mod rapier;
pub mod scene;
pub mod state;

pub mod prelude {
    pub use crate::backend::{Simulation, SimulationFactory};
    pub use crate::objective::{BaseHeightObjective, Objective, OptimizationDirection};
    pub use crate::rapier::RapierSimulation;
    pub use crate::scene::SceneDescription;
    pub use crate::state::{MotorTarget, RigidBodyState, SimulationState};
}

pub use backend::{Simulation, SimulationFactory};
pub use objective::{Objective, OptimizationDirection};
pub use scene::SceneDescription;
pub use state::{MotorTarget, SimulationState};
