// morpho-core: Errors, configuration, and seed derivation for the morpho stack.

pub mod config;
pub mod error;
pub mod seed;

pub mod prelude {
    pub use crate::config::ControllerConfig;
    pub use crate::error::{ConfigError, MorphoError, RolloutError, SimError};
    pub use crate::seed::{derive_seed, derive_seed_indexed};
}
