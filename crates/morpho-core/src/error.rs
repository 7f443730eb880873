use thiserror::Error;

/// Top-level error type for the morpho workspace.
#[derive(Debug, Error)]
pub enum MorphoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("Rollout error: {0}")]
    Rollout(#[from] RolloutError),
}

/// Fatal errors: malformed robot models, bad configuration values, or a
/// simulation factory that cannot produce an instance.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Link {link} references parent {parent}, which is not strictly smaller")]
    ParentOutOfOrder { link: usize, parent: usize },

    #[error("Link {link} has no parent, but only the first link may be the root")]
    UnexpectedRoot { link: usize },

    #[error("The first link must be the root (no parent)")]
    MissingRoot,

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Scene creation failed: {0}")]
    SceneCreation(String),
}

/// Simulation backend contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("Robot not found in this simulation instance")]
    RobotNotFound,

    #[error("Link index {link} out of range for robot {robot}")]
    LinkOutOfRange { robot: usize, link: usize },

    #[error("State size mismatch: snapshot has {got} bodies, scene has {expected}")]
    StateSizeMismatch { expected: usize, got: usize },

    #[error("Motor target count mismatch: expected {expected}, got {got}")]
    MotorTargetCount { expected: usize, got: usize },
}

/// Per-rollout failures. Recovered at the task boundary: the offending
/// candidate is scored with the worst possible value and the round goes on.
#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("Objective produced a non-finite score: {0}")]
    NonFiniteScore(f64),

    #[error("Rollout evaluation failed: {0}")]
    Evaluation(String),

    #[error("Rollout worker panicked: {0}")]
    WorkerPanic(String),

    #[error("Candidate batch was empty")]
    EmptyBatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn morpho_error_from_config_error() {
        let err = ConfigError::ParentOutOfOrder { link: 2, parent: 5 };
        let top: MorphoError = err.into();
        assert!(matches!(top, MorphoError::Config(_)));
        assert!(top.to_string().contains("parent 5"));
    }

    #[test]
    fn morpho_error_from_sim_error() {
        let err = SimError::RobotNotFound;
        let top: MorphoError = err.into();
        assert!(matches!(top, MorphoError::Sim(_)));
    }

    #[test]
    fn morpho_error_from_rollout_error() {
        let err = RolloutError::NonFiniteScore(f64::NAN);
        let top: MorphoError = err.into();
        assert!(matches!(top, MorphoError::Rollout(_)));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn sim_error_is_copy() {
        let err = SimError::StateSizeMismatch {
            expected: 14,
            got: 13,
        };
        let err2 = err; // Copy
        assert_eq!(err, err2);
    }

    #[test]
    fn sim_error_display_messages() {
        assert_eq!(
            SimError::RobotNotFound.to_string(),
            "Robot not found in this simulation instance"
        );
        assert_eq!(
            SimError::LinkOutOfRange { robot: 0, link: 13 }.to_string(),
            "Link index 13 out of range for robot 0"
        );
        assert_eq!(
            SimError::MotorTargetCount {
                expected: 8,
                got: 3
            }
            .to_string(),
            "Motor target count mismatch: expected 8, got 3"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::ParentOutOfOrder { link: 1, parent: 1 }.to_string(),
            "Link 1 references parent 1, which is not strictly smaller"
        );
        assert_eq!(
            ConfigError::MissingRoot.to_string(),
            "The first link must be the root (no parent)"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                field: "horizon".into(),
                message: "must be >= 1".into()
            }
            .to_string(),
            "Invalid value for horizon: must be >= 1"
        );
    }

    #[test]
    fn rollout_error_display_messages() {
        assert!(
            RolloutError::NonFiniteScore(f64::INFINITY)
                .to_string()
                .contains("non-finite")
        );
        assert_eq!(
            RolloutError::WorkerPanic("boom".into()).to_string(),
            "Rollout worker panicked: boom"
        );
        assert_eq!(
            RolloutError::EmptyBatch.to_string(),
            "Candidate batch was empty"
        );
    }
}
