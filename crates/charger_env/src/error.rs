use simcore::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("expected {expected} actions, got {got}")]
    ActionCount { expected: usize, got: usize },
}
