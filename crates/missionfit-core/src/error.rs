use thiserror::Error;

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("invalid goal '{0}': expected lose_weight, gain_muscle, increase_stamina or move_better")]
    InvalidGoal(String),

    #[error("invalid transition: cannot handle {event} while {state}")]
    InvalidTransition { state: String, event: String },

    #[error("unknown storage backend '{0}': expected json or redb")]
    UnknownBackend(String),

    #[error("task database error: {0}")]
    TaskDb(String),

    #[error(transparent)]
    Completion(#[from] completion_client::CompletionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MissionError>;
