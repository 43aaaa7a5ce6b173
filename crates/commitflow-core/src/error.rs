use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("not a git repository (run inside a working tree)")]
    NotARepository,

    #[error("no changes detected")]
    NoChanges,

    #[error("missing commit message")]
    MissingMessage,

    #[error("nothing staged: add files with 'git add' before committing")]
    NothingStaged,

    #[error("gate failed: {display_name} ('{script}' exited non-zero)")]
    GateFailed {
        script: String,
        display_name: String,
    },

    #[error("git commit failed: {0}")]
    CommitFailed(String),

    #[error("git command failed: {0}")]
    Git(String),

    #[error("required tool not found on PATH: {0}")]
    ToolNotFound(String),

    #[error("failed to spawn script: {0}")]
    ScriptSpawnFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    /// Process exit code for this failure.
    ///
    /// Codes are per entry point: the reporter uses 1/2, the committer
    /// 1/2/5 and the gate runner 3. Anything unexpected is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            FlowError::NoChanges | FlowError::NothingStaged => 2,
            FlowError::GateFailed { .. } => 3,
            FlowError::CommitFailed(_) => 5,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
