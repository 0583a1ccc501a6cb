use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Internal engine error: {0}")]
    Internal(String),
    #[error("Conclusion of {0} selected as pivot while it is the goal with pending premises")]
    GoalConclusionSelected(String),
}

