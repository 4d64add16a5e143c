//! Error types

/// Failures while loading or checking a question bank
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("Failed to load question bank from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Question bank is not an array.")]
    NotArray,

    #[error("Invalid bank file name: {0}")]
    InvalidName(String),

    #[error("Question bank has {} validation error(s).", .0.len())]
    Invalid(Vec<String>),
}

/// Guard-condition violations in the game flow.
///
/// The message is what the host sees in the alert; the state is untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error("Teams are already locked.")]
    TeamsLocked,

    #[error("Enter at least one team.")]
    NoTeams,

    #[error("Lock teams first.")]
    TeamsNotLocked,

    #[error("No questions selected. Set at least one category above 0.")]
    EmptyQueue,

    #[error("No current question.")]
    NoCurrentQuestion,

    #[error("The answer is already revealed.")]
    AlreadyRevealed,

    #[error("Reveal the answer first.")]
    NotRevealed,

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

/// Snapshot slot failures (always swallowed by the replicator)
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
