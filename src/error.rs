use thiserror::Error;

/// Rejections reported back to the connection that sent the command.
///
/// Every variant maps one-to-one onto a wire status. None of them is raised
/// after a match has been mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("name is empty")]
    NoName,
    #[error("name is longer than {max} characters", max = crate::models::directory::MAX_NAME_LEN)]
    NameTooLong,
    #[error("name already sits in an open match")]
    NameTaken,
    #[error("time budgets must be positive")]
    TimeTooShort,
    #[error("match not found or already started")]
    NotFound,
    #[error("not your move")]
    NotYourMove,
    #[error("match, name and key do not resolve")]
    Invalid,
}

impl CommandError {
    pub fn status(self) -> &'static str {
        match self {
            CommandError::NoName => "noName",
            CommandError::NameTooLong => "nameTooLong",
            CommandError::NameTaken => "nameTaken",
            CommandError::TimeTooShort => "timeTooShort",
            CommandError::NotFound => "notFound",
            CommandError::NotYourMove => "notYourMove",
            CommandError::Invalid => "invalid",
        }
    }
}

/// Failures decoding a position string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("unknown piece letter '{0}'")]
    UnknownPiece(char),
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {0} does not describe exactly 8 files")]
    RankWidth(usize),
    #[error("unknown side to move '{0}'")]
    SideToMove(String),
}
