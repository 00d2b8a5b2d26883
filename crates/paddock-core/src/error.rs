use std::fmt;

/// Failure kinds surfaced by the game engine.
///
/// `Validation` is the caller's fault and never worth retrying.
/// `SourceUnavailable` means a snapshot fetch failed and game state is
/// untouched. `DataIncomplete` is non-fatal and travels as a warning next
/// to a scoring outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    Validation(String),
    SourceUnavailable(String),
    DataIncomplete(String),
}

impl GameError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn data_incomplete(msg: impl Into<String>) -> Self {
        Self::DataIncomplete(msg.into())
    }

    /// The bare message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::SourceUnavailable(m) | Self::DataIncomplete(m) => m,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::DataIncomplete(_) => "data_incomplete",
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(m) => write!(f, "invalid request: {m}"),
            Self::SourceUnavailable(m) => write!(f, "snapshot source unavailable: {m}"),
            Self::DataIncomplete(m) => write!(f, "incomplete race data: {m}"),
        }
    }
}

impl std::error::Error for GameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_prefix() {
        let err = GameError::validation("name is empty");
        assert_eq!(err.to_string(), "invalid request: name is empty");
        assert_eq!(err.message(), "name is empty");
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn kinds_are_distinct() {
        assert_eq!(GameError::source_unavailable("x").kind(), "source_unavailable");
        assert_eq!(GameError::data_incomplete("x").kind(), "data_incomplete");
    }
}
