/// Category of a planning failure.
///
/// Every kind maps to a fixed process exit code so that wrapper scripts can
/// tell a bad config apart from a broken oracle without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid required parameter.
    Configuration,
    /// Unreadable or absent data source for a required instrument.
    DataAccess,
    /// No window of the requested duration can be formed.
    InsufficientData,
    /// External template-count call failed or returned unparsable output.
    Oracle,
    /// Plan artifacts could not be written.
    Output,
    /// The batch scheduler rejected the hand-off.
    Submission,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::DataAccess => 3,
            ErrorKind::InsufficientData => 4,
            ErrorKind::Oracle => 5,
            ErrorKind::Output => 6,
            ErrorKind::Submission => 7,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataAccess, message)
    }

    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientData, message)
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Oracle, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Output, message)
    }

    pub fn submission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Submission, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_non_zero() {
        let kinds = [
            ErrorKind::Configuration,
            ErrorKind::DataAccess,
            ErrorKind::InsufficientData,
            ErrorKind::Oracle,
            ErrorKind::Output,
            ErrorKind::Submission,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = AppError::oracle("template count missing");
        assert_eq!(err.to_string(), "template count missing");
        assert_eq!(err.kind(), ErrorKind::Oracle);
    }
}
