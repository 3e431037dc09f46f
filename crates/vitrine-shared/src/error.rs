use thiserror::Error;

/// A value that was present in a configuration source but could not be
/// used. The resolver drops the value and falls through to the next tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted path of the offending value (e.g. `mobile.colors.primary`).
    pub path: String,
    /// Human-readable description of the problem.
    pub problem: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            problem: problem.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.problem)
        } else {
            write!(f, "{}: {}", self.path, self.problem)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessCodeError {
    #[error("Access code must have {expected} characters, got {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("Invalid character in access code: {0:?}")]
    InvalidCharacter(char),
}
