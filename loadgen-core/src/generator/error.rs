pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    Validation(#[from] ValidationError),

    #[error("ticket pool capacity must be a positive integer")]
    InvalidCapacity,
}

/// Every parameter violation found in one check, reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .violations.join("; "))]
pub struct ValidationError {
    violations: Vec<String>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}
