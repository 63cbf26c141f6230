#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// At least one received result was not a success.
    CallsFailed = 10,

    /// Invalid CLI flags or load parameters (bad durations, zero rate, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (logging setup, output failures, generator refused to start).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_outcome(all_succeeded: bool) -> Self {
        if all_succeeded {
            Self::Success
        } else {
            Self::CallsFailed
        }
    }
}
