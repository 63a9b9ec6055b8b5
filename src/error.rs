//! Application error type.
//!
//! A single error type is enough for this tool: every failure ends up as a
//! message on stderr plus a process exit code. The exit codes are part of the
//! CLI contract:
//!
//! - `2`: usage / input-schema errors (bad flags, bad CSV schema, missing API key)
//! - `3`: validation gate FAIL, or not enough data to analyze
//! - `4`: runtime/data errors (HTTP failures, malformed upstream payloads)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Usage or input-schema error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Validation failure or insufficient data (exit code 3).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Runtime/data error from an upstream source (exit code 4).
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
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
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
