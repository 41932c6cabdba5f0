//! Error types.
//!
//! - `FitError` is the structured failure of the fitting core. Callers are expected
//!   to degrade gracefully on it ("no inflection detected"), never to crash.
//! - `AppError` is the application-level error: a message plus the process exit code.

use thiserror::Error;

/// Failure modes of a single fit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Non-finite values or mismatched x/y lengths.
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Too few samples, or no variation in x.
    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    /// The least-squares solver did not converge.
    #[error("fit did not converge: {reason}")]
    FitDivergence { reason: String },
}

impl FitError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        FitError::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn insufficient(reason: impl Into<String>) -> Self {
        FitError::InsufficientData {
            reason: reason.into(),
        }
    }

    pub fn divergence(reason: impl Into<String>) -> Self {
        FitError::FitDivergence {
            reason: reason.into(),
        }
    }

    /// Process exit code used when this error ends a CLI run.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::MalformedInput { .. } | FitError::InsufficientData { .. } => 3,
            FitError::FitDivergence { .. } => 4,
        }
    }
}

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

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_errors_map_to_exit_codes() {
        let e: AppError = FitError::insufficient("only 3 samples").into();
        assert_eq!(e.exit_code(), 3);
        assert_eq!(e.to_string(), "insufficient data: only 3 samples");

        let e: AppError = FitError::divergence("iteration budget exhausted").into();
        assert_eq!(e.exit_code(), 4);
    }
}
