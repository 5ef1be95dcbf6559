// src/infra/errors.rs — Error types for TripKoi

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TripKoiError {
    // Backend errors
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Empty response from '{provider}' ({model})")]
    EmptyResponse { provider: String, model: String },

    #[error("All models failed, last error: {last}")]
    AllModelsFailed { last: String },

    // Model output errors
    #[error("Invalid model output: {0}")]
    Output(#[from] OutputError),

    #[error("Generating {unit} failed after {attempts} attempts: {last_error}")]
    GenerationExhausted {
        unit: String,
        attempts: u32,
        last_error: String,
    },

    // User errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Real-time forecast is not available {days_ahead} day(s) from today")]
    ForecastOutOfRange { days_ahead: i64 },

    #[error("No API key configured. Set GEMINI_API_KEY or [provider].api_key in config.toml.")]
    NoProvider,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TripKoiError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TripKoiError::Provider {
                retriable: true,
                ..
            } | TripKoiError::RateLimited { .. }
        )
    }

    /// True for failures on the backend side, as opposed to bad model output.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TripKoiError::Provider { .. }
                | TripKoiError::RateLimited { .. }
                | TripKoiError::EmptyResponse { .. }
                | TripKoiError::AllModelsFailed { .. }
        )
    }
}

/// Reasons a model response was rejected for one attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputError {
    #[error("no JSON object could be recovered from the response")]
    Unparseable,

    #[error("required array field '{0}' is missing")]
    MissingField(&'static str),

    #[error("response shape is not usable: {0}")]
    Malformed(String),

    #[error("expected {expected} day plan(s), got {actual}")]
    DayCount { expected: usize, actual: usize },

    #[error("day indices must be exactly {expected}, got {actual:?}")]
    DayIndices { expected: String, actual: Vec<u32> },

    #[error("day {day} is missing required meals: {missing}")]
    MissingMeals { day: u32, missing: String },
}
