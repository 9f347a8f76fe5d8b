use std::path::PathBuf;

use thiserror::Error;

pub type SurveyResult<T> = Result<T, SurveyError>;

#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("config error: {0}")]
    Config(String),

    #[error("Not enough image pairs in {}. Found {found}, need {required}", path.display())]
    InsufficientPairs {
        path: PathBuf,
        found: usize,
        required: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unknown or expired survey session")]
    UnknownSession,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),

    #[error("session store failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("json failure: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chart rendering failed: {0}")]
    Chart(String),
}

impl SurveyError {
    pub fn chart(err: impl std::fmt::Display) -> Self {
        SurveyError::Chart(err.to_string())
    }
}

/// Rejections of a submitted form. `Display` is the participant-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please answer all questions. Pair {pair} has no selection.")]
    MissingAnswer { pair: usize },

    #[error("Pair {pair} has an invalid selection '{value}'.")]
    InvalidChoice { pair: usize, value: String },

    #[error("Please fill in the '{field}' question.")]
    MissingDemographic { field: &'static str },
}
