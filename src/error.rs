//! Error taxonomy for the predictor pipeline.
//!
//! Only [`PredictorError::InvalidPosition`] and [`PredictorError::NoLegalMoves`]
//! abort a request. Every other failure mode degrades gracefully and is
//! recorded as a trace-log entry instead (see `predictor::trace`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictorError {
    /// The request FEN could not be parsed.
    #[error("invalid FEN position: {fen}")]
    InvalidPosition { fen: String },

    /// The position has no legal moves (checkmate or stalemate).
    #[error("position has no legal moves: {fen}")]
    NoLegalMoves { fen: String },
}

pub type PredictorResult<T> = Result<T, PredictorError>;

/// Non-aborting degrade reasons. These never become an `Err`; they are
/// surfaced only through `TraceLogEntry::warning` (see `predictor::trace`).
#[derive(Debug, Clone, PartialEq)]
pub enum DegradeReason {
    /// The engine subprocess could not be reached or timed out entirely.
    EngineUnavailable { detail: String },
    /// A supplementary single-move evaluation failed; the candidate keeps
    /// the `-100` sentinel score and the request continues.
    EngineAnalysisFailure { san: String, detail: String },
    /// The profile store could not be reached; neutral defaults are used.
    ProfileLookupFailure { platform: String, username: String },
}

impl DegradeReason {
    pub fn message(&self) -> String {
        match self {
            DegradeReason::EngineUnavailable { detail } => {
                format!("engine unavailable, degrading to uniform random legal move: {detail}")
            }
            DegradeReason::EngineAnalysisFailure { san, detail } => {
                format!("supplementary evaluation of {san} failed, using sentinel score: {detail}")
            }
            DegradeReason::ProfileLookupFailure { platform, username } => {
                format!("profile lookup failed for {username}@{platform}, using neutral defaults")
            }
        }
    }
}
