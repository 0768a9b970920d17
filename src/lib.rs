pub mod candidates;
pub mod engine;
pub mod engine_norm;
pub mod error;
pub mod fusion;
pub mod heuristics;
pub mod history;
pub mod position;
pub mod predictor;
pub mod profile;
pub mod rng;
pub mod trace;
pub mod types;
pub mod weights;

pub use error::PredictorError;
pub use predictor::{Predictor, PredictorConfig};
pub use types::{PredictionRequest, PredictionResponse};
