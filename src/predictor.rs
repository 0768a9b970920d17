//! Top-level orchestration (§2, §5, §7). `Predictor::predict` is the single
//! entry point: Weight Selector + Habit Detector, then the Engine Adapter,
//! Candidate Assembler, per-candidate heuristics, normalizers, the Fusion
//! Core, and finally the trace/attribution writeup into a response.

use std::time::Duration;

use crate::candidates::assemble;
use crate::engine::{Engine, EngineAdapter, EngineConfig};
use crate::error::{PredictorError, PredictorResult};
use crate::fusion::fuse;
use crate::heuristics::{apply_tilt_modifier, is_tilted};
use crate::position::Position;
use crate::rng::PredictorRng;
use crate::trace::Trace;
use crate::types::{MoveSource, PredictionRequest, PredictionResponse, PrimarySource, TacticalGuardrail};
use crate::weights::{detect_habit, select_weights, suggested_delay_ms};

/// Tunables with sensible production defaults; nothing here is loaded from
/// the environment (§6 — configuration is the embedding application's job,
/// not this crate's).
#[derive(Clone, Debug)]
pub struct PredictorConfig {
    pub engine: EngineConfig,
    pub rng_seed: Option<u64>,
    /// §4.10 / Open Question 1: the centipawn gap the Tactical Guardrail
    /// reports against, never wired into fusion weighting.
    pub tactical_guardrail_threshold_cp: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            engine: EngineConfig::default(),
            rng_seed: None,
            tactical_guardrail_threshold_cp: crate::fusion::DEFAULT_GUARDRAIL_THRESHOLD_CP,
        }
    }
}

pub struct Predictor {
    engine: Box<dyn Engine>,
    rng: std::sync::Mutex<PredictorRng>,
    tactical_guardrail_threshold_cp: f64,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => PredictorRng::from_seed(seed),
            None => PredictorRng::from_entropy(),
        };
        Predictor {
            engine: Box::new(EngineAdapter::new(config.engine)),
            rng: std::sync::Mutex::new(rng),
            tactical_guardrail_threshold_cp: config.tactical_guardrail_threshold_cp,
        }
    }

    /// Constructs a `Predictor` over any [`Engine`] implementation with a
    /// fixed RNG seed, for deterministic testing (§8 property 6) against a
    /// scripted engine double instead of a real subprocess.
    pub fn with_engine_and_seed(engine: Box<dyn Engine>, seed: u64) -> Self {
        Predictor {
            engine,
            rng: std::sync::Mutex::new(PredictorRng::from_seed(seed)),
            tactical_guardrail_threshold_cp: crate::fusion::DEFAULT_GUARDRAIL_THRESHOLD_CP,
        }
    }

    /// Constructs a `Predictor` around a real `EngineAdapter` with a fixed
    /// RNG seed, for deterministic testing (§8 property 6).
    pub fn with_seed_and_engine(engine: EngineConfig, seed: u64) -> Self {
        Predictor::with_engine_and_seed(Box::new(EngineAdapter::new(engine)), seed)
    }

    pub fn predict(&self, request: &PredictionRequest) -> PredictorResult<PredictionResponse> {
        let pos = Position::from_fen(&request.fen)?;
        let legal_moves = pos.generate_legal_moves();
        if legal_moves.is_empty() {
            return Err(PredictorError::NoLegalMoves { fen: request.fen.clone() });
        }

        let mut trace = Trace::new();
        let mover = pos.turn();

        let weights = select_weights(request.move_number, request.is_opponent_turn, &request.history_moves);
        let habit = detect_habit(&request.history_moves);
        trace.logic(format!("phase classified as {:?}", weights.phase));
        if habit.detected {
            trace.logic(format!(
                "habit detected: {} at {:.1}% over {:.0} games",
                habit.move_san.as_deref().unwrap_or("?"),
                habit.frequency.unwrap_or(0.0),
                habit.sample_size
            ));
        }

        let tilt_active = is_tilted(&request.recent_eval_deltas);
        let (working_markers, tilt_attribution) = if tilt_active {
            trace.tilt("tilt detected over the last 3 recorded eval deltas, style markers amplified");
            apply_tilt_modifier(&request.style_markers)
        } else {
            (request.style_markers.clone(), Default::default())
        };
        let _ = tilt_attribution; // surfaced per-candidate via style_fit, not globally

        let analyses = assemble(&pos, &request.fen, &self.engine, &request.history_moves, &mut trace);

        if analyses.is_empty() {
            trace.warning("engine unavailable, degrading to a uniform random legal move");
            let mut rng = self.rng.lock().expect("rng mutex poisoned");
            let chosen = &legal_moves[rng.uniform_index(legal_moves.len())];
            return Ok(PredictionResponse {
                prediction_mode: request.mode,
                selected_move: chosen.san.clone(),
                selected_move_uci: chosen.uci.clone(),
                weights,
                candidates: Vec::new(),
                trace_log: trace.into_entries(),
                tilt_active,
                blunder_applied: false,
                habit_detection: habit,
                move_source: uniform_move_source(),
                suggested_delay_ms: 1500,
                tactical_guardrail: TacticalGuardrail { triggered: false, eval_delta: None },
            });
        }

        let mut rng = self.rng.lock().expect("rng mutex poisoned");
        let outcome = fuse(
            request.mode,
            &pos,
            mover,
            &analyses,
            &request.history_moves,
            &working_markers,
            &weights,
            self.tactical_guardrail_threshold_cp,
            &mut rng,
            &mut trace,
        );
        drop(rng);

        let selected = &outcome.candidates[outcome.selected_index];
        let delay = suggested_delay_ms(&habit, &selected.move_san);

        Ok(PredictionResponse {
            prediction_mode: request.mode,
            selected_move: selected.move_san.clone(),
            selected_move_uci: selected.move_uci.clone(),
            weights,
            candidates: outcome.candidates,
            trace_log: trace.into_entries(),
            tilt_active,
            blunder_applied: outcome.blunder_applied,
            habit_detection: habit,
            move_source: outcome.move_source,
            suggested_delay_ms: delay,
            tactical_guardrail: outcome.tactical_guardrail,
        })
    }
}

fn uniform_move_source() -> MoveSource {
    MoveSource { primary_source: PrimarySource::Engine, history_contribution: 0.0, engine_contribution: 0.0, style_contribution: 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PredictionMode, StyleMarkers};

    fn base_request() -> PredictionRequest {
        PredictionRequest {
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
            mode: PredictionMode::Hybrid,
            opponent_username: "tester".to_string(),
            is_opponent_turn: true,
            style_markers: StyleMarkers::neutral_defaults(),
            history_moves: vec![],
            recent_eval_deltas: vec![],
            move_number: 1,
        }
    }

    #[test]
    fn invalid_fen_aborts() {
        let predictor = Predictor::with_seed_and_engine(
            EngineConfig { path: "/nonexistent/engine".to_string(), timeout: Duration::from_millis(50), ..EngineConfig::default() },
            1,
        );
        let mut request = base_request();
        request.fen = "not a fen".to_string();
        let result = predictor.predict(&request);
        assert!(matches!(result, Err(PredictorError::InvalidPosition { .. })));
    }

    #[test]
    fn checkmate_position_has_no_legal_moves() {
        let predictor = Predictor::with_seed_and_engine(
            EngineConfig { path: "/nonexistent/engine".to_string(), timeout: Duration::from_millis(50), ..EngineConfig::default() },
            1,
        );
        let mut request = base_request();
        // Fool's mate.
        request.fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3".to_string();
        let result = predictor.predict(&request);
        assert!(matches!(result, Err(PredictorError::NoLegalMoves { .. })));
    }

    #[test]
    fn engine_unavailable_degrades_to_uniform_random_legal_move() {
        let predictor = Predictor::with_seed_and_engine(
            EngineConfig { path: "/nonexistent/engine".to_string(), timeout: Duration::from_millis(50), ..EngineConfig::default() },
            7,
        );
        let request = base_request();
        let response = predictor.predict(&request).expect("should degrade, not error");
        assert!(response.candidates.is_empty());
        assert!(response.trace_log.iter().any(|e| e.message.contains("uniform random")));
        let pos = Position::from_fen(&request.fen).unwrap();
        assert!(pos.find_legal_by_san(&response.selected_move).is_some());
    }
}
