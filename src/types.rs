//! Request/response data model (§3). Enumerations serialize as the literal
//! strings named in the wire contract, independent of Rust variant naming.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Fixed-schema style markers, all on a 0–100 scale. Immutable per request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StyleMarkers {
    pub aggression_index: f64,
    pub queen_trade_avoidance: f64,
    pub material_greed: f64,
    pub complexity_preference: f64,
    pub space_expansion: f64,
    pub blunder_rate: f64,
    pub time_pressure_weakness: f64,
}

impl StyleMarkers {
    /// Neutral defaults used when the profile store is unreachable (§7
    /// `ProfileLookupFailure`): all markers at 50, blunder rate at 5.
    pub fn neutral_defaults() -> Self {
        StyleMarkers {
            aggression_index: 50.0,
            queen_trade_avoidance: 50.0,
            material_greed: 50.0,
            complexity_preference: 50.0,
            space_expansion: 50.0,
            blunder_rate: 5.0,
            time_pressure_weakness: 50.0,
        }
    }

    /// `blunder_rate` read as a probability in [0, 1].
    pub fn blunder_probability(&self) -> f64 {
        self.blunder_rate / 100.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryMove {
    pub move_san: String,
    pub frequency: f64,
    #[serde(default)]
    pub last_played: Option<String>,
    #[serde(default)]
    pub avg_result: Option<f64>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    PureHistory,
    Hybrid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub fen: String,
    pub mode: PredictionMode,
    pub opponent_username: String,
    #[serde(default = "default_true")]
    pub is_opponent_turn: bool,
    pub style_markers: StyleMarkers,
    pub history_moves: Vec<HistoryMove>,
    /// Most recent delta last, in pawns, from the opponent's perspective.
    #[serde(default)]
    pub recent_eval_deltas: Vec<f64>,
    pub move_number: u32,
}

/// Per-candidate engine analysis (Multi-PV entry or a synthetic single-move
/// evaluation injected by the Candidate Assembler).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineAnalysis {
    pub move_uci: String,
    pub move_san: String,
    /// Side-to-move centipawns; mate scores are collapsed to ±10000.
    pub score_cp: i32,
    #[serde(default)]
    pub score_mate: Option<i32>,
    /// 1-indexed engine rank, or an assembler-assigned rank for history
    /// additions (`|engine_top_M| + insertion_order`).
    pub rank: usize,
    #[serde(default)]
    pub pv: Vec<String>,
    pub depth: u32,
    #[serde(default)]
    pub from_history: bool,
}

/// Additive bonuses/penalties on the style-fit unit scale (§4.1).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MoveAttribution {
    #[serde(default)]
    pub aggression_bonus: f64,
    #[serde(default)]
    pub complexity_bonus: f64,
    #[serde(default)]
    pub trade_penalty: f64,
    #[serde(default)]
    pub greed_bonus: f64,
    #[serde(default)]
    pub space_bonus: f64,
    #[serde(default)]
    pub tilt_modifier: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CandidateMove {
    pub move_san: String,
    pub move_uci: String,
    /// Pawns, signed from the side to move.
    pub engine_eval: f64,
    pub engine_rank: Option<usize>,
    pub history_frequency: f64,
    pub style_fit: f64,
    pub raw_score: f64,
    pub final_prob: f64,
    pub attribution: MoveAttribution,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightMode {
    NonOpponentTurn,
    LowSample,
    Habit,
    Chameleon,
    Phase,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhaseWeights {
    pub phase: Phase,
    pub history: f64,
    pub engine: f64,
    pub style: f64,
    pub predictability_index: f64,
    pub sample_size: f64,
    pub weight_mode: WeightMode,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TraceEntryType {
    Logic,
    Warning,
    Decision,
    Tilt,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TraceLogEntry {
    #[serde(rename = "type")]
    pub entry_type: TraceEntryType,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HabitDetection {
    pub detected: bool,
    #[serde(default)]
    pub move_san: Option<String>,
    #[serde(default)]
    pub frequency: Option<f64>,
    pub sample_size: f64,
}

/// Declared per §4.10 — computed and surfaced on every request, but never
/// executed inside fusion (the source only specifies the contract).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TacticalGuardrail {
    pub triggered: bool,
    #[serde(default)]
    pub eval_delta: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub prediction_mode: PredictionMode,
    pub selected_move: String,
    pub selected_move_uci: String,
    pub weights: PhaseWeights,
    pub candidates: Vec<CandidateMove>,
    pub trace_log: Vec<TraceLogEntry>,
    pub tilt_active: bool,
    pub blunder_applied: bool,
    pub habit_detection: HabitDetection,
    pub move_source: MoveSource,
    pub suggested_delay_ms: u32,
    pub tactical_guardrail: TacticalGuardrail,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimarySource {
    History,
    Style,
    Engine,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MoveSource {
    pub primary_source: PrimarySource,
    pub history_contribution: f64,
    pub engine_contribution: f64,
    pub style_contribution: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_mode_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&PredictionMode::PureHistory).unwrap(), "\"pure_history\"");
        assert_eq!(serde_json::to_string(&PredictionMode::Hybrid).unwrap(), "\"hybrid\"");
    }

    #[test]
    fn request_without_is_opponent_turn_defaults_to_true() {
        let json = r#"{
            "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "mode": "hybrid",
            "opponent_username": "tester",
            "style_markers": {
                "aggression_index": 50.0, "queen_trade_avoidance": 50.0, "material_greed": 50.0,
                "complexity_preference": 50.0, "space_expansion": 50.0, "blunder_rate": 5.0,
                "time_pressure_weakness": 50.0
            },
            "history_moves": [],
            "move_number": 1
        }"#;
        let request: PredictionRequest = serde_json::from_str(json).unwrap();
        assert!(request.is_opponent_turn);
    }

    #[test]
    fn response_round_trips_through_json() {
        let response = PredictionResponse {
            prediction_mode: PredictionMode::Hybrid,
            selected_move: "e4".to_string(),
            selected_move_uci: "e2e4".to_string(),
            weights: PhaseWeights {
                phase: Phase::Opening,
                history: 0.7,
                engine: 0.1,
                style: 0.2,
                predictability_index: 0.5,
                sample_size: 10.0,
                weight_mode: WeightMode::Phase,
            },
            candidates: vec![],
            trace_log: vec![TraceLogEntry { entry_type: TraceEntryType::Logic, message: "ok".to_string() }],
            tilt_active: false,
            blunder_applied: false,
            habit_detection: HabitDetection { detected: false, move_san: None, frequency: None, sample_size: 10.0 },
            move_source: MoveSource {
                primary_source: PrimarySource::History,
                history_contribution: 70.0,
                engine_contribution: 10.0,
                style_contribution: 20.0,
            },
            suggested_delay_ms: 1500,
            tactical_guardrail: TacticalGuardrail { triggered: false, eval_delta: None },
        };
        let json = serde_json::to_string(&response).unwrap();
        let parsed: PredictionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }
}
