//! Weight Selector (§4.3) and Habit Detector (§4.4). Pure functions over
//! `move_number`/`history_moves`/`is_opponent_turn`; no engine or board
//! access needed. Grounded in the teacher's tunable-`Weights`-struct
//! pattern (`engine.rs::Weights`/`AiConfig`) but the regime table here is
//! the fusion weighting scheme of §4.3, not evaluation-module weights.

use crate::types::{HabitDetection, Phase, PhaseWeights, HistoryMove, WeightMode};

pub fn classify_phase(move_number: u32) -> Phase {
    if move_number <= 12 {
        Phase::Opening
    } else if move_number <= 35 {
        Phase::Middlegame
    } else {
        Phase::Endgame
    }
}

/// Herfindahl-style concentration of the frequency distribution: `0` when
/// there is no history, `Σ(fᵢ/N)²` otherwise. Always in `[1/k, 1]` for `k`
/// distinct moves with positive frequency, and in `[0, 1]` overall.
pub fn predictability_index(history: &[HistoryMove]) -> (f64, f64) {
    let n: f64 = history.iter().map(|h| h.frequency).sum();
    if n <= 0.0 {
        return (0.0, 0.0);
    }
    let pi = history.iter().map(|h| (h.frequency / n).powi(2)).sum();
    (pi, n)
}

/// Selects (phase, α, β, γ, weight_mode) per the ordered regime table of
/// §4.3. Every row sums to 1.
pub fn select_weights(move_number: u32, is_opponent_turn: bool, history: &[HistoryMove]) -> PhaseWeights {
    let phase = classify_phase(move_number);
    let (pi, n) = predictability_index(history);

    let (alpha, beta, gamma, weight_mode) = if !is_opponent_turn {
        let (a, b) = match phase {
            Phase::Opening => (0.8, 0.2),
            Phase::Middlegame | Phase::Endgame => (0.3, 0.7),
        };
        (a, b, 0.0, WeightMode::NonOpponentTurn)
    } else if n < 5.0 {
        (0.00, 0.30, 0.70, WeightMode::LowSample)
    } else if pi > 0.85 {
        (0.90, 0.05, 0.05, WeightMode::Habit)
    } else if pi < 0.40 {
        (0.20, 0.20, 0.60, WeightMode::Chameleon)
    } else {
        let (a, b, g) = match phase {
            Phase::Opening => (0.7, 0.1, 0.2),
            Phase::Middlegame => (0.1, 0.4, 0.5),
            Phase::Endgame => (0.05, 0.8, 0.15),
        };
        (a, b, g, WeightMode::Phase)
    };

    PhaseWeights {
        phase,
        history: alpha,
        engine: beta,
        style: gamma,
        predictability_index: pi,
        sample_size: n,
        weight_mode,
    }
}

/// §4.4: a habit is a single move covering >=90% of a position's history
/// with at least 10 recorded games. `suggested_delay_ms` is resolved later,
/// once the final selection is known (§4.4's second sentence).
pub fn detect_habit(history: &[HistoryMove]) -> HabitDetection {
    let n: f64 = history.iter().map(|h| h.frequency).sum();
    let top = history.iter().max_by(|a, b| a.frequency.total_cmp(&b.frequency));

    match top {
        Some(top) if n >= 10.0 && top.frequency / n >= 0.90 => HabitDetection {
            detected: true,
            move_san: Some(top.move_san.clone()),
            frequency: Some(100.0 * top.frequency / n),
            sample_size: n,
        },
        _ => HabitDetection { detected: false, move_san: None, frequency: None, sample_size: n },
    }
}

/// §4.4: 500ms if the selected move matches the detected habit, else 1500ms.
pub fn suggested_delay_ms(habit: &HabitDetection, selected_move_san: &str) -> u32 {
    match &habit.move_san {
        Some(habit_move) if habit.detected && habit_move == selected_move_san => 500,
        _ => 1500,
    }
}
