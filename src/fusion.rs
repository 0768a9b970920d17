//! Fusion Core (§4.8): combines history/engine/style signals into a
//! calibrated probability distribution, then selects a move under the
//! pure-history bypass or the hybrid (softmax + blunder) policy. Also
//! computes the Tactical Guardrail contract (§4.10) and move-source
//! attribution.

use shakmaty::Color;

use crate::engine_norm::normalize_scores;
use crate::heuristics::{self, is_forcing_move};
use crate::history::history_vector;
use crate::position::{LegalMove, Position};
use crate::rng::PredictorRng;
use crate::trace::{candidate_reason, Trace};
use crate::types::{
    CandidateMove, EngineAnalysis, HistoryMove, MoveSource, PhaseWeights, PredictionMode, PrimarySource,
    StyleMarkers, TacticalGuardrail,
};

const SOFTMAX_TEMPERATURE: f64 = 0.5;
pub const DEFAULT_GUARDRAIL_THRESHOLD_CP: f64 = 200.0;

pub struct FusionOutcome {
    /// All candidates, `final_prob`-descending (ties broken by ascending
    /// engine rank, §4.8).
    pub candidates: Vec<CandidateMove>,
    pub selected_index: usize,
    pub blunder_applied: bool,
    pub move_source: MoveSource,
    pub tactical_guardrail: TacticalGuardrail,
}

#[allow(clippy::too_many_arguments)]
pub fn fuse(
    mode: PredictionMode,
    pos: &Position,
    mover: Color,
    analyses: &[EngineAnalysis],
    history: &[HistoryMove],
    markers: &StyleMarkers,
    weights: &PhaseWeights,
    tactical_guardrail_threshold_cp: f64,
    rng: &mut PredictorRng,
    trace: &mut Trace,
) -> FusionOutcome {
    debug_assert!(!analyses.is_empty(), "fuse requires a non-empty candidate set");

    // Pure-history target is chosen on legality alone (§4.8), independent of
    // whether the Candidate Assembler's share/frequency gate (§4.7) already
    // surfaced it. If it didn't, inject it here so it can actually be
    // selected and carry `final_prob=100`.
    let pure_history_target: Option<LegalMove> =
        if mode == PredictionMode::PureHistory { select_pure_history_target(history, pos) } else { None };

    let mut owned_analyses: Vec<EngineAnalysis> = analyses.to_vec();
    if let Some(target) = &pure_history_target {
        if !owned_analyses.iter().any(|a| a.move_san == target.san) {
            trace.logic(format!("pure-history target {} absent from candidate set, injecting", target.san));
            let next_rank = owned_analyses.len() + 1;
            owned_analyses.push(EngineAnalysis {
                move_uci: target.uci.clone(),
                move_san: target.san.clone(),
                score_cp: 0,
                score_mate: None,
                rank: next_rank,
                pv: vec![],
                depth: 0,
                from_history: true,
            });
        }
    }
    let analyses: &[EngineAnalysis] = &owned_analyses;

    let move_sans: Vec<String> = analyses.iter().map(|a| a.move_san.clone()).collect();
    let h = history_vector(history, &move_sans);
    let e = normalize_scores(&analyses.iter().map(|a| a.score_cp).collect::<Vec<_>>());

    let mut style_fits = Vec::with_capacity(analyses.len());
    for a in analyses {
        let legal = pos.find_legal_by_uci(&a.move_uci);
        let (s, attribution) = match &legal {
            Some(legal) => heuristics::style_fit(pos, legal, mover, markers),
            None => (0.0, Default::default()),
        };
        style_fits.push((s, attribution));
    }

    let raw_scores: Vec<f64> = (0..analyses.len())
        .map(|i| weights.history * h[i] + weights.engine * e[i] + weights.style * style_fits[i].0)
        .collect();

    let probabilities = softmax(&raw_scores, SOFTMAX_TEMPERATURE);

    trace.logic(format!(
        "phase {:?}, weights (history={:.2}, engine={:.2}, style={:.2})",
        weights.phase, weights.history, weights.engine, weights.style
    ));
    trace.logic(format!(
        "predictability_index={:.3}, N={:.1}, weight_mode={:?}",
        weights.predictability_index, weights.sample_size, weights.weight_mode
    ));

    let mut candidates: Vec<CandidateMove> = (0..analyses.len())
        .map(|i| {
            let a = &analyses[i];
            let (style_fit, attribution) = style_fits[i];
            if attribution.trade_penalty < 0.0 {
                trace.warning(format!("{}: queen-trade penalty applied ({:.2})", a.move_san, attribution.trade_penalty));
            }
            if attribution.aggression_bonus > 0.0 {
                trace.warning(format!("{}: aggression bonus applied ({:+.2})", a.move_san, attribution.aggression_bonus));
            }
            CandidateMove {
                move_san: a.move_san.clone(),
                move_uci: a.move_uci.clone(),
                engine_eval: a.score_cp as f64 / 100.0,
                engine_rank: Some(a.rank),
                history_frequency: h[i],
                style_fit,
                raw_score: raw_scores[i],
                final_prob: 100.0 * probabilities[i],
                attribution,
                reason: candidate_reason(&attribution, Some(a.rank), h[i]),
            }
        })
        .collect();

    let tactical_guardrail = compute_tactical_guardrail(pos, mover, analyses, tactical_guardrail_threshold_cp);

    let (selected_original_index, blunder_applied) = match mode {
        PredictionMode::PureHistory => {
            let chosen = pure_history_target
                .as_ref()
                .and_then(|target| analyses.iter().position(|a| a.move_san == target.san))
                .or_else(|| analyses.iter().position(|a| a.rank == 1))
                .unwrap_or(0);
            for (i, c) in candidates.iter_mut().enumerate() {
                c.final_prob = if i == chosen { 100.0 } else { 0.0 };
            }
            (chosen, false)
        }
        PredictionMode::Hybrid => select_hybrid(pos, analyses, &candidates, markers, rng, trace),
    };

    let selected_san = candidates[selected_original_index].move_san.clone();
    trace.decision(format!(
        "Selected {} (prob {:.1}%)",
        selected_san, candidates[selected_original_index].final_prob
    ));

    // Stable sort by final_prob desc, ties by ascending engine rank (§4.8).
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .final_prob
            .partial_cmp(&candidates[a].final_prob)
            .unwrap()
            .then_with(|| candidates[a].engine_rank.unwrap_or(usize::MAX).cmp(&candidates[b].engine_rank.unwrap_or(usize::MAX)))
    });
    let selected_index = order.iter().position(|&i| i == selected_original_index).unwrap();
    let sorted_candidates: Vec<CandidateMove> = order.into_iter().map(|i| candidates[i].clone()).collect();

    let move_source = attribute_move_source(weights);

    FusionOutcome {
        candidates: sorted_candidates,
        selected_index,
        blunder_applied,
        move_source,
        tactical_guardrail,
    }
}

fn softmax(raw_scores: &[f64], temperature: f64) -> Vec<f64> {
    let max = raw_scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw_scores.iter().map(|r| ((r - max) / temperature).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|x| x / sum).collect()
}

/// Pure-history target (§4.8): the first legal history move by descending
/// frequency, decided purely on legality in the position — never on whether
/// the Candidate Assembler's gate already surfaced it as a candidate. `None`
/// means history yielded nothing legal and the engine's top-ranked move
/// should be used instead.
fn select_pure_history_target(history: &[HistoryMove], pos: &Position) -> Option<LegalMove> {
    let mut ranked: Vec<&HistoryMove> = history.iter().collect();
    ranked.sort_by(|a, b| b.frequency.partial_cmp(&a.frequency).unwrap());
    ranked.into_iter().find_map(|hmove| pos.find_legal_by_san(&hmove.move_san))
}

fn select_hybrid(
    pos: &Position,
    analyses: &[EngineAnalysis],
    candidates: &[CandidateMove],
    markers: &StyleMarkers,
    rng: &mut PredictorRng,
    trace: &mut Trace,
) -> (usize, bool) {
    let tension = pos.tension() as f64;
    let blunder_probability = markers.blunder_probability() * (tension / 10.0).min(1.0);

    if candidates.len() >= 4 && rng.uniform() < blunder_probability {
        trace.warning(format!(
            "blunder branch triggered (tension={tension}, blunder_rate={:.1}%)",
            markers.blunder_rate
        ));
        let mut by_prob: Vec<usize> = (0..candidates.len()).collect();
        by_prob.sort_by(|&a, &b| candidates[b].final_prob.partial_cmp(&candidates[a].final_prob).unwrap());
        let pick = if rng.uniform_index(2) == 0 { by_prob[2] } else { by_prob[3] };
        let san = &candidates[pick].move_san;
        let original_index = analyses.iter().position(|a| &a.move_san == san).unwrap();
        return (original_index, true);
    }

    // CDF inversion against Uniform[0, 100] over the final probability
    // distribution, in the candidates' original (un-sorted) order.
    let draw = rng.uniform() * 100.0;
    let mut cumulative = 0.0;
    for (i, c) in candidates.iter().enumerate() {
        cumulative += c.final_prob;
        if draw < cumulative {
            return (i, false);
        }
    }
    (candidates.len() - 1, false)
}

fn attribute_move_source(weights: &PhaseWeights) -> MoveSource {
    // Tie preference: history > style > engine.
    let primary = if weights.history >= weights.style && weights.history >= weights.engine {
        PrimarySource::History
    } else if weights.style >= weights.engine {
        PrimarySource::Style
    } else {
        PrimarySource::Engine
    };

    MoveSource {
        primary_source: primary,
        history_contribution: 100.0 * weights.history,
        engine_contribution: 100.0 * weights.engine,
        style_contribution: 100.0 * weights.style,
    }
}

/// §4.10: computed and surfaced on every request, never executed (the
/// source declares the contract but does not wire it into fusion).
fn compute_tactical_guardrail(
    pos: &Position,
    mover: Color,
    analyses: &[EngineAnalysis],
    threshold_cp: f64,
) -> TacticalGuardrail {
    let (Some(top1), Some(top2)) = (analyses.iter().find(|a| a.rank == 1), analyses.iter().find(|a| a.rank == 2)) else {
        return TacticalGuardrail { triggered: false, eval_delta: None };
    };
    let eval_delta = (top1.score_cp - top2.score_cp).abs() as f64;
    let forcing = pos
        .find_legal_by_uci(&top1.move_uci)
        .map(|legal| is_forcing_move(pos, &legal, mover))
        .unwrap_or(false);
    let triggered = forcing && eval_delta > threshold_cp;
    TacticalGuardrail { triggered, eval_delta: Some(eval_delta) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[1.0, 0.5, -0.3], 0.5);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn softmax_favors_the_highest_raw_score() {
        let p = softmax(&[2.0, 0.0, 0.0], 0.5);
        assert!(p[0] > p[1] && p[0] > p[2]);
    }

    #[test]
    fn tactical_guardrail_absent_without_two_engine_lines() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let result = compute_tactical_guardrail(&pos, Color::White, &[], DEFAULT_GUARDRAIL_THRESHOLD_CP);
        assert!(!result.triggered);
        assert!(result.eval_delta.is_none());
    }

    #[test]
    fn pure_history_picks_top_frequency_legal_move_regardless_of_candidate_set() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        // "Nc3" is legal and by far the top-frequency history move, but it
        // never made the Candidate Assembler's share/frequency gate, so the
        // only analyses on hand are the engine's own top line.
        let analyses = vec![EngineAnalysis {
            move_uci: "e2e4".to_string(),
            move_san: "e4".to_string(),
            score_cp: 30,
            score_mate: None,
            rank: 1,
            pv: vec![],
            depth: 18,
            from_history: false,
        }];
        let history = vec![
            HistoryMove { move_san: "Nc3".to_string(), frequency: 60.0, last_played: None, avg_result: None },
            HistoryMove { move_san: "h3".to_string(), frequency: 2.0, last_played: None, avg_result: None },
        ];
        let weights = PhaseWeights {
            phase: crate::types::Phase::Opening,
            history: 0.8,
            engine: 0.1,
            style: 0.1,
            predictability_index: 0.8,
            sample_size: 62.0,
            weight_mode: crate::types::WeightMode::Phase,
        };
        let mut rng = PredictorRng::from_seed(1);
        let mut trace = Trace::new();
        let outcome = fuse(
            PredictionMode::PureHistory,
            &pos,
            Color::White,
            &analyses,
            &history,
            &StyleMarkers::neutral_defaults(),
            &weights,
            DEFAULT_GUARDRAIL_THRESHOLD_CP,
            &mut rng,
            &mut trace,
        );
        let selected = &outcome.candidates[outcome.selected_index];
        assert_eq!(selected.move_san, "Nc3");
        assert_eq!(selected.final_prob, 100.0);
        assert!(!outcome.blunder_applied);
    }

    #[test]
    fn pure_history_falls_back_to_engine_top_move_when_no_history_is_legal() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
        let analyses = vec![EngineAnalysis {
            move_uci: "e2e4".to_string(),
            move_san: "e4".to_string(),
            score_cp: 30,
            score_mate: None,
            rank: 1,
            pv: vec![],
            depth: 18,
            from_history: false,
        }];
        // "Qh5" is illegal from startpos: no history move is playable.
        let history =
            vec![HistoryMove { move_san: "Qh5".to_string(), frequency: 99.0, last_played: None, avg_result: None }];
        let weights = PhaseWeights {
            phase: crate::types::Phase::Opening,
            history: 0.8,
            engine: 0.1,
            style: 0.1,
            predictability_index: 0.8,
            sample_size: 99.0,
            weight_mode: crate::types::WeightMode::Phase,
        };
        let mut rng = PredictorRng::from_seed(1);
        let mut trace = Trace::new();
        let outcome = fuse(
            PredictionMode::PureHistory,
            &pos,
            Color::White,
            &analyses,
            &history,
            &StyleMarkers::neutral_defaults(),
            &weights,
            DEFAULT_GUARDRAIL_THRESHOLD_CP,
            &mut rng,
            &mut trace,
        );
        let selected = &outcome.candidates[outcome.selected_index];
        assert_eq!(selected.move_san, "e4");
        assert_eq!(selected.final_prob, 100.0);
    }
}
