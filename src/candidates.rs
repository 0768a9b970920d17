//! Candidate Assembler (§4.7): merges the engine's top-M analyses with
//! significant history moves the engine did not rank, requesting
//! supplementary single-move evaluations for the latter.

use crate::engine::Engine;
use crate::position::Position;
use crate::trace::Trace;
use crate::types::{EngineAnalysis, HistoryMove};

pub const TOP_M: u32 = 5;
pub const MULTIPV_DEPTH: u32 = 18;
pub const SINGLE_MOVE_DEPTH: u32 = 12;

/// Builds the union candidate set: engine top-M first (by engine rank),
/// then history additions in insertion order.
pub fn assemble(
    pos: &Position,
    fen: &str,
    engine: &dyn Engine,
    history: &[HistoryMove],
    trace: &mut Trace,
) -> Vec<EngineAnalysis> {
    let mut candidates = engine.analyze_position(fen, MULTIPV_DEPTH, TOP_M);
    if candidates.is_empty() {
        trace.warning("engine returned no Multi-PV analysis");
    } else {
        for top in candidates.iter().take(3) {
            trace.logic(format!(
                "engine line #{}: {} ({:+} cp)",
                top.rank, top.move_san, top.score_cp
            ));
        }
    }

    let n: f64 = history.iter().map(|h| h.frequency).sum();
    let engine_top_m = candidates.len();
    let mut insertion_order = 0usize;

    for hmove in history {
        if candidates.iter().any(|c| c.move_san == hmove.move_san) {
            continue;
        }
        let share = if n > 0.0 { hmove.frequency / n } else { 0.0 };
        if share < 0.10 && hmove.frequency < 5.0 {
            continue;
        }
        let Some(legal) = pos.find_legal_by_san(&hmove.move_san) else {
            trace.warning(format!("history move {} is not legal in this position, skipping", hmove.move_san));
            continue;
        };

        insertion_order += 1;
        let (score_cp, score_mate) = engine.analyze_single_move(fen, &legal.uci, SINGLE_MOVE_DEPTH);
        if score_cp == -100 && score_mate.is_none() {
            trace.warning(format!(
                "supplementary evaluation of history move {} failed, using sentinel score",
                hmove.move_san
            ));
        }

        trace.logic(format!(
            "inserting history-only candidate {} (frequency {:.1}, share {:.1}%)",
            hmove.move_san,
            hmove.frequency,
            share * 100.0
        ));

        candidates.push(EngineAnalysis {
            move_uci: legal.uci,
            move_san: legal.san,
            score_cp,
            score_mate,
            rank: engine_top_m + insertion_order,
            pv: vec![],
            depth: SINGLE_MOVE_DEPTH,
            from_history: true,
        });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineAdapter, EngineConfig};
    use std::collections::HashMap;
    use std::time::Duration;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn hm(san: &str, freq: f64) -> HistoryMove {
        HistoryMove { move_san: san.to_string(), frequency: freq, last_played: None, avg_result: None }
    }

    fn analysis(rank: usize, san: &str, uci: &str, score_cp: i32) -> EngineAnalysis {
        EngineAnalysis {
            move_uci: uci.to_string(),
            move_san: san.to_string(),
            score_cp,
            score_mate: None,
            rank,
            pv: vec![uci.to_string()],
            depth: 18,
            from_history: false,
        }
    }

    /// A scripted `Engine` double so the skip-branch test doesn't depend on
    /// engine reachability at all — only on the move's legality.
    struct ScriptedEngine {
        lines: HashMap<String, Vec<EngineAnalysis>>,
    }

    impl Engine for ScriptedEngine {
        fn analyze_position(&self, fen: &str, _depth: u32, _multipv: u32) -> Vec<EngineAnalysis> {
            self.lines.get(fen).cloned().unwrap_or_default()
        }

        fn evaluate_move(&self, _fen: &str, _san: &str, _depth: u32) -> Option<i32> {
            Some(0)
        }

        fn analyze_single_move(&self, _fen: &str, _uci: &str, _depth: u32) -> (i32, Option<i32>) {
            (0, None)
        }
    }

    #[test]
    fn unreachable_engine_yields_warning_and_no_candidates() {
        let pos = Position::from_fen(STARTPOS).unwrap();
        let engine = EngineAdapter::new(EngineConfig {
            path: "/nonexistent/engine".to_string(),
            timeout: Duration::from_millis(100),
            ..EngineConfig::default()
        });
        let mut trace = Trace::new();
        let candidates = assemble(&pos, STARTPOS, &engine, &[hm("e4", 50.0)], &mut trace);
        assert!(candidates.is_empty());
        let entries = trace.into_entries();
        assert!(entries.iter().any(|e| e.message.contains("no Multi-PV")));
    }

    #[test]
    fn illegal_history_move_is_skipped() {
        let pos = Position::from_fen(STARTPOS).unwrap();
        let mut lines = HashMap::new();
        lines.insert(STARTPOS.to_string(), vec![analysis(1, "e4", "e2e4", 40)]);
        let engine = ScriptedEngine { lines };

        let mut trace = Trace::new();
        // Qh5 is not reachable from d1 at startpos (the d/e/f-pawns block it).
        let candidates = assemble(&pos, STARTPOS, &engine, &[hm("Qh5", 50.0)], &mut trace);

        assert_eq!(candidates.len(), 1, "the illegal history move must not be injected");
        assert_eq!(candidates[0].move_san, "e4");
        let entries = trace.into_entries();
        assert!(entries.iter().any(|e| e.message.contains("Qh5") && e.message.contains("not legal")));
    }

    #[test]
    fn history_insertions_get_contiguous_ranks_after_engine_top_m() {
        let pos = Position::from_fen(STARTPOS).unwrap();
        let mut lines = HashMap::new();
        lines.insert(
            STARTPOS.to_string(),
            vec![analysis(1, "e4", "e2e4", 40), analysis(2, "d4", "d2d4", 20), analysis(3, "c4", "c2c4", 10)],
        );
        let engine = ScriptedEngine { lines };
        let mut trace = Trace::new();

        let history = vec![hm("Nf3", 50.0), hm("Nc3", 40.0), hm("g3", 30.0)];
        let candidates = assemble(&pos, STARTPOS, &engine, &history, &mut trace);

        let ranks: Vec<usize> = candidates.iter().filter(|c| c.from_history).map(|c| c.rank).collect();
        assert_eq!(ranks, vec![4, 5, 6], "ranks after the engine top-M must stay contiguous");
    }
}
