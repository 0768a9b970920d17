//! Trace & Attribution (§4.9): the accumulator for the user-visible
//! failure/decision channel. Trace entries are never truncated or
//! suppressed (§7) — every degrade path must leave one.

use crate::types::{TraceEntryType, TraceLogEntry};

#[derive(Default)]
pub struct Trace {
    entries: Vec<TraceLogEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    pub fn logic(&mut self, message: impl Into<String>) {
        self.push(TraceEntryType::Logic, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(TraceEntryType::Warning, message);
    }

    pub fn decision(&mut self, message: impl Into<String>) {
        self.push(TraceEntryType::Decision, message);
    }

    pub fn tilt(&mut self, message: impl Into<String>) {
        self.push(TraceEntryType::Tilt, message);
    }

    fn push(&mut self, entry_type: TraceEntryType, message: impl Into<String>) {
        self.entries.push(TraceLogEntry { entry_type, message: message.into() });
    }

    pub fn into_entries(self) -> Vec<TraceLogEntry> {
        self.entries
    }
}

/// Builds the semicolon-joined English `CandidateMove.reason` string from
/// its attribution, engine rank, and history frequency (§4.1/§3/§4.9).
pub fn candidate_reason(
    attribution: &crate::types::MoveAttribution,
    engine_rank: Option<usize>,
    history_frequency: f64,
) -> String {
    let mut parts = Vec::new();

    if let Some(rank) = engine_rank {
        parts.push(format!("engine rank {rank}"));
    } else {
        parts.push("not in engine top lines".to_string());
    }
    if history_frequency > 0.0 {
        parts.push(format!("{:.1}% of recorded history", history_frequency * 100.0));
    }
    if attribution.aggression_bonus != 0.0 {
        parts.push(format!("aggression bonus {:+.2}", attribution.aggression_bonus));
    }
    if attribution.trade_penalty != 0.0 {
        parts.push(format!("queen-trade penalty {:.2}", attribution.trade_penalty));
    }
    if attribution.greed_bonus != 0.0 {
        parts.push(format!("material-grab bonus {:+.2}", attribution.greed_bonus));
    }
    if attribution.complexity_bonus != 0.0 {
        parts.push(format!("complexity adjustment {:+.2}", attribution.complexity_bonus));
    }
    if attribution.space_bonus != 0.0 {
        parts.push(format!("space-expansion bonus {:+.2}", attribution.space_bonus));
    }
    if attribution.tilt_modifier != 0.0 {
        parts.push("tilt modifier applied".to_string());
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveAttribution;

    #[test]
    fn reason_lists_only_nonzero_contributions() {
        let attribution = MoveAttribution { trade_penalty: -0.5, ..Default::default() };
        let reason = candidate_reason(&attribution, Some(2), 0.1);
        assert!(reason.contains("engine rank 2"));
        assert!(reason.contains("10.0% of recorded history"));
        assert!(reason.contains("queen-trade penalty"));
        assert!(!reason.contains("aggression"));
    }

    #[test]
    fn reason_handles_history_only_candidate() {
        let reason = candidate_reason(&MoveAttribution::default(), None, 0.0);
        assert_eq!(reason, "not in engine top lines");
    }
}
