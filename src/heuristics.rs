//! Pure, side-effect-free predicates and scores over a position + move
//! (§4.1). Every heuristic here reads the pre-move board and the candidate
//! move; none mutate anything, mirroring the module-per-feature style of
//! the teacher's `engine.rs` evaluation functions (`eval_material`,
//! `eval_centre_control`, `eval_passed_pawns`, …), generalized from "score
//! this position" to "does this move fit this style marker".

use shakmaty::{Color, Role};

use crate::position::{LegalMove, Position};
use crate::types::{MoveAttribution, StyleMarkers};

/// `true` iff pushing `mv` raises king-zone pressure against the opponent's
/// king, from `mover`'s perspective.
pub fn move_increases_king_pressure(pos: &Position, mv: &LegalMove, mover: Color) -> bool {
    let opponent = mover.other();
    let before = pos.king_zone_pressure(opponent);
    let after = pos.apply_move(mv).king_zone_pressure(opponent);
    after > before
}

/// `(increased, delta)` where delta is tension after the push minus tension
/// before (side to move flips after the push, as specified).
pub fn move_increases_tension(pos: &Position, mv: &LegalMove) -> (bool, i64) {
    let before = pos.tension() as i64;
    let after = pos.apply_move(mv).tension() as i64;
    let delta = after - before;
    (delta > 0, delta)
}

/// Captures a queen, or moves our queen onto a square the enemy queen
/// attacks after the push.
pub fn is_queen_trade_offer(pos: &Position, mv: &LegalMove, mover: Color) -> bool {
    if mv.mv.capture() == Some(Role::Queen) {
        return true;
    }
    if mv.mv.role() != Role::Queen {
        return false;
    }
    let after = pos.apply_move(mv);
    after.is_attacked_by_queen(mv.mv.to(), mover.other())
}

/// Capture that lands on a square the opponent attacks with more attackers
/// than we have defenders. SEE is deliberately not used (§4.1).
pub fn is_material_grab(pos: &Position, mv: &LegalMove, mover: Color) -> bool {
    if !mv.mv.is_capture() {
        return false;
    }
    let after = pos.apply_move(mv);
    let dest = mv.mv.to();
    let opponent_attackers = after.is_square_attacked_by(dest, mover.other());
    let own_defenders = after.is_square_attacked_by(dest, mover);
    opponent_attackers > 0 && opponent_attackers > own_defenders
}

/// Non-capturing pawn push that reaches rank >= 5 for White or rank <= 4
/// for Black (0-indexed: >=4 / <=3).
pub fn is_space_expansion(mv: &LegalMove, mover: Color) -> bool {
    if mv.mv.role() != Role::Pawn || mv.mv.is_capture() {
        return false;
    }
    let rank_index = mv.mv.to().rank() as i8;
    match mover {
        Color::White => rank_index >= 4,
        Color::Black => rank_index <= 3,
    }
}

/// Used only by the Tactical Guardrail contract (§4.8/§4.10): capture,
/// check-after-push, or a direct attack on the enemy queen.
pub fn is_forcing_move(pos: &Position, mv: &LegalMove, mover: Color) -> bool {
    if mv.mv.is_capture() {
        return true;
    }
    let after = pos.apply_move(mv);
    if after.is_check() {
        return true;
    }
    if let Some(queen_sq) = after.queen_square(mover.other()) {
        if after.is_attacked_from(queen_sq, mover, mv.mv.to()) {
            return true;
        }
    }
    false
}

/// check-after-push, or after the push our moved piece directly attacks an
/// enemy queen or rook.
pub fn is_check_or_threat(pos: &Position, mv: &LegalMove, mover: Color) -> bool {
    let after = pos.apply_move(mv);
    if after.is_check() {
        return true;
    }
    let dest = mv.mv.to();
    let opponent = mover.other();
    let targets = after.squares_of(opponent, Role::Queen) | after.squares_of(opponent, Role::Rook);
    targets
        .into_iter()
        .any(|sq| after.is_attacked_from(sq, mover, dest))
}

/// Tilt: any of the last 3 recent eval deltas (opponent's perspective, in
/// pawns) is strictly below -1.0. Exactly -1.0 does not tilt (§8 property 12).
pub fn is_tilted(recent_eval_deltas: &[f64]) -> bool {
    let window_start = recent_eval_deltas.len().saturating_sub(3);
    recent_eval_deltas[window_start..].iter().any(|&d| d < -1.0)
}

/// Produces the working markers used downstream when tilt is active, and
/// records `attribution.tilt_modifier = 0.5` on the returned attribution.
pub fn apply_tilt_modifier(markers: &StyleMarkers) -> (StyleMarkers, MoveAttribution) {
    let working = StyleMarkers {
        aggression_index: (2.0 * markers.aggression_index).min(100.0),
        material_greed: (1.5 * markers.material_greed).min(100.0),
        blunder_rate: (2.0 * markers.blunder_rate).min(100.0),
        ..markers.clone()
    };
    let attribution = MoveAttribution { tilt_modifier: 0.5, ..Default::default() };
    (working, attribution)
}

/// Sum of unit-scale style-fit contributions for `mv`, given the (possibly
/// tilt-modified) working markers. Returns the total and the attribution
/// breakdown per §4.1's table.
pub fn style_fit(pos: &Position, mv: &LegalMove, mover: Color, markers: &StyleMarkers) -> (f64, MoveAttribution) {
    let mut attribution = MoveAttribution::default();
    let mut total = 0.0;

    if markers.aggression_index > 75.0 {
        if is_check_or_threat(pos, mv, mover) {
            attribution.aggression_bonus += 0.20;
            total += 0.20;
        }
        if move_increases_king_pressure(pos, mv, mover) {
            attribution.aggression_bonus += 0.15;
            total += 0.15;
        }
    }

    if markers.queen_trade_avoidance > 80.0 && is_queen_trade_offer(pos, mv, mover) {
        attribution.trade_penalty += -0.50;
        total += -0.50;
    }

    if markers.material_greed > 70.0 && is_material_grab(pos, mv, mover) {
        attribution.greed_bonus += 0.30;
        total += 0.30;
    }

    let (_, tension_delta) = move_increases_tension(pos, mv);
    if markers.complexity_preference > 80.0 && tension_delta > 2 {
        attribution.complexity_bonus += 0.25;
        total += 0.25;
    }
    if markers.complexity_preference < 30.0 && tension_delta > 3 {
        attribution.complexity_bonus += -0.15;
        total += -0.15;
    }

    if markers.space_expansion > 60.0 && is_space_expansion(mv, mover) {
        attribution.space_bonus += 0.15;
        total += 0.15;
    }

    (total, attribution)
}
