//! Thin wrapper around `shakmaty`'s chess rules engine.
//!
//! The teacher (`patrickangusjohngrant-vibechess`) rolls its own 8x8 board
//! with no FEN parser, built for a wasm frontend. This crate instead reaches
//! for `shakmaty` — already part of this retrieval pack (vendored by
//! `trilltino-XFChess`, used directly by the `other_examples` analysis
//! code) — but keeps the teacher's *method shape*: `generate_legal_moves`,
//! `is_square_attacked_by`, `apply_move` all have one-line forwarding
//! counterparts here so the heuristics module reads the way the teacher's
//! `engine.rs` does.
//!
//! "Board copy" (§4.1): every heuristic that needs the post-move position
//! calls [`Position::push`], which clones internally and never mutates
//! `self`.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position as _, Role, Square};

use crate::error::PredictorError;

/// A legal move paired with its SAN/UCI text, computed once at generation
/// time so downstream code never re-derives notation.
#[derive(Clone, Debug)]
pub struct LegalMove {
    pub mv: Move,
    pub san: String,
    pub uci: String,
}

#[derive(Clone)]
pub struct Position {
    chess: Chess,
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, PredictorError> {
        let setup: Fen = fen
            .parse()
            .map_err(|_| PredictorError::InvalidPosition { fen: fen.to_string() })?;
        let chess: Chess = setup
            .into_position(CastlingMode::Standard)
            .map_err(|_| PredictorError::InvalidPosition { fen: fen.to_string() })?;
        Ok(Position { chess })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.chess.turn()
    }

    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Legal moves for the side to move, with SAN/UCI pre-computed.
    pub fn generate_legal_moves(&self) -> Vec<LegalMove> {
        self.chess
            .legal_moves()
            .iter()
            .map(|mv| {
                let san = San::from_move(&self.chess, mv).to_string();
                let uci = mv.to_uci(CastlingMode::Standard).to_string();
                LegalMove { mv: mv.clone(), san, uci }
            })
            .collect()
    }

    pub fn find_legal_by_san(&self, san: &str) -> Option<LegalMove> {
        self.generate_legal_moves().into_iter().find(|m| m.san == san)
    }

    pub fn find_legal_by_uci(&self, uci: &str) -> Option<LegalMove> {
        self.generate_legal_moves().into_iter().find(|m| m.uci == uci)
    }

    /// Clone-push: returns the resulting position, leaving `self` untouched.
    pub fn apply_move(&self, legal: &LegalMove) -> Position {
        let mut next = self.chess.clone();
        next.play_unchecked(&legal.mv);
        Position { chess: next }
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.chess.board().king_of(color)
    }

    /// Squares holding an `attacker`-colored piece that attacks `sq`.
    pub fn attackers(&self, sq: Square, attacker: Color) -> shakmaty::Bitboard {
        self.chess.board().attacks_to(sq, attacker, self.chess.board().occupied())
    }

    /// Number of `attacker`-colored pieces attacking `sq` in the current
    /// position.
    pub fn is_square_attacked_by(&self, sq: Square, attacker: Color) -> usize {
        self.attackers(sq, attacker).count()
    }

    /// Whether the piece on `from` is among the `attacker`-colored pieces
    /// attacking `sq`.
    pub fn is_attacked_from(&self, sq: Square, attacker: Color, from: Square) -> bool {
        self.attackers(sq, attacker).contains(from)
    }

    /// True iff an enemy-colored queen attacks `sq`.
    pub fn is_attacked_by_queen(&self, sq: Square, attacker: Color) -> bool {
        let queens = self.chess.board().by_color(attacker) & self.chess.board().by_role(Role::Queen);
        (self.attackers(sq, attacker) & queens).any()
    }

    /// King zone: the king square plus its (board-clipped) eight neighbors.
    pub fn king_zone(&self, color: Color) -> Vec<Square> {
        let Some(king) = self.king_square(color) else {
            return Vec::new();
        };
        let mut zone = vec![king];
        let file = king.file();
        let rank = king.rank();
        for df in -1i32..=1 {
            for dr in -1i32..=1 {
                if df == 0 && dr == 0 {
                    continue;
                }
                if let (Some(f), Some(r)) = (file.offset(df), rank.offset(dr)) {
                    zone.push(Square::from_coords(f, r));
                }
            }
        }
        zone
    }

    /// Sum over the king zone of `attacker`-colored attackers on each square.
    pub fn king_zone_pressure(&self, king_owner: Color) -> usize {
        let attacker = king_owner.other();
        self.king_zone(king_owner)
            .into_iter()
            .map(|sq| self.is_square_attacked_by(sq, attacker))
            .sum()
    }

    /// §4.1 board tension: legal captures + legal checks for the side to move.
    pub fn tension(&self) -> usize {
        let moves = self.generate_legal_moves();
        let captures = moves.iter().filter(|m| m.mv.is_capture()).count();
        let checks = moves
            .iter()
            .filter(|m| self.apply_move(m).is_check())
            .count();
        captures + checks
    }

    pub fn queen_square(&self, color: Color) -> Option<Square> {
        self.squares_of(color, Role::Queen).into_iter().next()
    }

    pub fn squares_of(&self, color: Color, role: Role) -> shakmaty::Bitboard {
        self.chess.board().by_color(color) & self.chess.board().by_role(role)
    }
}
