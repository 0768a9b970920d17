//! History Normalizer (§4.5): each candidate's share of the *full* history
//! total, not just the candidate set — off-candidate historical moves still
//! "steal" probability mass. Recency reweighting is a documented future
//! hook (§9); weight is currently always 1.

use crate::types::HistoryMove;

/// `H` for one candidate SAN: its share of total history frequency, or 0 if
/// it never appears in `history`.
pub fn history_share(history: &[HistoryMove], move_san: &str) -> f64 {
    let n: f64 = history.iter().map(|h| h.frequency).sum();
    if n <= 0.0 {
        return 0.0;
    }
    history
        .iter()
        .find(|h| h.move_san == move_san)
        .map(|h| h.frequency / n)
        .unwrap_or(0.0)
}

/// `H` for every candidate in `move_sans`, in the same order.
pub fn history_vector(history: &[HistoryMove], move_sans: &[String]) -> Vec<f64> {
    move_sans.iter().map(|san| history_share(history, san)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(san: &str, freq: f64) -> HistoryMove {
        HistoryMove { move_san: san.to_string(), frequency: freq, last_played: None, avg_result: None }
    }

    #[test]
    fn off_candidate_history_steals_mass() {
        let history = vec![hm("e4", 80.0), hm("d4", 20.0)];
        // Only "e4" is a candidate; "d4"'s frequency still counts toward N.
        let h = history_vector(&history, &["e4".to_string()]);
        assert!((h[0] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn moves_not_in_history_get_zero() {
        let history = vec![hm("e4", 80.0)];
        let h = history_vector(&history, &["Nf3".to_string()]);
        assert_eq!(h[0], 0.0);
    }

    #[test]
    fn empty_history_is_all_zero() {
        let h = history_vector(&[], &["e4".to_string()]);
        assert_eq!(h[0], 0.0);
    }

    #[test]
    fn permuting_history_order_does_not_change_result() {
        let a = vec![hm("e4", 50.0), hm("d4", 30.0), hm("c4", 20.0)];
        let b = vec![hm("c4", 20.0), hm("e4", 50.0), hm("d4", 30.0)];
        let sans = vec!["e4".to_string(), "d4".to_string(), "c4".to_string()];
        assert_eq!(history_vector(&a, &sans), history_vector(&b, &sans));
    }
}
