//! Engine Normalizer (§4.6): min-max normalizes `score_cp` over the
//! extended candidate set. Mate scores participate via their already-
//! projected ±10000 (done by the Engine Adapter, §4.2).

/// `E` for each score in `scores`, in the same order. Best -> 1.0, worst ->
/// 0.0, linear in between. If the range is 0, every entry normalizes to 1.0.
pub fn normalize_scores(scores: &[i32]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let min = *scores.iter().min().unwrap();
    let max = *scores.iter().max().unwrap();
    if max == min {
        return vec![1.0; scores.len()];
    }
    let range = (max - min) as f64;
    scores.iter().map(|&s| (s - min) as f64 / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_and_worst_map_to_one_and_zero() {
        let e = normalize_scores(&[50, -20, 120]);
        assert_eq!(e[2], 1.0);
        assert_eq!(e[1], 0.0);
        assert!((e[0] - (70.0 / 140.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_range_maps_everything_to_one() {
        let e = normalize_scores(&[30, 30, 30]);
        assert_eq!(e, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn mate_sentinels_participate_linearly() {
        let e = normalize_scores(&[10_000, 0, -10_000]);
        assert_eq!(e[0], 1.0);
        assert_eq!(e[2], 0.0);
        assert!((e[1] - 0.5).abs() < 1e-9);
    }
}
