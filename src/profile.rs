//! Profile Store contract (§6): this crate never fetches style markers or
//! opponent history itself — a caller-supplied implementation does, against
//! whatever dataset backs it (a chess site's game archive, a local
//! scouting database, …). The crate only pins the contract and ships the
//! `StyleMarkers::neutral_defaults` fallback a caller uses on
//! `ProfileLookupFailure` (§7).

use crate::error::DegradeReason;
use crate::types::{HistoryMove, StyleMarkers};

/// External collaborator boundary. Implementations are expected to be
/// fallible and possibly slow (network calls, database lookups); this crate
/// treats either fetch failing as a non-aborting degrade (§7), not a reason
/// to fail the whole prediction.
pub trait ProfileStore {
    fn fetch_style_markers(&self, platform: &str, username: &str) -> Result<StyleMarkers, DegradeReason>;

    fn fetch_opponent_history(&self, platform: &str, username: &str, fen: &str) -> Result<Vec<HistoryMove>, DegradeReason>;
}
