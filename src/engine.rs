//! Engine Adapter (§4.2): spawns/owns a single UCI engine subprocess and
//! exposes Multi-PV analysis and single-move evaluation.
//!
//! Grounded in the teacher's `StockfishEngine` (`src/bin/elo.rs`): spawn
//! with piped stdin/stdout, a `send`/`wait_for` line protocol, `quit` on
//! drop. Generalized here from "get one best move" to Multi-PV parsing, and
//! wrapped so every call is synchronous and mutually exclusive (§5) — each
//! call runs the blocking UCI round-trip on a worker thread and the caller
//! waits on it with the configured timeout, so a wedged subprocess degrades
//! instead of hanging the whole predictor.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::position::Position;
use crate::types::EngineAnalysis;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub path: String,
    pub threads: u32,
    pub hash_mb: u32,
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            path: "stockfish".to_string(),
            threads: 2,
            hash_mb: 128,
            timeout: Duration::from_secs(30),
        }
    }
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    multipv: u32,
}

impl EngineProcess {
    fn spawn(config: &EngineConfig) -> std::io::Result<Self> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let mut process = EngineProcess { child, stdin, reader: BufReader::new(stdout), multipv: 1 };

        process.send("uci")?;
        process.wait_for("uciok")?;
        process.send(&format!("setoption name Threads value {}", config.threads))?;
        process.send(&format!("setoption name Hash value {}", config.hash_mb))?;
        process.send("isready")?;
        process.wait_for("readyok")?;
        Ok(process)
    }

    fn send(&mut self, cmd: &str) -> std::io::Result<()> {
        writeln!(self.stdin, "{cmd}")?;
        self.stdin.flush()
    }

    fn read_line(&mut self) -> std::io::Result<String> {
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn wait_for(&mut self, prefix: &str) -> std::io::Result<String> {
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "engine stream closed"));
            }
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
    }

    fn ensure_multipv(&mut self, multipv: u32) -> std::io::Result<()> {
        if self.multipv != multipv {
            self.send(&format!("setoption name MultiPV value {multipv}"))?;
            self.multipv = multipv;
        }
        Ok(())
    }

    /// Runs Multi-PV analysis to `depth`, returning entries in engine rank
    /// order. Empty PVs are discarded.
    fn analyze(&mut self, fen: &str, depth: u32, multipv: u32) -> std::io::Result<Vec<EngineAnalysis>> {
        self.ensure_multipv(multipv)?;
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go depth {depth}"))?;

        let mut by_rank: std::collections::BTreeMap<usize, EngineAnalysis> = std::collections::BTreeMap::new();
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "engine stream closed"));
            }
            if line.starts_with("bestmove") {
                break;
            }
            if let Some(info) = parse_info_line(&line) {
                if info.pv.is_empty() {
                    continue;
                }
                by_rank.insert(info.multipv, info.into_analysis(fen, depth));
            }
        }
        Ok(by_rank.into_values().collect())
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let _ = self.child.wait();
    }
}

struct ParsedInfo {
    multipv: usize,
    score_cp: i32,
    score_mate: Option<i32>,
    pv: Vec<String>,
    depth: u32,
}

impl ParsedInfo {
    fn into_analysis(self, fen: &str, requested_depth: u32) -> EngineAnalysis {
        let move_uci = self.pv[0].clone();
        let move_san = Position::from_fen(fen)
            .ok()
            .and_then(|p| p.find_legal_by_uci(&move_uci))
            .map(|m| m.san)
            .unwrap_or_else(|| move_uci.clone());
        EngineAnalysis {
            move_uci,
            move_san,
            score_cp: self.score_cp,
            score_mate: self.score_mate,
            rank: self.multipv,
            pv: self.pv.into_iter().take(5).collect(),
            depth: if self.depth > 0 { self.depth } else { requested_depth },
            from_history: false,
        }
    }
}

/// Parses a single `info ...` UCI line. Mate scores are projected to
/// ±10000cp with sign matching the mate direction (§4.2).
fn parse_info_line(line: &str) -> Option<ParsedInfo> {
    if !line.starts_with("info") {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut multipv = 1usize;
    let mut score_cp = 0i32;
    let mut score_mate = None;
    let mut depth = 0u32;
    let mut pv = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "multipv" => {
                multipv = tokens.get(i + 1)?.parse().ok()?;
                i += 2;
            }
            "depth" => {
                depth = tokens.get(i + 1)?.parse().unwrap_or(0);
                i += 2;
            }
            "score" => {
                match tokens.get(i + 1).copied() {
                    Some("cp") => {
                        score_cp = tokens.get(i + 2)?.parse().unwrap_or(0);
                        i += 3;
                    }
                    Some("mate") => {
                        let mate_in: i32 = tokens.get(i + 2)?.parse().unwrap_or(0);
                        score_cp = if mate_in >= 0 { 10_000 } else { -10_000 };
                        score_mate = Some(mate_in);
                        i += 3;
                    }
                    _ => i += 1,
                }
            }
            "pv" => {
                pv = tokens[i + 1..].iter().map(|s| s.to_string()).collect();
                break;
            }
            _ => i += 1,
        }
    }

    if pv.is_empty() {
        return None;
    }
    Some(ParsedInfo { multipv, score_cp, score_mate, pv, depth })
}

/// Object-safe boundary the Candidate Assembler and `Predictor` depend on,
/// so tests can substitute a scripted engine without spawning a real
/// subprocess (the one generalization beyond the teacher's tests, which
/// always shell out to a real Stockfish binary).
pub trait Engine: Send + Sync {
    fn analyze_position(&self, fen: &str, depth: u32, multipv: u32) -> Vec<EngineAnalysis>;
    fn evaluate_move(&self, fen: &str, san: &str, depth: u32) -> Option<i32>;
    /// Same as `evaluate_move` but the move is UCI-encoded and illegal or
    /// error cases return the `{score_cp: -100}` sentinel (§4.2).
    fn analyze_single_move(&self, fen: &str, uci: &str, depth: u32) -> (i32, Option<i32>);
}

/// Owns the engine subprocess. Lazily spawned on first use; re-spawned if
/// the previous process died or a call timed out (§9 "engine subprocess is
/// lazily spawned").
pub struct EngineAdapter {
    config: EngineConfig,
    process: Mutex<Option<EngineProcess>>,
}

impl EngineAdapter {
    pub fn new(config: EngineConfig) -> Self {
        EngineAdapter { config, process: Mutex::new(None) }
    }

    fn with_process<T, F>(&self, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut EngineProcess) -> std::io::Result<T> + Send + 'static,
    {
        let mut guard = self.process.lock().expect("engine mutex poisoned");
        if guard.is_none() {
            match EngineProcess::spawn(&self.config) {
                Ok(p) => *guard = Some(p),
                Err(e) => {
                    log::warn!("failed to spawn engine at {}: {e}", self.config.path);
                    return None;
                }
            }
        }
        let mut process = guard.take().expect("just spawned");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = f(&mut process);
            let _ = tx.send((process, result));
        });

        match rx.recv_timeout(self.config.timeout) {
            Ok((process, Ok(value))) => {
                *guard = Some(process);
                Some(value)
            }
            Ok((process, Err(e))) => {
                log::warn!("engine call failed: {e}");
                *guard = Some(process);
                None
            }
            Err(_) => {
                log::warn!("engine call exceeded {:?}, treating as unavailable", self.config.timeout);
                None
            }
        }
    }

    /// Spawns (if needed) and confirms the engine responds to `isready`.
    pub fn is_ready(&self) -> bool {
        self.with_process(|_| Ok(())).is_some()
    }

    /// Terminates the subprocess. A subsequent call re-spawns it.
    pub fn close(&self) {
        let mut guard = self.process.lock().expect("engine mutex poisoned");
        *guard = None;
    }
}

impl Engine for EngineAdapter {
    /// Multi-PV analysis of `fen` to `depth`, `multipv` lines. Empty on any
    /// engine absence or runtime error (§4.2).
    fn analyze_position(&self, fen: &str, depth: u32, multipv: u32) -> Vec<EngineAnalysis> {
        let fen = fen.to_string();
        self.with_process(move |p| p.analyze(&fen, depth, multipv)).unwrap_or_default()
    }

    /// Pushes `san`, analyzes depth=`depth` multipv=1, returns the negation
    /// of the resulting side-to-move centipawn score (i.e. from the
    /// original mover's perspective). `None` if the move is illegal or the
    /// engine is unavailable.
    fn evaluate_move(&self, fen: &str, san: &str, depth: u32) -> Option<i32> {
        let pos = Position::from_fen(fen).ok()?;
        let mv = pos.find_legal_by_san(san)?;
        let after_fen = pos.apply_move(&mv).fen();
        self.analyze_position(&after_fen, depth, 1).into_iter().next().map(|a| -a.score_cp)
    }

    fn analyze_single_move(&self, fen: &str, uci: &str, depth: u32) -> (i32, Option<i32>) {
        let Ok(pos) = Position::from_fen(fen) else { return (-100, None) };
        let Some(mv) = pos.find_legal_by_uci(uci) else { return (-100, None) };
        let after_fen = pos.apply_move(&mv).fen();
        match self.analyze_position(&after_fen, depth, 1).into_iter().next() {
            Some(a) => (-a.score_cp, a.score_mate.map(|m| -m)),
            None => (-100, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cp_score_and_pv() {
        let line = "info depth 18 seldepth 20 multipv 1 score cp 34 nodes 100 pv e2e4 e7e5 g1f3";
        let parsed = parse_info_line(line).expect("should parse");
        assert_eq!(parsed.multipv, 1);
        assert_eq!(parsed.score_cp, 34);
        assert_eq!(parsed.score_mate, None);
        assert_eq!(parsed.pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn projects_mate_score_with_sign() {
        let winning = parse_info_line("info depth 5 multipv 1 score mate 3 pv h5f7").unwrap();
        assert_eq!(winning.score_cp, 10_000);
        assert_eq!(winning.score_mate, Some(3));

        let losing = parse_info_line("info depth 5 multipv 1 score mate -2 pv a2a3").unwrap();
        assert_eq!(losing.score_cp, -10_000);
        assert_eq!(losing.score_mate, Some(-2));
    }

    #[test]
    fn discards_lines_without_pv() {
        assert!(parse_info_line("info string NNUE evaluation enabled").is_none());
    }

    #[test]
    fn missing_engine_binary_returns_empty() {
        let adapter = EngineAdapter::new(EngineConfig {
            path: "/nonexistent/engine/binary".to_string(),
            timeout: Duration::from_millis(200),
            ..EngineConfig::default()
        });
        let analyses = adapter.analyze_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 10, 3);
        assert!(analyses.is_empty());
    }
}
