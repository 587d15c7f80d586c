//! Iterative-deepening negamax search with alpha-beta pruning, quiescence,
//! and transposition-table lookups. Cancellation is cooperative: callers
//! flip a shared `AtomicBool` and the search notices it between moves
//! rather than being preempted.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SearchConfig;
use crate::eval::{evaluate, MATE_SCORE};
use crate::history::GameHistory;
use crate::moves::{Move, ScoredMoveList};
use crate::position::Position;
use crate::tt::{BoundType, TranspositionTable};

const INFINITY: i32 = MATE_SCORE + 1;

/// Per-search node/depth counters, useful for `info` reporting.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    pub nodes: u64,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

/// Walks the transposition table's `best_move` chain forward from `position`,
/// replaying each move on a scratch copy. Stops at a TT miss, a position with
/// no stored move, or a repeated hash (which would otherwise loop forever on
/// a drawn or mutually-zugzwanged line).
fn extract_pv(position: &Position, tt: &TranspositionTable, max_len: u32) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut scratch = position.clone();
    let mut seen_hashes = Vec::new();

    while (pv.len() as u32) < max_len {
        let hash = scratch.hash();
        if seen_hashes.contains(&hash) {
            break;
        }
        let Some(mv) = tt.probe(hash).and_then(|entry| entry.best_move) else {
            break;
        };
        if !scratch.generate_legal_moves().contains(&mv) {
            break;
        }
        seen_hashes.push(hash);
        scratch.make(mv);
        pv.push(mv);
    }

    pv
}

fn order_key(position: &Position, mv: &Move, tt_move: Option<Move>) -> i32 {
    let mut score = 0;
    if tt_move == Some(*mv) {
        score += 1_000_000;
    }
    if mv.is_capture() {
        let victim = position.piece_at(mv.to()).map_or(0, |(_, p)| p.value());
        score += 10_000 + victim - mv.moving_piece().value() / 10;
    }
    if mv.is_promotion() {
        score += 5_000;
    }
    score
}

fn quiescence(
    position: &mut Position,
    history: &mut GameHistory,
    config: &SearchConfig,
    mut alpha: i32,
    beta: i32,
    ply: u32,
    cancel: &AtomicBool,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if position.is_draw(history) {
        return 0;
    }
    if position.generate_legal_moves().is_empty() {
        return if position.in_check() { -(MATE_SCORE - ply as i32) } else { 0 };
    }

    let stand_pat = evaluate(position, history);
    if !config.search_until_no_captures {
        return stand_pat;
    }
    if stand_pat >= beta {
        return stand_pat;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let captures = position.generate_capture_moves();
    for mv in captures.iter() {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        history.push(position.hash());
        let (info, _) = position.make(*mv);
        let score = -quiescence(position, history, config, -beta, -alpha, ply + 1, cancel, stats);
        position.unmake(*mv, info);
        history.pop();

        if score >= beta {
            return score;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

#[allow(clippy::too_many_arguments)]
fn negamax(
    position: &mut Position,
    history: &mut GameHistory,
    tt: &mut TranspositionTable,
    config: &SearchConfig,
    depth: u32,
    ply: u32,
    mut alpha: i32,
    beta: i32,
    cancel: &AtomicBool,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if position.is_draw(history) {
        return 0;
    }

    let legal = position.generate_legal_moves();
    if legal.is_empty() {
        return if position.in_check() { -(MATE_SCORE - ply as i32) } else { 0 };
    }

    if depth == 0 {
        return quiescence(position, history, config, alpha, beta, ply, cancel, stats);
    }

    let original_alpha = alpha;
    let mut tt_move = None;
    if config.use_pruning {
        if let Some(entry) = tt.probe(position.hash()) {
            tt_move = entry.best_move;
            if entry.depth >= depth {
                match entry.bound_type {
                    BoundType::Exact => return entry.score,
                    BoundType::LowerBound if entry.score >= beta => return entry.score,
                    BoundType::UpperBound if entry.score <= alpha => return entry.score,
                    _ => {}
                }
            }
        }
    }

    let mut scored = ScoredMoveList::new();
    for mv in legal.iter() {
        scored.push(*mv, order_key(position, mv, tt_move));
    }

    let mut best_score = -INFINITY;
    let mut best_move = None;

    for i in 0..scored.len() {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let mv = scored.pick_best(i).expect("index within scored move list bounds");

        history.push(position.hash());
        let (info, _) = position.make(mv);
        let score = -negamax(position, history, tt, config, depth - 1, ply + 1, -beta, -alpha, cancel, stats);
        position.unmake(mv, info);
        history.pop();

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
        if config.use_pruning && alpha >= beta {
            break;
        }
    }

    if config.use_pruning {
        let bound = if best_score <= original_alpha {
            BoundType::UpperBound
        } else if best_score >= beta {
            BoundType::LowerBound
        } else {
            BoundType::Exact
        };
        tt.store(position.hash(), depth, best_score, bound, best_move);
    }

    best_score
}

/// Searches `position` to `config.max_search_depth`, returning the best
/// move found. Checked cooperatively against `cancel`: when it flips mid
/// iteration, the result of the last *fully completed* iteration is kept
/// (or, with `use_incremental_search` disabled, the first move of the
/// already-ordered move list, since there is no earlier iteration to fall
/// back to).
pub fn search(
    position: &mut Position,
    history: &mut GameHistory,
    tt: &mut TranspositionTable,
    config: &SearchConfig,
    cancel: &AtomicBool,
) -> SearchResult {
    let mut stats = SearchStats::default();
    let legal = position.generate_legal_moves();
    if legal.is_empty() {
        return SearchResult {
            best_move: None,
            score: evaluate(position, history),
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
        };
    }

    let mut best = SearchResult {
        best_move: Some(*legal.iter().next().expect("checked non-empty above")),
        score: 0,
        depth: 0,
        nodes: 0,
        pv: Vec::new(),
    };

    if !config.use_incremental_search {
        let score = negamax(position, history, tt, config, config.max_search_depth, 0, -INFINITY, INFINITY, cancel, &mut stats);
        let mv = tt.probe(position.hash()).and_then(|e| e.best_move).or(best.best_move);
        return SearchResult {
            best_move: mv,
            score,
            depth: config.max_search_depth,
            nodes: stats.nodes,
            pv: extract_pv(position, tt, config.max_search_depth),
        };
    }

    for depth in 2..=config.max_search_depth {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let score = negamax(position, history, tt, config, depth, 0, -INFINITY, INFINITY, cancel, &mut stats);
        let completed = !cancel.load(Ordering::Relaxed);
        if completed {
            if let Some(entry) = tt.probe(position.hash()) {
                if let Some(mv) = entry.best_move {
                    best = SearchResult {
                        best_move: Some(mv),
                        score,
                        depth,
                        nodes: stats.nodes,
                        pv: extract_pv(position, tt, depth),
                    };
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn finds_mate_in_one() {
        // White queen delivers back-rank mate with Qd8#.
        let mut pos = Position::try_from_fen("6k1/5ppp/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let mut history = GameHistory::new();
        let mut tt = TranspositionTable::new(1);
        let mut config = SearchConfig::default();
        config.max_search_depth = 3;
        let result = search(&mut pos, &mut history, &mut tt, &config, &no_cancel());
        let mv = result.best_move.expect("a legal move must be found");
        assert_eq!(mv.to(), Square::new(7, 3));
    }

    #[test]
    fn prefers_winning_material() {
        let mut pos = Position::try_from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mut history = GameHistory::new();
        let mut tt = TranspositionTable::new(1);
        let mut config = SearchConfig::default();
        config.max_search_depth = 3;
        let result = search(&mut pos, &mut history, &mut tt, &config, &no_cancel());
        let mv = result.best_move.expect("a legal move must be found");
        assert!(mv.is_capture());
    }

    #[test]
    fn pv_starts_with_the_best_move_and_stays_legal() {
        let mut pos = Position::try_from_fen("6k1/5ppp/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let mut history = GameHistory::new();
        let mut tt = TranspositionTable::new(1);
        let mut config = SearchConfig::default();
        config.max_search_depth = 3;
        let result = search(&mut pos, &mut history, &mut tt, &config, &no_cancel());
        let best_move = result.best_move.expect("a legal move must be found");
        assert_eq!(result.pv.first().copied(), Some(best_move));
        assert!(result.pv.len() <= config.max_search_depth as usize);
    }

    #[test]
    fn respects_cancellation_flag() {
        let mut pos = Position::startpos();
        let mut history = GameHistory::new();
        let mut tt = TranspositionTable::new(1);
        let config = SearchConfig::default();
        let cancel = AtomicBool::new(true);
        let result = search(&mut pos, &mut history, &mut tt, &config, &cancel);
        assert!(result.best_move.is_some());
    }
}
