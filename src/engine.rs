//! The long-lived engine facade: owns position, history, transposition
//! table, and configuration across a sequence of UCI commands, and turns a
//! time budget into a cooperative cancellation signal for the search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::history::GameHistory;
use crate::moves::Move;
use crate::position::Position;
use crate::search::{self, SearchResult};
use crate::tt::{TranspositionTable, DEFAULT_TT_MB};

/// How much of the reported time budget the engine spends searching,
/// leaving headroom for UCI round-trip and move-application overhead.
const MOVE_OVERHEAD_MS: u64 = 30;

/// A time control derived from a UCI `go` command.
#[derive(Clone, Copy, Debug)]
pub enum TimeControl {
    /// Search until `stop`, ignoring any computed budget.
    Infinite,
    /// Search for exactly this many milliseconds.
    MoveTime(u64),
    /// Clock-based budget: allot a fraction of the side-to-move's
    /// remaining time, the way most UCI engines approximate it.
    Clock {
        white_time_ms: u64,
        black_time_ms: u64,
        white_increment_ms: u64,
        black_increment_ms: u64,
    },
}

impl TimeControl {
    fn budget_ms(self, side_to_move_is_white: bool) -> Option<u64> {
        match self {
            TimeControl::Infinite => None,
            TimeControl::MoveTime(ms) => Some(ms.saturating_sub(MOVE_OVERHEAD_MS)),
            TimeControl::Clock {
                white_time_ms,
                black_time_ms,
                white_increment_ms,
                black_increment_ms,
            } => {
                let (remaining, increment) = if side_to_move_is_white {
                    (white_time_ms, white_increment_ms)
                } else {
                    (black_time_ms, black_increment_ms)
                };
                // A fixed fraction of remaining time plus the increment,
                // following the common "remaining/20 + increment" heuristic.
                let budget = remaining / 20 + increment;
                Some(budget.saturating_sub(MOVE_OVERHEAD_MS))
            }
        }
    }
}

/// Owns all state that persists between UCI commands.
pub struct Engine {
    position: Position,
    history: GameHistory,
    tt: TranspositionTable,
    config: SearchConfig,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Engine {
            position: Position::startpos(),
            history: GameHistory::new(),
            tt: TranspositionTable::new(DEFAULT_TT_MB),
            config: SearchConfig::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), crate::error::ConfigError> {
        self.config.set(name, value)
    }

    /// Resets game history and transposition table for a new game, as
    /// `ucinewgame` requires.
    pub fn new_game(&mut self) {
        self.position = Position::startpos();
        self.history.clear();
        self.tt.clear();
    }

    /// Sets the root position from a FEN string (or the standard start
    /// position) and replays the given UCI move list on top of it.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[&str]) -> Result<(), crate::error::FenError> {
        let mut position = match fen {
            Some(fen) => Position::try_from_fen(fen)?,
            None => Position::startpos(),
        };
        self.history.clear();
        self.history.push(position.hash());

        for uci in moves {
            match position.parse_move(uci) {
                Ok(mv) => {
                    position.make(mv);
                    self.history.push(position.hash());
                }
                Err(_) => break,
            }
        }

        self.position = position;
        log::debug!("position set: {}", self.position.to_fen());
        Ok(())
    }

    #[must_use]
    pub fn position_fen(&self) -> String {
        self.position.to_fen()
    }

    /// Runs a search under the given time control, blocking until the
    /// search completes or the derived budget elapses.
    pub fn go(&mut self, time_control: TimeControl) -> SearchResult {
        let cancel = Arc::new(AtomicBool::new(false));
        let timer_handle = time_control.budget_ms(self.position.side_to_move() == crate::piece::Color::White).map(|ms| {
            let cancel = Arc::clone(&cancel);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(ms));
                cancel.store(true, Ordering::Relaxed);
            })
        });

        log::info!("search starting at max depth {}", self.config.max_search_depth);
        let result = search::search(&mut self.position, &mut self.history, &mut self.tt, &self.config, &cancel);

        cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = timer_handle {
            let _ = handle.join();
        }
        log::info!("search finished: depth {} nodes {} score {}", result.depth, result.nodes, result.score);
        result
    }

    /// Applies a move to the live position and history, e.g. after the GUI
    /// plays the engine's chosen move.
    pub fn apply_move(&mut self, mv: Move) {
        self.position.make(mv);
        self.history.push(self.position.hash());
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
