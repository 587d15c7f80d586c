//! The UCI protocol shell: a thin translation layer between stdin/stdout
//! text and [`Engine`] calls. Implements only the command subset named in
//! the engine's interface, not the full UCI grammar.

use std::io::{BufRead, Write};

use crate::config::parse_setoption;
use crate::engine::{Engine, TimeControl};

/// Reads UCI commands from `input` and writes responses to `output` until
/// `quit` is received or the input stream ends.
pub fn run<R: BufRead, W: Write>(input: R, mut output: W) {
    let mut engine = Engine::new();
    for line in input.lines() {
        let Ok(line) = line else { break };
        if !handle_line(&mut engine, &line, &mut output) {
            break;
        }
    }
}

/// Processes one input line against `engine`, writing any response to
/// `output`. Returns `false` when the caller should stop reading further
/// commands (i.e. on `quit`).
pub fn handle_line<W: Write>(engine: &mut Engine, line: &str, output: &mut W) -> bool {
    let line = line.trim();
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(&command) = parts.first() else { return true };

    log::debug!("uci <- {line}");

    match command {
        "uci" => {
            writeln!(output, "id name core_chess").ok();
            writeln!(output, "id author the core_chess contributors").ok();
            for option_line in crate::config::SearchConfig::uci_option_lines() {
                writeln!(output, "{option_line}").ok();
            }
            writeln!(output, "uciok").ok();
        }
        "isready" => {
            writeln!(output, "readyok").ok();
        }
        "ucinewgame" => {
            engine.new_game();
        }
        "setoption" => {
            if let Some((name, value)) = parse_setoption(&parts[1..]) {
                if let Err(err) = engine.set_option(&name, &value) {
                    log::warn!("setoption rejected: {err}");
                }
            }
        }
        "position" => handle_position(engine, &parts[1..]),
        "go" => {
            let time_control = parse_go(&parts[1..]);
            let result = engine.go(time_control);
            if let Some(mv) = result.best_move {
                let pv = if result.pv.is_empty() {
                    mv.to_string()
                } else {
                    result.pv.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
                };
                writeln!(
                    output,
                    "info depth {} nodes {} score cp {} pv {}",
                    result.depth, result.nodes, result.score, pv
                )
                .ok();
                writeln!(output, "bestmove {mv}").ok();
            } else {
                writeln!(output, "bestmove 0000").ok();
            }
        }
        "stop" => {
            // The search already returned synchronously from `go`; nothing
            // further to cancel once control is back here.
        }
        "quit" => return false,
        _ => {
            log::warn!("unrecognized UCI command: {command}");
        }
    }

    true
}

fn handle_position(engine: &mut Engine, args: &[&str]) {
    let Some(&kind) = args.first() else { return };

    let (fen, rest) = match kind {
        "startpos" => (None, &args[1..]),
        "fen" => {
            let moves_idx = args.iter().position(|&a| a == "moves").unwrap_or(args.len());
            if moves_idx < 1 {
                return;
            }
            let fen = args[1..moves_idx].join(" ");
            (Some(fen), &args[moves_idx..])
        }
        _ => return,
    };

    let moves: Vec<&str> = if rest.first() == Some(&"moves") { rest[1..].to_vec() } else { Vec::new() };

    if let Err(err) = engine.set_position(fen.as_deref(), &moves) {
        log::warn!("position command rejected: {err}");
    }
}

fn parse_go(args: &[&str]) -> TimeControl {
    let mut movetime = None;
    let mut wtime = 0u64;
    let mut btime = 0u64;
    let mut winc = 0u64;
    let mut binc = 0u64;
    let mut infinite = false;
    let mut saw_clock = false;

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "movetime" => {
                movetime = args.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "infinite" => {
                infinite = true;
                i += 1;
            }
            "wtime" => {
                wtime = args.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                saw_clock = true;
                i += 2;
            }
            "btime" => {
                btime = args.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                saw_clock = true;
                i += 2;
            }
            "winc" => {
                winc = args.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 2;
            }
            "binc" => {
                binc = args.get(i + 1).and_then(|v| v.parse().ok()).unwrap_or(0);
                i += 2;
            }
            _ => i += 1,
        }
    }

    if infinite {
        TimeControl::Infinite
    } else if let Some(ms) = movetime {
        TimeControl::MoveTime(ms)
    } else if saw_clock {
        TimeControl::Clock {
            white_time_ms: wtime,
            black_time_ms: btime,
            white_increment_ms: winc,
            black_increment_ms: binc,
        }
    } else {
        TimeControl::Infinite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respond(engine: &mut Engine, line: &str) -> String {
        let mut buf = Vec::new();
        handle_line(engine, line, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn uci_command_announces_identity_and_options() {
        let mut engine = Engine::new();
        let response = respond(&mut engine, "uci");
        assert!(response.contains("id name"));
        assert!(response.contains("uciok"));
        assert!(response.contains("max_search_depth"));
    }

    #[test]
    fn isready_responds_readyok() {
        let mut engine = Engine::new();
        assert_eq!(respond(&mut engine, "isready").trim(), "readyok");
    }

    #[test]
    fn position_startpos_with_moves_updates_the_board() {
        let mut engine = Engine::new();
        respond(&mut engine, "position startpos moves e2e4 e7e5");
        assert!(engine.position_fen().contains("4P3"));
    }

    #[test]
    fn setoption_updates_config() {
        let mut engine = Engine::new();
        respond(&mut engine, "setoption name max_search_depth value 3");
        assert_eq!(engine.config().max_search_depth, 3);
    }

    #[test]
    fn quit_signals_the_caller_to_stop() {
        let mut engine = Engine::new();
        let mut buf = Vec::new();
        assert!(!handle_line(&mut engine, "quit", &mut buf));
    }

    #[test]
    fn go_emits_a_bestmove_line() {
        let mut engine = Engine::new();
        respond(&mut engine, "setoption name max_search_depth value 2");
        let response = respond(&mut engine, "go movetime 100");
        assert!(response.contains("bestmove"));
    }
}
