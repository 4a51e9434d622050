use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;
use log::warn;

use crate::cluster::master::Cluster;
use crate::position::Position;
use crate::search::driver::{best_move_search, ScoreDisplay, SearchInfo};
use crate::search::negamax::SearchOptions;
use crate::search::tt::{TranspositionTable, DEFAULT_SIZE_MB};
use crate::search::{GoLimits, SearchGlobals, MAX_PLY};

pub struct UciEngine {
    pos: Position,
    globals: Arc<SearchGlobals>,
    tt: Arc<TranspositionTable>,
    options: SearchOptions,
    workers: usize,
    searcher: Option<JoinHandle<()>>,
}

impl UciEngine {
    pub fn new() -> Self {
        Self {
            pos: Position::startpos(),
            globals: Arc::new(SearchGlobals::new()),
            tt: Arc::new(TranspositionTable::new(DEFAULT_SIZE_MB)),
            options: SearchOptions::default(),
            workers: 0,
            searcher: None,
        }
    }

    pub fn run_loop(&mut self) -> Result<()> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(s) => s.trim().to_string(),
                Err(_) => break,
            };
            if line.is_empty() {
                continue;
            }
            match line.as_str() {
                "uci" => self.cmd_uci(),
                "isready" => println!("readyok"),
                "ucinewgame" => self.cmd_ucinewgame(),
                "stop" => self.globals.set_stop(true),
                "quit" => break,
                _ => {
                    if let Some(rest) = line.strip_prefix("position ") {
                        self.cmd_position(rest);
                    } else if let Some(rest) = line.strip_prefix("setoption ") {
                        self.cmd_setoption(rest);
                    } else if line == "go" {
                        self.cmd_go("");
                    } else if let Some(rest) = line.strip_prefix("go ") {
                        self.cmd_go(rest);
                    }
                }
            }
        }
        self.globals.set_stop(true);
        self.wait_for_search();
        Ok(())
    }

    fn cmd_uci(&self) {
        println!("id name rookery");
        println!("id author rookery contributors");
        println!("option name Threads type spin default 1 min 1 max 256");
        println!("option name Hash type spin default {DEFAULT_SIZE_MB} min 1 max 65536");
        println!("option name Workers type spin default 0 min 0 max 64");
        println!("uciok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.wait_for_search();
        self.pos = Position::startpos();
        self.tt.clear();
    }

    fn cmd_setoption(&mut self, args: &str) {
        let mut name = None;
        let mut value = None;
        let mut tokens = args.split_whitespace();
        while let Some(tok) = tokens.next() {
            match tok {
                "name" => name = tokens.next(),
                "value" => value = tokens.next(),
                _ => {}
            }
        }
        let (Some(name), Some(value)) = (name, value) else {
            return;
        };
        match name {
            "Threads" => {
                if let Ok(n) = value.parse::<usize>() {
                    self.options.threads = n.max(1);
                }
            }
            "Hash" => {
                if let Ok(mb) = value.parse::<usize>() {
                    self.wait_for_search();
                    self.tt = Arc::new(TranspositionTable::new(mb));
                }
            }
            "Workers" => {
                if let Ok(n) = value.parse::<usize>() {
                    self.workers = n;
                }
            }
            _ => {}
        }
    }

    fn cmd_position(&mut self, args: &str) {
        self.wait_for_search();
        let mut tokens = args.split_whitespace();
        let pos = match tokens.next() {
            Some("startpos") => Some(Position::startpos()),
            Some("fen") => {
                let fields: Vec<&str> = tokens.by_ref().take(6).collect();
                match Position::from_fen(&fields.join(" ")) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!("{e:#}");
                        None
                    }
                }
            }
            _ => None,
        };
        let Some(mut pos) = pos else { return };
        if tokens.next() == Some("moves") {
            for mv_str in tokens {
                match pos.parse_uci_move(mv_str) {
                    Some(mv) => pos.make_move(mv),
                    None => {
                        warn!("illegal move {mv_str} in position command");
                        break;
                    }
                }
            }
        }
        self.pos = pos;
    }

    fn cmd_go(&mut self, args: &str) {
        self.wait_for_search();
        let limits = parse_go(args);
        self.globals.set_limits(limits);
        let max_depth = limits.depth.unwrap_or(MAX_PLY as i32 - 1).max(1);

        let mut pos = self.pos.clone();
        let globals = self.globals.clone();
        let tt = self.tt.clone();
        let options = self.options;
        let workers = self.workers;
        self.searcher = Some(std::thread::spawn(move || {
            let cluster = if workers > 0 {
                match Cluster::spawn(workers, options) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        warn!("cluster spawn failed, searching locally: {e:#}");
                        None
                    }
                }
            } else {
                None
            };
            let best = best_move_search(
                &mut pos,
                &globals,
                &tt,
                options,
                cluster,
                max_depth,
                print_info,
            );
            match best {
                Ok(Some(mv)) => println!("bestmove {}", pos.move_to_uci(mv)),
                Ok(None) => println!("bestmove 0000"),
                Err(e) => {
                    warn!("search failed: {e:#}");
                    println!("bestmove 0000");
                }
            }
        }));
    }

    fn wait_for_search(&mut self) {
        if let Some(handle) = self.searcher.take() {
            let _ = handle.join();
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_info(info: &SearchInfo) {
    let score = match info.score {
        ScoreDisplay::Centipawns(cp) => format!("cp {cp}"),
        ScoreDisplay::MateIn(n) => format!("mate {n}"),
    };
    println!(
        "info depth {} score {} time {} nodes {} nps {} pv {}",
        info.depth,
        score,
        info.time_ms,
        info.nodes,
        info.nps,
        info.pv.join(" ")
    );
}

fn parse_go(args: &str) -> GoLimits {
    fn number<T: std::str::FromStr>(tokens: &mut std::str::SplitWhitespace) -> Option<T> {
        tokens.next().and_then(|s| s.parse().ok())
    }

    let mut limits = GoLimits::default();
    let mut tokens = args.split_whitespace();
    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => limits.depth = number(&mut tokens),
            "movetime" => limits.movetime = number(&mut tokens),
            "wtime" => limits.wtime = number(&mut tokens),
            "btime" => limits.btime = number(&mut tokens),
            "winc" => limits.winc = number(&mut tokens),
            "binc" => limits.binc = number(&mut tokens),
            "infinite" => limits.infinite = true,
            _ => {}
        }
    }
    limits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_arguments_parse() {
        let limits = parse_go("depth 7 movetime 2500 wtime 60000 winc 1000");
        assert_eq!(limits.depth, Some(7));
        assert_eq!(limits.movetime, Some(2500));
        assert_eq!(limits.wtime, Some(60000));
        assert_eq!(limits.winc, Some(1000));
        assert!(!limits.infinite);
        assert!(parse_go("infinite").infinite);
    }
}
