use std::sync::Arc;

use anyhow::Result;
use cozy_chess::Move;
use log::debug;

use crate::cluster::master::Cluster;
use crate::position::Position;

use super::negamax::{Search, SearchOptions};
use super::tt::TranspositionTable;
use super::{GoLimits, SearchGlobals, MATE_SCORE, MAX_MATE_SCORE};

/// Per-depth progress record published while the search deepens, with the
/// keys UCI wants: depth, score, time, nodes, nps, pv.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: i32,
    pub score: ScoreDisplay,
    pub time_ms: u64,
    pub nodes: u64,
    pub nps: u64,
    pub pv: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreDisplay {
    Centipawns(i32),
    MateIn(i32),
}

/// Collapse an internal score into centipawns or a signed mate distance in
/// full moves.
pub fn uci_score(score: i32) -> ScoreDisplay {
    if score <= -MAX_MATE_SCORE {
        ScoreDisplay::MateIn(-(score + MATE_SCORE) / 2)
    } else if score >= MAX_MATE_SCORE {
        ScoreDisplay::MateIn((MATE_SCORE - score + 1) / 2)
    } else {
        ScoreDisplay::Centipawns(score)
    }
}

/// Iterative deepening to `max_depth`. Each depth goes through the cluster
/// master when one is attached, otherwise through the local (possibly
/// thread-split) search. On a stop the in-progress iteration is discarded
/// and the deepest completed iteration's move wins. Workers are terminated
/// before returning.
pub fn best_move_search<F>(
    pos: &mut Position,
    globals: &Arc<SearchGlobals>,
    tt: &Arc<TranspositionTable>,
    options: SearchOptions,
    mut cluster: Option<Cluster>,
    max_depth: i32,
    mut on_info: F,
) -> Result<Option<Move>>
where
    F: FnMut(&SearchInfo),
{
    let generation = globals.start_search(pos.side_to_move());
    tt.clear();
    arm_watchdog(globals, generation, pos);
    let search = Search::new(tt.clone(), globals.clone(), options);

    let mut best_move = None;
    for depth in 1..=max_depth {
        let result = match cluster.as_mut() {
            Some(c) => c.search_root(pos, depth, globals)?,
            None => search.search_root(pos, depth),
        };

        if depth > 1 && globals.stop() {
            debug!("search stopped during depth {depth}, keeping previous best");
            break;
        }
        if result.pv.is_empty() {
            break;
        }
        best_move = Some(result.pv[0]);

        let time_ms = globals.elapsed_ms();
        let nodes = globals.nodes();
        let nps = if time_ms > 0 { nodes * 1000 / time_ms } else { nodes };
        on_info(&SearchInfo {
            depth,
            score: uci_score(result.score),
            time_ms,
            nodes,
            nps,
            pv: pv_to_uci(pos, &result.pv),
        });
    }

    if let Some(mut c) = cluster.take() {
        c.terminate();
    }
    Ok(best_move)
}

/// Time control stays cooperative: a detached watchdog thread arms the stop
/// flag once the budget elapses, and the generation check keeps a stale
/// watchdog from reaching into a later search.
fn arm_watchdog(globals: &Arc<SearchGlobals>, generation: u64, pos: &Position) {
    let Some(ms) = time_budget_ms(globals.limits(), pos) else {
        return;
    };
    let globals = globals.clone();
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(ms));
        if globals.generation() == generation {
            globals.set_stop(true);
        }
    });
}

fn time_budget_ms(limits: GoLimits, pos: &Position) -> Option<u64> {
    if limits.infinite {
        return None;
    }
    if let Some(ms) = limits.movetime {
        return Some(ms);
    }
    let (time, inc) = match pos.side_to_move() {
        cozy_chess::Color::White => (limits.wtime, limits.winc),
        cozy_chess::Color::Black => (limits.btime, limits.binc),
    };
    time.map(|t| t / 30 + inc.unwrap_or(0) / 2)
}

/// Render a PV in long algebraic form by replaying it; stops early if a
/// stale table move snuck into the tail.
pub fn pv_to_uci(pos: &Position, pv: &[Move]) -> Vec<String> {
    let mut replay = pos.clone();
    let mut out = Vec::with_capacity(pv.len());
    for &mv in pv {
        if !replay.is_legal(mv) {
            break;
        }
        out.push(replay.move_to_uci(mv));
        replay.make_move(mv);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MATE_SCORE;

    #[test]
    fn centipawn_scores_pass_through() {
        assert_eq!(uci_score(42), ScoreDisplay::Centipawns(42));
        assert_eq!(uci_score(-310), ScoreDisplay::Centipawns(-310));
    }

    #[test]
    fn winning_mate_distance_in_moves() {
        // Mate delivered on the next ply.
        assert_eq!(uci_score(MATE_SCORE - 1), ScoreDisplay::MateIn(1));
        // Mate in three plies: still two of our moves away.
        assert_eq!(uci_score(MATE_SCORE - 3), ScoreDisplay::MateIn(2));
    }

    #[test]
    fn losing_mate_distance_is_negative() {
        assert_eq!(uci_score(-MATE_SCORE + 2), ScoreDisplay::MateIn(-1));
        assert_eq!(uci_score(-MATE_SCORE + 4), ScoreDisplay::MateIn(-2));
    }
}
