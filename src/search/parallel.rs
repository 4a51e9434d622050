use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use cozy_chess::Move;
use rayon::prelude::*;

use crate::position::Position;

use super::negamax::Search;
use super::{SearchStack, StackEntry};

/// Fork-join split of an ordered move list at a PV node (the root included).
///
/// The first move runs sequentially on the full window so the tail starts
/// from a real alpha; the rest fan out over rayon, each branch on a private
/// `Position` clone and a fresh stack. Branches publish improvements through
/// a shared atomic alpha and finish the compare-and-record inside one mutex,
/// and a cutoff flag lets the remaining branches skip their work.
pub(crate) fn split_node(
    search: &Search,
    pos: &Position,
    moves: &[Move],
    alpha0: i32,
    beta: i32,
    depth: i32,
    ss: &[StackEntry],
) -> (i32, Move, Vec<Move>) {
    let ply = ss[0].ply;
    let first = moves[0];

    let mut seed_pos = pos.clone();
    seed_pos.make_move(first);
    let seed_stack = SearchStack::new();
    let seed = -search.search_impl(
        &mut seed_pos,
        -beta,
        -alpha0,
        depth - 1,
        &seed_stack.entries()[(ply + 1) as usize..],
    );

    let shared_alpha = AtomicI32::new(alpha0.max(seed.score));
    let cutoff = AtomicBool::new(seed.score >= beta);
    let best: Mutex<(i32, Move, Vec<Move>)> = Mutex::new({
        let mut pv = Vec::with_capacity(seed.pv.len() + 1);
        if seed.score > alpha0 {
            pv.push(first);
            pv.extend_from_slice(&seed.pv);
        }
        (seed.score, first, pv)
    });

    moves[1..].par_iter().for_each(|&mv| {
        if cutoff.load(Ordering::Relaxed) || search.globals().stop() {
            return;
        }
        let alpha = shared_alpha.load(Ordering::Relaxed);
        if alpha >= beta {
            return;
        }

        let mut branch = pos.clone();
        branch.make_move(mv);
        let stack = SearchStack::new();
        let child = &stack.entries()[(ply + 1) as usize..];

        let mut result = -search.search_impl(&mut branch, -alpha - 1, -alpha, depth - 1, child);
        if result.score > alpha {
            result = -search.search_impl(&mut branch, -beta, -alpha, depth - 1, child);
        }

        let mut guard = best.lock().unwrap();
        let (best_score, best_move, best_pv) = &mut *guard;
        if result.score > *best_score {
            *best_score = result.score;
            *best_move = mv;
            raise_shared_alpha(&shared_alpha, result.score);
            best_pv.clear();
            best_pv.push(mv);
            best_pv.extend_from_slice(&result.pv);
            if result.score >= beta {
                cutoff.store(true, Ordering::Relaxed);
            }
        }
    });

    best.into_inner().unwrap()
}

fn raise_shared_alpha(alpha: &AtomicI32, score: i32) {
    let mut current = alpha.load(Ordering::Relaxed);
    while score > current {
        match alpha.compare_exchange(current, score, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(seen) => current = seen,
        }
    }
}
