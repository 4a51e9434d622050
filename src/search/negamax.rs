use std::sync::Arc;

use cozy_chess::Move;

use crate::eval;
use crate::position::{move_from_u16, move_to_u16, Position};

use super::ordering::sort_moves;
use super::parallel;
use super::tt::{score_from_tt, score_to_tt, Bound, TranspositionTable, TtEntry};
use super::{
    SearchGlobals, SearchResult, SearchStack, StackEntry, DRAW_SCORE, INFINITE, MATE_SCORE,
    MAX_PLY,
};

const NULL_MOVE_REDUCTION: i32 = 3;
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MOVE_THRESHOLD: usize = 3;
const SPLIT_MIN_DEPTH: i32 = 3;
const SPLIT_MIN_MOVES: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct SearchOptions {
    pub use_null_move: bool,
    pub use_lmr: bool,
    pub threads: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { use_null_move: true, use_lmr: true, threads: 1 }
    }
}

/// One search instance: a window into the shared transposition table and
/// globals plus the pruning configuration. Cheap to share across the rayon
/// branches at a split point.
pub struct Search {
    tt: Arc<TranspositionTable>,
    globals: Arc<SearchGlobals>,
    options: SearchOptions,
}

impl Search {
    pub fn new(
        tt: Arc<TranspositionTable>,
        globals: Arc<SearchGlobals>,
        options: SearchOptions,
    ) -> Self {
        Self { tt, globals, options }
    }

    pub fn globals(&self) -> &Arc<SearchGlobals> {
        &self.globals
    }

    pub fn tt(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    /// Full-window search from the root.
    pub fn search_root(&self, pos: &mut Position, depth: i32) -> SearchResult {
        let stack = SearchStack::new();
        self.search_impl(pos, -INFINITE, INFINITE, depth, stack.entries())
    }

    /// Principal-variation negamax inside `[alpha, beta)`. Returns the score
    /// from the side to move and, at PV nodes where alpha improved, the line
    /// that produced it. A stop observed below the root returns the `(0, ∅)`
    /// sentinel the driver knows to discard.
    pub fn search_impl(
        &self,
        pos: &mut Position,
        mut alpha: i32,
        mut beta: i32,
        depth: i32,
        ss: &[StackEntry],
    ) -> SearchResult {
        if depth <= 0 {
            return SearchResult {
                score: self.qsearch_impl(pos, alpha, beta, ss),
                pv: Vec::new(),
            };
        }

        let ply = ss[0].ply;
        if ply > 0 {
            if self.globals.stop() {
                return SearchResult::default();
            }
            if pos.halfmoves() >= 100 || pos.is_repeat() {
                return SearchResult { score: DRAW_SCORE, pv: Vec::new() };
            }
            if ply >= MAX_PLY as i32 - 1 {
                return SearchResult { score: eval::evaluate(pos), pv: Vec::new() };
            }
            // Mate-distance pruning: no line from here can beat a mate that
            // is already shorter than this ply.
            alpha = alpha.max(-MATE_SCORE + ply);
            beta = beta.min(MATE_SCORE - ply);
            if alpha >= beta {
                return SearchResult { score: alpha, pv: Vec::new() };
            }
        }

        let pv_node = alpha != beta - 1;
        let hash = pos.hash();
        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(hash) {
            tt_move = move_from_u16(entry.mv);
            if !pv_node && entry.depth >= depth {
                let tt_score = score_from_tt(entry.score, ply);
                let cutoff = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => tt_score >= beta,
                    Bound::Upper => tt_score <= alpha,
                };
                if cutoff {
                    return SearchResult { score: tt_score, pv: Vec::new() };
                }
            }
        }

        self.globals.increment_nodes();

        let mut moves = pos.legal_moves();
        if moves.is_empty() {
            let score = if pos.in_check() { -MATE_SCORE + ply } else { DRAW_SCORE };
            return SearchResult { score, pv: Vec::new() };
        }

        if self.options.use_null_move
            && !pv_node
            && !pos.in_check()
            && depth >= NULL_MOVE_MIN_DEPTH
            && ply > 0
            && eval::evaluate(pos) >= beta
            && pos.make_null_move()
        {
            let null = -self.search_impl(
                pos,
                -beta,
                -beta + 1,
                depth - NULL_MOVE_REDUCTION - 1,
                &ss[1..],
            );
            pos.unmake_move();
            if null.score >= beta {
                return SearchResult { score: beta, pv: Vec::new() };
            }
        }

        sort_moves(pos, &mut moves, tt_move);

        let (best_score, best_move, pv) =
            if pv_node && self.options.threads > 1 && depth >= SPLIT_MIN_DEPTH
                && moves.len() >= SPLIT_MIN_MOVES
            {
                parallel::split_node(self, pos, &moves, alpha, beta, depth, ss)
            } else {
                self.search_moves(pos, &moves, alpha, beta, depth, ss, pv_node)
            };
        if ply > 0 && self.globals.stop() {
            return SearchResult::default();
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score <= alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.tt.store(
            hash,
            TtEntry {
                mv: move_to_u16(best_move),
                score: score_to_tt(best_score, ply),
                depth,
                bound,
            },
        );

        SearchResult { score: best_score, pv }
    }

    /// The sequential PVS loop over an ordered move list. Returns the best
    /// score, the move that produced it, and the PV when one was built.
    #[allow(clippy::too_many_arguments)]
    fn search_moves(
        &self,
        pos: &mut Position,
        moves: &[Move],
        mut alpha: i32,
        beta: i32,
        depth: i32,
        ss: &[StackEntry],
        pv_node: bool,
    ) -> (i32, Move, Vec<Move>) {
        let ply = ss[0].ply;
        let mut best_score = -INFINITE;
        let mut best_move = moves[0];
        let mut pv = Vec::new();

        for (i, &mv) in moves.iter().enumerate() {
            let is_capture = pos.is_capture(mv);
            let is_promotion = mv.promotion.is_some();
            pos.make_move(mv);

            let mut new_depth = depth - 1;
            if self.options.use_lmr
                && i >= LMR_MOVE_THRESHOLD
                && depth >= LMR_MIN_DEPTH
                && !pos.in_check()
                && !is_capture
                && !is_promotion
            {
                new_depth = (depth - 2).max(1);
            }

            let mut result = if i == 0 {
                -self.search_impl(pos, -beta, -alpha, new_depth, &ss[1..])
            } else {
                -self.search_impl(pos, -alpha - 1, -alpha, new_depth, &ss[1..])
            };
            if i > 0 && result.score > alpha {
                if new_depth < depth - 1 {
                    // The reduced search beat alpha: redo at full depth
                    // before paying for the full window.
                    result = -self.search_impl(pos, -alpha - 1, -alpha, depth - 1, &ss[1..]);
                }
                if result.score > alpha {
                    result = -self.search_impl(pos, -beta, -alpha, depth - 1, &ss[1..]);
                }
            }

            pos.unmake_move();

            if ply > 0 && self.globals.stop() {
                return (best_score, best_move, pv);
            }

            if result.score > best_score {
                best_score = result.score;
                best_move = mv;
                if best_score > alpha {
                    alpha = best_score;
                    if pv_node {
                        pv.clear();
                        pv.push(mv);
                        pv.extend_from_slice(&result.pv);
                    }
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        (best_score, best_move, pv)
    }

    /// Quiescence: extend the horizon through captures, promotions, and
    /// check evasions until the position goes quiet.
    pub fn qsearch_impl(
        &self,
        pos: &mut Position,
        mut alpha: i32,
        beta: i32,
        ss: &[StackEntry],
    ) -> i32 {
        if self.globals.stop() {
            return 0;
        }
        self.globals.increment_nodes();

        let ply = ss[0].ply;
        if ply >= MAX_PLY as i32 - 1 {
            return eval::evaluate(pos);
        }

        let stand_pat = eval::evaluate(pos);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves;
        if pos.in_check() {
            // Searching only captures here would let a checked side "stand
            // pat" out of a lost position; take every evasion instead.
            moves = pos.legal_moves();
            if moves.is_empty() {
                return -MATE_SCORE + ply;
            }
        } else {
            moves = pos.captures_and_promotions();
        }

        sort_moves(pos, &mut moves, None);

        let mut best_score = -INFINITE;
        for &mv in &moves {
            pos.make_move(mv);
            let score = -self.qsearch_impl(pos, -beta, -alpha, &ss[1..]);
            pos.unmake_move();

            if self.globals.stop() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if best_score > alpha {
                    alpha = best_score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        alpha
    }
}
