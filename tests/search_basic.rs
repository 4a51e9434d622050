use std::sync::Arc;

use rookery::position::Position;
use rookery::search::negamax::{Search, SearchOptions};
use rookery::search::tt::{Bound, TranspositionTable};
use rookery::search::{SearchGlobals, MATE_SCORE};

fn new_search(options: SearchOptions) -> Search {
    Search::new(
        Arc::new(TranspositionTable::new(16)),
        Arc::new(SearchGlobals::new()),
        options,
    )
}

#[test]
fn depth_one_returns_a_legal_move() {
    let mut pos = Position::startpos();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 1);
    let best = *result.pv.first().expect("no move at depth 1");
    assert!(pos.legal_moves().contains(&best), "pv head must be legal");
}

#[test]
fn startpos_depth_four_picks_a_main_line_opening() {
    let mut pos = Position::startpos();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 4);
    let best = pos.move_to_uci(result.pv[0]);
    assert!(
        ["e2e4", "d2d4", "g1f3", "c2c4"].contains(&best.as_str()),
        "unexpected opening move {best}"
    );
    assert!(result.score.abs() <= 50, "startpos should be near balanced: {}", result.score);
}

#[test]
fn winning_queen_capture_preferred() {
    let mut pos = Position::from_fen("k7/8/8/8/8/8/3qQ3/7K w - - 0 1").unwrap();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 1);
    assert_eq!(pos.move_to_uci(result.pv[0]), "e2d2");
}

#[test]
fn every_pv_move_is_legal_in_sequence() {
    let mut pos = Position::from_fen(
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3",
    )
    .unwrap();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 4);
    assert!(result.score.abs() <= MATE_SCORE);
    let mut replay = pos.clone();
    for &mv in &result.pv {
        assert!(replay.is_legal(mv), "pv move {mv} illegal in its position");
        replay.make_move(mv);
    }
}

#[test]
fn root_entry_is_exact_after_full_window_search() {
    let mut pos = Position::startpos();
    let search = new_search(SearchOptions::default());
    search.search_root(&mut pos, 3);
    let entry = search.tt().probe(pos.hash()).expect("root entry missing");
    assert_eq!(entry.bound, Bound::Exact);
    assert!(entry.depth >= 3, "stored depth {} too shallow", entry.depth);
}

#[test]
fn any_window_containing_the_score_agrees_with_full_window() {
    let plain = SearchOptions { use_null_move: false, use_lmr: false, threads: 1 };
    let mut pos = Position::startpos();
    let full = new_search(plain).search_root(&mut pos, 3);

    let narrow = new_search(plain);
    let stack = rookery::search::SearchStack::new();
    let windowed = narrow.search_impl(
        &mut pos,
        full.score - 30,
        full.score + 30,
        3,
        stack.entries(),
    );
    assert_eq!(windowed.score, full.score);
}
