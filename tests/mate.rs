use std::sync::Arc;

use rookery::position::Position;
use rookery::search::driver::{best_move_search, uci_score, ScoreDisplay, SearchInfo};
use rookery::search::negamax::{Search, SearchOptions};
use rookery::search::tt::TranspositionTable;
use rookery::search::{SearchGlobals, MATE_SCORE};

fn new_search(options: SearchOptions) -> Search {
    Search::new(
        Arc::new(TranspositionTable::new(16)),
        Arc::new(SearchGlobals::new()),
        options,
    )
}

#[test]
fn back_rank_mate_in_one() {
    let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/4R1K1 w - - 0 1").unwrap();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 2);
    assert_eq!(pos.move_to_uci(result.pv[0]), "e1e8");
    assert_eq!(result.score, MATE_SCORE - 1);
    assert_eq!(uci_score(result.score), ScoreDisplay::MateIn(1));
}

#[test]
fn scholars_mate_delivery() {
    // After 1.e4 e5 2.Bc4 Nc6 3.Qh5 Nf6: Qxf7 is mate.
    let mut pos = Position::from_fen(
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    )
    .unwrap();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 2);
    assert_eq!(pos.move_to_uci(result.pv[0]), "h5f7");
    assert_eq!(uci_score(result.score), ScoreDisplay::MateIn(1));
}

#[test]
fn black_finds_its_own_mate() {
    // Fool's mate pattern: ...Qh4 ends it.
    let mut pos = Position::from_fen(
        "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
    )
    .unwrap();
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 2);
    assert_eq!(pos.move_to_uci(result.pv[0]), "d8h4");
    assert_eq!(result.score, MATE_SCORE - 1);
}

#[test]
fn checkmated_root_has_no_move() {
    // Scholar's mate already delivered; black to move.
    let mut pos = Position::from_fen(
        "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
    )
    .unwrap();
    assert!(pos.legal_moves().is_empty());
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 3);
    assert_eq!(result.score, -MATE_SCORE);
    assert!(result.pv.is_empty());
}

#[test]
fn stalemated_root_is_a_draw_with_no_move() {
    let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(pos.legal_moves().is_empty());
    assert!(!pos.in_check());
    let search = new_search(SearchOptions::default());
    let result = search.search_root(&mut pos, 1);
    assert_eq!(result.score, 0);
    assert!(result.pv.is_empty());

    // The driver reports "no move" the same way.
    let globals = Arc::new(SearchGlobals::new());
    let tt = Arc::new(TranspositionTable::new(16));
    let best = best_move_search(
        &mut pos,
        &globals,
        &tt,
        SearchOptions::default(),
        None,
        1,
        |_| {},
    )
    .unwrap();
    assert!(best.is_none());
}

#[test]
fn driver_publishes_one_info_record_per_depth() {
    let mut pos = Position::startpos();
    let globals = Arc::new(SearchGlobals::new());
    let tt = Arc::new(TranspositionTable::new(16));
    let mut infos: Vec<SearchInfo> = Vec::new();
    let best = best_move_search(
        &mut pos,
        &globals,
        &tt,
        SearchOptions::default(),
        None,
        3,
        |info| infos.push(info.clone()),
    )
    .unwrap();
    assert!(best.is_some());
    assert_eq!(infos.len(), 3);
    for (i, info) in infos.iter().enumerate() {
        assert_eq!(info.depth, i as i32 + 1);
        assert!(!info.pv.is_empty());
        assert!(info.nodes > 0);
    }
    assert!(infos[2].nodes >= infos[0].nodes, "node counter must not decrease");
}
