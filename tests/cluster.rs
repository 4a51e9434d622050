use std::path::Path;
use std::sync::Arc;

use rookery::cluster::master::Cluster;
use rookery::position::Position;
use rookery::search::negamax::{Search, SearchOptions};
use rookery::search::tt::TranspositionTable;
use rookery::search::SearchGlobals;

const MIDGAME: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3";

// Pure alpha-beta so worker full-window results and the local PVS agree on
// the root value.
const PLAIN: SearchOptions = SearchOptions { use_null_move: false, use_lmr: false, threads: 1 };

fn spawn_cluster(workers: usize) -> Cluster {
    let exe = env!("CARGO_BIN_EXE_rookery");
    Cluster::spawn_program(Path::new(exe), workers, PLAIN).expect("spawn workers")
}

#[test]
fn two_workers_agree_with_the_local_search() {
    let pos = Position::from_fen(MIDGAME).unwrap();
    let globals = Arc::new(SearchGlobals::new());
    let mut cluster = spawn_cluster(2);
    let distributed = cluster.search_root(&pos, 3, &globals).expect("cluster search");
    cluster.terminate();

    let local = Search::new(
        Arc::new(TranspositionTable::new(16)),
        Arc::new(SearchGlobals::new()),
        PLAIN,
    )
    .search_root(&mut pos.clone(), 3);

    assert_eq!(distributed.score, local.score, "root value must not depend on distribution");
    let best = *distributed.pv.first().expect("cluster search lost the pv");
    assert!(pos.legal_moves().contains(&best));
    assert!(globals.nodes() > 0, "worker node deltas were not aggregated");
}

#[test]
fn cluster_handles_a_mate_root() {
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/4R1K1 w - - 0 1").unwrap();
    let globals = Arc::new(SearchGlobals::new());
    let mut cluster = spawn_cluster(2);
    let result = cluster.search_root(&pos, 2, &globals).expect("cluster search");
    cluster.terminate();
    assert_eq!(pos.move_to_uci(result.pv[0]), "e1e8");
    assert_eq!(result.score, rookery::search::MATE_SCORE - 1);
}

#[test]
fn terminate_is_idempotent_and_reaps_workers() {
    let mut cluster = spawn_cluster(3);
    assert_eq!(cluster.size(), 3);
    cluster.terminate();
    cluster.terminate();
    // Dropping after an explicit terminate must also be safe.
    drop(cluster);
}

#[test]
fn more_workers_than_root_moves_is_fine() {
    // A bare king has three moves here; the extra workers only ever see idles.
    let pos = Position::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let moves = pos.legal_moves().len();
    assert!(moves > 1, "fixture needs a few moves");
    let globals = Arc::new(SearchGlobals::new());
    let mut cluster = spawn_cluster(moves + 2);
    let result = cluster.search_root(&pos, 2, &globals).expect("cluster search");
    cluster.terminate();
    assert!(!result.pv.is_empty());
}
