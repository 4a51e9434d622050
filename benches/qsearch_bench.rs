use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rookery::position::Position;
use rookery::search::negamax::{Search, SearchOptions};
use rookery::search::tt::TranspositionTable;
use rookery::search::{SearchGlobals, SearchStack, INFINITE};

fn bench_qsearch(c: &mut Criterion) {
    let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    c.bench_function("qsearch_kiwipete", |b| {
        b.iter(|| {
            let mut pos = Position::from_fen(kiwipete).unwrap();
            let search = Search::new(
                Arc::new(TranspositionTable::new(16)),
                Arc::new(SearchGlobals::new()),
                SearchOptions::default(),
            );
            let stack = SearchStack::new();
            let score =
                search.qsearch_impl(black_box(&mut pos), -INFINITE, INFINITE, stack.entries());
            black_box(score)
        })
    });
}

criterion_group!(benches, bench_qsearch);
criterion_main!(benches);
