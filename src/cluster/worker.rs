use std::io::{self, BufReader, BufWriter};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

use crate::position::{move_to_u16, Position};
use crate::search::negamax::{Search, SearchOptions};
use crate::search::tt::{TranspositionTable, DEFAULT_SIZE_MB};
use crate::search::{SearchGlobals, SearchStack, INFINITE};

use super::protocol::{self, Dispatch, WorkerResult};

/// Serve dispatches on stdin until the terminate sentinel arrives. Stdout
/// carries the result frames, so anything chatty must go to stderr. The
/// transposition table lives for the whole worker process and is shared
/// across every dispatch and depth it serves.
pub fn run(options: SearchOptions) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = BufReader::new(stdin.lock());
    let mut output = BufWriter::new(stdout.lock());

    let tt = Arc::new(TranspositionTable::new(DEFAULT_SIZE_MB));
    let globals = Arc::new(SearchGlobals::new());
    let search = Search::new(tt, globals.clone(), options);
    let stack = SearchStack::new();

    loop {
        match protocol::read_dispatch(&mut input).context("read dispatch frame")? {
            Dispatch::Terminate => break,
            Dispatch::Idle => continue,
            Dispatch::Work { fen, depth } => {
                let mut pos = Position::from_fen(&fen)?;
                let before = globals.nodes();
                // The master already played the root move: search one ply
                // shallower, one ply deeper in the stack.
                let result = search.search_impl(
                    &mut pos,
                    -INFINITE,
                    INFINITE,
                    depth - 1,
                    &stack.entries()[1..],
                );
                let nodes = globals.nodes() - before;
                debug!("worker searched {fen} to depth {} ({nodes} nodes)", depth - 1);
                let reply = WorkerResult {
                    score: result.score,
                    nodes,
                    pv: result.pv.iter().map(|&m| move_to_u16(m)).collect(),
                };
                protocol::write_result(&mut output, &reply).context("write result frame")?;
            }
        }
    }
    Ok(())
}
