use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::warn;

use rookery::cluster::master::Cluster;
use rookery::cluster::worker;
use rookery::position::Position;
use rookery::search::driver::best_move_search;
use rookery::search::negamax::SearchOptions;
use rookery::search::tt::TranspositionTable;
use rookery::search::SearchGlobals;
use rookery::uci::{print_info, UciEngine};

#[derive(Parser, Debug)]
#[command(name = "rookery", version, about = "Parallel chess search engine")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the UCI front-end (the default).
    Uci,
    /// Search one position to a fixed depth and print statistics.
    Bench {
        /// FEN string, or 'startpos'
        #[arg(long, default_value = "startpos")]
        fen: String,

        #[arg(long, default_value_t = 6)]
        depth: i32,

        /// Worker threads inside this process
        #[arg(long, default_value_t = 1)]
        threads: usize,

        /// Worker processes for root distribution (0 = single process)
        #[arg(long, default_value_t = 0)]
        workers: usize,

        /// Transposition table size in MB
        #[arg(long, default_value_t = 32)]
        hash_mb: usize,

        #[arg(long)]
        no_null_move: bool,

        #[arg(long)]
        no_lmr: bool,
    },
    /// Serve as a cluster search worker over stdio (spawned by the master).
    #[command(hide = true)]
    Worker {
        #[arg(long, default_value_t = 1)]
        threads: usize,

        #[arg(long)]
        no_null_move: bool,

        #[arg(long)]
        no_lmr: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    match Args::parse().command {
        None | Some(Command::Uci) => UciEngine::new().run_loop(),
        Some(Command::Worker { threads, no_null_move, no_lmr }) => worker::run(SearchOptions {
            use_null_move: !no_null_move,
            use_lmr: !no_lmr,
            threads,
        }),
        Some(Command::Bench { fen, depth, threads, workers, hash_mb, no_null_move, no_lmr }) => {
            run_bench(&fen, depth, threads, workers, hash_mb, !no_null_move, !no_lmr)
        }
    }
}

fn run_bench(
    fen: &str,
    depth: i32,
    threads: usize,
    workers: usize,
    hash_mb: usize,
    use_null_move: bool,
    use_lmr: bool,
) -> Result<()> {
    let mut pos = if fen == "startpos" { Position::startpos() } else { Position::from_fen(fen)? };
    let options = SearchOptions { use_null_move, use_lmr, threads: threads.max(1) };
    if threads > 1 {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
            warn!("rayon pool already configured: {e}");
        }
    }
    let globals = Arc::new(SearchGlobals::new());
    let tt = Arc::new(TranspositionTable::new(hash_mb));
    let cluster = if workers > 0 { Some(Cluster::spawn(workers, options)?) } else { None };

    println!("position: {}", pos.fen());
    println!(
        "depth {depth}, {threads} thread(s), {workers} worker process(es), {hash_mb} MB hash"
    );
    let started = Instant::now();
    let best = best_move_search(&mut pos, &globals, &tt, options, cluster, depth, print_info)?;
    let elapsed = started.elapsed();

    match best {
        Some(mv) => println!("bestmove {}", pos.move_to_uci(mv)),
        None => println!("bestmove 0000"),
    }
    let nodes = globals.nodes();
    let ms = elapsed.as_millis() as u64;
    let nps = if ms > 0 { nodes * 1000 / ms } else { nodes };
    println!("time {ms} ms, nodes {nodes}, nps {nps}");
    Ok(())
}
