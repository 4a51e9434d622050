use std::io::BufReader;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use cozy_chess::Move;
use log::{debug, warn};

use crate::position::{move_from_u16, Position};
use crate::search::negamax::SearchOptions;
use crate::search::ordering::sort_moves;
use crate::search::{SearchGlobals, SearchResult, DRAW_SCORE, INFINITE, MATE_SCORE};

use super::protocol::{self, WorkerResult};

struct Worker {
    child: Child,
    stdin: ChildStdin,
    reader: Option<JoinHandle<()>>,
}

/// Master side of the root scheduler: owns the worker processes and drains
/// their results through one channel, which stands in for a receive from
/// any source. All sends happen from the calling thread.
pub struct Cluster {
    workers: Vec<Worker>,
    results: Receiver<(usize, WorkerResult)>,
    terminated: bool,
}

impl Cluster {
    /// Spawn workers running this same executable in `worker` mode.
    pub fn spawn(count: usize, options: SearchOptions) -> Result<Cluster> {
        let exe = std::env::current_exe().context("locate current executable")?;
        Cluster::spawn_program(&exe, count, options)
    }

    pub fn spawn_program(program: &Path, count: usize, options: SearchOptions) -> Result<Cluster> {
        if count == 0 {
            bail!("a cluster needs at least one worker");
        }
        let mut args = vec!["worker".to_string()];
        args.push("--threads".to_string());
        args.push(options.threads.to_string());
        if !options.use_null_move {
            args.push("--no-null-move".to_string());
        }
        if !options.use_lmr {
            args.push("--no-lmr".to_string());
        }

        let (tx, rx) = channel();
        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            let mut child = Command::new(program)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .spawn()
                .with_context(|| format!("spawn search worker {id}"))?;
            let stdin = child.stdin.take().context("worker stdin unavailable")?;
            let stdout = child.stdout.take().context("worker stdout unavailable")?;
            let tx = tx.clone();
            let reader = std::thread::spawn(move || {
                let mut stream = BufReader::new(stdout);
                while let Ok(result) = protocol::read_result(&mut stream) {
                    if tx.send((id, result)).is_err() {
                        break;
                    }
                }
            });
            workers.push(Worker { child, stdin, reader: Some(reader) });
        }
        debug!("cluster up with {count} workers");
        Ok(Cluster { workers, results: rx, terminated: false })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// One depth of root splitting: seed every worker with a root move, then
    /// keep handing out the rest as results come back. The worker score is
    /// from the child's side to move, so it is negated here, and the
    /// dispatched move is prepended to the returned PV.
    pub fn search_root(
        &mut self,
        pos: &Position,
        depth: i32,
        globals: &Arc<SearchGlobals>,
    ) -> Result<SearchResult> {
        let mut moves = pos.legal_moves();
        if moves.is_empty() {
            let score = if pos.in_check() { -MATE_SCORE } else { DRAW_SCORE };
            return Ok(SearchResult { score, pv: Vec::new() });
        }
        sort_moves(pos, &mut moves, None);

        let total = moves.len();
        let mut next = 0usize;
        let mut completed = 0usize;
        let mut assigned: Vec<Option<Move>> = vec![None; self.workers.len()];

        for id in 0..self.workers.len() {
            if next < total {
                self.dispatch(id, pos, moves[next], depth)?;
                assigned[id] = Some(moves[next]);
                next += 1;
            } else {
                protocol::write_idle(&mut self.workers[id].stdin)
                    .with_context(|| format!("idle worker {id}"))?;
            }
        }

        let mut best = SearchResult { score: -INFINITE, pv: Vec::new() };
        while completed < total {
            let (id, result) = self
                .results
                .recv()
                .context("worker result channel closed mid-search")?;
            let dispatched = assigned[id]
                .take()
                .context("received a result from a worker with no assignment")?;
            globals.add_nodes(result.nodes);

            let score = -result.score;
            if score > best.score {
                let mut pv = Vec::with_capacity(result.pv.len() + 1);
                pv.push(dispatched);
                pv.extend(result.pv.iter().filter_map(|&v| move_from_u16(v)));
                best = SearchResult { score, pv };
            }
            completed += 1;

            if next < total {
                self.dispatch(id, pos, moves[next], depth)?;
                assigned[id] = Some(moves[next]);
                next += 1;
            } else {
                protocol::write_idle(&mut self.workers[id].stdin)
                    .with_context(|| format!("idle worker {id}"))?;
            }
        }

        Ok(best)
    }

    fn dispatch(&mut self, id: usize, pos: &Position, mv: Move, depth: i32) -> Result<()> {
        // The root move is consumed here; the worker searches the child one
        // ply shallower.
        let mut child_pos = pos.clone();
        child_pos.make_move(mv);
        protocol::write_work(&mut self.workers[id].stdin, &child_pos.fen(), depth)
            .with_context(|| format!("dispatch work to worker {id}"))
    }

    /// Send every worker the terminate sentinel and reap the processes.
    /// Idempotent; also runs on drop.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        for (id, worker) in self.workers.iter_mut().enumerate() {
            if protocol::write_terminate(&mut worker.stdin).is_err() {
                warn!("worker {id} was already gone at terminate");
            }
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.reader.take() {
                let _ = handle.join();
            }
            let _ = worker.child.wait();
        }
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.terminate();
    }
}
