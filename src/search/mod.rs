use std::ops::Neg;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use cozy_chess::{Color, Move};

pub mod driver;
pub mod negamax;
pub mod ordering;
pub mod parallel;
pub mod tt;

pub const MAX_PLY: usize = 128;
pub const INFINITE: i32 = 32_000;
pub const MATE_SCORE: i32 = 30_000;
pub const MAX_MATE_SCORE: i32 = MATE_SCORE - MAX_PLY as i32;
pub const DRAW_SCORE: i32 = 0;

/// Negamax score plus the principal variation from the node that produced
/// it. An empty `pv` means "no line": non-PV nodes, stops, and leaves all
/// return one.
#[derive(Clone, Debug, Default)]
pub struct SearchResult {
    pub score: i32,
    pub pv: Vec<Move>,
}

impl Neg for SearchResult {
    type Output = SearchResult;

    fn neg(mut self) -> SearchResult {
        self.score = -self.score;
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StackEntry {
    pub ply: i32,
}

/// Per-thread scratch records, one per ply. The search walks it as a slice
/// and hands `&ss[1..]` to each child.
pub struct SearchStack {
    entries: [StackEntry; MAX_PLY],
}

impl SearchStack {
    pub fn new() -> Self {
        let mut entries = [StackEntry { ply: 0 }; MAX_PLY];
        for (i, e) in entries.iter_mut().enumerate() {
            e.ply = i as i32;
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }
}

impl Default for SearchStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Time controls handed down from `go`; opaque to the search core.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoLimits {
    pub depth: Option<i32>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub infinite: bool,
}

/// Shared mutable search state: the cooperative stop flag, the node counter,
/// and the per-search snapshot taken by the driver.
pub struct SearchGlobals {
    stop: AtomicBool,
    nodes: AtomicU64,
    generation: AtomicU64,
    side_to_move: Mutex<Color>,
    start: Mutex<Instant>,
    limits: Mutex<GoLimits>,
}

impl SearchGlobals {
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            side_to_move: Mutex::new(Color::White),
            start: Mutex::new(Instant::now()),
            limits: Mutex::new(GoLimits::default()),
        }
    }

    pub fn stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn set_stop(&self, value: bool) {
        self.stop.store(value, Ordering::Relaxed);
    }

    pub fn increment_nodes(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a whole worker's node delta in at once.
    pub fn add_nodes(&self, delta: u64) {
        self.nodes.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Reset for a fresh search: clears the stop flag and the node counter,
    /// snapshots the root side and the start time, bumps the generation so
    /// stale watchdogs from an earlier search cannot fire into this one.
    pub fn start_search(&self, side: Color) -> u64 {
        self.set_stop(false);
        self.nodes.store(0, Ordering::Relaxed);
        *self.side_to_move.lock().unwrap() = side;
        *self.start.lock().unwrap() = Instant::now();
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    pub fn side_to_move(&self) -> Color {
        *self.side_to_move.lock().unwrap()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.lock().unwrap().elapsed().as_millis() as u64
    }

    pub fn set_limits(&self, limits: GoLimits) {
        *self.limits.lock().unwrap() = limits;
    }

    pub fn limits(&self) -> GoLimits {
        *self.limits.lock().unwrap()
    }
}

impl Default for SearchGlobals {
    fn default() -> Self {
        Self::new()
    }
}
