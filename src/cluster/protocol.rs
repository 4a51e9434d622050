use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

// Dispatch length-field sentinels.
const NO_WORK: i32 = 0;
const TERMINATE: i32 = -1;

/// Master → worker frame: a child position to search, or a control signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Work { fen: String, depth: i32 },
    Idle,
    Terminate,
}

/// Worker → master frame: the searched score from the child's side to move,
/// the node delta it cost, and the child PV as wire moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerResult {
    pub score: i32,
    pub nodes: u64,
    pub pv: Vec<u16>,
}

pub fn write_work(w: &mut impl Write, fen: &str, depth: i32) -> io::Result<()> {
    w.write_i32::<LittleEndian>(fen.len() as i32)?;
    w.write_all(fen.as_bytes())?;
    w.write_i32::<LittleEndian>(depth)?;
    w.flush()
}

pub fn write_idle(w: &mut impl Write) -> io::Result<()> {
    w.write_i32::<LittleEndian>(NO_WORK)?;
    w.flush()
}

pub fn write_terminate(w: &mut impl Write) -> io::Result<()> {
    w.write_i32::<LittleEndian>(TERMINATE)?;
    w.flush()
}

pub fn read_dispatch(r: &mut impl Read) -> io::Result<Dispatch> {
    let len = r.read_i32::<LittleEndian>()?;
    if len < 0 {
        return Ok(Dispatch::Terminate);
    }
    if len == 0 {
        return Ok(Dispatch::Idle);
    }
    let mut fen = vec![0u8; len as usize];
    r.read_exact(&mut fen)?;
    let fen = String::from_utf8(fen)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let depth = r.read_i32::<LittleEndian>()?;
    Ok(Dispatch::Work { fen, depth })
}

pub fn write_result(w: &mut impl Write, result: &WorkerResult) -> io::Result<()> {
    w.write_i32::<LittleEndian>(result.score)?;
    w.write_u64::<LittleEndian>(result.nodes)?;
    w.write_i32::<LittleEndian>(result.pv.len() as i32)?;
    for &mv in &result.pv {
        w.write_u16::<LittleEndian>(mv)?;
    }
    w.flush()
}

pub fn read_result(r: &mut impl Read) -> io::Result<WorkerResult> {
    let score = r.read_i32::<LittleEndian>()?;
    let nodes = r.read_u64::<LittleEndian>()?;
    let len = r.read_i32::<LittleEndian>()?;
    if len < 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "negative pv length"));
    }
    let mut pv = Vec::with_capacity(len as usize);
    for _ in 0..len {
        pv.push(r.read_u16::<LittleEndian>()?);
    }
    Ok(WorkerResult { score, nodes, pv })
}
