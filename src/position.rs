use anyhow::{anyhow, Result};
use cozy_chess::{BitBoard, Board, Color, File, Move, Piece, Rank, Square};

/// Mutable game state over a `cozy_chess::Board`, with the make/unmake stack
/// and position history the search needs. Parallel branches clone the whole
/// thing and mutate their private copy.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    undo: Vec<Board>,
    hashes: Vec<u64>,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: Board::default(), undo: Vec::new(), hashes: Vec::new() }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let board = Board::from_fen(fen, false)
            .map_err(|e| anyhow!("invalid FEN {:?}: {:?}", fen, e))?;
        Ok(Self { board, undo: Vec::new(), hashes: Vec::new() })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn halfmoves(&self) -> u32 {
        self.board.halfmove_clock() as u32
    }

    pub fn hash(&self) -> u64 {
        self.board.hash()
    }

    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board.piece_on(sq)
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.board.is_legal(mv)
    }

    /// True if the current position already occurred in the push history,
    /// looking back no further than the halfmove clock allows.
    pub fn is_repeat(&self) -> bool {
        let hash = self.board.hash();
        let lookback = self.board.halfmove_clock() as usize + 1;
        self.hashes.iter().rev().take(lookback).any(|&h| h == hash)
    }

    pub fn make_move(&mut self, mv: Move) {
        self.undo.push(self.board.clone());
        self.hashes.push(self.board.hash());
        self.board.play(mv);
    }

    /// Pass the turn to the opponent. Returns false (and leaves the position
    /// untouched) when the side to move is in check.
    pub fn make_null_move(&mut self) -> bool {
        match self.board.null_move() {
            Some(next) => {
                self.undo.push(self.board.clone());
                self.hashes.push(self.board.hash());
                self.board = next;
                true
            }
            None => false,
        }
    }

    pub fn unmake_move(&mut self) {
        let prev = self.undo.pop().expect("unmake_move without matching make_move");
        self.hashes.pop();
        self.board = prev;
    }

    /// All legal moves. When in check this is exactly the evasion list.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        self.board.generate_moves(|ms| {
            moves.extend(ms);
            false
        });
        moves
    }

    /// Staged generation for quiescence: captures (including en passant) and
    /// promotions. Only legal moves come out, so no post-filter is needed.
    pub fn captures_and_promotions(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(32);
        let enemy = self.board.colors(!self.board.side_to_move());
        let promo_rank = match self.board.side_to_move() {
            Color::White => Rank::Eighth.bitboard(),
            Color::Black => Rank::First.bitboard(),
        };
        let ep = self
            .en_passant_square()
            .map(|sq| sq.bitboard())
            .unwrap_or(BitBoard::EMPTY);
        self.board.generate_moves(|mut ms| {
            let mask = if ms.piece == Piece::Pawn {
                enemy | promo_rank | ep
            } else {
                enemy
            };
            ms.to &= mask;
            moves.extend(ms);
            false
        });
        moves
    }

    pub fn is_en_passant(&self, mv: Move) -> bool {
        self.board.piece_on(mv.from) == Some(Piece::Pawn)
            && mv.from.file() != mv.to.file()
            && Some(mv.to) == self.en_passant_square()
    }

    /// The enemy piece a move captures, if any. Castling lands on a friendly
    /// rook in cozy-chess encoding and must not count as a capture.
    pub fn capture_victim(&self, mv: Move) -> Option<Piece> {
        if self.board.color_on(mv.to) == Some(!self.board.side_to_move()) {
            self.board.piece_on(mv.to)
        } else {
            None
        }
    }

    pub fn is_capture(&self, mv: Move) -> bool {
        self.capture_victim(mv).is_some() || self.is_en_passant(mv)
    }

    fn en_passant_square(&self) -> Option<Square> {
        self.board.en_passant().map(|file| {
            let rank = match self.board.side_to_move() {
                Color::White => Rank::Sixth,
                Color::Black => Rank::Third,
            };
            Square::new(file, rank)
        })
    }

    /// Long-algebraic form. cozy-chess encodes castling king-takes-rook; UCI
    /// wants the king's destination square.
    pub fn move_to_uci(&self, mv: Move) -> String {
        if self.board.piece_on(mv.from) == Some(Piece::King)
            && self.board.color_on(mv.to) == Some(self.board.side_to_move())
        {
            let file = if mv.to.file() > mv.from.file() { File::G } else { File::C };
            return format!("{}{}", mv.from, Square::new(file, mv.from.rank()));
        }
        mv.to_string()
    }

    /// Resolve a long-algebraic string against the legal moves, accepting both
    /// standard UCI castling and the internal king-takes-rook form.
    pub fn parse_uci_move(&self, s: &str) -> Option<Move> {
        self.legal_moves()
            .into_iter()
            .find(|&m| self.move_to_uci(m) == s || m.to_string() == s)
    }
}

/// Wire form of a move: from | to << 6 | promotion << 12. Zero never encodes
/// a real move and doubles as the "no move" sentinel.
pub fn move_to_u16(mv: Move) -> u16 {
    let promo = match mv.promotion {
        None => 0u16,
        Some(Piece::Knight) => 1,
        Some(Piece::Bishop) => 2,
        Some(Piece::Rook) => 3,
        Some(Piece::Queen) => 4,
        Some(_) => 0,
    };
    (mv.from as u16) | ((mv.to as u16) << 6) | (promo << 12)
}

pub fn move_from_u16(value: u16) -> Option<Move> {
    if value == 0 {
        return None;
    }
    let from = Square::ALL[(value & 0x3f) as usize];
    let to = Square::ALL[((value >> 6) & 0x3f) as usize];
    let promotion = match (value >> 12) & 0x7 {
        1 => Some(Piece::Knight),
        2 => Some(Piece::Bishop),
        3 => Some(Piece::Rook),
        4 => Some(Piece::Queen),
        _ => None,
    };
    Some(Move { from, to, promotion })
}
