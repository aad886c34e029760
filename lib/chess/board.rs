use crate::chess::{Color, Move, Piece, PieceId, Role, Square, Step};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Formatter, Write};

/// The reason why a [`Board`] could not be assembled.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum InvalidBoard {
    #[display(fmt = "`{}` is not a sequence of distinct ASCII labels", _0)]
    InvalidLabels(#[error(not(source))] String),

    #[display(fmt = "square `{}` is outside of the board", _0)]
    OutOfBounds(#[error(not(source))] Square),

    #[display(fmt = "square `{}` is occupied more than once", _0)]
    Occupied(#[error(not(source))] Square),

    #[display(fmt = "piece `{}` is placed more than once", _0)]
    DuplicatePiece(#[error(not(source))] PieceId),

    #[display(fmt = "piece `{}` leaves no identities for promotions", _0)]
    ExhaustedIds(#[error(not(source))] PieceId),
}

/// The square to piece mapping of a chess board along with its move history.
///
/// The board never mutates a [`Piece`], moving one only remaps squares.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "BoardRepr", into = "BoardRepr")]
pub struct Board {
    ranks: Vec<u8>,
    files: Vec<u8>,
    squares: HashMap<Square, Piece>,
    history: Vec<Move>,
}

impl Default for Board {
    /// The standard starting layout.
    fn default() -> Self {
        use Role::*;

        const BACK_RANK: [Role; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let rows = [
            (b'1', Color::White, BACK_RANK),
            (b'2', Color::White, [Pawn; 8]),
            (b'7', Color::Black, [Pawn; 8]),
            (b'8', Color::Black, BACK_RANK),
        ];

        let mut squares = HashMap::with_capacity(32);
        for (rank, color, roles) in rows {
            for (file, role) in (b'a'..=b'h').zip(roles) {
                let id = PieceId(squares.len() as u16);
                squares.insert(Square::new(file, rank), Piece::new(id, color, role));
            }
        }

        Board {
            ranks: (b'1'..=b'8').collect(),
            files: (b'a'..=b'h').collect(),
            squares,
            history: Vec::new(),
        }
    }
}

impl Board {
    /// Sets up a board with the given labels, assigning identities in placement order.
    pub fn new<I>(ranks: &str, files: &str, placements: I) -> Result<Self, InvalidBoard>
    where
        I: IntoIterator<Item = (Square, Color, Role)>,
    {
        let pieces = placements
            .into_iter()
            .enumerate()
            .map(|(i, (s, c, r))| (s, Piece::new(PieceId(i as u16), c, r)))
            .collect();

        Board::assemble(ranks, files, pieces, Vec::new())
    }

    fn assemble(
        ranks: &str,
        files: &str,
        pieces: Vec<(Square, Piece)>,
        history: Vec<Move>,
    ) -> Result<Self, InvalidBoard> {
        let mut board = Board {
            ranks: labels(ranks)?,
            files: labels(files)?,
            squares: HashMap::with_capacity(pieces.len()),
            history,
        };

        let mut ids = HashSet::with_capacity(pieces.len());
        for (square, piece) in pieces {
            if !board.is_valid(square) {
                return Err(InvalidBoard::OutOfBounds(square));
            } else if !ids.insert(piece.id()) {
                return Err(InvalidBoard::DuplicatePiece(piece.id()));
            } else if board.squares.insert(square, piece).is_some() {
                return Err(InvalidBoard::Occupied(square));
            }
        }

        // Every pawn on the board may still claim a fresh identity when promoted.
        if let Some(id @ PieceId(max)) = board.max_piece_id() {
            let pawns = board.squares.values().filter(|p| p.role() == Role::Pawn).count();
            if usize::from(u16::MAX - max) <= pawns {
                return Err(InvalidBoard::ExhaustedIds(id));
            }
        }

        Ok(board)
    }

    /// The rank labels, bottom to top from white's perspective.
    pub fn ranks(&self) -> &[u8] {
        &self.ranks
    }

    /// The file labels, left to right from white's perspective.
    pub fn files(&self) -> &[u8] {
        &self.files
    }

    /// Every move applied so far, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Whether the [`Square`] exists on this board.
    pub fn is_valid(&self, s: Square) -> bool {
        self.ranks.contains(&s.rank()) && self.files.contains(&s.file())
    }

    /// The [`Piece`] standing on a [`Square`], if any.
    pub fn lookup(&self, s: Square) -> Option<Piece> {
        self.squares.get(&s).copied()
    }

    /// Every occupied [`Square`], rank by rank and file by file.
    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.ranks
            .iter()
            .flat_map(move |&r| self.files.iter().map(move |&f| Square::new(f, r)))
            .filter_map(move |s| Some((s, self.lookup(s)?)))
    }

    /// Whether the piece has taken part in any move so far.
    pub fn has_piece_moved(&self, id: PieceId) -> bool {
        self.history.iter().any(|m| {
            m.piece().id() == id || m.secondary().map_or(false, |s| s.piece.id() == id)
        })
    }

    /// The rank where the officers of this [`Color`] start.
    pub fn back_rank(&self, c: Color) -> Option<u8> {
        self.last_rank(!c)
    }

    /// The rank where pawns of this [`Color`] start.
    pub fn home_rank(&self, c: Color) -> Option<u8> {
        match c {
            Color::White => self.ranks.get(1).copied(),
            Color::Black => self.ranks.iter().rev().nth(1).copied(),
        }
    }

    /// The rank where pawns of this [`Color`] are promoted.
    pub fn last_rank(&self, c: Color) -> Option<u8> {
        match c {
            Color::White => self.ranks.last().copied(),
            Color::Black => self.ranks.first().copied(),
        }
    }

    /// An identity not held by any piece on the board or in its history.
    ///
    /// This is a function of the board state alone, so it rolls back with undo.
    pub fn next_piece_id(&self) -> PieceId {
        PieceId(self.max_piece_id().map_or(0, |PieceId(id)| id + 1))
    }

    fn max_piece_id(&self) -> Option<PieceId> {
        let on_board = self.squares.values().map(Piece::id);
        let in_history = self.history.iter().flat_map(|m| {
            let steps = [Some(m.primary()), m.secondary()];
            let pieces = steps.into_iter().flatten().flat_map(|s| [Some(s.piece), s.captured]);
            pieces.chain([m.promotion()]).flatten().map(|p| p.id())
        });

        on_board.chain(in_history).max()
    }

    /// Applies a move and records it in the history.
    pub(crate) fn apply(&mut self, m: Move) {
        match &m {
            Move::Simple(s) => self.shift(s, s.piece),
            Move::Compound { primary, secondary } => {
                self.shift(secondary, secondary.piece);
                self.shift(primary, primary.piece);
            }
            Move::Promotion { primary, to, .. } => self.shift(primary, *to),
        }

        self.history.push(m);
    }

    /// Reverts the most recent move, if any.
    pub(crate) fn undo(&mut self) -> Option<Move> {
        let m = self.history.pop()?;

        match &m {
            Move::Simple(s) => self.unshift(s, s.piece),
            Move::Compound { primary, secondary } => {
                self.unshift(primary, primary.piece);
                self.unshift(secondary, secondary.piece);
            }
            Move::Promotion { primary, from, .. } => self.unshift(primary, *from),
        }

        Some(m)
    }

    fn shift(&mut self, s: &Step, arrival: Piece) {
        self.squares.remove(&s.whence);
        self.squares.insert(s.whither, arrival);
    }

    fn unshift(&mut self, s: &Step, departure: Piece) {
        match s.captured {
            Some(captured) => self.squares.insert(s.whither, captured),
            None => self.squares.remove(&s.whither),
        };

        self.squares.insert(s.whence, departure);
    }
}

fn labels(s: &str) -> Result<Vec<u8>, InvalidBoard> {
    let labels: Vec<u8> = s.bytes().collect();
    let distinct: HashSet<_> = labels.iter().collect();

    if labels.is_empty()
        || distinct.len() != labels.len()
        || !s.bytes().all(|b| b.is_ascii_graphic())
    {
        Err(InvalidBoard::InvalidLabels(s.into()))
    } else {
        Ok(labels)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, &rank) in self.ranks.iter().rev().enumerate() {
            f.write_char(rank.into())?;

            for (j, &file) in self.files.iter().enumerate() {
                let glyph = match self.lookup(Square::new(file, rank)) {
                    Some(p) => p.glyph(),
                    None if (i + j) % 2 == 1 => 'x',
                    None => ' ',
                };

                write!(f, " {}", glyph)?;
            }

            writeln!(f)?;
        }

        f.write_char(' ')?;
        for &file in &self.files {
            write!(f, " {}", char::from(file))?;
        }

        Ok(())
    }
}

#[derive(Deserialize, Serialize)]
struct BoardRepr {
    ranks: String,
    files: String,
    pieces: Vec<(Square, Piece)>,
    history: Vec<Move>,
}

impl TryFrom<BoardRepr> for Board {
    type Error = InvalidBoard;

    fn try_from(repr: BoardRepr) -> Result<Self, Self::Error> {
        Board::assemble(&repr.ranks, &repr.files, repr.pieces, repr.history)
    }
}

impl From<Board> for BoardRepr {
    fn from(b: Board) -> Self {
        BoardRepr {
            ranks: b.ranks.iter().copied().map(char::from).collect(),
            files: b.files.iter().copied().map(char::from).collect(),
            pieces: b.iter().collect(),
            history: b.history,
        }
    }
}

#[cfg(test)]
impl proptest::arbitrary::Arbitrary for Board {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        use proptest::{prelude::*, sample::Selector};

        (0..48usize, any::<Selector>())
            .prop_map(|(plies, selector)| {
                let mut board = Board::default();
                let mut turn = Color::White;

                for _ in 0..plies {
                    match selector.try_select(board.legal_moves(turn)) {
                        Some(m) => board.apply(m),
                        None => break,
                    }

                    turn = !turn;
                }

                board
            })
            .no_shrink()
            .boxed()
    }
}
