use crate::chess::{Board, Color, Role, Square};
use derive_more::{Display, Error};
use std::fmt::{self, Formatter, Write};
use std::str::FromStr;
use tracing::instrument;

const RANKS: &str = "12345678";
const FILES: &str = "abcdefgh";

/// A position in [Forsyth–Edwards Notation].
///
/// Only the piece placement and the side to move are interpreted,
/// castling rights and pawn double steps follow from the board itself.
///
/// [Forsyth–Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Fen {
    pub board: Board,
    pub turn: Color,
}

/// The reason why parsing [`Fen`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParseFenError {
    #[display(fmt = "empty position")]
    InvalidSyntax,

    #[display(fmt = "invalid piece placement `{}`", _0)]
    InvalidPlacement(#[error(not(source))] String),

    #[display(fmt = "invalid side to move `{}`", _0)]
    InvalidTurn(#[error(not(source))] String),
}

fn role(c: char) -> Option<(Color, Role)> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };

    let role = c.to_ascii_lowercase().to_string().parse().ok()?;
    Some((color, role))
}

fn placement(s: &str) -> Option<Vec<(Square, Color, Role)>> {
    let rows: Vec<_> = s.split('/').collect();
    if rows.len() != RANKS.len() {
        return None;
    }

    let mut pieces = Vec::with_capacity(32);
    for (row, &rank) in rows.iter().zip(RANKS.as_bytes().iter().rev()) {
        let mut files = FILES.bytes();
        for c in row.chars() {
            match c.to_digit(10) {
                Some(n @ 1..=8) => {
                    for _ in 0..n {
                        files.next()?;
                    }
                }

                Some(_) => return None,

                None => {
                    let (color, role) = role(c)?;
                    pieces.push((Square::new(files.next()?, rank), color, role));
                }
            }
        }

        if files.next().is_some() {
            return None;
        }
    }

    pieces.sort_by_key(|(s, _, _)| (s.rank(), s.file()));
    Some(pieces)
}

impl Default for Fen {
    /// The standard starting position.
    fn default() -> Self {
        Fen {
            board: Board::default(),
            turn: Color::White,
        }
    }
}

impl FromStr for Fen {
    type Err = ParseFenError;

    #[instrument(level = "trace", err)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();

        let field = fields.next().ok_or(ParseFenError::InvalidSyntax)?;
        let board = placement(field)
            .and_then(|pieces| Board::new(RANKS, FILES, pieces).ok())
            .ok_or_else(|| ParseFenError::InvalidPlacement(field.into()))?;

        let turn = match fields.next() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(t) => return Err(ParseFenError::InvalidTurn(t.into())),
        };

        Ok(Fen { board, turn })
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, &rank) in self.board.ranks().iter().rev().enumerate() {
            if i > 0 {
                f.write_char('/')?;
            }

            let mut empty = 0;
            for &file in self.board.files() {
                match self.board.lookup(Square::new(file, rank)) {
                    None => empty += 1,
                    Some(p) => {
                        if empty > 0 {
                            write!(f, "{}", empty)?;
                            empty = 0;
                        }

                        let letter = p.role().to_string();
                        match p.color() {
                            Color::White => f.write_str(&letter.to_ascii_uppercase())?,
                            Color::Black => f.write_str(&letter)?,
                        }
                    }
                }
            }

            if empty > 0 {
                write!(f, "{}", empty)?;
            }
        }

        match self.turn {
            Color::White => f.write_str(" w"),
            Color::Black => f.write_str(" b"),
        }
    }
}
