use crate::chess::{Move, Role, Square};
use derive_more::{Display, Error};
use shakmaty as sm;
use std::str::FromStr;

/// A move in [standard algebraic notation].
///
/// Only boards labeled `a`-`h` and `1`-`8` can be described this way.
///
/// [standard algebraic notation]: https://www.chessprogramming.org/Algebraic_Chess_Notation
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash)]
#[display(fmt = "{}", _0)]
pub struct San(sm::san::San);

/// The reason why parsing [`San`] failed.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "invalid algebraic notation")]
pub struct ParseSanError;

impl FromStr for San {
    type Err = ParseSanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let san: sm::san::SanPlus = s.parse().map_err(|_| ParseSanError)?;
        Ok(San(san.san))
    }
}

#[doc(hidden)]
impl From<sm::san::San> for San {
    fn from(san: sm::san::San) -> Self {
        San(san)
    }
}

fn role(r: Role) -> sm::Role {
    match r {
        Role::Pawn => sm::Role::Pawn,
        Role::Knight => sm::Role::Knight,
        Role::Bishop => sm::Role::Bishop,
        Role::Rook => sm::Role::Rook,
        Role::Queen => sm::Role::Queen,
        Role::King => sm::Role::King,
    }
}

fn square(s: Square) -> Option<sm::Square> {
    let file = sm::File::from_char(s.file().into())?;
    let rank = sm::Rank::from_char(s.rank().into())?;
    Some(sm::Square::from_coords(file, rank))
}

fn side(m: &Move) -> sm::CastlingSide {
    let king = m.primary();
    if king.whither.file() > king.whence.file() {
        sm::CastlingSide::KingSide
    } else {
        sm::CastlingSide::QueenSide
    }
}

impl San {
    /// Describes a move given every legal alternative in the same position.
    ///
    /// The origin is spelled out only as far as needed to tell apart pieces
    /// of the same [`Role`] that can reach the same square.
    pub fn from_move(m: &Move, legal: &[Move]) -> Option<Self> {
        if m.secondary().is_some() {
            return Some(San(sm::san::San::Castle(side(m))));
        }

        let step = m.primary();
        let (whence, piece) = (step.whence, step.piece);

        let rivals: Vec<Square> = legal
            .iter()
            .filter(|n| n.secondary().is_none() && n.whence() != whence)
            .filter(|n| n.whither() == step.whither && n.piece().role() == piece.role())
            .filter(|n| n.piece().color() == piece.color())
            .map(Move::whence)
            .collect();

        let (file, rank) = match piece.role() {
            Role::Pawn if step.captured.is_some() => (true, false),
            Role::Pawn => (false, false),
            _ if rivals.is_empty() => (false, false),
            _ if rivals.iter().all(|s| s.file() != whence.file()) => (true, false),
            _ if rivals.iter().all(|s| s.rank() != whence.rank()) => (false, true),
            _ => (true, true),
        };

        let origin = square(whence)?;

        Some(San(sm::san::San::Normal {
            role: role(piece.role()),
            file: file.then(|| origin.file()),
            rank: rank.then(|| origin.rank()),
            capture: step.captured.is_some(),
            to: square(step.whither)?,
            promotion: m.promotion().map(|p| role(p.role())),
        }))
    }

    /// The only move among the legal ones that fits this description.
    pub fn resolve<'a>(&self, legal: &'a [Move]) -> Option<&'a Move> {
        let mut candidates = legal.iter().filter(|m| self.describes(m));

        match (candidates.next(), candidates.next()) {
            (Some(m), None) => Some(m),
            _ => None,
        }
    }

    fn describes(&self, m: &Move) -> bool {
        use sm::san::San::*;

        match (&self.0, m) {
            (Castle(s), Move::Compound { .. }) => side(m) == *s,

            (
                Normal {
                    role: r,
                    file,
                    rank,
                    capture,
                    to,
                    promotion,
                },
                Move::Simple(step) | Move::Promotion { primary: step, .. },
            ) => {
                let origin = square(step.whence);

                role(step.piece.role()) == *r
                    && square(step.whither) == Some(*to)
                    && file.map_or(true, |f| origin.map(|o| o.file()) == Some(f))
                    && rank.map_or(true, |k| origin.map(|o| o.rank()) == Some(k))
                    && (!*capture || step.captured.is_some())
                    && m.promotion().map(|p| role(p.role())) == *promotion
            }

            _ => false,
        }
    }
}
