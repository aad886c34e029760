use crate::chess::{Piece, Role, Square};
use derive_more::{Constructor, Display, Error};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Formatter};

/// A single piece hopping from one [`Square`] to another, possibly capturing.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Constructor)]
#[derive(Deserialize, Serialize)]
#[display(fmt = "{}{}", whence, whither)]
pub struct Step {
    pub piece: Piece,
    #[serde(default, rename = "taken", skip_serializing_if = "Option::is_none")]
    pub captured: Option<Piece>,
    #[serde(rename = "from")]
    pub whence: Square,
    #[serde(rename = "to")]
    pub whither: Square,
}

/// A chess move.
///
/// Moves are produced fresh by the rule set and stored permanently in the
/// history of the [`Board`][`crate::chess::Board`] they were applied to.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(try_from = "MoveRepr", into = "MoveRepr")]
pub enum Move {
    /// A plain step.
    Simple(Step),

    /// Two steps applied and undone as a unit, e.g. castling.
    Compound { primary: Step, secondary: Step },

    /// A pawn step replacing the pawn with another piece at the destination.
    Promotion { primary: Step, from: Piece, to: Piece },
}

impl Move {
    /// The step that defines this move.
    pub fn primary(&self) -> &Step {
        match self {
            Move::Simple(s) => s,
            Move::Compound { primary, .. } => primary,
            Move::Promotion { primary, .. } => primary,
        }
    }

    /// The moving [`Piece`].
    pub fn piece(&self) -> Piece {
        self.primary().piece
    }

    /// The source [`Square`].
    pub fn whence(&self) -> Square {
        self.primary().whence
    }

    /// The destination [`Square`].
    pub fn whither(&self) -> Square {
        self.primary().whither
    }

    /// The captured [`Piece`], if any.
    pub fn captured(&self) -> Option<Piece> {
        self.primary().captured
    }

    /// The paired step of a compound move.
    pub fn secondary(&self) -> Option<&Step> {
        match self {
            Move::Compound { secondary, .. } => Some(secondary),
            _ => None,
        }
    }

    /// The replacement [`Piece`] of a promotion.
    pub fn promotion(&self) -> Option<Piece> {
        match self {
            Move::Promotion { to, .. } => Some(*to),
            _ => None,
        }
    }

    /// The piece that stands on the destination once this move is applied.
    pub fn arrival(&self) -> Piece {
        self.promotion().unwrap_or_else(|| self.piece())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Move::Promotion { primary, to, .. } => write!(f, "{}{}", primary, to.role()),
            m => write!(f, "{}", m.primary()),
        }
    }
}

#[derive(Deserialize, Serialize)]
struct MoveRepr {
    piece: Piece,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    taken: Option<Piece>,
    from: Square,
    to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    castle: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    promotion: Option<(Piece, Piece)>,
}

/// The reason why a persisted move is malformed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum InvalidMoveRepr {
    #[display(fmt = "a move cannot both castle and promote")]
    CastlingPromotion,

    #[display(fmt = "promotion must replace the moving piece")]
    PromotionMismatch,

    #[display(fmt = "a pawn cannot be promoted to a {}", _0)]
    PromotionRole(#[error(not(source))] Role),
}

impl TryFrom<MoveRepr> for Move {
    type Error = InvalidMoveRepr;

    fn try_from(repr: MoveRepr) -> Result<Self, Self::Error> {
        let primary = Step::new(repr.piece, repr.taken, repr.from, repr.to);

        match (repr.castle, repr.promotion) {
            (None, None) => Ok(Move::Simple(primary)),
            (Some(secondary), None) => Ok(Move::Compound { primary, secondary }),

            (None, Some((from, to))) => {
                if from != primary.piece || from.color() != to.color() {
                    Err(InvalidMoveRepr::PromotionMismatch)
                } else if !Role::PROMOTIONS.contains(&to.role()) {
                    Err(InvalidMoveRepr::PromotionRole(to.role()))
                } else {
                    Ok(Move::Promotion { primary, from, to })
                }
            }

            (Some(_), Some(_)) => Err(InvalidMoveRepr::CastlingPromotion),
        }
    }
}

impl From<Move> for MoveRepr {
    fn from(m: Move) -> Self {
        let primary = *m.primary();
        let (castle, promotion) = match m {
            Move::Simple(_) => (None, None),
            Move::Compound { secondary, .. } => (Some(secondary), None),
            Move::Promotion { from, to, .. } => (None, Some((from, to))),
        };

        MoveRepr {
            piece: primary.piece,
            taken: primary.captured,
            from: primary.whence,
            to: primary.whither,
            castle,
            promotion,
        }
    }
}
