use crate::chess::{Color, Role};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

/// The stable identity of a [`Piece`].
///
/// Identities are assigned when pieces are placed on a [`Board`][`crate::chess::Board`]
/// and never recomputed from where the piece stands.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, From)]
#[derive(Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "#{}", _0)]
#[serde(transparent)]
pub struct PieceId(pub u16);

/// A chess [piece][`Role`] of a certain [`Color`] with a stable identity.
///
/// Pieces are immutable, moving a piece only changes which square holds it.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display(fmt = "{}", "self.glyph()")]
#[serde(into = "(char, PieceId)", try_from = "(char, PieceId)")]
pub struct Piece {
    id: PieceId,
    color: Color,
    role: Role,
}

impl Piece {
    /// Constructs a [`Piece`] with the given identity.
    pub fn new(id: PieceId, color: Color, role: Role) -> Self {
        Piece { id, color, role }
    }

    /// This piece's identity.
    pub fn id(&self) -> PieceId {
        self.id
    }

    /// This piece's [`Color`].
    pub fn color(&self) -> Color {
        self.color
    }

    /// This piece's [`Role`].
    pub fn role(&self) -> Role {
        self.role
    }

    /// The display glyph, derived from [`Role`] and [`Color`].
    pub fn glyph(&self) -> char {
        self.role.glyphs()[self.color.index()]
    }

    /// Whether `other` belongs to the opposite side.
    pub fn is_enemy(&self, other: &Piece) -> bool {
        self.color != other.color
    }
}

/// The reason why a [`Piece`] could not be decoded from its glyph.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "`{}` is not a chess piece glyph", _0)]
pub struct ParsePieceError(#[error(not(source))] pub char);

impl TryFrom<(char, PieceId)> for Piece {
    type Error = ParsePieceError;

    fn try_from((glyph, id): (char, PieceId)) -> Result<Self, Self::Error> {
        for role in Role::ALL {
            for color in Color::ALL {
                if role.glyphs()[color.index()] == glyph {
                    return Ok(Piece::new(id, color, role));
                }
            }
        }

        Err(ParsePieceError(glyph))
    }
}

impl From<Piece> for (char, PieceId) {
    fn from(p: Piece) -> Self {
        (p.glyph(), p.id())
    }
}
