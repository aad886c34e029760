use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// A square address on the board, in terms of a file label and a rank label.
///
/// Labels are single ASCII characters. Adjacency never checks bounds,
/// whether a square exists is up to the [`Board`][`crate::chess::Board`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[derive(Deserialize, Serialize)]
#[display(fmt = "{}{}", "char::from(*file)", "char::from(*rank)")]
#[serde(into = "String", try_from = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Constructs a [`Square`] from a pair of labels.
    pub fn new(file: u8, rank: u8) -> Self {
        Square { file, rank }
    }

    /// This square's file label.
    pub fn file(&self) -> u8 {
        self.file
    }

    /// This square's rank label.
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// The square one rank above.
    pub fn up(&self) -> Self {
        Square::new(self.file, self.rank.wrapping_add(1))
    }

    /// The square one rank below.
    pub fn down(&self) -> Self {
        Square::new(self.file, self.rank.wrapping_sub(1))
    }

    /// The square one file to the left.
    pub fn left(&self) -> Self {
        Square::new(self.file.wrapping_sub(1), self.rank)
    }

    /// The square one file to the right.
    pub fn right(&self) -> Self {
        Square::new(self.file.wrapping_add(1), self.rank)
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "`{}` is not a square, expected <file><rank>", _0)]
pub struct ParseSquareError(#[error(not(source))] pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    #[instrument(level = "trace", err)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [file, rank] if file.is_ascii_graphic() && rank.is_ascii_graphic() => {
                Ok(Square::new(*file, *rank))
            }

            _ => Err(ParseSquareError(s.into())),
        }
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Square> for String {
    fn from(s: Square) -> Self {
        s.to_string()
    }
}

#[cfg(test)]
impl proptest::arbitrary::Arbitrary for Square {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;
        (b'a'..=b'h', b'1'..=b'8')
            .prop_map(|(f, r)| Square::new(f, r))
            .boxed()
    }
}
