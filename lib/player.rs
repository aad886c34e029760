use crate::chess::Move;
use crate::game::State;
use crate::util::Build;
use derive_more::{Display, Error, From};
use rand::rngs::StdRng;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{self, Formatter};
use std::str::FromStr;
use tracing::instrument;

/// Trait for types that decide which move to play.
#[cfg_attr(test, mockall::automock(type Error = String;))]
pub trait Play {
    /// The reason why a move could not be decided.
    type Error;

    /// Decides the next [`Move`] for the side to move.
    ///
    /// Returning `None` defers the decision, the move is then expected to be
    /// submitted later through [`Game::make_move`][`crate::game::Game::make_move`].
    fn play(&mut self, state: &State) -> Result<Option<Move>, Self::Error>;
}

/// A player whose moves are submitted from outside, e.g. by a human.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Human;

impl Play for Human {
    type Error = Infallible;

    fn play(&mut self, _: &State) -> Result<Option<Move>, Self::Error> {
        Ok(None)
    }
}

/// A player that picks uniformly among the legal moves.
#[derive(Debug, Clone)]
pub struct Random<R: Rng = StdRng> {
    rng: R,
}

impl<R: Rng> Random<R> {
    /// Constructs a [`Random`] player drawing from some source of randomness.
    pub fn new(rng: R) -> Self {
        Random { rng }
    }
}

impl<R: Rng> Play for Random<R> {
    type Error = Infallible;

    #[instrument(level = "trace", skip(self, state), ret)]
    fn play(&mut self, state: &State) -> Result<Option<Move>, Self::Error> {
        Ok(state.legal_moves().choose(&mut self.rng).cloned())
    }
}

/// A generic player.
#[derive(Debug, From)]
pub enum Player {
    Human(Human),
    Random(Random),
}

impl Play for Player {
    type Error = Infallible;

    fn play(&mut self, state: &State) -> Result<Option<Move>, Self::Error> {
        match self {
            Player::Human(p) => p.play(state),
            Player::Random(p) => p.play(state),
        }
    }
}

/// The reason why parsing [`PlayerConfig`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse player configuration")]
pub struct ParsePlayerConfigError(ron::de::SpannedError);

/// Runtime configuration for a [`Player`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum PlayerConfig {
    Human,
    Random,
    Seeded(u64),
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig::Human
    }
}

impl fmt::Display for PlayerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&ron::ser::to_string(self).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for PlayerConfig {
    type Err = ParsePlayerConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

impl Build for PlayerConfig {
    type Output = Player;
    type Error = Infallible;

    fn build(self) -> Result<Self::Output, Self::Error> {
        match self {
            PlayerConfig::Human => Ok(Human.into()),
            PlayerConfig::Random => Ok(Random::new(StdRng::from_entropy()).into()),
            PlayerConfig::Seeded(seed) => Ok(Random::new(StdRng::seed_from_u64(seed)).into()),
        }
    }
}
