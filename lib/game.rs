use crate::chess::{Color, Move};
use crate::player::Play;
use derive_more::{Deref, Display, Error, From};
use tracing::{instrument, warn};

mod pgn;
mod state;

pub use pgn::*;
pub use state::*;

/// The reason why the [`Game`] could not proceed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
pub enum GameError<W, B> {
    #[display(fmt = "{}", _0)]
    Invalid(InvalidMove),

    #[display(fmt = "the white player encountered an error")]
    #[from(ignore)]
    White(W),

    #[display(fmt = "the black player encountered an error")]
    #[from(ignore)]
    Black(B),
}

/// A game of chess between two players.
///
/// Whenever it's their turn, the active player is asked to decide a move,
/// until either the game ends or the player defers the decision.
#[derive(Debug, Deref)]
pub struct Game<W, B> {
    #[deref]
    state: State,
    white: W,
    black: B,
}

impl<W: Play, B: Play> Game<W, B> {
    /// A game from the standard starting position.
    pub fn new(white: W, black: B) -> Self {
        Game::with_state(State::default(), white, black)
    }

    /// A game resumed from some [`State`].
    pub fn with_state(state: State, white: W, black: B) -> Self {
        Game { state, white, black }
    }

    /// The current [`State`].
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The side expected to decide the next move, unless the game has ended.
    pub fn active_player(&self) -> Option<Color> {
        match self.state.outcome() {
            None => Some(self.state.turn()),
            Some(_) => None,
        }
    }

    /// Hands control to the active player for the first time.
    ///
    /// This is a no-op if the game has already ended.
    #[instrument(level = "debug", skip(self), err)]
    pub fn start(&mut self) -> Result<(), GameError<W::Error, B::Error>> {
        self.proceed()
    }

    /// Plays a move on behalf of the active player and hands control over.
    #[instrument(level = "debug", skip(self), fields(%m), err)]
    pub fn make_move(&mut self, m: Move) -> Result<(), GameError<W::Error, B::Error>> {
        self.state.make_move(m)?;
        self.proceed()
    }

    fn proceed(&mut self) -> Result<(), GameError<W::Error, B::Error>> {
        while self.state.outcome().is_none() {
            let decision = match self.state.turn() {
                Color::White => self.white.play(&self.state).map_err(GameError::White)?,
                Color::Black => self.black.play(&self.state).map_err(GameError::Black)?,
            };

            match decision {
                None => break,
                Some(m) => {
                    if let Err(e) = self.state.make_move(m) {
                        warn!(player = %self.state.turn(), "{}", e);
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(())
    }
}
