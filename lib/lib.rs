/// Chess domain types and rules.
pub mod chess;
/// The turn-driven game state machine.
pub mod game;
/// Move-decision providers.
pub mod player;
/// Assorted utilities.
pub mod util;
