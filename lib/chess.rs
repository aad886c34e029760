mod board;
mod color;
mod fen;
mod legality;
mod r#move;
mod outcome;
mod piece;
mod role;
mod rules;
mod san;
mod square;

pub use board::*;
pub use color::*;
pub use fen::*;
pub use legality::*;
pub use outcome::*;
pub use piece::*;
pub use r#move::*;
pub use role::*;
pub use san::*;
pub use square::*;
