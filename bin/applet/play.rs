use crate::io::Io;
use anyhow::{Context, Error as Anyhow};
use clap::{Parser, Subcommand};
use lib::chess::{Fen, PieceId, Role, San, Square};
use lib::game::{Game, GameError, Pgn, State};
use lib::player::{Player, PlayerConfig};
use lib::util::Build;
use ron::ser::PrettyConfig;
use std::convert::Infallible;
use std::io::{stdin, stdout};
use std::{fs, path::PathBuf};
use tracing::{info, instrument};

/// Plays a game of chess in the terminal.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Play {
    /// The player with the white pieces.
    #[clap(short, long, default_value_t = PlayerConfig::Human)]
    white: PlayerConfig,

    /// The player with the black pieces.
    #[clap(short, long, default_value_t = PlayerConfig::Random)]
    black: PlayerConfig,

    /// The starting position in FEN notation.
    #[clap(long, conflicts_with_all = ["load", "pgn"])]
    fen: Option<Fen>,

    /// A game previously saved.
    #[clap(long, conflicts_with = "pgn")]
    load: Option<PathBuf>,

    /// A game recorded in PGN, replayed up to its last move.
    #[clap(long)]
    pgn: Option<PathBuf>,
}

impl Default for Play {
    fn default() -> Self {
        Play {
            white: PlayerConfig::Human,
            black: PlayerConfig::Random,
            fen: None,
            load: None,
            pgn: None,
        }
    }
}

/// A line typed while it's a human's turn.
#[derive(Debug, Parser)]
#[clap(multicall = true)]
struct Prompt {
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Moves the piece on a square, optionally promoting it to <ROLE>.
    Move {
        whence: Square,
        whither: Square,
        role: Option<Role>,
    },

    /// Plays a move written in algebraic notation, e.g. `Nf3` or `O-O`.
    San { san: San },

    /// Lists the legal moves, optionally only those of the piece on a square.
    Moves { square: Option<Square> },

    /// Prints the board.
    Board,

    /// Saves the game.
    Save { path: PathBuf },

    /// Prints the game in PGN, or writes it to a file.
    Pgn { path: Option<PathBuf> },

    /// Quits the game.
    Exit,
}

impl Play {
    #[instrument(level = "trace", skip(self), err)]
    pub fn execute(self) -> Result<(), Anyhow> {
        let state = match (self.fen, self.load, self.pgn) {
            (Some(fen), _, _) => State::from(fen),
            (None, Some(path), _) => {
                let saved = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                ron::de::from_str(&saved).context("failed to load the saved game")?
            }
            (None, None, Some(path)) => {
                let recorded = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
                let pgn: Pgn = recorded.parse().context("failed to parse the recorded game")?;
                State::try_from(pgn).context("failed to replay the recorded game")?
            }
            (None, None, None) => State::default(),
        };

        info!(white = %self.white, black = %self.black);
        let names = (self.white.to_string(), self.black.to_string());

        let white = self.white.build()?;
        let black = self.black.build()?;
        let mut game = Game::with_state(state, white, black);
        let mut io = Io::new(stdout(), stdin());

        game.start()?;
        io.send(game.board())?;

        while let Some(turn) = game.active_player() {
            let line = match io.ask(format!("{} > ", turn))? {
                None => return Ok(()),
                Some(line) => line,
            };

            let cmd = match Prompt::try_parse_from(line.split_whitespace()) {
                Ok(p) => p.cmd,
                Err(e) => {
                    io.send(e)?;
                    continue;
                }
            };

            match cmd {
                Cmd::Exit => return Ok(()),
                Cmd::Board => io.send(game.board())?,

                Cmd::Moves { square } => {
                    let moves: Vec<_> = game
                        .legal_moves()
                        .iter()
                        .filter(|m| square.map_or(true, |s| m.whence() == s))
                        .map(|m| m.to_string())
                        .collect();

                    io.send(moves.join(" "))?;
                }

                Cmd::Pgn { path } => match Pgn::try_from(game.state()) {
                    Err(e) => io.send(e)?,
                    Ok(pgn) => {
                        let (white, black) = names.clone();
                        let pgn = Pgn { white, black, ..pgn };

                        match path {
                            None => io.send(pgn)?,
                            Some(path) => fs::write(&path, pgn.to_string())
                                .with_context(|| format!("failed to write `{}`", path.display()))?,
                        }
                    }
                },

                Cmd::San { san } => match game.as_san(&san) {
                    Err(e) => io.send(e)?,
                    Ok(m) => match game.make_move(m) {
                        Err(GameError::Invalid(e)) => io.send(e)?,
                        Err(e) => return Err(e.into()),
                        Ok(()) => io.send(game.board())?,
                    },
                },

                Cmd::Save { path } => {
                    let saved = ron::ser::to_string_pretty(game.state(), PrettyConfig::default())?;
                    fs::write(&path, saved)
                        .with_context(|| format!("failed to write `{}`", path.display()))?;
                }

                Cmd::Move { whence, whither, role } => match game.board().lookup(whence) {
                    None => io.send(format!("there is no piece on `{}`", whence))?,
                    Some(p) => match submit(&mut game, p.id(), whither, role) {
                        Err(GameError::Invalid(e)) => io.send(e)?,
                        Err(e) => return Err(e.into()),
                        Ok(()) => io.send(game.board())?,
                    },
                },
            }
        }

        if let Some(o) = game.outcome() {
            io.send(o)?;
        }

        Ok(())
    }
}

fn submit(
    game: &mut Game<Player, Player>,
    piece: PieceId,
    whither: Square,
    role: Option<Role>,
) -> Result<(), GameError<Infallible, Infallible>> {
    let m = match role {
        None => game.as_move(piece, whither)?,
        Some(r) => game.as_promotion(piece, whither, r)?,
    };

    game.make_move(m)
}
