use crate::chess::{Board, Color, Fen, Outcome, ParseFenError, San};
use crate::game::{InvalidMove, State};
use derive_more::{Display, Error};
use pgn_reader::{BufferedReader, RawComment, RawHeader, Skip, Visitor};
use shakmaty as sm;
use std::fmt::{self, Formatter};
use std::{mem::take, str::FromStr};
use tracing::instrument;

/// The record of a game of chess.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Pgn {
    pub white: String,
    pub black: String,
    /// The starting position, unless it's the standard one.
    pub setup: Option<Fen>,
    pub moves: Vec<San>,
    pub outcome: Option<Outcome>,
}

/// The reason why a [`State`] could not be recorded as [`Pgn`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Error)]
#[display(fmt = "only boards labeled a-h and 1-8 can be recorded")]
pub struct NonStandardBoard;

/// The reason why parsing [`Pgn`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParsePgnError {
    #[display(fmt = "failed to read the game")]
    Unreadable,

    #[display(fmt = "no game found")]
    Empty,

    #[display(fmt = "invalid starting position")]
    InvalidSetup(#[error(source)] ParseFenError),
}

/// Prints a simplified [PGN] description of the game.
///
/// [PGN]: https://www.chessprogramming.org/Portable_Game_Notation
impl fmt::Display for Pgn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "[White {:?}]", self.white)?;
        writeln!(f, "[Black {:?}]", self.black)?;

        let offset = match &self.setup {
            None => 0,
            Some(fen) => {
                writeln!(f, "[SetUp \"1\"]")?;
                writeln!(f, "[FEN \"{} - - 0 1\"]", fen)?;
                usize::from(fen.turn == Color::Black)
            }
        };

        for (i, san) in self.moves.iter().enumerate() {
            let ply = i + offset;
            if ply % 2 == 0 {
                write!(f, "{}. ", ply / 2 + 1)?;
            } else if i == 0 {
                write!(f, "{}... ", ply / 2 + 1)?;
            }

            write!(f, "{} ", san)?;
        }

        match self.outcome {
            None => write!(f, "*"),
            Some(Outcome::DrawByInsufficientMaterial) => {
                write!(f, "{{insufficient material}} 1/2-1/2")
            }
            Some(Outcome::Stalemate) => write!(f, "{{stalemate}} 1/2-1/2"),
            Some(Outcome::Checkmate(Color::Black)) => write!(f, "0-1"),
            Some(Outcome::Checkmate(Color::White)) => write!(f, "1-0"),
        }
    }
}

#[derive(Default)]
struct Reader {
    white: Option<String>,
    black: Option<String>,
    fen: Option<String>,
    moves: Vec<San>,
    comment: Option<String>,
    outcome: Option<sm::Outcome>,
}

impl Visitor for Reader {
    type Result = Reader;

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();

        match key {
            b"White" => self.white = Some(value),
            b"Black" => self.black = Some(value),
            b"FEN" => self.fen = Some(value),
            _ => {}
        }
    }

    fn san(&mut self, san_plus: sm::san::SanPlus) {
        self.moves.push(san_plus.san.into());
    }

    fn comment(&mut self, comment: RawComment<'_>) {
        let comment = String::from_utf8_lossy(comment.as_bytes());
        self.comment = Some(comment.trim().into());
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn outcome(&mut self, outcome: Option<sm::Outcome>) {
        self.outcome = outcome;
    }

    fn end_game(&mut self) -> Self::Result {
        take(self)
    }
}

impl FromStr for Pgn {
    type Err = ParsePgnError;

    #[instrument(level = "trace", err)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = BufferedReader::new_cursor(s.as_bytes());
        let game = reader
            .read_game(&mut Reader::default())
            .map_err(|_| ParsePgnError::Unreadable)?
            .ok_or(ParsePgnError::Empty)?;

        let setup = match game.fen.as_deref() {
            None => None,
            Some(fen) => Some(fen.parse::<Fen>().map_err(ParsePgnError::InvalidSetup)?),
        };

        // Draws are told apart by the comment that precedes the result.
        let outcome = match game.outcome {
            None => None,
            Some(sm::Outcome::Decisive { winner: sm::Color::White }) => {
                Some(Outcome::Checkmate(Color::White))
            }
            Some(sm::Outcome::Decisive { winner: sm::Color::Black }) => {
                Some(Outcome::Checkmate(Color::Black))
            }
            Some(sm::Outcome::Draw) => match game.comment.as_deref() {
                Some("insufficient material") => Some(Outcome::DrawByInsufficientMaterial),
                Some("stalemate") => Some(Outcome::Stalemate),
                _ => None,
            },
        };

        Ok(Pgn {
            white: game.white.unwrap_or_else(|| "?".into()),
            black: game.black.unwrap_or_else(|| "?".into()),
            setup,
            moves: game.moves,
            outcome,
        })
    }
}

impl TryFrom<&State> for Pgn {
    type Error = NonStandardBoard;

    /// Records the moves played so far, naming both players `?`.
    fn try_from(state: &State) -> Result<Self, Self::Error> {
        let standard = Board::default();
        let mut board = state.board().clone();
        if board.ranks() != standard.ranks() || board.files() != standard.files() {
            return Err(NonStandardBoard);
        }

        let history = board.history().to_vec();
        while board.undo().is_some() {}

        let mut turn = history.first().map_or(state.turn(), |m| m.piece().color());
        let setup = Fen {
            board: board.clone(),
            turn,
        };

        let setup = if setup == Fen::default() {
            None
        } else {
            Some(setup)
        };

        let mut moves = Vec::with_capacity(history.len());
        for m in history {
            let legal = board.legal_moves(turn);
            moves.push(San::from_move(&m, &legal).ok_or(NonStandardBoard)?);
            board.apply(m);
            turn = !turn;
        }

        Ok(Pgn {
            white: "?".into(),
            black: "?".into(),
            setup,
            moves,
            outcome: state.outcome(),
        })
    }
}

impl TryFrom<Pgn> for State {
    type Error = InvalidMove;

    /// Replays the recorded moves, the outcome follows from the moves alone.
    #[instrument(level = "debug", skip(pgn), err)]
    fn try_from(pgn: Pgn) -> Result<Self, Self::Error> {
        let mut state = pgn.setup.map_or_else(State::default, State::from);

        for san in &pgn.moves {
            let m = state.as_san(san)?;
            state.make_move(m)?;
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Role, Square};
    use test_strategy::proptest;

    const SCHOLARS_MATE: &str = "1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0";

    #[proptest]
    fn recording_a_game_preserves_it(s: State) {
        let pgn = Pgn::try_from(&s)?;
        assert_eq!(pgn.moves.len(), s.board().history().len());

        let parsed: Pgn = pgn.to_string().parse()?;
        assert_eq!(parsed, pgn);
        assert_eq!(State::try_from(parsed)?, s);
    }

    #[test]
    fn recorded_games_are_replayed() {
        let pgn: Pgn = SCHOLARS_MATE.parse().unwrap();
        assert_eq!(pgn.moves.len(), 7);
        assert_eq!(pgn.outcome, Some(Outcome::Checkmate(Color::White)));

        let state = State::try_from(pgn).unwrap();
        assert_eq!(state.outcome(), Some(Outcome::Checkmate(Color::White)));
        assert_eq!(state.board().history().len(), 7);
    }

    #[test]
    fn games_are_recorded_in_algebraic_notation() {
        let state = State::try_from(SCHOLARS_MATE.parse::<Pgn>().unwrap()).unwrap();
        let pgn = Pgn {
            white: "human".into(),
            black: "random".into(),
            ..Pgn::try_from(&state).unwrap()
        };

        assert_eq!(pgn.setup, None);
        assert_eq!(
            pgn.to_string(),
            "[White \"human\"]\n[Black \"random\"]\n\
             1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7 1-0"
        );
    }

    #[test]
    fn games_from_other_positions_record_their_setup() {
        let fen: Fen = "r3k3/8/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        let mut state = State::from(fen.clone());
        state.make_move(state.as_san(&"O-O-O".parse().unwrap()).unwrap()).unwrap();
        state.make_move(state.as_san(&"Ke2".parse().unwrap()).unwrap()).unwrap();

        let pgn = Pgn::try_from(&state).unwrap();
        assert_eq!(pgn.setup, Some(fen));
        assert_eq!(
            pgn.to_string(),
            "[White \"?\"]\n[Black \"?\"]\n[SetUp \"1\"]\n\
             [FEN \"r3k3/8/8/8/8/8/8/4K3 b - - 0 1\"]\n\
             1... O-O-O 2. Ke2 *"
        );

        assert_eq!(pgn.to_string().parse(), Ok(pgn.clone()));
        assert_eq!(State::try_from(pgn), Ok(state));
    }

    #[test]
    fn draws_keep_their_reason() {
        let pgn = Pgn {
            white: "?".into(),
            black: "?".into(),
            setup: Some("k7/8/1Q6/8/8/8/8/K7 b - - 0 1".parse().unwrap()),
            moves: Vec::new(),
            outcome: Some(Outcome::Stalemate),
        };

        assert!(pgn.to_string().ends_with("{stalemate} 1/2-1/2"));
        assert_eq!(pgn.to_string().parse(), Ok(pgn.clone()));
        assert_eq!(State::try_from(pgn).map(|s| s.outcome()), Ok(Some(Outcome::Stalemate)));
    }

    #[test]
    fn promotions_are_recorded_with_the_chosen_role() {
        let fen: Fen = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut state = State::from(fen);
        let pawn = state.board().lookup("a7".parse().unwrap()).unwrap();
        let m = state.as_promotion(pawn.id(), "a8".parse().unwrap(), Role::Knight).unwrap();
        state.make_move(m).unwrap();

        let pgn = Pgn::try_from(&state).unwrap();
        assert_eq!(pgn.moves, ["a8=N".parse::<San>().unwrap()]);
        assert_eq!(State::try_from(pgn), Ok(state));
    }

    #[test]
    fn comments_and_variations_are_skipped() {
        let pgn: Pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 *".parse().unwrap();
        let moves: Vec<_> = pgn.moves.iter().map(|san| san.to_string()).collect();
        assert_eq!(moves, ["e4", "e5", "Nf3"]);
        assert_eq!(pgn.outcome, None);
    }

    #[test]
    fn moves_that_do_not_fit_the_position_are_rejected() {
        let pgn: Pgn = "1. e4 e5 2. Ke3 *".parse().unwrap();
        let san: San = "Ke3".parse().unwrap();
        assert_eq!(State::try_from(pgn), Err(InvalidMove::Unresolvable(san)));
    }

    #[test]
    fn invalid_setups_are_rejected() {
        let pgn = "[SetUp \"1\"]\n[FEN \"8/8/8\"]\n*".parse::<Pgn>();
        assert!(matches!(pgn, Err(ParsePgnError::InvalidSetup(_))));
        assert_eq!("".parse::<Pgn>(), Err(ParsePgnError::Empty));
    }

    #[test]
    fn boards_with_other_labels_cannot_be_recorded() {
        let king = ("x1".parse::<Square>().unwrap(), Color::White, Role::King);
        let board = Board::new("123", "xyz", [king]).unwrap();
        assert_eq!(Pgn::try_from(&State::new(board, Color::White)), Err(NonStandardBoard));
    }
}
