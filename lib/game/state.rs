use crate::chess::{Board, Color, Fen, Move, Outcome, PieceId, Role, San, Square};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// The reason why a move was rejected.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum InvalidMove {
    #[display(fmt = "the game has already ended in a {}", _0)]
    GameHasEnded(#[error(not(source))] Outcome),

    #[display(fmt = "it's not the {} player's turn", _0)]
    TurnOfTheOpponent(#[error(not(source))] Color),

    #[display(fmt = "move `{}` is illegal in this position", _0)]
    IllegalMove(#[error(not(source))] Move),

    #[display(fmt = "piece `{}` cannot move to `{}`", _0, _1)]
    Unreachable(PieceId, Square),

    #[display(fmt = "`{}` does not describe exactly one legal move", _0)]
    Unresolvable(#[error(not(source))] San),
}

/// The board, the side to move and the result of a game of chess.
///
/// The legal moves of the side to move are cached and recomputed after
/// every move, once an [`Outcome`] is reached no more moves are accepted.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(from = "Snapshot", into = "Snapshot")]
pub struct State {
    board: Board,
    turn: Color,
    outcome: Option<Outcome>,
    moves: Vec<Move>,
}

impl Default for State {
    fn default() -> Self {
        State::new(Board::default(), Color::White)
    }
}

impl From<Fen> for State {
    fn from(fen: Fen) -> Self {
        State::new(fen.board, fen.turn)
    }
}

impl State {
    /// Resumes a game from some [`Board`] with this [`Color`] to move.
    pub fn new(board: Board, turn: Color) -> Self {
        let mut state = State {
            board,
            turn,
            outcome: None,
            moves: Vec::new(),
        };

        state.settle();
        state
    }

    /// The current [`Board`].
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// The result of the game, if it has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.board.is_check(self.turn)
    }

    /// The legal moves of the side to move, none once the game has ended.
    pub fn legal_moves(&self) -> &[Move] {
        &self.moves
    }

    /// The legal moves of the piece standing on a [`Square`].
    pub fn legal_moves_from(&self, whence: Square) -> impl Iterator<Item = &Move> {
        self.moves.iter().filter(move |m| m.whence() == whence)
    }

    /// The legal move of a piece to some [`Square`].
    ///
    /// Promotions resolve to the first choice in [`Role::PROMOTIONS`].
    pub fn as_move(&self, piece: PieceId, whither: Square) -> Result<Move, InvalidMove> {
        self.find(piece, whither, |_| true)
    }

    /// The legal promotion of a pawn to some [`Role`] on a [`Square`].
    pub fn as_promotion(
        &self,
        piece: PieceId,
        whither: Square,
        role: Role,
    ) -> Result<Move, InvalidMove> {
        self.find(piece, whither, |m| m.promotion().map(|p| p.role()) == Some(role))
    }

    /// The legal move described in [`San`].
    pub fn as_san(&self, san: &San) -> Result<Move, InvalidMove> {
        if let Some(o) = self.outcome {
            return Err(InvalidMove::GameHasEnded(o));
        }

        san.resolve(&self.moves)
            .cloned()
            .ok_or_else(|| InvalidMove::Unresolvable(san.clone()))
    }

    fn find<F>(&self, piece: PieceId, whither: Square, f: F) -> Result<Move, InvalidMove>
    where
        F: Fn(&Move) -> bool,
    {
        if let Some(o) = self.outcome {
            return Err(InvalidMove::GameHasEnded(o));
        }

        self.moves
            .iter()
            .find(|m| m.piece().id() == piece && m.whither() == whither && f(m))
            .cloned()
            .ok_or(InvalidMove::Unreachable(piece, whither))
    }

    /// Plays a move and hands the turn over to the opponent.
    ///
    /// Rejected moves leave the state untouched.
    #[instrument(level = "debug", skip(self), fields(%m), err)]
    pub(crate) fn make_move(&mut self, m: Move) -> Result<(), InvalidMove> {
        if let Some(o) = self.outcome {
            return Err(InvalidMove::GameHasEnded(o));
        }

        if m.piece().color() != self.turn {
            return Err(InvalidMove::TurnOfTheOpponent(m.piece().color()));
        }

        if !self.moves.contains(&m) {
            return Err(InvalidMove::IllegalMove(m));
        }

        debug!(player = %self.turn, %m, "applying move");

        self.board.apply(m);
        self.turn = !self.turn;
        self.settle();

        Ok(())
    }

    fn settle(&mut self) {
        self.moves.clear();

        if self.board.iter().all(|(_, p)| p.role() == Role::King) {
            self.outcome = Some(Outcome::DrawByInsufficientMaterial);
        } else {
            self.moves = self.board.legal_moves(self.turn);
            if self.moves.is_empty() {
                self.outcome = if self.board.is_check(self.turn) {
                    Some(Outcome::Checkmate(!self.turn))
                } else {
                    Some(Outcome::Stalemate)
                };
            }
        }

        if let Some(o) = self.outcome {
            info!(outcome = %o, "the game has ended");
        }
    }
}

#[derive(Deserialize, Serialize)]
struct Snapshot {
    board: Board,
    turn: Color,
}

impl From<Snapshot> for State {
    fn from(s: Snapshot) -> Self {
        State::new(s.board, s.turn)
    }
}

impl From<State> for Snapshot {
    fn from(s: State) -> Self {
        Snapshot {
            board: s.board,
            turn: s.turn,
        }
    }
}

#[cfg(test)]
impl proptest::arbitrary::Arbitrary for State {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        use proptest::{prelude::*, sample::Selector};

        (0..64usize, any::<Selector>())
            .prop_map(|(plies, selector)| {
                let mut state = State::default();

                for _ in 0..plies {
                    match selector.try_select(state.legal_moves().to_vec()) {
                        Some(m) => state.make_move(m).ok(),
                        None => break,
                    };
                }

                state
            })
            .no_shrink()
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::sample::Selector;
    use test_strategy::proptest;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(state: &mut State, whence: &str, whither: &str) {
        let piece = state.board().lookup(sq(whence)).unwrap();
        let m = state.as_move(piece.id(), sq(whither)).unwrap();
        state.make_move(m).unwrap();
    }

    fn fen(s: &str) -> State {
        s.parse::<Fen>().unwrap().into()
    }

    #[test]
    fn game_starts_from_the_standard_position() {
        let state = State::default();
        assert_eq!(state.turn(), Color::White);
        assert_eq!(state.outcome(), None);
        assert_eq!(state.legal_moves().len(), 20);
    }

    #[test]
    fn pawn_loses_its_double_step_once_it_moves() {
        let mut state = State::default();
        let pawn = state.board().lookup(sq("e2")).unwrap();

        let whither: Vec<_> = state.legal_moves_from(sq("e2")).map(|m| m.whither()).collect();
        assert_eq!(whither, [sq("e3"), sq("e4")]);

        play(&mut state, "e2", "e4");
        play(&mut state, "a7", "a6");

        let whither: Vec<_> = state.legal_moves_from(sq("e4")).map(|m| m.whither()).collect();
        assert_eq!(whither, [sq("e5")]);
        assert_eq!(state.board().lookup(sq("e4")), Some(pawn));
    }

    #[test]
    fn castling_moves_king_and_rook_in_a_single_entry() {
        let mut state = fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let king = state.board().lookup(sq("e1")).unwrap();
        let rook = state.board().lookup(sq("h1")).unwrap();

        let m = state.as_move(king.id(), sq("g1")).unwrap();
        assert_eq!(m.secondary().map(|s| s.piece), Some(rook));

        state.make_move(m.clone()).unwrap();
        assert_eq!(state.board().lookup(sq("g1")), Some(king));
        assert_eq!(state.board().lookup(sq("f1")), Some(rook));
        assert_eq!(state.board().history(), [m]);
    }

    #[test]
    fn promotion_choice_can_be_disambiguated() {
        let state = fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let pawn = state.board().lookup(sq("a7")).unwrap();

        let queen = state.as_move(pawn.id(), sq("a8")).unwrap();
        assert_eq!(queen.promotion().map(|p| p.role()), Some(Role::Queen));

        let knight = state.as_promotion(pawn.id(), sq("a8"), Role::Knight).unwrap();
        assert_eq!(knight.promotion().map(|p| p.role()), Some(Role::Knight));

        assert_eq!(
            state.as_promotion(pawn.id(), sq("a8"), Role::King),
            Err(InvalidMove::Unreachable(pawn.id(), sq("a8")))
        );
    }

    #[test]
    fn moves_can_be_described_in_algebraic_notation() {
        let mut state = State::default();
        let knight = state.board().lookup(sq("g1")).unwrap();

        let m = state.as_san(&"Nf3".parse().unwrap()).unwrap();
        assert_eq!(m, state.as_move(knight.id(), sq("f3")).unwrap());
        state.make_move(m).unwrap();

        let san = "Nf3".parse().unwrap();
        assert_eq!(state.as_san(&san), Err(InvalidMove::Unresolvable(san)));
    }

    #[test]
    fn capturing_down_to_two_kings_is_a_draw() {
        let mut state = fen("4k3/8/8/8/8/8/3q4/4K3 w - - 0 1");
        play(&mut state, "e1", "d2");

        assert_eq!(state.outcome(), Some(Outcome::DrawByInsufficientMaterial));
        assert!(state.legal_moves().is_empty());
    }

    #[test]
    fn fools_mate_is_a_checkmate_by_black() {
        let mut state = State::default();
        play(&mut state, "f2", "f3");
        play(&mut state, "e7", "e5");
        play(&mut state, "g2", "g4");
        play(&mut state, "d8", "h4");

        assert!(state.is_check());
        assert_eq!(state.outcome(), Some(Outcome::Checkmate(Color::Black)));
        assert_eq!(state.outcome().and_then(|o| o.winner()), Some(Color::Black));
    }

    #[test]
    fn side_with_no_moves_out_of_check_is_stalemated() {
        let state = fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1");
        assert!(!state.is_check());
        assert_eq!(state.outcome(), Some(Outcome::Stalemate));
    }

    #[test]
    fn check_that_can_be_resolved_is_not_the_end() {
        let state = fen("4k3/8/8/8/8/3n4/8/R3K3 w - - 0 1");
        assert!(state.is_check());
        assert_eq!(state.outcome(), None);
        assert!(!state.legal_moves().is_empty());
    }

    #[test]
    fn moving_opponent_pieces_is_rejected() {
        let mut state = State::default();
        let pawn = state.board().lookup(sq("e7")).unwrap();
        let m = Move::Simple(crate::chess::Step::new(pawn, None, sq("e7"), sq("e5")));

        assert_eq!(
            state.make_move(m),
            Err(InvalidMove::TurnOfTheOpponent(Color::Black))
        );

        assert_eq!(state, State::default());
    }

    #[test]
    fn pseudo_legal_moves_are_rejected() {
        let mut state = fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1");
        let before = state.clone();
        let bishop = state.board().lookup(sq("e2")).unwrap();
        let m = Move::Simple(crate::chess::Step::new(bishop, None, sq("e2"), sq("d3")));

        assert_eq!(state.make_move(m.clone()), Err(InvalidMove::IllegalMove(m)));
        assert_eq!(state, before);
    }

    #[proptest]
    fn make_move_flips_the_turn(#[filter(#s.outcome().is_none())] s: State, selector: Selector) {
        let mut s = s;
        let turn = s.turn();
        let m = selector.select(s.legal_moves()).clone();

        s.make_move(m)?;
        assert_eq!(s.turn(), !turn);
    }

    #[test]
    fn ended_games_reject_every_move() {
        let mut state = fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1");
        let before = state.clone();
        let outcome = Outcome::Stalemate;

        for c in Color::ALL {
            for m in state.board.clone().pseudo_legal_moves(c) {
                assert_eq!(state.make_move(m), Err(InvalidMove::GameHasEnded(outcome)));
            }
        }

        assert_eq!(state, before);
    }

    #[test]
    fn restoring_a_game_without_identities_left_fails() {
        let ron = r#"(
            board: (
                ranks: "12345678",
                files: "abcdefgh",
                pieces: [("a7", ('♙', 65535)), ("e1", ('♔', 0)), ("e8", ('♚', 1))],
                history: [],
            ),
            turn: white,
        )"#;

        assert!(ron::de::from_str::<State>(ron).is_err());
    }

    #[proptest]
    fn persisting_a_game_preserves_it(s: State) {
        let restored: State = ron::de::from_str(&ron::ser::to_string(&s)?)?;
        assert_eq!(restored, s);
    }
}
