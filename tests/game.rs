use lib::chess::{Color, Fen, Outcome, Role, Square};
use lib::game::{Game, GameError, InvalidMove, State};
use lib::player::{Human, PlayerConfig};
use lib::util::Build;
use std::convert::Infallible;
use test_strategy::proptest;

type Error = GameError<Infallible, Infallible>;

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn play(game: &mut Game<Human, Human>, whence: &str, whither: &str) -> Result<(), Error> {
    let piece = game.board().lookup(sq(whence)).unwrap();
    let m = game.as_move(piece.id(), sq(whither))?;
    game.make_move(m)
}

#[test]
fn humans_alternate_until_checkmate() -> Result<(), Error> {
    let mut game = Game::new(Human, Human);
    game.start()?;

    let moves = [
        ("e2", "e4"),
        ("e7", "e5"),
        ("f1", "c4"),
        ("b8", "c6"),
        ("d1", "h5"),
        ("g8", "f6"),
    ];

    for (turn, (whence, whither)) in moves.into_iter().enumerate() {
        assert_eq!(game.active_player(), Some(Color::ALL[turn % 2]));
        play(&mut game, whence, whither)?;
    }

    play(&mut game, "h5", "f7")?;

    assert_eq!(game.outcome(), Some(Outcome::Checkmate(Color::White)));
    assert_eq!(game.active_player(), None);
    assert_eq!(game.board().history().len(), 7);

    assert_eq!(
        play(&mut game, "e8", "f7"),
        Err(InvalidMove::GameHasEnded(Outcome::Checkmate(Color::White)).into())
    );

    Ok(())
}

#[test]
fn pawn_promotes_to_the_chosen_role() -> Result<(), Error> {
    let state: State = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse::<Fen>().unwrap().into();
    let mut game = Game::with_state(state, Human, Human);
    let pawn = game.board().lookup(sq("a7")).unwrap();

    let m = game.as_promotion(pawn.id(), sq("a8"), Role::Rook)?;
    game.make_move(m)?;

    let rook = game.board().lookup(sq("a8")).unwrap();
    assert_eq!(rook.role(), Role::Rook);
    assert_eq!(rook.color(), Color::White);
    assert_ne!(rook.id(), pawn.id());

    Ok(())
}

#[test]
fn saved_games_resume_where_they_left_off() -> Result<(), Error> {
    let mut game = Game::new(Human, Human);
    play(&mut game, "e2", "e4")?;
    play(&mut game, "e7", "e5")?;

    let saved = ron::ser::to_string(game.state()).unwrap();
    let restored: State = ron::de::from_str(&saved).unwrap();
    assert_eq!(&restored, game.state());

    let mut game = Game::with_state(restored, Human, Human);
    let pawn = game.board().lookup(sq("e4")).unwrap();
    assert!(game.as_move(pawn.id(), sq("e6")).is_err());

    play(&mut game, "g1", "f3")?;
    assert_eq!(game.turn(), Color::Black);

    Ok(())
}

#[proptest(cases = 8)]
fn random_player_replies_to_the_human(seed: u64) {
    let black = PlayerConfig::Seeded(seed).build()?;
    let mut game = Game::new(PlayerConfig::Human.build()?, black);
    game.start()?;

    let pawn = game.board().lookup(sq("d2")).unwrap();
    let m = game.as_move(pawn.id(), sq("d4"))?;
    game.make_move(m)?;

    assert_eq!(game.board().history().len(), 2);
    assert_eq!(game.board().history()[1].piece().color(), Color::Black);
    assert_eq!(game.active_player(), Some(Color::White));
}
