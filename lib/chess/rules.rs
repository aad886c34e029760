use crate::chess::{Board, Color, Move, Piece, Role, Square, Step};

/// A single step in some direction.
type Direction = fn(&Square) -> Square;

const ORTHOGONAL: [Direction; 4] = [Square::up, Square::down, Square::left, Square::right];

const DIAGONAL: [Direction; 4] = [
    |s| s.up().left(),
    |s| s.up().right(),
    |s| s.down().left(),
    |s| s.down().right(),
];

const ADJACENT: [Direction; 8] = [
    Square::up,
    Square::down,
    Square::left,
    Square::right,
    |s| s.up().left(),
    |s| s.up().right(),
    |s| s.down().left(),
    |s| s.down().right(),
];

const KNIGHT: [Direction; 8] = [
    |s| s.up().up().left(),
    |s| s.up().up().right(),
    |s| s.down().down().left(),
    |s| s.down().down().right(),
    |s| s.left().left().up(),
    |s| s.right().right().up(),
    |s| s.left().left().down(),
    |s| s.right().right().down(),
];

impl Board {
    /// The pseudo-legal moves of every piece of this [`Color`].
    ///
    /// Pseudo-legal moves follow the movement rules of each piece,
    /// regardless of whether they leave the mover's own king in check.
    pub fn pseudo_legal_moves(&self, c: Color) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);

        for (whence, piece) in self.iter() {
            if piece.color() == c {
                generate(self, piece, whence, &mut moves);
            }
        }

        moves
    }

    /// The pseudo-legal moves of the piece standing on a [`Square`].
    pub fn pseudo_legal_moves_from(&self, whence: Square) -> Vec<Move> {
        let mut moves = Vec::new();

        if let Some(piece) = self.lookup(whence) {
            generate(self, piece, whence, &mut moves);
        }

        moves
    }
}

fn generate(board: &Board, piece: Piece, whence: Square, moves: &mut Vec<Move>) {
    match piece.role() {
        Role::Pawn => pawn(board, piece, whence, moves),
        Role::Knight => leap(board, piece, whence, &KNIGHT, moves),
        Role::Bishop => slide(board, piece, whence, &DIAGONAL, moves),
        Role::Rook => slide(board, piece, whence, &ORTHOGONAL, moves),
        Role::Queen => slide(board, piece, whence, &ADJACENT, moves),
        Role::King => {
            leap(board, piece, whence, &ADJACENT, moves);
            castles(board, piece, whence, moves);
        }
    }
}

/// Whether `piece` may end its move on `whither`, and what it would capture.
fn landing(board: &Board, piece: Piece, whither: Square) -> Option<Option<Piece>> {
    if !board.is_valid(whither) {
        return None;
    }

    match board.lookup(whither) {
        Some(occupant) if !occupant.is_enemy(&piece) => None,
        occupant => Some(occupant),
    }
}

fn slide(
    board: &Board,
    piece: Piece,
    whence: Square,
    directions: &[Direction],
    moves: &mut Vec<Move>,
) {
    for step in directions {
        let mut whither = step(&whence);

        while let Some(captured) = landing(board, piece, whither) {
            moves.push(Move::Simple(Step::new(piece, captured, whence, whither)));

            if captured.is_some() {
                break;
            }

            whither = step(&whither);
        }
    }
}

fn leap(board: &Board, piece: Piece, whence: Square, offsets: &[Direction], moves: &mut Vec<Move>) {
    for offset in offsets {
        let whither = offset(&whence);
        if let Some(captured) = landing(board, piece, whither) {
            moves.push(Move::Simple(Step::new(piece, captured, whence, whither)));
        }
    }
}

fn pawn(board: &Board, piece: Piece, whence: Square, moves: &mut Vec<Move>) {
    let color = piece.color();
    let forward: Direction = match color {
        Color::White => Square::up,
        Color::Black => Square::down,
    };

    let mut steps = Vec::with_capacity(4);

    let single = forward(&whence);
    if board.is_valid(single) && board.lookup(single).is_none() {
        steps.push(Step::new(piece, None, whence, single));

        let double = forward(&single);
        if board.home_rank(color) == Some(whence.rank())
            && !board.has_piece_moved(piece.id())
            && board.is_valid(double)
            && board.lookup(double).is_none()
        {
            steps.push(Step::new(piece, None, whence, double));
        }
    }

    for side in [Square::left, Square::right] {
        let target = side(&single);
        if let Some(Some(captured)) = landing(board, piece, target) {
            steps.push(Step::new(piece, Some(captured), whence, target));
        }
    }

    let last = board.last_rank(color);
    for step in steps {
        if Some(step.whither.rank()) != last {
            moves.push(Move::Simple(step));
            continue;
        }

        let id = board.next_piece_id();
        for role in Role::PROMOTIONS {
            moves.push(Move::Promotion {
                primary: step,
                from: piece,
                to: Piece::new(id, color, role),
            });
        }
    }
}

fn castles(board: &Board, king: Piece, whence: Square, moves: &mut Vec<Move>) {
    if board.has_piece_moved(king.id()) || board.back_rank(king.color()) != Some(whence.rank()) {
        return;
    }

    for side in [Square::left, Square::right] {
        let passed = side(&whence);
        let arrival = side(&passed);

        let mut cursor = passed;
        let mut distance = 1;

        while board.is_valid(cursor) {
            if let Some(rook) = board.lookup(cursor) {
                let eligible = distance >= 3
                    && rook.role() == Role::Rook
                    && rook.color() == king.color()
                    && !board.has_piece_moved(rook.id());

                if eligible {
                    moves.push(Move::Compound {
                        primary: Step::new(king, None, whence, arrival),
                        secondary: Step::new(rook, None, cursor, passed),
                    });
                }

                break;
            }

            cursor = side(&cursor);
            distance += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::Fen;
    use std::collections::HashSet;
    use test_strategy::proptest;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn destinations(board: &Board, whence: &str) -> HashSet<String> {
        board
            .pseudo_legal_moves_from(sq(whence))
            .iter()
            .map(|m| m.whither().to_string())
            .collect()
    }

    fn set(squares: &[&str]) -> HashSet<String> {
        squares.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn standard_position_has_twenty_pseudo_legal_moves() {
        let board = Board::default();
        assert_eq!(board.pseudo_legal_moves(Color::White).len(), 20);
        assert_eq!(board.pseudo_legal_moves(Color::Black).len(), 20);
    }

    #[test]
    fn unmoved_pawn_may_advance_one_or_two_squares() {
        let board = Board::default();
        assert_eq!(destinations(&board, "e2"), set(&["e3", "e4"]));
        assert_eq!(destinations(&board, "d7"), set(&["d6", "d5"]));
    }

    #[test]
    fn pawn_cannot_jump_over_a_blocker() {
        let Fen { board, .. } = "4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(destinations(&board, "e2"), set(&[]));
    }

    #[test]
    fn pawn_captures_diagonally_only_onto_enemies() {
        let Fen { board, .. } = "4k3/8/8/3p1N2/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(destinations(&board, "e4"), set(&["e5", "d5"]));
    }

    #[test]
    fn pawn_away_from_home_rank_advances_a_single_square() {
        let Fen { board, .. } = "4k3/8/8/8/8/4P3/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(destinations(&board, "e3"), set(&["e4"]));
    }

    #[test]
    fn pawn_reaching_the_last_rank_expands_into_promotions() {
        let Fen { board, .. } = "1n5k/P7/8/8/8/8/8/K7 w - - 0 1".parse().unwrap();
        let moves = board.pseudo_legal_moves_from(sq("a7"));

        let roles: Vec<_> = moves.iter().filter_map(|m| m.promotion()).map(|p| p.role()).collect();
        assert_eq!(roles, [Role::PROMOTIONS, Role::PROMOTIONS].concat());
        assert!(moves.iter().all(|m| m.promotion().map(|p| p.id()) == Some(board.next_piece_id())));
        assert_eq!(moves.iter().filter(|m| m.captured().is_some()).count(), 4);
    }

    #[test]
    fn sliding_pieces_stop_at_the_first_occupied_square() {
        let Fen { board, .. } = "4k3/8/8/8/1p6/8/1R1P4/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(destinations(&board, "b2"), set(&["b1", "a2", "c2", "b3", "b4"]));
    }

    #[test]
    fn bishop_walks_diagonals() {
        let Fen { board, .. } = "4k3/8/8/8/8/8/8/B3K3 w - - 0 1".parse().unwrap();
        let expected = set(&["b2", "c3", "d4", "e5", "f6", "g7", "h8"]);
        assert_eq!(destinations(&board, "a1"), expected);
    }

    #[test]
    fn knight_leaps_over_pieces() {
        let board = Board::default();
        assert_eq!(destinations(&board, "g1"), set(&["f3", "h3"]));
    }

    #[test]
    fn queen_combines_rook_and_bishop() {
        let Fen { board, .. } = "4k3/8/8/8/3Q4/8/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(board.pseudo_legal_moves_from(sq("d4")).len(), 27);
    }

    #[test]
    fn king_may_castle_on_both_sides() {
        let Fen { board, .. } = "4k3/8/8/8/8/8/8/R3K2R w - - 0 1".parse().unwrap();
        let castles: Vec<_> = board
            .pseudo_legal_moves_from(sq("e1"))
            .into_iter()
            .filter_map(|m| Some((m.whither(), *m.secondary()?)))
            .map(|(k, r)| (k.to_string(), r.whence.to_string(), r.whither.to_string()))
            .collect();

        assert_eq!(castles.len(), 2);
        assert!(castles.contains(&("c1".into(), "a1".into(), "d1".into())));
        assert!(castles.contains(&("g1".into(), "h1".into(), "f1".into())));
    }

    #[test]
    fn king_cannot_castle_through_pieces() {
        let Fen { board, .. } = "4k3/8/8/8/8/8/8/RN2K1NR w - - 0 1".parse().unwrap();
        let castles = board.pseudo_legal_moves_from(sq("e1"));
        assert!(castles.iter().all(|m| m.secondary().is_none()));
    }

    #[test]
    fn king_cannot_castle_with_a_moved_rook() {
        let Fen { mut board, .. } = "4k3/8/8/8/8/8/8/4K2R w - - 0 1".parse().unwrap();
        let rook = board.lookup(sq("h1")).unwrap();

        board.apply(Move::Simple(Step::new(rook, None, sq("h1"), sq("h2"))));
        board.apply(Move::Simple(Step::new(rook, None, sq("h2"), sq("h1"))));

        let castles = board.pseudo_legal_moves_from(sq("e1"));
        assert!(castles.iter().all(|m| m.secondary().is_none()));
    }

    #[test]
    fn king_away_from_its_back_rank_cannot_castle() {
        let Fen { board, .. } = "4k3/8/8/8/R3K2R/8/8/8 w - - 0 1".parse().unwrap();
        let castles = board.pseudo_legal_moves_from(sq("e4"));
        assert!(castles.iter().all(|m| m.secondary().is_none()));
    }

    #[proptest]
    fn pseudo_legal_moves_never_capture_own_pieces(board: Board, c: Color) {
        for m in board.pseudo_legal_moves(c) {
            assert_eq!(m.piece().color(), c);
            assert!(board.is_valid(m.whither()));
            assert!(m.captured().map_or(true, |p| p.color() != c));
        }
    }
}
