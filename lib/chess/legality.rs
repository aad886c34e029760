use crate::chess::{Board, Color, Move, Role, Square, Step};
use std::ops::{Deref, DerefMut};
use tracing::instrument;

/// A [`Board`] with a move temporarily applied.
///
/// The move is undone when the simulation goes out of scope.
#[derive(Debug)]
pub(crate) struct Simulation<'a> {
    board: &'a mut Board,
    plies: usize,
}

impl Deref for Simulation<'_> {
    type Target = Board;

    fn deref(&self) -> &Self::Target {
        self.board
    }
}

impl DerefMut for Simulation<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.board
    }
}

impl Drop for Simulation<'_> {
    fn drop(&mut self) {
        debug_assert_eq!(self.board.history().len(), self.plies);
        self.board.undo();
    }
}

impl Board {
    /// Applies a move for as long as the returned [`Simulation`] lives.
    pub(crate) fn simulate(&mut self, m: Move) -> Simulation<'_> {
        self.apply(m);
        let plies = self.history().len();
        Simulation { board: self, plies }
    }

    /// Whether the king of this [`Color`] is under attack.
    ///
    /// Only the opponent's pseudo-legal moves are considered, so this never
    /// recurses into another legality pass.
    pub fn is_check(&self, c: Color) -> bool {
        self.pseudo_legal_moves(!c).iter().any(|m| {
            m.captured()
                .map_or(false, |p| p.role() == Role::King && p.color() == c)
        })
    }

    /// The legal moves of this [`Color`], in the order they are generated.
    #[instrument(level = "trace", skip(self))]
    pub fn legal_moves(&mut self, c: Color) -> Vec<Move> {
        let in_check = self.is_check(c);
        let candidates = self.pseudo_legal_moves(c);
        self.retain_legal(c, in_check, candidates)
    }

    /// The legal moves of the piece standing on a [`Square`].
    pub fn legal_moves_from(&mut self, whence: Square) -> Vec<Move> {
        match self.lookup(whence) {
            None => Vec::new(),
            Some(p) => {
                let in_check = self.is_check(p.color());
                let candidates = self.pseudo_legal_moves_from(whence);
                self.retain_legal(p.color(), in_check, candidates)
            }
        }
    }

    fn retain_legal(&mut self, c: Color, in_check: bool, candidates: Vec<Move>) -> Vec<Move> {
        candidates
            .into_iter()
            .filter(|m| self.is_legal(c, in_check, m))
            .collect()
    }

    fn is_legal(&mut self, c: Color, in_check: bool, m: &Move) -> bool {
        if let Some(rook) = m.secondary() {
            if in_check {
                return false;
            }

            let king = m.primary();
            let passing = Step::new(king.piece, None, king.whence, rook.whither);
            if self.simulate(Move::Simple(passing)).is_check(c) {
                return false;
            }
        }

        !self.simulate(m.clone()).is_check(c)
    }

    /// Counts the leaf nodes of the legal move tree up to some depth.
    ///
    /// See [perft](https://www.chessprogramming.org/Perft).
    #[instrument(level = "debug", skip(self))]
    pub fn perft(&mut self, c: Color, depth: usize) -> usize {
        match depth {
            0 => 1,
            1 => self.legal_moves(c).len(),
            _ => self
                .legal_moves(c)
                .into_iter()
                .map(|m| self.simulate(m).perft(!c, depth - 1))
                .sum(),
        }
    }

    /// The [perft](Self::perft) count under each legal move of this [`Color`].
    #[instrument(level = "debug", skip(self))]
    pub fn divide(&mut self, c: Color, depth: usize) -> Vec<(Move, usize)> {
        self.legal_moves(c)
            .into_iter()
            .map(|m| {
                let nodes = self.simulate(m.clone()).perft(!c, depth.saturating_sub(1));
                (m, nodes)
            })
            .collect()
    }
}
