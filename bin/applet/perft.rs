use anyhow::Error as Anyhow;
use clap::Parser;
use lib::chess::Fen;
use std::time::Instant;
use tracing::{info, instrument};

/// Counts the leaf nodes of the legal move tree.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Perft {
    /// How many plies deep to count.
    depth: usize,

    /// The position in FEN notation, the standard starting position by default.
    #[clap(long)]
    fen: Option<Fen>,
}

impl Perft {
    #[instrument(level = "trace", skip(self), err)]
    pub fn execute(self) -> Result<(), Anyhow> {
        let Fen { mut board, turn } = self.fen.unwrap_or_default();
        let timer = Instant::now();

        let nodes = match self.depth {
            0 => 1,
            depth => {
                let mut nodes = 0;
                for (m, n) in board.divide(turn, depth) {
                    println!("{}: {}", m, n);
                    nodes += n;
                }

                nodes
            }
        };

        println!("\n{}", nodes);
        info!(nodes, elapsed = ?timer.elapsed());

        Ok(())
    }
}
