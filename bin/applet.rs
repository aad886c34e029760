use anyhow::Error as Anyhow;
use clap::Subcommand;
use derive_more::From;

mod perft;
mod play;

#[derive(From, Subcommand)]
pub enum Applet {
    Play(play::Play),
    Perft(perft::Perft),
}

impl Default for Applet {
    fn default() -> Self {
        play::Play::default().into()
    }
}

impl Applet {
    pub fn execute(self) -> Result<(), Anyhow> {
        match self {
            Applet::Play(a) => a.execute(),
            Applet::Perft(a) => a.execute(),
        }
    }
}
