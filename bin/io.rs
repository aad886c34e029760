use std::fmt::Display;
use std::io::{self, BufRead, BufReader, Lines, Read, Write};
use tracing::instrument;

/// A line-oriented terminal.
#[derive(Debug)]
pub struct Io<W: Write, R: Read> {
    writer: W,
    reader: Lines<BufReader<R>>,
}

impl<W: Write, R: Read> Io<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Io {
            writer,
            reader: BufReader::new(reader).lines(),
        }
    }

    /// Prints a line.
    #[instrument(level = "trace", skip(self, msg), err, fields(%msg))]
    pub fn send<T: Display>(&mut self, msg: T) -> io::Result<()> {
        writeln!(&mut self.writer, "{}", msg)
    }

    /// Prints a prompt and waits for the reply, if the input hasn't ended.
    #[instrument(level = "trace", skip(self, prompt), ret, err, fields(%prompt))]
    pub fn ask<T: Display>(&mut self, prompt: T) -> io::Result<Option<String>> {
        write!(&mut self.writer, "{}", prompt)?;
        self.writer.flush()?;
        self.reader.next().transpose()
    }
}
