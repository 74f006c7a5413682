use std::io::{self, BufRead, Write};

/// Line-oriented request/response surface the session talks to
pub(crate) trait Terminal {
    /// Writes `message` without a line break and reads one line of input.
    /// Returns `None` once the input is closed.
    fn prompt_line(&mut self, message: &str) -> io::Result<Option<String>>;

    fn emit_line(&mut self, message: &str) -> io::Result<()>;
}

impl<T: Terminal + ?Sized> Terminal for &mut T {
    fn prompt_line(&mut self, message: &str) -> io::Result<Option<String>> {
        (**self).prompt_line(message)
    }

    fn emit_line(&mut self, message: &str) -> io::Result<()> {
        (**self).emit_line(message)
    }
}

/// [`Terminal`] over any reader and writer pair
pub(crate) struct ConsoleTerminal<R, W> {
    input: R,
    output: W,
}

impl ConsoleTerminal<io::StdinLock<'static>, io::Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleTerminal<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &W {
        &self.output
    }
}

impl<R: BufRead, W: Write> Terminal for ConsoleTerminal<R, W> {
    fn prompt_line(&mut self, message: &str) -> io::Result<Option<String>> {
        self.output.write_all(message.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn emit_line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()
    }
}
