//! Interactive questions asked while browsing locations or clearing the cache.

use std::io::{self, BufRead, Write};

use crate::browse::LocationNode;

/// Blocking user interaction. Waits indefinitely for an answer.
pub trait Prompt {
    /// Present the choices of one hierarchy level and read the selection
    fn choose(&mut self, node: &LocationNode) -> io::Result<String>;

    /// Ask a yes/no question; anything other than "y" is a no
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Ask a free-form question
    fn ask(&mut self, question: &str) -> io::Result<String>;

    /// Print an informational line
    fn say(&mut self, message: &str) -> io::Result<()>;
}

/// Prompt over any reader/writer pair, stdin/stdout by default.
pub struct StdioPrompt<R, W> {
    input: R,
    output: W,
}

impl StdioPrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompt for StdioPrompt<R, W> {
    fn choose(&mut self, node: &LocationNode) -> io::Result<String> {
        for label in node.choices.labels() {
            writeln!(self.output, "{label}")?;
        }
        write!(self.output, "\nEnter {} name:\n", node.label)?;
        self.output.flush()?;
        self.read_answer()
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        writeln!(self.output, "{question} Y/N")?;
        self.output.flush()?;
        Ok(self.read_answer()?.eq_ignore_ascii_case("y"))
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        writeln!(self.output, "{question}")?;
        self.output.flush()?;
        self.read_answer()
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }
}
