use crate::config::ShellConfig;
use crate::errors::{ParseError, ShellResult};
use crate::jobs::JobTable;
use crate::parser::parse_line;
use crate::pipeline::{Executor, Flow};
use std::env;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::sync::Arc;
use tracing::debug;

/// Size of the line buffer, terminating byte included
pub const BUFLEN: usize = 1024;

/// Reads input one bounded line at a time
pub struct LineReader<R> {
    inner: R,
    limit: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, BUFLEN - 1)
    }

    pub fn with_limit(inner: R, limit: usize) -> Self {
        Self { inner, limit }
    }

    /// Read up to `limit` bytes, stopping after a newline.
    ///
    /// A returned line without a trailing newline did not fit; the rest of it
    /// is still pending and should be dropped with `discard_line`. `None`
    /// means end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let n = (&mut self.inner)
            .take(self.limit as u64)
            .read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') && n < self.limit {
            // end of input in the middle of a line
            buf.push(b'\n');
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Skip input up to and including the next newline
    pub fn discard_line(&mut self) -> io::Result<usize> {
        let mut sink = Vec::new();
        self.inner.read_until(b'\n', &mut sink)
    }
}

/// The interactive loop: prompt, read, parse, execute, repeat
pub struct Shell {
    config: ShellConfig,
    executor: Executor,
}

impl Shell {
    pub fn new(config: ShellConfig, jobs: Arc<JobTable>) -> Self {
        let executor = Executor::new(jobs).report_foreground(!config.quiet);
        Self { config, executor }
    }

    fn prompt(&self) -> io::Result<()> {
        let cwd = env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|_| "?".to_string());
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}:{}> ", self.config.prompt, cwd)?;
        stdout.flush()
    }

    /// Run until `exit` or end of input; returns the shell's exit status
    pub fn run<R: BufRead>(&self, input: R, interactive: bool) -> ShellResult<i32> {
        let mut reader = LineReader::new(input);
        loop {
            if interactive {
                self.prompt()?;
            }

            let Some(line) = reader.read_line()? else {
                if interactive {
                    println!();
                }
                return Ok(0);
            };

            match self.handle_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return Ok(code),
                Err(ParseError::LineTooLong) => {
                    eprintln!("{}", ParseError::LineTooLong);
                    reader.discard_line()?;
                }
                Err(err) => eprintln!("{}", err),
            }
        }
    }

    /// Parse and execute one raw line. Execution failures are reported here;
    /// parse failures go back to the caller.
    pub fn handle_line(&self, line: &str) -> Result<Flow, ParseError> {
        let pipeline = parse_line(line)?;
        debug!(commands = pipeline.len(), background = pipeline.background, "parsed line");

        if self.config.show_line {
            eprint!("{}", pipeline);
        }

        match self.executor.execute(&pipeline) {
            Ok(flow) => Ok(flow),
            Err(err) => {
                eprintln!("{}", err);
                Ok(Flow::Continue)
            }
        }
    }
}

/// Run the shell on the process's standard input
pub fn run_stdin(config: ShellConfig, jobs: Arc<JobTable>) -> ShellResult<i32> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    Shell::new(config, jobs).run(stdin.lock(), interactive)
}
