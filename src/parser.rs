use crate::errors::{ParseError, SyntaxError};
use crate::tokenizer::{Token, Tokenizer};
use std::fmt;

/// Maximum number of commands in one line
pub const MAX_CMDS: usize = 16;
/// Maximum number of words (program name included) in one command
pub const MAX_ARGS: usize = 16;

/// Characters that may not appear in any argument or filename
const FORBIDDEN: [char; 4] = ['<', '>', '&', '|'];

/// A program name followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<String>,
}

impl Command {
    /// The program name
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// The full argument vector, program name included
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// The parsed form of one input line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub background: bool,
}

impl Pipeline {
    /// A blank line: nothing to execute
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "Y" } else { "N" };

        writeln!(f, "Command line:")?;
        writeln!(f, "\tNumber of commands: {}", self.commands.len())?;
        for (i, cmd) in self.commands.iter().enumerate() {
            writeln!(f, "\t\tCommand #{}:", i)?;
            writeln!(f, "\t\t\tNumber of args: {}", cmd.args.len())?;
            write!(f, "\t\t\tArgs:")?;
            for arg in &cmd.args {
                write!(f, " \"{}\"", arg)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "\tRedirection of input: {}", yes_no(self.input.is_some()))?;
        if let Some(file) = &self.input {
            writeln!(f, "\t\tFilename: '{}'", file)?;
        }
        writeln!(f, "\tRedirection of output: {}", yes_no(self.output.is_some()))?;
        if let Some(file) = &self.output {
            writeln!(f, "\t\tFilename: '{}'", file)?;
        }
        writeln!(f, "\tBackground: {}", yes_no(self.background))
    }
}

/// True when the word contains none of `<`, `>`, `&`, `|`
pub fn is_valid_word(word: &str) -> bool {
    !word.contains(FORBIDDEN)
}

/// Parse a raw line into a `Pipeline`.
///
/// The line must end with `\n`; anything else is `LineTooLong`, and it is up
/// to the caller to drop the rest of that line from its input. On failure the
/// partially built pipeline is dropped.
pub fn parse_line(line: &str) -> Result<Pipeline, ParseError> {
    if !line.ends_with('\n') {
        return Err(ParseError::LineTooLong);
    }

    let mut parser = LineParser {
        tokens: Tokenizer::new(line),
        pipeline: Pipeline::default(),
        current: Vec::new(),
    };
    parser.run()?;
    Ok(parser.pipeline)
}

struct LineParser<'a> {
    tokens: Tokenizer<'a>,
    pipeline: Pipeline,
    /// Words of the command being collected
    current: Vec<String>,
}

impl LineParser<'_> {
    fn run(&mut self) -> Result<(), ParseError> {
        while let Some(token) = self.tokens.next_word()? {
            if token.is_operator("|") {
                self.pipe()?;
            } else if token.is_operator(">") {
                self.redirect_output()?;
            } else if token.is_operator("<") {
                self.redirect_input()?;
            } else if token.is_operator("&") {
                self.background()?;
            } else {
                self.word(token)?;
            }
        }
        self.finish()
    }

    fn pipe(&mut self) -> Result<(), ParseError> {
        if self.pipeline.background {
            return Err(SyntaxError::PipeAfterBackground.into());
        }
        if self.pipeline.output.is_some() {
            return Err(SyntaxError::PipeAfterOutputRedirection.into());
        }
        if self.current.is_empty() {
            return Err(SyntaxError::EmptyCommandBeforePipe.into());
        }
        self.close_command()
    }

    fn redirect_output(&mut self) -> Result<(), ParseError> {
        if self.pipeline.output.is_some() {
            return Err(SyntaxError::OutputAlreadyRedirected.into());
        }
        if self.pipeline.background {
            return Err(SyntaxError::OutputRedirectionAfterBackground.into());
        }
        let file = self.filename(SyntaxError::MissingOutputFilename)?;
        self.pipeline.output = Some(file);
        Ok(())
    }

    fn redirect_input(&mut self) -> Result<(), ParseError> {
        if self.pipeline.input.is_some() {
            return Err(SyntaxError::InputAlreadyRedirected.into());
        }
        if self.pipeline.background {
            return Err(SyntaxError::InputRedirectionAfterBackground.into());
        }
        if !self.pipeline.commands.is_empty() {
            return Err(SyntaxError::InputRedirectionNotFirst.into());
        }
        let file = self.filename(SyntaxError::MissingInputFilename)?;
        self.pipeline.input = Some(file);
        Ok(())
    }

    fn background(&mut self) -> Result<(), ParseError> {
        if self.pipeline.background {
            return Err(SyntaxError::MultipleBackground.into());
        }
        if self.current.is_empty() {
            return Err(SyntaxError::EmptyCommandBeforeBackground.into());
        }
        self.pipeline.background = true;
        Ok(())
    }

    fn word(&mut self, token: Token) -> Result<(), ParseError> {
        if self.pipeline.background {
            return Err(SyntaxError::CommandAfterBackground.into());
        }
        if self.pipeline.commands.len() == MAX_CMDS {
            return Err(SyntaxError::TooManyCommands.into());
        }
        if self.current.len() == MAX_ARGS {
            return Err(SyntaxError::TooManyArguments.into());
        }
        if !is_valid_word(&token.text) {
            return Err(SyntaxError::InvalidArgument(token.text).into());
        }
        if self.current.is_empty() {
            self.current
                .try_reserve_exact(MAX_ARGS)
                .map_err(|_| ParseError::OutOfMemory)?;
        }
        self.current.push(token.text);
        Ok(())
    }

    /// Consume the word following a redirection operator
    fn filename(&mut self, missing: SyntaxError) -> Result<String, ParseError> {
        let token = self.tokens.next_word()?.ok_or(missing)?;
        if !is_valid_word(&token.text) {
            return Err(SyntaxError::InvalidFilename(token.text).into());
        }
        Ok(token.text)
    }

    fn close_command(&mut self) -> Result<(), ParseError> {
        let args = std::mem::take(&mut self.current);
        self.pipeline
            .commands
            .try_reserve(1)
            .map_err(|_| ParseError::OutOfMemory)?;
        self.pipeline.commands.push(Command { args });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        if self.current.is_empty() {
            if !self.pipeline.commands.is_empty() {
                return Err(SyntaxError::EmptyCommand.into());
            }
            // "< fic" or "> fic" alone would be a file test or a truncation in a real shell
            if self.pipeline.input.is_some() {
                return Err(SyntaxError::MissingFirstCommand.into());
            }
            if self.pipeline.output.is_some() {
                return Err(SyntaxError::MissingLastCommand.into());
            }
            return Ok(());
        }
        self.close_command()
    }
}
