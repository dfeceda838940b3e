use nix::errno::Errno;
use std::io;
use thiserror::Error;

use crate::parser::{MAX_ARGS, MAX_CMDS};

/// Grammar violations detected while parsing a line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("Malformed line")]
    MalformedLine,

    #[error("No pipe allowed after a '&'")]
    PipeAfterBackground,

    #[error("No pipe allowed after an output redirection")]
    PipeAfterOutputRedirection,

    #[error("An empty command before a pipe detected")]
    EmptyCommandBeforePipe,

    #[error("Output redirection already defined")]
    OutputAlreadyRedirected,

    #[error("No output redirection allowed after a '&'")]
    OutputRedirectionAfterBackground,

    #[error("Waiting for a filename after an output redirection")]
    MissingOutputFilename,

    #[error("Input redirection already defined")]
    InputAlreadyRedirected,

    #[error("No input redirection allowed after a '&'")]
    InputRedirectionAfterBackground,

    #[error("Input redirection is only allowed for the first command")]
    InputRedirectionNotFirst,

    #[error("Waiting for a filename after an input redirection")]
    MissingInputFilename,

    #[error("Filename \"{0}\" is not valid")]
    InvalidFilename(String),

    #[error("More than one '&' detected")]
    MultipleBackground,

    #[error("An empty command before '&' detected")]
    EmptyCommandBeforeBackground,

    #[error("No more commands allowed after a '&'")]
    CommandAfterBackground,

    #[error("Too many commands. Max: {}", MAX_CMDS)]
    TooManyCommands,

    #[error("Too many arguments. Max: {}", MAX_ARGS)]
    TooManyArguments,

    #[error("Argument \"{0}\" is not valid")]
    InvalidArgument(String),

    #[error("An empty command detected")]
    EmptyCommand,

    #[error("Missing first command")]
    MissingFirstCommand,

    #[error("Missing last command")]
    MissingLastCommand,
}

/// Reasons a line is rejected before it reaches the executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Error while parsing: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("The command line is too long")]
    LineTooLong,

    #[error("Memory allocation failure")]
    OutOfMemory,
}

/// Comprehensive error type for shell operations
#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}: {}", .syscall, describe(.source))]
    Os {
        syscall: &'static str,
        source: io::Error,
    },

    #[error("{}: {}", .program, describe(.source))]
    Exec { program: String, source: io::Error },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("{0}")]
    InvalidDirectory(String),
}

impl ShellError {
    /// Wrap an OS-level failure with the name of the call that produced it
    pub fn os(syscall: &'static str, source: impl Into<io::Error>) -> Self {
        ShellError::Os {
            syscall,
            source: source.into(),
        }
    }
}

pub type ShellResult<T> = Result<T, ShellError>;

/// perror-style description: the bare OS message without the "(os error N)" suffix
pub fn describe(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    }
}
