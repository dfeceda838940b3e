use crate::errors::{ShellError, ShellResult};
use crate::parser::Pipeline;
use std::fs::{File, OpenOptions};
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;

const NULL_DEVICE: &str = "/dev/null";

/// Where the last command of a pipeline writes
#[derive(Debug)]
pub enum Output {
    /// The shell's own standard output
    Inherit,
    /// An explicit `> file`
    File(File),
    /// A background pipeline without `>`: keep it off the terminal
    Null(File),
}

impl Output {
    /// The descriptor to install as stdout, `None` to keep the shell's
    pub fn into_fd(self) -> Option<OwnedFd> {
        match self {
            Output::Inherit => None,
            Output::File(file) | Output::Null(file) => Some(file.into()),
        }
    }
}

/// External ends of a pipeline, opened before anything is spawned
#[derive(Debug)]
pub struct Redirections {
    pub input: Option<File>,
    pub output: Output,
}

impl Redirections {
    /// Open the files named by the pipeline.
    ///
    /// Input is opened read-only; output write-only, created with mode 0644
    /// when absent and truncated otherwise.
    pub fn open(pipeline: &Pipeline) -> ShellResult<Self> {
        let input = match &pipeline.input {
            Some(path) => Some(File::open(path).map_err(|e| ShellError::os("open", e))?),
            None => None,
        };

        let output = match &pipeline.output {
            Some(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o644)
                    .open(path)
                    .map_err(|e| ShellError::os("open", e))?;
                Output::File(file)
            }
            None if pipeline.background => {
                let null = OpenOptions::new()
                    .write(true)
                    .open(NULL_DEVICE)
                    .map_err(|e| ShellError::os("open", e))?;
                Output::Null(null)
            }
            None => Output::Inherit,
        };

        Ok(Self { input, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::io::Read;

    #[test]
    fn background_without_output_goes_to_null() {
        let p = parse_line("sleep 1 &\n").unwrap();
        let redirs = Redirections::open(&p).unwrap();
        assert!(redirs.input.is_none());
        assert!(matches!(redirs.output, Output::Null(_)));
        assert!(redirs.output.into_fd().is_some());
    }

    #[test]
    fn foreground_without_output_inherits() {
        let p = parse_line("ls\n").unwrap();
        let output = Redirections::open(&p).unwrap().output;
        assert!(matches!(output, Output::Inherit));
        assert!(output.into_fd().is_none());
    }

    #[test]
    fn output_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "previous content").unwrap();

        let p = parse_line(&format!("true > {}\n", path.display())).unwrap();
        let redirs = Redirections::open(&p).unwrap();
        assert!(matches!(redirs.output, Output::File(_)));
        drop(redirs);

        let mut content = String::new();
        File::open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn missing_input_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let p = parse_line(&format!("cat < {}\n", path.display())).unwrap();
        let err = Redirections::open(&p).unwrap_err();
        assert_eq!(err.to_string(), "open: No such file or directory");
    }
}
