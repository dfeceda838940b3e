use crate::commands::registry::BuiltinCommand;
use crate::errors::{ShellError, ShellResult};
use std::env;
use std::path::PathBuf;

/// `cd [dir]`: change the shell's own working directory.
///
/// No argument means `$HOME`; a leading `~` is replaced by `$HOME`.
pub struct CdCommand;

fn home() -> ShellResult<String> {
    env::var("HOME").map_err(|_| ShellError::InvalidDirectory("cd: HOME not set".to_string()))
}

/// Resolve the directory `cd` should move to
pub fn target_dir(arg: Option<&str>) -> ShellResult<PathBuf> {
    let target = match arg {
        None => home()?,
        Some(p) => match p.strip_prefix('~') {
            Some(rest) => home()? + rest,
            None => p.to_string(),
        },
    };
    Ok(PathBuf::from(target))
}

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(&self, args: &[String]) -> ShellResult<()> {
        let target = target_dir(args.get(1).map(String::as_str))?;
        env::set_current_dir(&target).map_err(|e| ShellError::os("cd", e))
    }
}
