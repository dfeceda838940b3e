use crate::commands::registry::BuiltinCommand;
use crate::errors::ShellResult;

/// `exit [status]`: leave the main loop.
///
/// The status is reduced to 0..=255 the way the kernel would; a missing or
/// non-numeric status means 0.
pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn execute(&self, _args: &[String]) -> ShellResult<()> {
        Ok(())
    }

    fn exit_code(&self, args: &[String]) -> Option<i32> {
        let status = args
            .get(1)
            .and_then(|s| s.parse::<i32>().ok())
            .map_or(0, |n| n & 0xff);
        Some(status)
    }
}
