use crate::errors::ShellResult;
use once_cell::sync::Lazy;

/// Trait that all builtin commands must implement
pub trait BuiltinCommand: Send + Sync {
    /// The command name (e.g., "cd", "exit")
    fn name(&self) -> &'static str;

    /// Execute the command in the shell process itself.
    /// args[0] is the command name itself
    fn execute(&self, args: &[String]) -> ShellResult<()>;

    /// Returns Some(exit_code) if the shell should stop, None otherwise
    fn exit_code(&self, _args: &[String]) -> Option<i32> {
        None
    }
}

/// Central registry for all builtin commands
#[derive(Default)]
pub struct BuiltinRegistry {
    commands: Vec<Box<dyn BuiltinCommand>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: BuiltinCommand + 'static>(&mut self, cmd: C) {
        self.commands.push(Box::new(cmd));
    }

    fn find(&self, name: &str) -> Option<&dyn BuiltinCommand> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Execute a builtin command by name
    pub fn execute(&self, name: &str, args: &[String]) -> Option<ShellResult<()>> {
        self.find(name).map(|c| c.execute(args))
    }

    /// Check if command should exit the shell
    pub fn check_exit(&self, name: &str, args: &[String]) -> Option<i32> {
        self.find(name).and_then(|c| c.exit_code(args))
    }
}

/// Global registry instance
pub static BUILTINS: Lazy<BuiltinRegistry> = Lazy::new(|| {
    let mut registry = BuiltinRegistry::new();

    registry.register(super::builtins::CdCommand);
    registry.register(super::builtins::ExitCommand);

    registry
});

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn exit_stops_the_shell() {
        assert_eq!(BUILTINS.check_exit("exit", &args(&["exit"])), Some(0));
        assert_eq!(BUILTINS.check_exit("exit", &args(&["exit", "4"])), Some(4));
        assert_eq!(BUILTINS.check_exit("exit", &args(&["exit", "four"])), Some(0));
        assert_eq!(BUILTINS.check_exit("cd", &args(&["cd"])), None);
    }

    #[test]
    fn unknown_name_is_not_executed() {
        assert!(BUILTINS.execute("ls", &args(&["ls"])).is_none());
    }
}
