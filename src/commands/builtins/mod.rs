mod cd;
mod exit;

pub use cd::CdCommand;
pub use exit::ExitCommand;
