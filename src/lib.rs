pub mod commands;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod parser;
pub mod pipeline;
pub mod redirection;
pub mod repl;
pub mod signals;
pub mod tokenizer;

use config::ShellConfig;
use errors::ShellResult;
use jobs::JobTable;
use signals::Reaper;
use std::sync::Arc;

/// Main entry point for the shell REPL.
///
/// Blocks the interrupt signals, starts the background reaper, then reads
/// lines from stdin until `exit` or end of input. Returns the exit status.
pub fn run_shell(config: ShellConfig) -> ShellResult<i32> {
    signals::block_interrupts()?;

    let jobs = Arc::new(JobTable::new());
    let reaper = Reaper::spawn(Arc::clone(&jobs))?;

    let status = repl::run_stdin(config, jobs);
    reaper.close();
    status
}
