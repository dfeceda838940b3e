//! Signal plumbing: the interrupt mask kept by the shell, and the reaper
//! that collects background jobs when SIGCHLD arrives.
//!
//! The SIGCHLD handler installed by `signal-hook` only records the
//! notification; the scan of the job table runs on a dedicated thread, where
//! taking the table lock and writing the report are allowed.

use crate::errors::{ShellError, ShellResult};
use crate::jobs::JobTable;
use nix::sys::signal::{SigSet, Signal};
use signal_hook::consts::SIGCHLD;
use signal_hook::iterator::{Handle, Signals};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

fn interrupts() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set.add(Signal::SIGQUIT);
    set
}

/// Block SIGINT and SIGQUIT in the calling thread.
///
/// Must run on the main thread before any other thread is spawned, so every
/// thread of the shell inherits the mask.
pub fn block_interrupts() -> ShellResult<()> {
    interrupts()
        .thread_block()
        .map_err(|e| ShellError::os("sigprocmask", e))
}

/// Undo `block_interrupts`. Meant for a freshly forked foreground child, right before exec.
pub fn unblock_interrupts() -> nix::Result<()> {
    interrupts().thread_unblock()
}

/// Background job collector driven by SIGCHLD
pub struct Reaper {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Install the SIGCHLD handler and start the collecting thread
    pub fn spawn(jobs: Arc<JobTable>) -> ShellResult<Self> {
        let mut signals = Signals::new([SIGCHLD]).map_err(|e| ShellError::os("sigaction", e))?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("reaper".into())
            .spawn(move || {
                for _ in signals.forever() {
                    let reaped = jobs.reap_all(|job| eprintln!("{}", job));
                    // zero is a normal outcome: a foreground child, or a job already collected
                    debug!(reaped, "SIGCHLD");
                }
            })
            .map_err(ShellError::IoError)?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Stop listening and wait for the thread to finish
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::Pid;
    use std::process::Command;
    use std::time::{Duration, Instant};

    #[test]
    fn reaper_clears_finished_background_job() {
        let jobs = Arc::new(JobTable::new());
        let reaper = Reaper::spawn(Arc::clone(&jobs)).unwrap();

        let child = Command::new("sleep").arg("0.3").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        jobs.insert(pid);

        let deadline = Instant::now() + Duration::from_secs(5);
        while jobs.contains(pid) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!jobs.contains(pid));
        reaper.close();
    }

    #[test]
    fn interrupt_mask_round_trips() {
        // run on a scratch thread so the test harness thread keeps its mask
        thread::spawn(|| {
            block_interrupts().unwrap();
            let mask = SigSet::thread_get_mask().unwrap();
            assert!(mask.contains(Signal::SIGINT));
            assert!(mask.contains(Signal::SIGQUIT));

            unblock_interrupts().unwrap();
            let mask = SigSet::thread_get_mask().unwrap();
            assert!(!mask.contains(Signal::SIGINT));
        })
        .join()
        .unwrap();
    }
}
