use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Termination {
    /// The final state carried by a wait status, if it is one
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
            WaitStatus::Signaled(_, sig, _) => Some(Termination::Signaled(sig as i32)),
            _ => None,
        }
    }
}

/// A process collected by the shell, with how it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub termination: Termination,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.termination {
            Termination::Exited(code) => {
                write!(f, "[{}] exited with exit status {}", self.pid, code)
            }
            Termination::Signaled(sig) => write!(f, "[{}] killed by signal {}", self.pid, sig),
        }
    }
}

/// Background processes that have not been reaped yet.
///
/// The table only holds identities; liveness is what `reap_one` observes.
/// Shared between the main loop, which inserts, and the reaper, which scans
/// and removes. Both go through the same lock, and the lock is never held
/// across a blocking call.
#[derive(Debug, Default)]
pub struct JobTable {
    pids: Mutex<Vec<Pid>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Pid>> {
        self.pids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a freshly spawned background process. Returns false if the pid is already known.
    pub fn insert(&self, pid: Pid) -> bool {
        let mut pids = self.lock();
        if pids.contains(&pid) {
            return false;
        }
        pids.push(pid);
        debug!(%pid, live = pids.len(), "registered background job");
        true
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.lock().contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Collect the first registered job found terminated.
    ///
    /// Every check is `WNOHANG`, so this never blocks. Returns `None` when no
    /// registered job has terminated yet.
    pub fn reap_one(&self) -> Option<Job> {
        let mut pids = self.lock();
        let mut i = 0;
        while i < pids.len() {
            let pid = pids[i];
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(status) => {
                    if let Some(termination) = Termination::from_wait_status(status) {
                        pids.swap_remove(i);
                        return Some(Job { pid, termination });
                    }
                    i += 1;
                }
                Err(Errno::ECHILD) => {
                    // collected elsewhere; nothing left to report
                    warn!(%pid, "background job vanished before it was reaped");
                    pids.swap_remove(i);
                }
                Err(err) => {
                    warn!(%pid, %err, "waitpid failed");
                    i += 1;
                }
            }
        }
        None
    }

    /// Reap every terminated job, handing each one to `report`
    pub fn reap_all(&self, mut report: impl FnMut(&Job)) -> usize {
        let mut reaped = 0;
        while let Some(job) = self.reap_one() {
            report(&job);
            reaped += 1;
        }
        reaped
    }
}
