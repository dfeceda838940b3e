use crate::commands::BUILTINS;
use crate::errors::{ShellError, ShellResult};
use crate::jobs::{Job, JobTable, Termination};
use crate::parser::Pipeline;
use crate::redirection::Redirections;
use crate::signals;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc;
use nix::sys::wait::waitpid;
use nix::unistd::{execvp, fork, pipe2, ForkResult, Pid};
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::Arc;
use tracing::debug;

/// What the main loop should do after a line has been executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// How a launched pipeline ended up
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Foreground: every spawned process, waited for
    Finished(Vec<Job>),
    /// Background: pids handed to the job table
    Detached(Vec<Pid>),
}

#[derive(Debug)]
pub struct Completion {
    /// Anonymous pipes created between stages
    pub pipes: usize,
    pub outcome: Outcome,
}

/// Processes forked so far, plus the error that stopped the launch early
struct Launch {
    children: Vec<Pid>,
    pipes: usize,
    aborted: Option<ShellError>,
}

/// Realizes parsed pipelines as processes
pub struct Executor {
    jobs: Arc<JobTable>,
    report_foreground: bool,
}

impl Executor {
    pub fn new(jobs: Arc<JobTable>) -> Self {
        Self {
            jobs,
            report_foreground: true,
        }
    }

    /// Whether to print a termination line for each foreground process
    pub fn report_foreground(mut self, report: bool) -> Self {
        self.report_foreground = report;
        self
    }

    pub fn jobs(&self) -> &Arc<JobTable> {
        &self.jobs
    }

    /// Execute one parsed line: a builtin when it is a lone `cd`/`exit`, processes otherwise
    pub fn execute(&self, pipeline: &Pipeline) -> ShellResult<Flow> {
        if pipeline.is_empty() {
            return Ok(Flow::Continue);
        }

        if let [command] = pipeline.commands.as_slice() {
            let (name, args) = (command.program(), command.args());
            if let Some(code) = BUILTINS.check_exit(name, args) {
                return Ok(Flow::Exit(code));
            }
            if let Some(result) = BUILTINS.execute(name, args) {
                result?;
                return Ok(Flow::Continue);
            }
        }

        self.run(pipeline)?;
        Ok(Flow::Continue)
    }

    /// Fork every command of the pipeline, then wait for all of them or detach them.
    ///
    /// Redirection files are opened first: if that fails nothing is forked.
    /// A program that cannot be exec'd is an ordinary child exiting with
    /// status 1. If a fork or a pipe fails, the rest of the pipeline is
    /// abandoned, but the processes already started are still waited for or
    /// registered.
    pub fn run(&self, pipeline: &Pipeline) -> ShellResult<Completion> {
        let Launch {
            children,
            pipes,
            aborted,
        } = self.launch(pipeline)?;

        debug!(
            spawned = children.len(),
            pipes,
            background = pipeline.background,
            "pipeline launched"
        );

        let outcome = if pipeline.background {
            Outcome::Detached(self.detach(children))
        } else {
            Outcome::Finished(self.wait_all(children))
        };

        match aborted {
            Some(err) => Err(err),
            None => Ok(Completion { pipes, outcome }),
        }
    }

    fn launch(&self, pipeline: &Pipeline) -> ShellResult<Launch> {
        // everything the children need is allocated before the first fork
        let argvs = pipeline
            .commands
            .iter()
            .map(|command| argv(command.args()))
            .collect::<ShellResult<Vec<_>>>()?;

        let Redirections { input, output } = Redirections::open(pipeline)?;
        let mut input: Option<OwnedFd> = input.map(OwnedFd::from);
        let mut output = output.into_fd();
        let foreground = !pipeline.background;

        let last = argvs.len() - 1;
        let mut previous: Option<OwnedFd> = None;
        let mut launch = Launch {
            children: Vec::with_capacity(argvs.len()),
            pipes: 0,
            aborted: None,
        };

        for (i, argv) in argvs.iter().enumerate() {
            let stdin = if i == 0 { input.take() } else { previous.take() };

            let stdout = if i == last {
                output.take()
            } else {
                match pipe2(OFlag::O_CLOEXEC) {
                    Ok((read, write)) => {
                        launch.pipes += 1;
                        previous = Some(read);
                        Some(write)
                    }
                    Err(err) => {
                        launch.aborted = Some(ShellError::os("pipe", err));
                        break;
                    }
                }
            };

            // SAFETY: the child only calls async-signal-safe functions before exec or _exit
            match unsafe { fork() } {
                Ok(ForkResult::Child) => exec_child(
                    argv,
                    stdin.as_ref().map(AsRawFd::as_raw_fd),
                    stdout.as_ref().map(AsRawFd::as_raw_fd),
                    foreground,
                ),
                Ok(ForkResult::Parent { child }) => {
                    debug!(pid = %child, program = ?argv[0], "forked");
                    launch.children.push(child);
                }
                Err(err) => {
                    launch.aborted = Some(ShellError::os("fork", err));
                    break;
                }
            }
            // `stdin` and `stdout` drop here: the parent keeps no end of a pipe it handed out
        }

        Ok(launch)
    }

    fn wait_all(&self, children: Vec<Pid>) -> Vec<Job> {
        let mut finished = Vec::with_capacity(children.len());
        for pid in children {
            match wait_for(pid) {
                Ok(termination) => {
                    let job = Job { pid, termination };
                    if self.report_foreground {
                        eprintln!("{}", job);
                    }
                    finished.push(job);
                }
                Err(err) => eprintln!("{}", ShellError::os("waitpid", err)),
            }
        }
        finished
    }

    fn detach(&self, children: Vec<Pid>) -> Vec<Pid> {
        for &pid in &children {
            self.jobs.insert(pid);
        }
        // a job that ended before it was registered raised its SIGCHLD too early
        self.jobs.reap_all(|job| eprintln!("{}", job));
        children
    }
}

fn argv(args: &[String]) -> ShellResult<Vec<CString>> {
    args.iter()
        .map(|arg| {
            CString::new(arg.as_bytes()).map_err(|e| ShellError::Exec {
                program: args[0].clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, e),
            })
        })
        .collect()
}

/// Block until `pid` has terminated
fn wait_for(pid: Pid) -> nix::Result<Termination> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(termination) = Termination::from_wait_status(status) {
                    return Ok(termination);
                }
            }
            Err(Errno::EINTR) => {}
            Err(err) => return Err(err),
        }
    }
}

/// Child side of the fork: wire stdin/stdout, restore interrupts, exec.
///
/// Unused pipe ends are `O_CLOEXEC` and vanish at exec; on failure `_exit`
/// closes everything.
fn exec_child(
    argv: &[CString],
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
    foreground: bool,
) -> ! {
    for (fd, target) in [(stdin, libc::STDIN_FILENO), (stdout, libc::STDOUT_FILENO)] {
        if let Some(fd) = fd {
            // SAFETY: both descriptors are valid for the lifetime of the child
            if unsafe { libc::dup2(fd, target) } < 0 {
                child_fail(b"dup2", Errno::last());
            }
        }
    }

    if foreground {
        if let Err(err) = signals::unblock_interrupts() {
            child_fail(b"sigprocmask", err);
        }
    }

    let err = match execvp(&argv[0], argv) {
        Err(err) => err,
        Ok(never) => match never {},
    };
    child_fail(argv[0].as_bytes(), err)
}

/// Report `<what>: <reason>` on stderr and leave with status 1, without allocating
fn child_fail(what: &[u8], err: Errno) -> ! {
    let parts: [&[u8]; 4] = [what, b": ", err.desc().as_bytes(), b"\n"];
    for part in parts {
        // SAFETY: plain write(2) of a borrowed buffer
        unsafe {
            libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len());
        }
    }
    // SAFETY: _exit skips atexit handlers and the parent's stdio buffers
    unsafe { libc::_exit(1) }
}
