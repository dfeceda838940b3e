//! End-to-end tests: parse a line, run it as real processes, look at the result.

use shrimp::errors::ShellError;
use shrimp::jobs::{Job, JobTable, Termination};
use shrimp::parser::parse_line;
use shrimp::pipeline::{Completion, Executor, Flow, Outcome};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn executor() -> Executor {
    Executor::new(Arc::new(JobTable::new())).report_foreground(false)
}

fn run(executor: &Executor, line: &str) -> Result<Completion, ShellError> {
    let pipeline = parse_line(&format!("{}\n", line)).expect("line should parse");
    executor.run(&pipeline)
}

fn finished(completion: Completion) -> Vec<Termination> {
    match completion.outcome {
        Outcome::Finished(jobs) => jobs.into_iter().map(|job| job.termination).collect(),
        Outcome::Detached(_) => panic!("expected a foreground pipeline"),
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn output_then_input_redirection_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let copy = dir.path().join("copy.txt");
    let exec = executor();

    let done = run(&exec, &format!("echo hi > {}", out.display())).unwrap();
    assert_eq!(finished(done), vec![Termination::Exited(0)]);
    assert_eq!(read(&out), "hi\n");

    let done = run(&exec, &format!("cat < {} > {}", out.display(), copy.display())).unwrap();
    assert_eq!(finished(done), vec![Termination::Exited(0)]);
    assert_eq!(read(&copy), "hi\n");
}

#[test]
fn three_stage_pipeline_chains_stdout_to_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("count.txt");
    let exec = executor();

    let done = run(
        &exec,
        &format!("echo hello world | tr a-z A-Z | wc -w > {}", out.display()),
    )
    .unwrap();
    assert_eq!(done.pipes, 2);
    assert_eq!(finished(done), vec![Termination::Exited(0); 3]);
    assert_eq!(read(&out).trim(), "2");
}

#[test]
fn every_stage_sees_the_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("upper.txt");
    let exec = executor();

    let done = run(
        &exec,
        &format!("< /dev/null echo hello world | tr a-z A-Z > {}", out.display()),
    )
    .unwrap();
    assert_eq!(done.pipes, 1);
    assert_eq!(read(&out), "HELLO WORLD\n");
}

#[test]
fn quoted_word_reaches_the_program_as_one_argument() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("args.txt");
    let exec = executor();

    run(&exec, &format!("printf [%s] \"a b\" c > {}", out.display())).unwrap();
    assert_eq!(read(&out), "[a b][c]");
}

#[test]
fn single_command_creates_no_pipe() {
    let done = run(&executor(), "true").unwrap();
    assert_eq!(done.pipes, 0);
    assert_eq!(finished(done), vec![Termination::Exited(0)]);
}

#[test]
fn foreground_reports_exit_status_and_signal() {
    let exec = executor();
    let done = run(&exec, "sh -c \"exit 3\"").unwrap();
    assert_eq!(finished(done), vec![Termination::Exited(3)]);

    let done = run(&exec, "sh -c \"kill -9 $$\"").unwrap();
    assert_eq!(finished(done), vec![Termination::Signaled(9)]);
}

#[test]
fn missing_input_file_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let err = run(&executor(), &format!("cat < {}", missing.display())).unwrap_err();
    assert!(matches!(err, ShellError::Os { syscall: "open", .. }));
}

#[test]
fn unknown_program_does_not_stop_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.txt");
    let exec = executor();

    let done = run(&exec, "no-such-program-for-shrimp-tests").unwrap();
    assert_eq!(finished(done), vec![Termination::Exited(1)]);

    let done = run(
        &exec,
        &format!("no-such-program-for-shrimp-tests | cat > {}", out.display()),
    )
    .unwrap();
    assert_eq!(
        finished(done),
        vec![Termination::Exited(1), Termination::Exited(0)]
    );
    assert_eq!(read(&out), "");
}

#[test]
fn unknown_program_in_background_is_reaped_with_status_1() {
    let exec = executor();
    let done = run(&exec, "no-such-program-for-shrimp-tests &").unwrap();
    let pid = match done.outcome {
        Outcome::Detached(pids) => pids[0],
        Outcome::Finished(_) => panic!("background pipeline was waited for"),
    };

    let mut reaped: Vec<Job> = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while exec.jobs().contains(pid) && Instant::now() < deadline {
        exec.jobs().reap_all(|job| reaped.push(*job));
        thread::sleep(Duration::from_millis(20));
    }
    // `detach` may already have collected it during its own drain
    assert!(!exec.jobs().contains(pid));
    if let Some(job) = reaped.first() {
        assert_eq!(job.pid, pid);
        assert_eq!(job.termination, Termination::Exited(1));
    }
}

#[test]
fn background_job_returns_immediately_and_is_reaped() {
    let exec = executor();
    let started = Instant::now();
    let done = run(&exec, "sleep 1 &").unwrap();
    assert!(started.elapsed() < Duration::from_millis(900));

    let pids = match done.outcome {
        Outcome::Detached(pids) => pids,
        Outcome::Finished(_) => panic!("background pipeline was waited for"),
    };
    assert_eq!(pids.len(), 1);
    assert!(exec.jobs().contains(pids[0]));

    let deadline = Instant::now() + Duration::from_secs(10);
    while exec.jobs().contains(pids[0]) && Instant::now() < deadline {
        exec.jobs().reap_all(|_| {});
        thread::sleep(Duration::from_millis(50));
    }
    assert!(!exec.jobs().contains(pids[0]));
}

#[test]
fn background_pipeline_registers_every_process() {
    let exec = executor();
    let done = run(&exec, "sleep 1 | sleep 1 &").unwrap();
    assert_eq!(done.pipes, 1);
    match done.outcome {
        Outcome::Detached(pids) => {
            assert_eq!(pids.len(), 2);
            assert!(pids.iter().all(|pid| exec.jobs().contains(*pid)));
        }
        Outcome::Finished(_) => panic!("background pipeline was waited for"),
    }
}

#[test]
fn blank_line_and_exit_do_not_spawn() {
    let exec = executor();
    let blank = parse_line("   \n").unwrap();
    assert_eq!(exec.execute(&blank).unwrap(), Flow::Continue);

    let exit = parse_line("exit\n").unwrap();
    assert_eq!(exec.execute(&exit).unwrap(), Flow::Exit(0));
}
