// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::io::{Error, ErrorKind, Result, Write};
use std::process::{ChildStdin, Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn split_command(args: &[String]) -> Result<(&String, &[String])> {
    args.split_first()
        .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "empty solver command"))
}

fn feed(stdin: Option<ChildStdin>, input: &str) -> Result<()> {
    if let Some(mut stdin) = stdin {
        stdin.write_all(input.as_bytes())?;
    }
    Ok(())
}

/// Runs `args` with `input` on its standard input. The whole process group
/// is killed once `timeout` elapses.
#[cfg(unix)]
pub fn run_with_timeout(args: &[String], input: &str, timeout: Duration) -> Result<Output> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    use std::os::unix::process::CommandExt;

    let (exe, rest) = split_command(args)?;
    let mut child = Command::new(exe)
        .args(rest)
        .process_group(0)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let pid = child.id() as i32;
    let stdin = child.stdin.take();
    let input = input.to_owned();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let fed = feed(stdin, &input);
        let result = child.wait_with_output();
        let _ = tx.send(fed.and(result));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => {
            let _ = signal::killpg(Pid::from_raw(pid), Signal::SIGKILL);
            Err(Error::new(ErrorKind::TimedOut, "solver timed out"))
        }
    }
}

#[cfg(windows)]
pub fn run_with_timeout(args: &[String], input: &str, timeout: Duration) -> Result<Output> {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;

    let (exe, rest) = split_command(args)?;
    let mut child = Command::new(exe)
        .args(rest)
        .creation_flags(CREATE_NEW_PROCESS_GROUP)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let pid = child.id();
    let stdin = child.stdin.take();
    let input = input.to_owned();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let fed = feed(stdin, &input);
        let result = child.wait_with_output();
        let _ = tx.send(fed.and(result));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => {
            let _ = Command::new("taskkill")
                .args(["/F", "/T", "/PID", &pid.to_string()])
                .output();
            Err(Error::new(ErrorKind::TimedOut, "solver timed out"))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn command(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_input_reaches_the_process() {
        let output = run_with_timeout(&command(&["cat"]), "(check-sat)\n", Duration::from_secs(10))
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "(check-sat)\n");
    }

    #[test]
    fn test_timeout_kills_the_process() {
        let err = run_with_timeout(&command(&["sleep", "10"]), "", Duration::from_millis(100))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[test]
    fn test_empty_command() {
        let err = run_with_timeout(&[], "", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
