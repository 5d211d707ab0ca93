//! External process plumbing
//!
//! Every spawned child is owned by a [`ChildGuard`], which kills and reaps it
//! when dropped before it was waited for, so an early return never leaves a
//! process behind.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

/// Owner of a running child process
#[derive(Debug)]
pub struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    /// Spawn `command` with piped standard streams
    pub fn spawn(command: &mut Command) -> Result<Self> {
        let child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        Ok(Self { child: Some(child) })
    }

    /// Feed `input` to the child, collect its output and wait for it to exit
    pub fn communicate(mut self, input: &str) -> Result<ProcessOutput> {
        let Some(child) = self.child.as_mut() else {
            return Err(Error::Io(std::io::Error::other("child already reaped")));
        };
        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let (written, err_text, out_text) = thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(mut pipe) = stdin.take() {
                    pipe.write_all(input.as_bytes())?;
                }
                Ok(())
            });
            let err_reader = scope.spawn(move || -> std::io::Result<String> {
                let mut text = String::new();
                if let Some(mut pipe) = stderr.take() {
                    pipe.read_to_string(&mut text)?;
                }
                Ok(text)
            });

            let mut out_text = String::new();
            let out_result = match stdout.take() {
                Some(mut pipe) => pipe.read_to_string(&mut out_text).map(|_| out_text),
                None => Ok(out_text),
            };
            (join(writer), join(err_reader), out_result)
        });

        let status = child.wait()?;
        self.child = None;

        // A tool may exit without reading all of its input
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
        Ok(ProcessOutput {
            status,
            stdout: out_text?,
            stderr: err_text?,
        })
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, std::io::Result<T>>) -> std::io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("pipe thread panicked")))
}

/// Collected result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status
    pub status: ExitStatus,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Run `program` with `args`, piping `input` through it
pub fn run_piped(program: &str, args: &[String], input: &str) -> Result<ProcessOutput> {
    let mut command = Command::new(program);
    command.args(args);
    ChildGuard::spawn(&mut command)?.communicate(input)
}

static FILE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"file:(//)?(/[^\s:]*/)?").expect("Invalid file prefix regex")
});

static STACK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(at [\w$.<>]+\(.*\)|\.\.\. \d+ more|Caused by: .*)$")
        .expect("Invalid stack line regex")
});

/// Strip local file URL prefixes and Java stack frames from tool diagnostics
pub fn scrub_stderr(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|line| !STACK_LINE.is_match(line))
        .map(|line| FILE_PREFIX.replace_all(line, "").into_owned())
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
