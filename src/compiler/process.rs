//! External compiler processes.
//!
//! A [`Process`] runs one command to completion and hands back everything it
//! wrote. Output streams are drained on their own threads, so a compiler that
//! fills one pipe while we wait on another cannot deadlock the build.
//!
//! ```text
//! Process::new(cmd, args)
//!     .stdin(bytes)       // fed on a writer thread, then closed
//!     .merge_stderr()     // stderr shares the stdout pipe
//!     .with_aux()         // extra output on descriptor 3 (Unix)
//!     .timeout(limit)     // kill when it runs too long
//!     .run()?             // → ProcessOutput { code, stdout, stderr, aux }
//! ```

use super::CompileError;
use std::{
    ffi::OsString,
    io::{self, PipeReader, Read, Write},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Descriptor number of the aux channel inside the child.
#[cfg(unix)]
const AUX_FD: i32 = 3;

/// How often a process with a timeout is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything a finished process produced.
#[derive(Debug, Default)]
pub struct ProcessOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    /// Empty when stderr was merged into stdout
    pub stderr: Vec<u8>,
    /// Empty unless the aux channel was requested
    pub aux: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Builder for one external process run.
#[derive(Debug)]
pub struct Process {
    name: String,
    program: OsString,
    args: Vec<OsString>,
    dir: Option<PathBuf>,
    stdin: Option<Vec<u8>>,
    merge_stderr: bool,
    aux: bool,
    timeout: Option<Duration>,
}

impl Process {
    /// Prepare `cmd` (program followed by fixed leading arguments) with
    /// extra `args`. Empty arguments are dropped.
    pub fn new(cmd: &[String], args: &[OsString]) -> Result<Self, CompileError> {
        let (program, fixed) = cmd.split_first().ok_or(CompileError::EmptyCommand)?;
        if program.is_empty() {
            return Err(CompileError::EmptyCommand);
        }

        let name = Path::new(program)
            .file_name()
            .map_or_else(|| program.clone(), |n| n.to_string_lossy().into_owned());

        let args = fixed
            .iter()
            .map(OsString::from)
            .chain(args.iter().cloned())
            .filter(|a| !a.is_empty())
            .collect();

        Ok(Self {
            name,
            program: program.into(),
            args,
            dir: None,
            stdin: None,
            merge_stderr: false,
            aux: false,
            timeout: None,
        })
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Feed `bytes` on stdin. Without this, stdin is null.
    pub fn stdin(mut self, bytes: Vec<u8>) -> Self {
        self.stdin = Some(bytes);
        self
    }

    /// Send stderr into the stdout pipe, interleaved as written.
    pub fn merge_stderr(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    /// Open an extra output channel on descriptor 3.
    ///
    /// Only supported on Unix; elsewhere the aux output is always empty.
    pub fn with_aux(mut self) -> Self {
        self.aux = true;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion.
    ///
    /// All pipes are closed and reader threads joined before this returns,
    /// on error paths too.
    pub fn run(self) -> Result<ProcessOutput, CompileError> {
        let name = self.name;
        let io_err = |source| CompileError::Io {
            name: name.clone(),
            source,
        };

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        command.stdin(if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        // Own process group, so a timeout also reaches anything the compiler
        // started and that still holds our pipes
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let (stdout_reader, stdout_writer) = io::pipe().map_err(io_err)?;
        let stderr_reader = if self.merge_stderr {
            command.stderr(stdout_writer.try_clone().map_err(io_err)?);
            None
        } else {
            let (reader, writer) = io::pipe().map_err(io_err)?;
            command.stderr(writer);
            Some(reader)
        };
        command.stdout(stdout_writer);

        #[cfg(unix)]
        let (aux_reader, aux_writer) = if self.aux {
            let (reader, writer) = io::pipe().map_err(io_err)?;
            let writer = install_aux(&mut command, writer);
            (Some(reader), Some(writer))
        } else {
            (None, None)
        };
        #[cfg(not(unix))]
        let aux_reader: Option<PipeReader> = None;

        let spawned = command.spawn();

        // The command (and our copy of the aux writer) hold the write ends;
        // readers only see EOF once they are gone
        drop(command);
        #[cfg(unix)]
        drop(aux_writer);

        let mut child = spawned.map_err(|source| CompileError::Spawn {
            name: name.clone(),
            source,
        })?;

        let stdin_thread = match (child.stdin.take(), self.stdin) {
            (Some(mut pipe), Some(bytes)) => Some(thread::spawn(move || {
                // A compiler may exit without reading all of its input
                let _ = pipe.write_all(&bytes);
            })),
            _ => None,
        };

        let stdout_thread = drain(stdout_reader);
        let stderr_thread = stderr_reader.map(drain);
        let aux_thread = aux_reader.map(drain);

        let waited = wait_for(&mut child, self.timeout);

        if let Some(handle) = stdin_thread {
            handle.join().ok();
        }
        let stdout = join(stdout_thread);
        let stderr = stderr_thread.map(join).transpose();
        let aux = aux_thread.map(join).transpose();

        let status = waited.map_err(io_err)?;
        let Some(status) = status else {
            return Err(CompileError::Timeout {
                name: name.clone(),
                timeout: self.timeout.unwrap_or_default(),
            });
        };

        Ok(ProcessOutput {
            code: status.code(),
            stdout: stdout.map_err(io_err)?,
            stderr: stderr.map_err(io_err)?.unwrap_or_default(),
            aux: aux.map_err(io_err)?.unwrap_or_default(),
        })
    }
}

/// Make `writer` appear as [`AUX_FD`] in the child.
///
/// Returns the parent's copy, which must be dropped after spawning.
#[cfg(unix)]
fn install_aux(command: &mut Command, writer: io::PipeWriter) -> std::os::fd::OwnedFd {
    use std::os::{
        fd::{AsRawFd, OwnedFd},
        unix::process::CommandExt,
    };

    let fd = OwnedFd::from(writer);
    let raw = fd.as_raw_fd();

    // SAFETY: the hook runs between fork and exec and only makes
    // async-signal-safe libc calls on descriptors it does not own
    unsafe {
        command.pre_exec(move || {
            if raw == AUX_FD {
                // Already in place; dup2 would be a no-op that keeps CLOEXEC
                let flags = libc::fcntl(raw, libc::F_GETFD);
                if flags == -1 || libc::fcntl(raw, libc::F_SETFD, flags & !libc::FD_CLOEXEC) == -1
                {
                    return Err(io::Error::last_os_error());
                }
            } else if libc::dup2(raw, AUX_FD) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    fd
}

fn drain(mut reader: PipeReader) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked")))
}

/// Wait for the child, killing it once `timeout` has passed.
///
/// Returns `Ok(None)` when the child was killed.
fn wait_for(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and the rest of its process group.
fn kill(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall on the group created for this child
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
    child.kill().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Process {
        Process::new(&["sh".into(), "-c".into(), script.into()], &[]).unwrap()
    }

    #[test]
    fn test_new_empty_command() {
        assert!(matches!(
            Process::new(&[], &[]),
            Err(CompileError::EmptyCommand)
        ));
        assert!(matches!(
            Process::new(&[String::new()], &[]),
            Err(CompileError::EmptyCommand)
        ));
    }

    #[test]
    fn test_new_filters_empty_args() {
        let process = Process::new(
            &["/opt/awe/node_modules/.bin/coffee".into(), "compile.coffee".into()],
            &["".into(), "app.coffee".into()],
        )
        .unwrap();

        assert_eq!(process.name, "coffee");
        assert_eq!(process.args, vec![OsString::from("compile.coffee"), "app.coffee".into()]);
    }

    #[test]
    fn test_spawn_failure() {
        let process = Process::new(&["/nonexistent/awe-compiler".into()], &[]).unwrap();
        match process.run() {
            Err(CompileError::Spawn { name, .. }) => assert_eq!(name, "awe-compiler"),
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_and_stderr_separate() {
        let output = sh("echo out; echo err >&2; exit 3").run().unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr, b"err\n");
        assert!(output.aux.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_merge_stderr() {
        let output = sh("echo one; echo two >&2; echo three")
            .merge_stderr()
            .run()
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, b"one\ntwo\nthree\n");
        assert!(output.stderr.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_bytes() {
        let output = sh("tr a-z A-Z").stdin(b"x = 1\n".to_vec()).run().unwrap();
        assert_eq!(output.stdout, b"X = 1\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_null_by_default() {
        let output = sh("cat").run().unwrap();
        assert!(output.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_aux_channel() {
        let output = sh(r#"echo code; printf '{"version":3}' >&3"#)
            .with_aux()
            .run()
            .unwrap();
        assert_eq!(output.stdout, b"code\n");
        assert_eq!(output.aux, br#"{"version":3}"#);
    }

    #[cfg(unix)]
    #[test]
    fn test_large_output_does_not_block() {
        // Larger than a pipe buffer on both streams
        let output = sh("head -c 200000 /dev/zero; head -c 200000 /dev/zero >&2")
            .run()
            .unwrap();
        assert_eq!(output.stdout.len(), 200_000);
        assert_eq!(output.stderr.len(), 200_000);
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills() {
        let started = Instant::now();
        let result = sh("exec sleep 5")
            .timeout(Some(Duration::from_millis(200)))
            .run();

        assert!(matches!(result, Err(CompileError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_grandchildren() {
        // `sleep` runs as a grandchild holding stdout open
        let started = Instant::now();
        let result = sh("sleep 5; echo late")
            .timeout(Some(Duration::from_millis(200)))
            .run();

        assert!(matches!(result, Err(CompileError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = sh("pwd").current_dir(dir.path()).run().unwrap();
        let pwd = String::from_utf8(output.stdout).unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(pwd.trim()).canonicalize().unwrap(), expected);
    }
}
