// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Interface to `openssl smime`. */

use {
    crate::error::SmimeError,
    log::{debug, error, warn},
    std::{
        ffi::{OsStr, OsString},
        path::{Path, PathBuf},
        process::Output,
        time::{Duration, Instant},
    },
};

/// Environment variable that overrides the `openssl` executable to run.
pub const OPENSSL_ENV: &str = "TUGGER_SMIME_OPENSSL";

/// How often a running process is polled when a timeout is in effect.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Resolve the `openssl` executable to invoke.
///
/// Honors [OPENSSL_ENV] if set to a non-empty value. Otherwise `openssl` is
/// resolved through `PATH` when the process is spawned. See [resolve_program].
pub fn find_openssl() -> PathBuf {
    match std::env::var_os(OPENSSL_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from("openssl"),
    }
}

/// Resolve a program to the path that will actually be executed.
///
/// A bare name like `openssl` is searched for in `PATH`. Anything with a
/// directory component, absolute or relative, is returned unchanged.
pub fn resolve_program(program: &Path) -> Result<PathBuf, SmimeError> {
    let bare = !program.is_absolute() && program.components().count() == 1;

    if !bare {
        return Ok(program.to_path_buf());
    }

    which::which(program).map_err(|e| SmimeError::Spawn {
        program: program.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
    })
}

/// Represents a single invocation of `openssl smime`.
#[derive(Clone, Debug)]
pub struct SmimeCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl SmimeCommand {
    /// Construct a new instance running the `smime` subcommand of `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: vec!["smime".into()],
            timeout: None,
        }
    }

    /// The executable that will be run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the executable, starting with `smime`.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add a flag followed by its value.
    pub fn option(&mut self, flag: &str, value: impl AsRef<OsStr>) -> &mut Self {
        self.arg(flag).arg(value)
    }

    /// Bound how long the process may run.
    ///
    /// `None` waits forever.
    pub fn timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Run the command to completion.
    ///
    /// `stdin` is written in full and the pipe closed. stderr is always
    /// captured. stdout is captured if `capture_stdout` is set and discarded
    /// otherwise.
    ///
    /// A non-zero exit is not an error here. Callers inspect the returned
    /// status.
    pub fn run(&self, stdin: Option<&[u8]>, capture_stdout: bool) -> Result<Output, SmimeError> {
        let program = resolve_program(&self.program)?;

        debug!(
            "invoking {} with args: {:?}",
            program.display(),
            self.args
        );

        let mut expression = duct::cmd(&program, &self.args)
            .stderr_capture()
            .unchecked();

        expression = match stdin {
            Some(data) => expression.stdin_bytes(data.to_vec()),
            None => expression.stdin_null(),
        };

        expression = if capture_stdout {
            expression.stdout_capture()
        } else {
            expression.stdout_null()
        };

        let handle = expression.start().map_err(|source| SmimeError::Spawn {
            program: program.clone(),
            source,
        })?;

        let output = match self.timeout {
            None => handle.into_output()?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;

                loop {
                    if let Some(output) = handle.try_wait()? {
                        break output.clone();
                    }

                    if Instant::now() >= deadline {
                        error!(
                            "{} did not exit within {:?}; killing it",
                            program.display(),
                            timeout
                        );
                        handle.kill()?;
                        return Err(SmimeError::Timeout(timeout));
                    }

                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        };

        if !output.status.success() {
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                warn!("openssl> {}", line);
            }
        }

        Ok(output)
    }
}

/// Convert a failed [Output] into an error.
pub(crate) fn failure(output: &Output) -> SmimeError {
    SmimeError::Openssl {
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
    }
}
