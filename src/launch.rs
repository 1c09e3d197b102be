//! Child process launching from a decoded job descriptor.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::env::Environment;
use crate::error::LaunchError;
use crate::job::Job;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Launch `job` in a child process and block until it terminates.
///
/// The child environment is the job's overrides merged over `env`; the
/// working directory change requested by the job is scoped to this call and
/// released on every exit path. The result is the child's own exit code,
/// with signal termination mapped to `128 + signal`.
pub fn launch(job: Job, env: &Environment) -> Result<ExitCode, LaunchError> {
    let child_env = env.merge_overrides(&job.env);

    let _workdir = match &job.work_dir {
        Some(target) => Some(WorkdirGuard::enter(target, env.current_dir.clone())?),
        None => None,
    };

    // Resolution happens inside the scoped directory so that a relative
    // executable is looked up where the child will run.
    let program =
        resolve_program(env, Path::new(&job.executable)).ok_or_else(|| LaunchError::Spawn {
            executable: job.executable.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "executable not found in search path"),
        })?;

    let status = Command::new(&program)
        .args(&job.args)
        .env_clear()
        .envs(child_env)
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|source| LaunchError::Spawn {
            executable: job.executable.clone(),
            source,
        })?;
    Ok(exit_code(status))
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> ExitCode {
    -1
}

/// Scoped change of the process-wide working directory.
///
/// Dropping the guard restores the recorded directory, so every exit path
/// out of the spawn step releases it. A restore failure is reported through
/// the diagnostics layer; it cannot override an already-determined launch
/// outcome.
struct WorkdirGuard {
    original: PathBuf,
}

impl WorkdirGuard {
    fn enter(target: &Path, original: PathBuf) -> Result<Self, LaunchError> {
        std::env::set_current_dir(target).map_err(|source| LaunchError::Workdir {
            path: target.to_path_buf(),
            source,
        })?;
        Ok(Self { original })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(err) = std::env::set_current_dir(&self.original) {
            tracing::warn!(
                path = %self.original.display(),
                error = %err,
                "failed to restore working directory"
            );
        }
    }
}

/// Resolve a program path the way `execvpe` would.
///
/// An absolute path or a path with a directory component is taken as-is
/// when it exists; a bare name is searched in the directories of the
/// snapshot's `PATH`.
fn resolve_program(env: &Environment, program: &Path) -> Option<PathBuf> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.is_absolute() || program.components().nth(1).is_some() {
        return program.exists().then(|| program.to_path_buf());
    }
    let search_paths = env.get_var("PATH")?;
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(program);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
