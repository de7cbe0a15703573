//! Child process handle for the enhancement server.

use crate::UpscaleConfig;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use vermeer_error::{UpscaleError, UpscaleErrorKind};

/// Handle for the running enhancement server process.
///
/// On unix the child is placed in its own process group so that cooperative
/// and forced termination reach the full descendant tree (the server spawns
/// worker subprocesses of its own).
pub(crate) struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    /// Spawn the server process.
    ///
    /// Output is inherited so the server's startup log stays observable in
    /// the supervisor's session.
    pub(crate) fn spawn(config: &UpscaleConfig) -> Result<Self, UpscaleError> {
        info!(
            "Starting enhancement server on {} with '{}'",
            config.base_url(),
            config.start_command.program
        );

        let mut command = Command::new(&config.start_command.program);
        command
            .args(&config.start_command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            UpscaleError::new(UpscaleErrorKind::StartFailed(format!(
                "Failed to spawn '{}': {}. Make sure it's installed.",
                config.start_command.program, e
            )))
        })?;

        debug!("Server process spawned with PID: {:?}", child.id());
        Ok(Self { child })
    }

    /// Check whether the process has exited, without blocking.
    pub(crate) fn exit_status(&mut self) -> Option<String> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not poll server process: {}", e);
                None
            }
        }
    }

    /// Terminate the process tree.
    ///
    /// Cooperative first: SIGTERM to the process group, then a bounded
    /// grace wait; if the process is still alive, SIGKILL the group. All
    /// errors are logged rather than returned.
    pub(crate) async fn terminate(mut self, grace: Duration) {
        info!("Stopping enhancement server");

        self.signal_group(libc_sigterm());
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!("Server stopped cooperatively: {}", status);
                return;
            }
            Ok(Err(e)) => warn!("Failed to wait for server shutdown: {}", e),
            Err(_) => warn!(
                "Server did not stop within {:?}; killing process tree",
                grace
            ),
        }

        self.signal_group(libc_sigkill());
        if let Err(e) = self.child.start_kill() {
            warn!("Failed to kill server process: {}", e);
        }
        if let Err(e) = self.child.wait().await {
            warn!("Failed to reap server process: {}", e);
        }
    }

    #[cfg(unix)]
    fn signal_group(&mut self, signal: i32) {
        if let Some(pid) = self.child.id() {
            // The child is its own group leader, so -pid addresses the
            // whole descendant tree.
            // SAFETY: kill(2) with a negative pid is a plain syscall on a
            // group we created; no memory is touched.
            let rc = unsafe { libc::kill(-(pid as i32), signal) };
            if rc != 0 {
                debug!(
                    "kill({}, {}) failed: {}",
                    -(pid as i32),
                    signal,
                    std::io::Error::last_os_error()
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn signal_group(&mut self, _signal: i32) {
        // No process groups here; both phases fall back to a direct kill.
        if let Err(e) = self.child.start_kill() {
            debug!("start_kill failed: {}", e);
        }
    }
}

#[cfg(unix)]
fn libc_sigterm() -> i32 {
    libc::SIGTERM
}

#[cfg(unix)]
fn libc_sigkill() -> i32 {
    libc::SIGKILL
}

#[cfg(not(unix))]
fn libc_sigterm() -> i32 {
    0
}

#[cfg(not(unix))]
fn libc_sigkill() -> i32 {
    0
}
