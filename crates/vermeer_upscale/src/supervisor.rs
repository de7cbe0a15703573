//! The supervisor state machine.

use crate::process::ServerProcess;
use crate::{UpscaleClient, UpscaleConfig, UpscaleOutcome};
use std::process::Stdio;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use vermeer_error::{UpscaleError, UpscaleErrorKind};

/// Observable lifecycle state of the enhancement server.
///
/// Transitions:
/// `Unconfigured -> Uninstalled -> Installing -> Stopped -> Starting ->
/// HealthPolling -> Running -> Stopping -> Stopped` (the cycle repeats),
/// and `Running -> Failed` on crash detection, recoverable by re-entering
/// `Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SupervisorState {
    /// No usable start command
    Unconfigured,
    /// Dependencies not yet installed
    Uninstalled,
    /// The one-shot setup command is running
    Installing,
    /// Installed but not running
    Stopped,
    /// The server process is being spawned
    Starting,
    /// Waiting for the server to answer its health probe
    HealthPolling,
    /// Healthy and accepting requests
    Running,
    /// Cooperative or forced shutdown in progress
    Stopping,
    /// The server crashed or never became healthy
    Failed,
}

/// Owns the enhancement server's lifecycle and mediates all requests to it.
///
/// The child process handle lives exclusively inside the supervisor; no
/// other component can signal or await it. Enhancement requests funnel
/// through a single queue so at most one is in flight against the child
/// server at any time; callers wait cooperatively and dropping a waiting
/// call releases its queue position.
///
/// # Examples
///
/// ```no_run
/// use vermeer_upscale::{CommandSpec, Supervisor, UpscaleConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = UpscaleConfig::new(
///     "127.0.0.1",
///     8000,
///     CommandSpec::new("python3", &["SeedVr2Server.py"]),
/// )
/// .with_install_command(CommandSpec::new(
///     "python3",
///     &["-m", "pip", "install", "-r", "requirements.txt"],
/// ));
///
/// let supervisor = Supervisor::new(config);
/// supervisor.ensure_running(true).await?;
/// let outcome = supervisor.upscale(&[0u8; 16], None).await?;
/// supervisor.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Supervisor {
    config: UpscaleConfig,
    client: UpscaleClient,
    state: StdMutex<SupervisorState>,
    // Lifecycle lock: install/start/stop hold this across their awaits so
    // concurrent lifecycle calls serialize instead of racing the handle.
    process: Mutex<Option<ServerProcess>>,
    // Request lock: at most one enhancement request in flight.
    request_turn: Mutex<()>,
}

impl Supervisor {
    /// Create a supervisor for the configured server.
    pub fn new(config: UpscaleConfig) -> Self {
        let initial = if config.start_command.program.is_empty() {
            SupervisorState::Unconfigured
        } else if config.install_command.is_some() {
            SupervisorState::Uninstalled
        } else {
            SupervisorState::Stopped
        };

        let client = UpscaleClient::new(&config);
        Self {
            config,
            client,
            state: StdMutex::new(initial),
            process: Mutex::new(None),
            request_turn: Mutex::new(()),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        *self.state.lock().expect("supervisor state poisoned")
    }

    fn set_state(&self, next: SupervisorState) {
        let mut state = self.state.lock().expect("supervisor state poisoned");
        debug!("Supervisor state: {} -> {}", *state, next);
        *state = next;
    }

    /// Probe the server once.
    pub async fn is_healthy(&self) -> bool {
        self.client.is_healthy().await
    }

    /// Run the one-shot setup command.
    ///
    /// Output is inherited so installation progress stays visible. Success
    /// is exit code 0; anything else halts the transition to `Starting` and
    /// is reported, never silently retried.
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<(), UpscaleError> {
        let _lifecycle = self.process.lock().await;

        let Some(install) = &self.config.install_command else {
            // Nothing to install; move straight to Stopped.
            self.set_state(SupervisorState::Stopped);
            return Ok(());
        };

        self.set_state(SupervisorState::Installing);
        info!("Installing enhancement server dependencies");

        let mut command = tokio::process::Command::new(&install.program);
        command
            .args(&install.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let status = command.status().await.map_err(|e| {
            self.set_state(SupervisorState::Uninstalled);
            UpscaleError::new(UpscaleErrorKind::InstallFailed(format!(
                "Failed to run '{}': {}",
                install.program, e
            )))
        })?;

        if !status.success() {
            self.set_state(SupervisorState::Uninstalled);
            return Err(UpscaleError::new(UpscaleErrorKind::InstallFailed(format!(
                "Setup command exited with {}",
                status
            ))));
        }

        info!("Installation complete");
        self.set_state(SupervisorState::Stopped);
        Ok(())
    }

    /// Start the server and poll until it is healthy.
    ///
    /// Polling ends at the first of: a successful probe (`Running`), the
    /// configured timeout (`HealthTimeout`), or the child exiting
    /// (`Crashed`). Timeout and early exit are distinct failures.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), UpscaleError> {
        let mut slot = self.process.lock().await;
        if slot.is_some() {
            debug!("Server already started");
            return Ok(());
        }

        self.set_state(SupervisorState::Starting);
        let mut process = match ServerProcess::spawn(&self.config) {
            Ok(process) => process,
            Err(e) => {
                self.set_state(SupervisorState::Failed);
                return Err(e);
            }
        };

        self.set_state(SupervisorState::HealthPolling);
        let deadline = tokio::time::Instant::now() + self.config.health_timeout();

        loop {
            if let Some(status) = process.exit_status() {
                self.set_state(SupervisorState::Failed);
                return Err(UpscaleError::new(UpscaleErrorKind::Crashed(format!(
                    "exited during startup with {}",
                    status
                ))));
            }

            if self.client.is_healthy().await {
                info!("Enhancement server is ready");
                *slot = Some(process);
                self.set_state(SupervisorState::Running);
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                warn!("Server never became healthy; terminating it");
                process.terminate(self.config.stop_grace()).await;
                self.set_state(SupervisorState::Failed);
                return Err(UpscaleError::new(UpscaleErrorKind::HealthTimeout(
                    self.config.health_timeout_secs,
                )));
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// Make sure a healthy server is running, installing and starting it
    /// only when needed.
    ///
    /// With `skip_install_if_healthy`, a successful probe short-circuits
    /// the whole Install -> Start -> Poll sequence (the server may have
    /// been left running by an earlier session). Idempotent.
    #[instrument(skip(self))]
    pub async fn ensure_running(&self, skip_install_if_healthy: bool) -> Result<(), UpscaleError> {
        if self.state() == SupervisorState::Unconfigured {
            return Err(UpscaleError::new(UpscaleErrorKind::StartFailed(
                "no server command configured".into(),
            )));
        }

        if skip_install_if_healthy && self.client.is_healthy().await {
            debug!("Server already healthy; skipping install and start");
            self.set_state(SupervisorState::Running);
            return Ok(());
        }

        if matches!(
            self.state(),
            SupervisorState::Uninstalled | SupervisorState::Installing
        ) {
            self.install().await?;
        }
        self.start().await
    }

    /// Submit one enhancement request.
    ///
    /// Requests serialize through the supervisor's queue: at most one is
    /// delivered to the child server at a time, in caller arrival order.
    /// `resolution` overrides the configured target short side.
    ///
    /// # Errors
    ///
    /// - [`UpscaleErrorKind::NotRunning`] when the server is not up
    /// - [`UpscaleErrorKind::Crashed`] when the request failed and the
    ///   child turns out to have exited
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn upscale(
        &self,
        image: &[u8],
        resolution: Option<u32>,
    ) -> Result<UpscaleOutcome, UpscaleError> {
        let _turn = self.request_turn.lock().await;

        let state = self.state();
        if state != SupervisorState::Running {
            return Err(UpscaleError::new(UpscaleErrorKind::NotRunning(
                state.to_string(),
            )));
        }

        match self.client.upscale(image, resolution).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // Distinguish a crashed child from a plain request failure.
                let mut slot = self.process.lock().await;
                if let Some(process) = slot.as_mut() {
                    if let Some(status) = process.exit_status() {
                        slot.take();
                        self.set_state(SupervisorState::Failed);
                        return Err(UpscaleError::new(UpscaleErrorKind::Crashed(format!(
                            "exited with {} during a request",
                            status
                        ))));
                    }
                }
                Err(e)
            }
        }
    }

    /// Stop the server.
    ///
    /// Cooperative shutdown first, then a bounded grace period, then a
    /// forced kill of the full process tree. Termination errors are logged,
    /// never returned. A stop with no running process is a no-op.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut slot = self.process.lock().await;
        let Some(process) = slot.take() else {
            debug!("Stop requested with no running server");
            self.set_state(SupervisorState::Stopped);
            return;
        };

        self.set_state(SupervisorState::Stopping);
        process.terminate(self.config.stop_grace()).await;
        self.set_state(SupervisorState::Stopped);
    }
}
