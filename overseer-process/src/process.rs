use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use overseer_error::{OptionError, OverseerError, ProcessError};
use overseer_options::OptionValue;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{ProcessConfiguration, CMDLINE, CONFIG};
use crate::state::{ExitStatus, ProcessState};
use crate::substitution::{
    Substitutor, TAG_CONFIGFILE, TAG_DATAROOTPATH, TAG_LOGFILE, TAG_LOGFILELOCATION,
    TAG_LOGFILENAME, TAG_PID, TAG_ROOTPATH,
};

static NEXT_UNIQ: AtomicU64 = AtomicU64::new(1);

/// Failure delivered from a `start()` attempt: either a validation error
/// raised before a child was ever spawned, or the OS declining to spawn it.
#[derive(Debug)]
pub enum StartFailure {
    Validation(ProcessError),
    Spawn(std::io::Error),
}

impl std::fmt::Display for StartFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartFailure::Validation(e) => write!(f, "{e}"),
            StartFailure::Spawn(e) => write!(f, "failed to spawn child process: {e}"),
        }
    }
}

impl std::error::Error for StartFailure {}

/// Called exactly once, from the exit callback, with the process's final
/// status.
pub type StopHandler = Arc<dyn Fn(ExitStatus) + Send + Sync>;

struct ProcessInner {
    state: ProcessState,
    configuration: ProcessConfiguration,
    config_file_path: Option<PathBuf>,
    log_file_path: Option<PathBuf>,
    child: Option<tokio::process::Child>,
    last_exit: Option<ExitStatus>,
    stop_handler: Option<StopHandler>,
}

/// A single supervised child process.
///
/// Identity (name, executable, root/data directories, fixed argument
/// prefix) is immutable; everything else lives behind a single
/// `tokio::sync::RwLock` so a caller can hold a shared read lock across an
/// `.await` while rendering option values.
pub struct Process {
    name: String,
    executable: String,
    root_path: PathBuf,
    data_path: PathBuf,
    fixed_args: Vec<String>,
    inner: RwLock<ProcessInner>,
}

impl Process {
    pub fn new(
        name: impl Into<String>,
        executable: impl Into<String>,
        root_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
        fixed_args: Vec<String>,
        configuration: ProcessConfiguration,
    ) -> Arc<Self> {
        Arc::new(Process {
            name: name.into(),
            executable: executable.into(),
            root_path: root_path.into(),
            data_path: data_path.into(),
            fixed_args,
            inner: RwLock::new(ProcessInner {
                state: ProcessState::Stopped,
                configuration,
                config_file_path: None,
                log_file_path: None,
                child: None,
                last_exit: None,
                stop_handler: None,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub async fn state(&self) -> ProcessState {
        self.inner.read().await.state
    }

    pub async fn last_exit(&self) -> Option<ExitStatus> {
        self.inner.read().await.last_exit.clone()
    }

    pub async fn storage_names(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .configuration
            .storage_names()
            .map(String::from)
            .collect()
    }

    /// Begin launching the process. Returns once the child has been handed
    /// to the OS (`Running`) or the attempt has been abandoned (`Stopped`).
    /// A background task awaits the child's exit and invokes `stop_handler`
    /// exactly once when it happens.
    #[instrument(skip(self, stop_handler), fields(process = %self.name))]
    pub async fn start(
        self: &Arc<Self>,
        stop_handler: StopHandler,
    ) -> Result<(), StartFailure> {
        let uniq = NEXT_UNIQ.fetch_add(1, Ordering::Relaxed);

        {
            let mut inner = self.inner.write().await;
            if inner.state != ProcessState::Stopped {
                return Err(StartFailure::Validation(ProcessError::AlreadyRunning {
                    detail: Some(self.name.clone()),
                }));
            }
            inner.state = ProcessState::Starting;
            inner.stop_handler = Some(stop_handler);

            // Best-effort cleanup of files from a previous run.
            if let Some(old_config) = &inner.config_file_path {
                if let Err(e) = std::fs::remove_file(old_config) {
                    warn!(process = %self.name, error = %e, "failed to remove stale config file");
                }
            }
            if let Some(old_log) = &inner.log_file_path {
                if let Err(e) = std::fs::remove_file(old_log) {
                    warn!(process = %self.name, error = %e, "failed to remove stale log file");
                }
            }
        }

        #[cfg(test)]
        test_hooks::pause_after_starting_lock_released(&self.name).await;

        let log_file_path = self.data_path.join(format!("{}-{}.log", self.name, uniq));
        let has_config_storage = {
            let inner = self.inner.read().await;
            inner.configuration.has_storage(CONFIG)
        };
        let config_file_path = has_config_storage
            .then(|| self.data_path.join(format!("{}-{}.config", self.name, uniq)));

        let mut substitutor = Substitutor::new();
        substitutor.set(TAG_PID, uniq.to_string());
        substitutor.set(TAG_ROOTPATH, self.root_path.display().to_string());
        substitutor.set(TAG_DATAROOTPATH, self.data_path.display().to_string());
        substitutor.set(TAG_LOGFILE, log_file_path.display().to_string());
        substitutor.set(
            TAG_LOGFILENAME,
            log_file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        substitutor.set(TAG_LOGFILELOCATION, self.data_path.display().to_string());
        if let Some(path) = &config_file_path {
            substitutor.set(TAG_CONFIGFILE, path.display().to_string());
        }

        let mut inner = self.inner.write().await;

        if let Some(config_path) = &config_file_path {
            match inner.configuration.get_storage(CONFIG) {
                Ok(storage) => match storage.render_all() {
                    Ok(lines) => {
                        let substituted: Result<Vec<String>, ProcessError> =
                            lines.iter().map(|l| substitutor.substitute(l)).collect();
                        match substituted {
                            Ok(lines) => {
                                if let Err(e) =
                                    std::fs::write(config_path, lines.join("\n"))
                                {
                                    inner.state = ProcessState::Stopped;
                                    return Err(StartFailure::Validation(
                                        ProcessError::ConfigFileWriteError {
                                            detail: Some(e.to_string()),
                                        },
                                    ));
                                }
                            }
                            Err(e) => {
                                inner.state = ProcessState::Stopped;
                                return Err(StartFailure::Validation(e));
                            }
                        }
                    }
                    Err(overseer_options::RenderError::MissingRequired(missing)) => {
                        inner.state = ProcessState::Stopped;
                        return Err(StartFailure::Validation(ProcessError::MissingRequiredOption {
                            detail: Some(missing.join(", ")),
                        }));
                    }
                    Err(overseer_options::RenderError::Format(e)) => {
                        inner.state = ProcessState::Stopped;
                        return Err(StartFailure::Validation(ProcessError::OptionRenderFailed {
                            detail: Some(e.to_string()),
                        }));
                    }
                },
                Err(e) => {
                    inner.state = ProcessState::Stopped;
                    return Err(StartFailure::Validation(e));
                }
            }
        }

        let mut args = self.fixed_args.clone();
        if inner.configuration.has_storage(CMDLINE) {
            let storage = match inner.configuration.get_storage(CMDLINE) {
                Ok(s) => s,
                Err(e) => {
                    inner.state = ProcessState::Stopped;
                    return Err(StartFailure::Validation(e));
                }
            };
            match storage.render_all() {
                Ok(lines) => {
                    for line in lines {
                        match substitutor.substitute(&line) {
                            Ok(rendered) => args.push(rendered),
                            Err(e) => {
                                inner.state = ProcessState::Stopped;
                                return Err(StartFailure::Validation(e));
                            }
                        }
                    }
                }
                Err(overseer_options::RenderError::MissingRequired(missing)) => {
                    inner.state = ProcessState::Stopped;
                    return Err(StartFailure::Validation(ProcessError::MissingRequiredOption {
                        detail: Some(missing.join(", ")),
                    }));
                }
                Err(overseer_options::RenderError::Format(e)) => {
                    inner.state = ProcessState::Stopped;
                    return Err(StartFailure::Validation(ProcessError::OptionRenderFailed {
                        detail: Some(e.to_string()),
                    }));
                }
            }
        }

        let spawn_result = tokio::process::Command::new(&self.executable)
            .args(&args)
            .current_dir(&self.root_path)
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawn_result {
            Ok(child) => child,
            Err(e) => {
                inner.state = ProcessState::Stopped;
                return Err(StartFailure::Spawn(e));
            }
        };

        // A concurrent stop() may have run while the lock was released for
        // the spawn above; it found `child` still `None` and set `Stopping`
        // without signaling anything. Honor that request now rather than
        // resurrecting the process as `Running`.
        let raced_with_stop = inner.state == ProcessState::Stopping;
        if raced_with_stop {
            if let Err(e) = child.start_kill() {
                warn!(process = %self.name, error = %e, "failed to signal freshly spawned child for termination");
            }
        } else {
            inner.state = ProcessState::Running;
        }
        inner.config_file_path = config_file_path;
        inner.log_file_path = Some(log_file_path);

        let wait_handle = child.wait();
        inner.child = Some(child);
        drop(inner);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let wait_result = wait_handle.await;
            this.on_child_exit(wait_result).await;
        });

        if raced_with_stop {
            info!(process = %self.name, uniq, "start raced with a pending stop; killing freshly spawned child");
        } else {
            info!(process = %self.name, uniq, "process started");
        }
        Ok(())
    }

    async fn on_child_exit(&self, wait_result: std::io::Result<std::process::ExitStatus>) {
        let mut inner = self.inner.write().await;
        let unexpected = inner.state != ProcessState::Stopping;
        let (code, error) = match wait_result {
            Ok(status) => (status.code(), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let exit = ExitStatus {
            code,
            unexpected_exit: unexpected,
            error,
        };
        inner.last_exit = Some(exit.clone());
        inner.state = ProcessState::Stopped;
        inner.child = None;
        let handler = inner.stop_handler.take();
        drop(inner);

        if unexpected {
            warn!(process = %self.name, code = ?exit.code, "process exited unexpectedly");
        } else {
            info!(process = %self.name, code = ?exit.code, "process stopped");
        }
        if let Some(handler) = handler {
            handler(exit);
        }
    }

    /// Request termination. The stop-handler passed to `start()` is invoked
    /// exactly once, asynchronously, when the child actually exits.
    #[instrument(skip(self), fields(process = %self.name))]
    pub async fn stop(&self) -> Result<(), ProcessError> {
        let mut inner = self.inner.write().await;
        if inner.state != ProcessState::Running && inner.state != ProcessState::Starting {
            return Err(ProcessError::ProcessNotRunning {
                detail: Some(self.name.clone()),
            });
        }
        inner.state = ProcessState::Stopping;
        if let Some(child) = inner.child.as_mut() {
            if let Err(e) = child.start_kill() {
                warn!(process = %self.name, error = %e, "failed to signal child for termination");
            }
        }
        Ok(())
    }

    /// Set an explicit option value. Fails `cantEditConfigOfRunningProcess`
    /// if `storage_name` is `cmdline`/`config` and the process is running,
    /// or `systemOptionEditForbidden` if the option is a system option.
    pub async fn set_option_value(
        &self,
        storage_name: &str,
        option_name: &str,
        value: OptionValue,
    ) -> Result<(), OverseerError> {
        let mut inner = self.inner.write().await;
        let state = inner.state;
        let storage = inner.configuration.get_storage_mut(storage_name)?;
        let desc = storage
            .scheme()
            .get_option_desc(option_name)
            .map_err(|e| match e {
                OptionError::NotRegistered { detail } => {
                    OverseerError::Process(ProcessError::NoSuchOption { detail })
                }
                other => OverseerError::Option(other),
            })?;
        if desc.is_system() {
            return Err(OverseerError::Process(ProcessError::SystemOptionEditForbidden {
                detail: Some(option_name.to_string()),
            }));
        }
        if (storage_name == CMDLINE || storage_name == CONFIG) && state == ProcessState::Running {
            return Err(OverseerError::Process(
                ProcessError::CantEditConfigOfRunningProcess {
                    detail: Some(option_name.to_string()),
                },
            ));
        }
        storage.set_value(option_name, value)?;
        Ok(())
    }

    pub async fn remove_option_value(
        &self,
        storage_name: &str,
        option_name: &str,
    ) -> Result<(), OverseerError> {
        let mut inner = self.inner.write().await;
        let state = inner.state;
        let storage = inner.configuration.get_storage_mut(storage_name)?;
        let desc = storage
            .scheme()
            .get_option_desc(option_name)
            .map_err(|e| match e {
                OptionError::NotRegistered { detail } => {
                    OverseerError::Process(ProcessError::NoSuchOption { detail })
                }
                other => OverseerError::Option(other),
            })?;
        if desc.is_system() {
            return Err(OverseerError::Process(ProcessError::SystemOptionEditForbidden {
                detail: Some(option_name.to_string()),
            }));
        }
        if (storage_name == CMDLINE || storage_name == CONFIG) && state == ProcessState::Running {
            return Err(OverseerError::Process(
                ProcessError::CantEditConfigOfRunningProcess {
                    detail: Some(option_name.to_string()),
                },
            ));
        }
        storage.remove_value(option_name)?;
        Ok(())
    }

    /// Atomically replace every storage (used by preset application). The
    /// caller is responsible for having already verified `state() ==
    /// Stopped`.
    pub async fn replace_configuration(&self, configuration: ProcessConfiguration) {
        let mut inner = self.inner.write().await;
        inner.configuration = configuration;
    }

    pub async fn with_configuration<R>(&self, f: impl FnOnce(&ProcessConfiguration) -> R) -> R {
        let inner = self.inner.read().await;
        f(&inner.configuration)
    }

    /// Read the current log file line-by-line. Tolerates the file having
    /// been rotated away by a new `start()`: a missing file yields an empty
    /// list rather than an error.
    pub async fn read_log_lines(&self) -> std::io::Result<Vec<String>> {
        let log_path = { self.inner.read().await.log_file_path.clone() };
        let Some(path) = log_path else {
            return Ok(Vec::new());
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content.lines().map(String::from).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// If still running, initiate a stop and await the child before
    /// removing the tracked config/log files. `tokio::sync::RwLock` has no
    /// async `Drop`, so the controller must call this explicitly before
    /// dropping its last `Arc<Process>`.
    pub async fn shutdown(&self) {
        if self.state().await != ProcessState::Stopped {
            let _ = self.stop().await;
            while self.state().await != ProcessState::Stopped {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        }
        let mut inner = self.inner.write().await;
        if let Some(path) = inner.config_file_path.take() {
            let _ = std::fs::remove_file(path);
        }
        if let Some(path) = inner.log_file_path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("executable", &self.executable)
            .finish()
    }
}
