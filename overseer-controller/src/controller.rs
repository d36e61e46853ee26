use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{instrument, warn};

use overseer_error::{ControllerError, OverseerError, ProcessError};
use overseer_options::{OptionValue, OptionsStorage};
use overseer_presets::{PresetDefinition, Presets};
use overseer_process::{Process, ProcessConfiguration, ProcessState, StartFailure};
use overseer_scheduler::SchedulerHandle;

use crate::bootstrap::{bootstrap, BootstrapError};
use crate::results::{ControllerInfo, ProcessInfo, ProcessLog, ProcessOption, StopProcessResult};

/// The sole public entry point for process-lifecycle and option-manipulation
/// actions (§4.C6). Holds the process registry, the preset store, and a
/// handle to the worker scheduler every action is expected to run on.
///
/// Lock discipline: the registry/preset locks are always acquired and
/// released before a per-process lock is touched — never the other way
/// around. Actions that need both clone the `Arc<Process>`(es) they need
/// out from under the registry lock, drop it, and only then act on the
/// process itself.
pub struct Controller {
    processes: RwLock<HashMap<String, Arc<Process>>>,
    presets: RwLock<Presets>,
    scheduler: SchedulerHandle,
}

impl Controller {
    pub fn new(
        processes: HashMap<String, Arc<Process>>,
        presets: Presets,
        scheduler: SchedulerHandle,
    ) -> Arc<Controller> {
        Arc::new(Controller {
            processes: RwLock::new(processes),
            presets: RwLock::new(presets),
            scheduler,
        })
    }

    /// Build the registry and preset store from configuration, then wrap
    /// them in a `Controller` bound to `scheduler`.
    pub fn from_config(
        config: &overseer_config::OverseerConfig,
        scheduler: SchedulerHandle,
    ) -> Result<Arc<Controller>, BootstrapError> {
        let bootstrapped = bootstrap(config)?;
        Ok(Controller::new(
            bootstrapped.processes,
            bootstrapped.presets,
            scheduler,
        ))
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    async fn find_process(&self, name: &str) -> Result<Arc<Process>, OverseerError> {
        self.processes
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| {
                OverseerError::Controller(ControllerError::ProcessNotFound {
                    detail: Some(name.to_string()),
                })
            })
    }

    pub fn get_controller_info(&self) -> ControllerInfo {
        ControllerInfo {
            pid: std::process::id(),
        }
    }

    pub async fn get_processes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processes.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    #[instrument(skip(self))]
    pub async fn get_process_info(&self, name: &str) -> Result<ProcessInfo, OverseerError> {
        let process = self.find_process(name).await?;
        Ok(ProcessInfo {
            name: process.name().to_string(),
            state: process.state().await,
            configs: process.storage_names().await,
        })
    }

    pub async fn get_process_configs(&self, name: &str) -> Result<Vec<String>, OverseerError> {
        let process = self.find_process(name).await?;
        Ok(process.storage_names().await)
    }

    pub async fn get_process_config(
        &self,
        name: &str,
        storage: &str,
    ) -> Result<Vec<String>, OverseerError> {
        let process = self.find_process(name).await?;
        process
            .with_configuration(|cfg| {
                cfg.get_storage(storage)
                    .map(|s| s.scheme().iter().map(|d| d.name().to_string()).collect())
                    .map_err(OverseerError::Process)
            })
            .await
    }

    pub async fn get_process_option(
        &self,
        name: &str,
        storage: &str,
        option: &str,
    ) -> Result<ProcessOption, OverseerError> {
        let process = self.find_process(name).await?;
        process
            .with_configuration(|cfg| build_process_option(cfg, storage, option))
            .await
    }

    #[instrument(skip(self, value))]
    pub async fn set_process_option(
        &self,
        name: &str,
        storage: &str,
        option: &str,
        value: OptionValue,
    ) -> Result<ProcessOption, OverseerError> {
        let process = self.find_process(name).await?;
        process.set_option_value(storage, option, value).await?;
        process
            .with_configuration(|cfg| build_process_option(cfg, storage, option))
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_process_option(
        &self,
        name: &str,
        storage: &str,
        option: &str,
    ) -> Result<ProcessOption, OverseerError> {
        let process = self.find_process(name).await?;
        process.remove_option_value(storage, option).await?;
        process
            .with_configuration(|cfg| build_process_option(cfg, storage, option))
            .await
    }

    #[instrument(skip(self))]
    pub async fn start_process(&self, name: &str) -> Result<(), OverseerError> {
        let process = self.find_process(name).await?;
        let handler_process_name = process.name().to_string();
        process
            .start(Arc::new(move |exit| {
                if exit.unexpected_exit {
                    warn!(process = %handler_process_name, code = ?exit.code, "process exited unexpectedly");
                }
            }))
            .await
            .map_err(|e| match e {
                StartFailure::Validation(err) => OverseerError::Process(err),
                StartFailure::Spawn(io_err) => OverseerError::Controller(ControllerError::StartProcessError {
                    detail: Some(io_err.to_string()),
                }),
            })
    }

    #[instrument(skip(self))]
    pub async fn stop_process(&self, name: &str) -> Result<StopProcessResult, OverseerError> {
        let process = self.find_process(name).await?;
        process.stop().await.map_err(OverseerError::Process)?;
        Ok(StopProcessResult {
            exit_status: process.last_exit().await,
        })
    }

    pub async fn get_process_log(&self, name: &str) -> Result<ProcessLog, OverseerError> {
        let process = self.find_process(name).await?;
        let lines = process.read_log_lines().await.map_err(|e| {
            OverseerError::Controller(ControllerError::UnknownError {
                detail: Some(e.to_string()),
            })
        })?;
        Ok(ProcessLog { lines })
    }

    pub async fn get_preset_groups(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .presets
            .read()
            .await
            .names()
            .map(String::from)
            .collect();
        names.sort();
        names
    }

    pub async fn get_presets(&self, group: &str) -> Result<PresetDefinition, OverseerError> {
        let presets = self.presets.read().await;
        presets.get(group)?;
        presets
            .to_definitions()
            .into_iter()
            .find(|def| def.name == group)
            .ok_or_else(|| {
                OverseerError::Controller(ControllerError::PresetsNotFound {
                    detail: Some(group.to_string()),
                })
            })
    }

    /// Refuses if any target process isn't `Stopped` (`processIsRunning`)
    /// before mutating any of them — the check pass and the apply pass are
    /// separate so a failure never leaves a partially-applied group.
    #[instrument(skip(self))]
    pub async fn apply_preset_group(&self, group: &str) -> Result<(), OverseerError> {
        let overlay_group = {
            let presets = self.presets.read().await;
            presets.get(group)?.clone()
        };

        let mut targets = Vec::with_capacity(overlay_group.len());
        {
            let processes = self.processes.read().await;
            for (process_name, overlay) in &overlay_group {
                let process = processes.get(process_name).cloned().ok_or_else(|| {
                    OverseerError::Controller(ControllerError::ProcessNotFound {
                        detail: Some(process_name.clone()),
                    })
                })?;
                targets.push((process, overlay.clone()));
            }
        }

        for (process, _) in &targets {
            if process.state().await != ProcessState::Stopped {
                return Err(OverseerError::Controller(ControllerError::ProcessIsRunning {
                    detail: Some(process.name().to_string()),
                }));
            }
        }

        for (process, overlay) in targets {
            let merged = process
                .with_configuration(|cfg| merge_overlay(cfg, &overlay))
                .await?;
            process.replace_configuration(merged).await;
        }

        Ok(())
    }
}

fn build_process_option(
    cfg: &ProcessConfiguration,
    storage_name: &str,
    option_name: &str,
) -> Result<ProcessOption, OverseerError> {
    let storage = cfg.get_storage(storage_name)?;
    let scheme = storage.scheme();
    let desc = scheme
        .get_option_desc(option_name)
        .map_err(|e| map_no_such_option(option_name, e))?;
    let value = storage
        .get_value(option_name)
        .map_err(|e| map_no_such_option(option_name, e))?
        .cloned();
    let rendered = match &value {
        Some(v) => Some(
            scheme
                .format_option(option_name, v)
                .map_err(OverseerError::Option)?,
        ),
        None => None,
    };
    Ok(ProcessOption {
        name: option_name.to_string(),
        required: desc.required(),
        is_list: desc.is_list(),
        is_system: desc.is_system(),
        domain: desc.domain().map(|d| d.to_vec()),
        value,
        rendered,
    })
}

fn map_no_such_option(option_name: &str, err: overseer_error::OptionError) -> OverseerError {
    match err {
        overseer_error::OptionError::NotRegistered { .. } => {
            OverseerError::Process(ProcessError::NoSuchOption {
                detail: Some(option_name.to_string()),
            })
        }
        other => OverseerError::Option(other),
    }
}

/// Per the preset-apply algorithm (§4.C5): for every storage the overlay
/// mentions, assign just the options it explicitly mentions — valued or
/// bare — leaving every other option, and every storage the overlay
/// doesn't mention at all, untouched.
fn merge_overlay(
    current: &ProcessConfiguration,
    overlay: &ProcessConfiguration,
) -> Result<ProcessConfiguration, OverseerError> {
    let mut merged = current.clone();
    for (storage_name, overlay_storage) in overlay.iter() {
        if !merged.has_storage(storage_name) {
            merged.add_storage(
                storage_name.to_string(),
                OptionsStorage::new(Arc::clone(overlay_storage.scheme())),
            );
        }
        let target = merged.get_storage_mut(storage_name)?;
        for (option_name, value) in overlay_storage.iter_assigned() {
            match value {
                Some(value) => target.set_value(option_name, value.clone())?,
                None => target.set_bare(option_name)?,
            }
        }
    }
    Ok(merged)
}
