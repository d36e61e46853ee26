use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use overseer_error::OverseerError;
use overseer_options::OptionValue;
use overseer_process::ExitStatus;

use crate::error::{bad_request, ActionError};
use crate::status::ActionId;
use crate::{run_on_scheduler, AppState};

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn controller_info(State(state): State<AppState>) -> Response {
    let controller = state.controller.clone();
    let info = run_on_scheduler(controller.scheduler(), async move {
        controller.get_controller_info()
    })
    .await;
    Json(info).into_response()
}

pub async fn list_processes(State(state): State<AppState>) -> Response {
    let controller = state.controller.clone();
    let names = run_on_scheduler(controller.scheduler(), async move { controller.get_processes().await }).await;
    Json(names).into_response()
}

pub async fn process_info(
    method: Method,
    State(state): State<AppState>,
    Path(process): Path<String>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.get_process_info(&process).await
    })
    .await;
    dispatch(ActionId::ProcessInfo, method, result)
}

pub async fn process_configs(
    method: Method,
    State(state): State<AppState>,
    Path(process): Path<String>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.get_process_configs(&process).await
    })
    .await;
    dispatch(ActionId::ProcessConfigs, method, result)
}

pub async fn process_config(
    method: Method,
    State(state): State<AppState>,
    Path((process, config)): Path<(String, String)>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.get_process_config(&process, &config).await
    })
    .await;
    dispatch(ActionId::ProcessConfig, method, result)
}

pub async fn process_log(
    method: Method,
    State(state): State<AppState>,
    Path(process): Path<String>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move { controller.get_process_log(&process).await }).await;
    dispatch(ActionId::ProcessLog, method, result)
}

pub async fn get_process_option(
    method: Method,
    State(state): State<AppState>,
    Path((process, config, option)): Path<(String, String, String)>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.get_process_option(&process, &config, &option).await
    })
    .await;
    dispatch(ActionId::ProcessOption, method, result)
}

pub async fn set_process_option(
    method: Method,
    State(state): State<AppState>,
    Path((process, config, option)): Path<(String, String, String)>,
    Json(body): Json<OptionBody>,
) -> Response {
    let value = match body.into_option_value() {
        Ok(v) => v,
        Err(msg) => return bad_request(msg),
    };
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.set_process_option(&process, &config, &option, value).await
    })
    .await;
    match dispatch(ActionId::ProcessOption, method, result) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub async fn remove_process_option(
    method: Method,
    State(state): State<AppState>,
    Path((process, config, option)): Path<(String, String, String)>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.remove_process_option(&process, &config, &option).await
    })
    .await;
    dispatch(ActionId::ProcessOption, method, result)
}

pub async fn process_action(
    method: Method,
    State(state): State<AppState>,
    Path(process): Path<String>,
    Json(body): Json<ProcessActionBody>,
) -> Response {
    let controller = state.controller.clone();
    let name = process.clone();
    let result: Result<ProcessActionResult, OverseerError> = match body.action.as_str() {
        "start" => {
            run_on_scheduler(controller.scheduler(), async move {
                controller.start_process(&name).await.map(|_| ProcessActionResult {
                    process: name.clone(),
                    action: "start".to_string(),
                    exit_status: None,
                })
            })
            .await
        }
        "stop" => {
            run_on_scheduler(controller.scheduler(), async move {
                controller.stop_process(&name).await.map(|result| ProcessActionResult {
                    process: name.clone(),
                    action: "stop".to_string(),
                    exit_status: result.exit_status,
                })
            })
            .await
        }
        other => return bad_request(format!("unknown action '{other}', expected 'start' or 'stop'")),
    };
    match dispatch(ActionId::ProcessAction, method, result) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub async fn list_presets(State(state): State<AppState>) -> Response {
    let controller = state.controller.clone();
    let names = run_on_scheduler(controller.scheduler(), async move { controller.get_preset_groups().await }).await;
    Json(names).into_response()
}

pub async fn get_preset_group(
    method: Method,
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Response, ActionError> {
    let controller = state.controller.clone();
    let result = run_on_scheduler(controller.scheduler(), async move { controller.get_presets(&group).await }).await;
    dispatch(ActionId::PresetsGroup, method, result)
}

pub async fn apply_preset_group(
    method: Method,
    State(state): State<AppState>,
    Json(body): Json<ApplyPresetBody>,
) -> Response {
    let controller = state.controller.clone();
    let group = body.name.clone();
    let result = run_on_scheduler(controller.scheduler(), async move {
        controller.apply_preset_group(&group).await.map(|_| ApplyPresetResult {
            name: body.name,
        })
    })
    .await;
    match dispatch(ActionId::Presets, method, result) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

fn dispatch<T: Serialize>(
    action: ActionId,
    method: Method,
    result: Result<T, OverseerError>,
) -> Result<Response, ActionError> {
    match result {
        Ok(value) => Ok(Json(value).into_response()),
        Err(err) => Err(ActionError::new(action, method, err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyPresetBody {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyPresetResult {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessActionBody {
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessActionResult {
    pub process: String,
    pub action: String,
    pub exit_status: Option<ExitStatus>,
}

/// `PUT .../options/<option>` body: either `value` or `array_value`,
/// mutually exclusive. Numbers inside `array_value` are coerced to their
/// decimal string form (§6).
#[derive(Debug, Deserialize)]
pub struct OptionBody {
    pub value: Option<String>,
    pub array_value: Option<Vec<JsonValue>>,
}

impl OptionBody {
    fn into_option_value(self) -> Result<OptionValue, String> {
        match (self.value, self.array_value) {
            (Some(_), Some(_)) => Err("'value' and 'array_value' are mutually exclusive".into()),
            (None, None) => Err("request body must set 'value' or 'array_value'".into()),
            (Some(value), None) => Ok(OptionValue::Single(value)),
            (None, Some(values)) => {
                let mut elements = Vec::with_capacity(values.len());
                for element in values {
                    match element {
                        JsonValue::String(s) => elements.push(s),
                        JsonValue::Number(n) => elements.push(n.to_string()),
                        _ => return Err("'array_value' elements must be strings or numbers".into()),
                    }
                }
                Ok(OptionValue::List(elements))
            }
        }
    }
}
