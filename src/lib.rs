mod application;
mod domain;
mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    add_activity_impl, add_time_block_impl, clear_schedule_impl, get_metrics_impl,
    get_recommendations_impl, get_schedule_impl, import_schedule_impl, list_activities_impl,
    list_time_blocks_impl, remove_activity_impl, remove_time_block_impl, update_activity_impl,
    update_settings_impl, update_time_block_impl, AppState, RecommendationsResponse,
};
use domain::metrics::ScheduleMetrics;
use domain::models::{Activity, SchedulePatch, ScheduleState, Settings, SettingsPatch, TimeBlock};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct BootstrapResponse {
    workspace_root: String,
    database_path: String,
}

#[tauri::command]
fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

#[tauri::command]
fn ping() -> &'static str {
    "pong"
}

#[tauri::command]
fn add_time_block(
    state: tauri::State<'_, AppState>,
    block: TimeBlock,
) -> Result<TimeBlock, String> {
    add_time_block_impl(state.inner(), block)
        .map_err(|error| state.command_error("add_time_block", &error))
}

#[tauri::command]
fn remove_time_block(state: tauri::State<'_, AppState>, block_id: String) -> Result<bool, String> {
    remove_time_block_impl(state.inner(), block_id)
        .map_err(|error| state.command_error("remove_time_block", &error))
}

#[tauri::command]
fn update_time_block(
    state: tauri::State<'_, AppState>,
    block: TimeBlock,
) -> Result<TimeBlock, String> {
    update_time_block_impl(state.inner(), block)
        .map_err(|error| state.command_error("update_time_block", &error))
}

#[tauri::command]
fn list_time_blocks(
    state: tauri::State<'_, AppState>,
    day: Option<String>,
) -> Result<Vec<TimeBlock>, String> {
    list_time_blocks_impl(state.inner(), day)
        .map_err(|error| state.command_error("list_time_blocks", &error))
}

#[tauri::command]
fn add_activity(
    state: tauri::State<'_, AppState>,
    activity: Activity,
) -> Result<Activity, String> {
    add_activity_impl(state.inner(), activity)
        .map_err(|error| state.command_error("add_activity", &error))
}

#[tauri::command]
fn remove_activity(
    state: tauri::State<'_, AppState>,
    activity_id: String,
) -> Result<bool, String> {
    remove_activity_impl(state.inner(), activity_id)
        .map_err(|error| state.command_error("remove_activity", &error))
}

#[tauri::command]
fn update_activity(
    state: tauri::State<'_, AppState>,
    activity: Activity,
) -> Result<Activity, String> {
    update_activity_impl(state.inner(), activity)
        .map_err(|error| state.command_error("update_activity", &error))
}

#[tauri::command]
fn list_activities(state: tauri::State<'_, AppState>) -> Result<Vec<Activity>, String> {
    list_activities_impl(state.inner())
        .map_err(|error| state.command_error("list_activities", &error))
}

#[tauri::command]
fn update_settings(
    state: tauri::State<'_, AppState>,
    patch: SettingsPatch,
) -> Result<Settings, String> {
    update_settings_impl(state.inner(), patch)
        .map_err(|error| state.command_error("update_settings", &error))
}

#[tauri::command]
fn clear_schedule(state: tauri::State<'_, AppState>) -> Result<(), String> {
    clear_schedule_impl(state.inner())
        .map_err(|error| state.command_error("clear_schedule", &error))
}

#[tauri::command]
fn import_schedule(
    state: tauri::State<'_, AppState>,
    patch: SchedulePatch,
) -> Result<ScheduleState, String> {
    import_schedule_impl(state.inner(), patch)
        .map_err(|error| state.command_error("import_schedule", &error))
}

#[tauri::command]
fn get_schedule(state: tauri::State<'_, AppState>) -> Result<ScheduleState, String> {
    get_schedule_impl(state.inner()).map_err(|error| state.command_error("get_schedule", &error))
}

#[tauri::command]
fn get_metrics(state: tauri::State<'_, AppState>) -> Result<ScheduleMetrics, String> {
    get_metrics_impl(state.inner()).map_err(|error| state.command_error("get_metrics", &error))
}

#[tauri::command]
fn get_recommendations(
    state: tauri::State<'_, AppState>,
) -> Result<RecommendationsResponse, String> {
    get_recommendations_impl(state.inner())
        .map_err(|error| state.command_error("get_recommendations", &error))
}

pub fn run() {
    let workspace_root = std::env::current_dir().expect("failed to resolve current directory");
    let app_state = AppState::new(workspace_root).expect("failed to initialize app state");

    tauri::Builder::default()
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            ping,
            bootstrap,
            add_time_block,
            remove_time_block,
            update_time_block,
            list_time_blocks,
            add_activity,
            remove_activity,
            update_activity,
            list_activities,
            update_settings,
            clear_schedule,
            import_schedule,
            get_schedule,
            get_metrics,
            get_recommendations
        ])
        .run(tauri::generate_context!())
        .expect("failed to run tauri app");
}
