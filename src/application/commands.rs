use crate::application::bootstrap::bootstrap_workspace;
use crate::domain::metrics::{compute_metrics, ScheduleMetrics};
use crate::domain::models::{
    time_as_hours, Activity, DayOfWeek, SchedulePatch, ScheduleState, Settings, SettingsPatch,
    TimeBlock,
};
use crate::domain::recommendations::{
    schedule_recommendations, study_recommendations, time_management_tips,
};
use crate::domain::schedule::{apply, ScheduleCommand};
use crate::infrastructure::config::load_default_settings;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::snapshot_repository::{SnapshotRepository, SqliteSnapshotRepository};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub struct AppState {
    config_dir: PathBuf,
    database_path: PathBuf,
    logs_dir: PathBuf,
    snapshots: SqliteSnapshotRepository,
    schedule: Mutex<ScheduleState>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config_dir = workspace_root.join("config");
        let logs_dir = workspace_root.join("logs");

        let snapshots = SqliteSnapshotRepository::new(&bootstrap.database_path);
        let schedule = match snapshots.load()? {
            Some(state) => state,
            None => ScheduleState {
                settings: load_default_settings(&config_dir)?,
                ..ScheduleState::default()
            },
        };

        Ok(Self {
            config_dir,
            database_path: bootstrap.database_path,
            logs_dir,
            snapshots,
            schedule: Mutex::new(schedule),
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    /// The snapshot is written before the in-memory state advances; a failed
    /// write leaves both the store and the session on the previous state.
    fn persist(&self, next: &ScheduleState) -> Result<(), InfraError> {
        self.snapshots.save(next)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub schedule: Vec<String>,
    pub study: Vec<String>,
    pub time_management: Vec<String>,
}

pub fn add_time_block_impl(state: &AppState, block: TimeBlock) -> Result<TimeBlock, InfraError> {
    let mut schedule = lock_schedule(state)?;
    let next =
        apply(&schedule, ScheduleCommand::AddTimeBlock(block)).map_err(InfraError::InvalidInput)?;
    let created = next
        .time_blocks
        .last()
        .cloned()
        .ok_or_else(|| InfraError::InvalidInput("block was not stored".to_string()))?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    state.log_info("add_time_block", &format!("added block_id={}", created.id));
    Ok(created)
}

pub fn remove_time_block_impl(state: &AppState, block_id: String) -> Result<bool, InfraError> {
    let block_id = block_id.trim();
    if block_id.is_empty() {
        return Err(InfraError::InvalidInput(
            "block_id must not be empty".to_string(),
        ));
    }

    let mut schedule = lock_schedule(state)?;
    let existed = schedule.time_blocks.iter().any(|block| block.id == block_id);
    let next = apply(&schedule, ScheduleCommand::RemoveTimeBlock(block_id.to_string()))
        .map_err(InfraError::InvalidInput)?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    if existed {
        state.log_info("remove_time_block", &format!("removed block_id={block_id}"));
    }
    Ok(existed)
}

pub fn update_time_block_impl(state: &AppState, mut block: TimeBlock) -> Result<TimeBlock, InfraError> {
    let block_id = block.id.trim().to_string();
    if block_id.is_empty() {
        return Err(InfraError::InvalidInput(
            "block.id must not be empty".to_string(),
        ));
    }
    block.id = block_id.clone();

    let mut schedule = lock_schedule(state)?;
    if !schedule.time_blocks.iter().any(|candidate| candidate.id == block_id) {
        return Err(InfraError::InvalidInput(format!(
            "block not found: {block_id}"
        )));
    }
    let next =
        apply(&schedule, ScheduleCommand::UpdateTimeBlock(block)).map_err(InfraError::InvalidInput)?;
    let updated = next
        .time_blocks
        .iter()
        .find(|candidate| candidate.id == block_id)
        .cloned()
        .ok_or_else(|| InfraError::InvalidInput(format!("block not found: {block_id}")))?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    state.log_info("update_time_block", &format!("updated block_id={block_id}"));
    Ok(updated)
}

pub fn list_time_blocks_impl(
    state: &AppState,
    day: Option<String>,
) -> Result<Vec<TimeBlock>, InfraError> {
    let day_filter = match day.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(label) => Some(DayOfWeek::from_label(label).ok_or_else(|| {
            InfraError::InvalidInput(format!("unknown day label: {label}"))
        })?),
        None => None,
    };

    let schedule = lock_schedule(state)?;
    let mut blocks = schedule
        .time_blocks
        .iter()
        .filter(|block| day_filter.map(|day| block.day == day).unwrap_or(true))
        .cloned()
        .collect::<Vec<_>>();
    blocks.sort_by(|left, right| {
        left.day.cmp(&right.day).then_with(|| {
            time_as_hours(&left.start_time)
                .unwrap_or(0.0)
                .total_cmp(&time_as_hours(&right.start_time).unwrap_or(0.0))
        })
    });
    Ok(blocks)
}

pub fn add_activity_impl(state: &AppState, activity: Activity) -> Result<Activity, InfraError> {
    let mut schedule = lock_schedule(state)?;
    let next =
        apply(&schedule, ScheduleCommand::AddActivity(activity)).map_err(InfraError::InvalidInput)?;
    let created = next
        .activities
        .last()
        .cloned()
        .ok_or_else(|| InfraError::InvalidInput("activity was not stored".to_string()))?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    state.log_info("add_activity", &format!("added activity_id={}", created.id));
    Ok(created)
}

pub fn remove_activity_impl(state: &AppState, activity_id: String) -> Result<bool, InfraError> {
    let activity_id = activity_id.trim();
    if activity_id.is_empty() {
        return Err(InfraError::InvalidInput(
            "activity_id must not be empty".to_string(),
        ));
    }

    let mut schedule = lock_schedule(state)?;
    let existed = schedule
        .activities
        .iter()
        .any(|activity| activity.id == activity_id);
    let next = apply(
        &schedule,
        ScheduleCommand::RemoveActivity(activity_id.to_string()),
    )
    .map_err(InfraError::InvalidInput)?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    if existed {
        state.log_info(
            "remove_activity",
            &format!("removed activity_id={activity_id}"),
        );
    }
    Ok(existed)
}

pub fn update_activity_impl(state: &AppState, mut activity: Activity) -> Result<Activity, InfraError> {
    let activity_id = activity.id.trim().to_string();
    if activity_id.is_empty() {
        return Err(InfraError::InvalidInput(
            "activity.id must not be empty".to_string(),
        ));
    }
    activity.id = activity_id.clone();

    let mut schedule = lock_schedule(state)?;
    if !schedule
        .activities
        .iter()
        .any(|candidate| candidate.id == activity_id)
    {
        return Err(InfraError::InvalidInput(format!(
            "activity not found: {activity_id}"
        )));
    }
    let next =
        apply(&schedule, ScheduleCommand::UpdateActivity(activity)).map_err(InfraError::InvalidInput)?;
    let updated = next
        .activities
        .iter()
        .find(|candidate| candidate.id == activity_id)
        .cloned()
        .ok_or_else(|| InfraError::InvalidInput(format!("activity not found: {activity_id}")))?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    state.log_info(
        "update_activity",
        &format!("updated activity_id={activity_id}"),
    );
    Ok(updated)
}

pub fn list_activities_impl(state: &AppState) -> Result<Vec<Activity>, InfraError> {
    let schedule = lock_schedule(state)?;
    Ok(schedule.activities.clone())
}

pub fn update_settings_impl(
    state: &AppState,
    patch: SettingsPatch,
) -> Result<Settings, InfraError> {
    let mut schedule = lock_schedule(state)?;
    let next =
        apply(&schedule, ScheduleCommand::UpdateSettings(patch)).map_err(InfraError::InvalidInput)?;
    let settings = next.settings.clone();
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    state.log_info("update_settings", "merged settings patch");
    Ok(settings)
}

pub fn clear_schedule_impl(state: &AppState) -> Result<(), InfraError> {
    let mut schedule = lock_schedule(state)?;
    let next = apply(&schedule, ScheduleCommand::ClearSchedule).map_err(InfraError::InvalidInput)?;
    state.persist(&next)?;
    *schedule = next;
    drop(schedule);

    state.log_info("clear_schedule", "cleared blocks and activities");
    Ok(())
}

pub fn import_schedule_impl(
    state: &AppState,
    patch: SchedulePatch,
) -> Result<ScheduleState, InfraError> {
    let mut schedule = lock_schedule(state)?;
    let next =
        apply(&schedule, ScheduleCommand::ImportSchedule(patch)).map_err(InfraError::InvalidInput)?;
    state.persist(&next)?;
    *schedule = next.clone();
    drop(schedule);

    state.log_info(
        "import_schedule",
        &format!(
            "imported snapshot blocks={} activities={}",
            next.time_blocks.len(),
            next.activities.len()
        ),
    );
    Ok(next)
}

pub fn get_schedule_impl(state: &AppState) -> Result<ScheduleState, InfraError> {
    let schedule = lock_schedule(state)?;
    Ok(schedule.clone())
}

pub fn get_metrics_impl(state: &AppState) -> Result<ScheduleMetrics, InfraError> {
    let schedule = lock_schedule(state)?;
    Ok(compute_metrics(&schedule))
}

pub fn get_recommendations_impl(state: &AppState) -> Result<RecommendationsResponse, InfraError> {
    let schedule = lock_schedule(state)?;
    Ok(RecommendationsResponse {
        schedule: schedule_recommendations(&schedule),
        study: study_recommendations(&schedule),
        time_management: time_management_tips(&schedule),
    })
}

fn lock_schedule(state: &AppState) -> Result<MutexGuard<'_, ScheduleState>, InfraError> {
    state
        .schedule
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("schedule lock poisoned: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::AVAILABLE_HOURS_PER_WEEK;
    use crate::domain::models::{ActivityType, BlockKind, PreferredTime, Priority};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "zenith-command-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }

        fn app_state(&self) -> AppState {
            AppState::new(self.path.clone()).expect("initialize app state")
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn class_block() -> TimeBlock {
        TimeBlock {
            id: String::new(),
            day: DayOfWeek::Lunes,
            start_time: "08:00".to_string(),
            end_time: "10:00".to_string(),
            kind: BlockKind::Occupied,
            title: "Calculus".to_string(),
            description: None,
            location: Some("Room B12".to_string()),
            activity_type: Some(ActivityType::Academic),
            color: None,
        }
    }

    fn gym_activity() -> Activity {
        Activity {
            id: String::new(),
            name: "Gym".to_string(),
            activity_type: ActivityType::Exercise,
            duration: 1.0,
            priority: Priority::Medium,
            description: None,
            preferred_time: Some(PreferredTime {
                start_hour: 18,
                end_hour: 19,
            }),
            preferred_days: vec![DayOfWeek::Martes],
            time_block_id: None,
        }
    }

    #[test]
    fn new_workspace_starts_with_default_settings() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        assert!(state.config_dir().join("settings.json").exists());

        let schedule = get_schedule_impl(&state).expect("get schedule");
        assert!(schedule.time_blocks.is_empty());
        assert!(schedule.activities.is_empty());
        assert_eq!(schedule.settings, Settings::default());
    }

    #[test]
    fn add_time_block_rejects_blank_title() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let mut block = class_block();
        block.title = "  ".to_string();
        assert!(add_time_block_impl(&state, block).is_err());
    }

    #[test]
    fn add_and_list_time_blocks_roundtrip() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let mut evening = class_block();
        evening.day = DayOfWeek::Lunes;
        evening.start_time = "19:00".to_string();
        evening.end_time = "21:00".to_string();
        evening.title = "Lab".to_string();
        let _ = add_time_block_impl(&state, evening).expect("add evening block");
        let created = add_time_block_impl(&state, class_block()).expect("add morning block");
        assert!(!created.id.is_empty());

        let listed = list_time_blocks_impl(&state, Some("lunes".to_string())).expect("list blocks");
        assert_eq!(listed.len(), 2);
        // Sorted by start time within the day.
        assert_eq!(listed[0].title, "Calculus");
        assert_eq!(listed[1].title, "Lab");
    }

    #[test]
    fn list_time_blocks_rejects_unknown_day_label() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        assert!(list_time_blocks_impl(&state, Some("funday".to_string())).is_err());
    }

    #[test]
    fn add_activity_creates_linked_block_and_counts_in_metrics() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let created = add_activity_impl(&state, gym_activity()).expect("add activity");
        let block_id = created.time_block_id.clone().expect("activity owns a block");

        let blocks = list_time_blocks_impl(&state, Some("martes".to_string())).expect("list");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, block_id);
        assert_eq!(blocks[0].start_time, "18:00");
        assert_eq!(blocks[0].end_time, "19:00");
        assert_eq!(blocks[0].activity_type, Some(ActivityType::Exercise));

        let metrics = get_metrics_impl(&state).expect("metrics");
        let exercise = metrics
            .duration_by_type
            .iter()
            .find(|entry| entry.activity_type == ActivityType::Exercise)
            .expect("exercise entry");
        assert_eq!(exercise.hours, 1.0);
        assert_eq!(metrics.total_occupied, 1.0);
    }

    #[test]
    fn remove_activity_cascades_to_owned_block() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let created = add_activity_impl(&state, gym_activity()).expect("add activity");

        let removed = remove_activity_impl(&state, created.id).expect("remove activity");
        assert!(removed);
        let blocks = list_time_blocks_impl(&state, None).expect("list blocks");
        assert!(blocks.is_empty());
    }

    #[test]
    fn remove_time_block_delinks_owning_activity() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let created = add_activity_impl(&state, gym_activity()).expect("add activity");
        let block_id = created.time_block_id.expect("linked block");

        let removed = remove_time_block_impl(&state, block_id).expect("remove block");
        assert!(removed);

        let activities = list_activities_impl(&state).expect("list activities");
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].time_block_id, None);
    }

    #[test]
    fn update_activity_resyncs_its_block() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let mut created = add_activity_impl(&state, gym_activity()).expect("add activity");

        created.name = "Swimming".to_string();
        created.preferred_time = Some(PreferredTime {
            start_hour: 7,
            end_hour: 8,
        });
        created.preferred_days = vec![DayOfWeek::Jueves];
        let updated = update_activity_impl(&state, created).expect("update activity");

        let blocks = list_time_blocks_impl(&state, Some("jueves".to_string())).expect("list");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title, "Swimming");
        assert_eq!(blocks[0].start_time, "07:00");
        assert_eq!(blocks[0].id, updated.time_block_id.expect("still linked"));
    }

    #[test]
    fn update_activity_requires_known_id() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let mut ghost = gym_activity();
        ghost.id = "act-ghost".to_string();
        assert!(update_activity_impl(&state, ghost).is_err());
    }

    #[test]
    fn update_time_block_requires_known_id() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let mut block = class_block();
        block.id = "blk-ghost".to_string();
        assert!(update_time_block_impl(&state, block).is_err());
    }

    #[test]
    fn state_survives_app_restart() {
        let workspace = TempWorkspace::new();
        {
            let state = workspace.app_state();
            let _ = add_activity_impl(&state, gym_activity()).expect("add activity");
            let _ = update_settings_impl(
                &state,
                SettingsPatch {
                    minimum_sleep_hours: Some(9),
                    ..SettingsPatch::default()
                },
            )
            .expect("update settings");
        }

        let reopened = workspace.app_state();
        let schedule = get_schedule_impl(&reopened).expect("get schedule");
        assert_eq!(schedule.activities.len(), 1);
        assert_eq!(schedule.time_blocks.len(), 1);
        assert_eq!(schedule.settings.minimum_sleep_hours, 9);
    }

    #[test]
    fn clear_schedule_keeps_settings_and_persists() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let _ = add_time_block_impl(&state, class_block()).expect("add block");
        let _ = update_settings_impl(
            &state,
            SettingsPatch {
                break_duration: Some(25),
                ..SettingsPatch::default()
            },
        )
        .expect("update settings");

        clear_schedule_impl(&state).expect("clear schedule");
        let schedule = get_schedule_impl(&state).expect("get schedule");
        assert!(schedule.time_blocks.is_empty());
        assert_eq!(schedule.settings.break_duration, 25);

        let reopened = workspace.app_state();
        let restored = get_schedule_impl(&reopened).expect("get schedule");
        assert!(restored.time_blocks.is_empty());
        assert_eq!(restored.settings.break_duration, 25);
    }

    #[test]
    fn import_schedule_replaces_present_sections_only() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let _ = add_activity_impl(&state, gym_activity()).expect("add activity");

        let mut replacement = class_block();
        replacement.id = "blk-import".to_string();
        let imported = import_schedule_impl(
            &state,
            SchedulePatch {
                time_blocks: Some(vec![replacement]),
                activities: None,
                settings: None,
            },
        )
        .expect("import schedule");

        assert_eq!(imported.time_blocks.len(), 1);
        assert_eq!(imported.time_blocks[0].id, "blk-import");
        assert_eq!(imported.activities.len(), 1);
    }

    #[test]
    fn metrics_expose_free_time_complement() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let _ = add_time_block_impl(&state, class_block()).expect("add block");

        let metrics = get_metrics_impl(&state).expect("metrics");
        assert_eq!(metrics.total_occupied, 2.0);
        assert_eq!(metrics.total_free, AVAILABLE_HOURS_PER_WEEK - 2.0);
        assert!(metrics.productivity <= 100);
    }

    #[test]
    fn recommendations_cover_all_three_sections() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let response = get_recommendations_impl(&state).expect("recommendations");
        assert!(!response.schedule.is_empty());
        assert!(!response.study.is_empty());
        assert!(!response.time_management.is_empty());
        // An empty schedule asks the user to set it up first.
        assert!(response.schedule[0].contains("Set up"));
    }

    #[test]
    fn database_file_lives_under_state_dir() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        assert!(state.database_path().starts_with(&workspace.path));
        assert!(state.database_path().ends_with("state/zenith.sqlite"));
    }
}
