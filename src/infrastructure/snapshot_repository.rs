use crate::domain::models::ScheduleState;
use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Durable store for the single schedule snapshot. The serialized form is
/// the `ScheduleState` JSON exactly; loading `None` means no state has ever
/// been saved and the caller starts from defaults.
pub trait SnapshotRepository: Send + Sync {
    fn load(&self) -> Result<Option<ScheduleState>, InfraError>;
    fn save(&self, state: &ScheduleState) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteSnapshotRepository {
    db_path: PathBuf,
}

impl SqliteSnapshotRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn load(&self) -> Result<Option<ScheduleState>, InfraError> {
        let connection = self.connect()?;
        let row: Option<String> = connection
            .query_row(
                "SELECT snapshot FROM schedule_snapshot WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = row else {
            return Ok(None);
        };
        let state: ScheduleState = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    fn save(&self, state: &ScheduleState) -> Result<(), InfraError> {
        let connection = self.connect()?;
        let snapshot = serde_json::to_string(state)?;
        connection.execute(
            "INSERT INTO schedule_snapshot (id, snapshot, saved_at)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
               snapshot = excluded.snapshot,
               saved_at = excluded.saved_at",
            params![snapshot, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    state: Mutex<Option<ScheduleState>>,
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn load(&self) -> Result<Option<ScheduleState>, InfraError> {
        let state = self.state.lock().map_err(|error| {
            InfraError::InvalidConfig(format!("snapshot lock poisoned: {error}"))
        })?;
        Ok(state.clone())
    }

    fn save(&self, state: &ScheduleState) -> Result<(), InfraError> {
        let mut stored = self.state.lock().map_err(|error| {
            InfraError::InvalidConfig(format!("snapshot lock poisoned: {error}"))
        })?;
        *stored = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        Activity, ActivityType, BlockKind, DayOfWeek, Priority, TimeBlock,
    };
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DB: AtomicUsize = AtomicUsize::new(0);

    struct TempDb {
        path: PathBuf,
    }

    impl TempDb {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DB.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!(
                "zenith-snapshot-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&dir).expect("create temp dir");
            let path = dir.join("zenith.sqlite");
            initialize_database(&path).expect("initialize database");
            Self { path }
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            if let Some(parent) = self.path.parent() {
                let _ = fs::remove_dir_all(parent);
            }
        }
    }

    fn sample_state() -> ScheduleState {
        ScheduleState {
            time_blocks: vec![TimeBlock {
                id: "blk-1".to_string(),
                day: DayOfWeek::Lunes,
                start_time: "08:00".to_string(),
                end_time: "10:00".to_string(),
                kind: BlockKind::Occupied,
                title: "Calculus".to_string(),
                description: None,
                location: None,
                activity_type: Some(ActivityType::Academic),
                color: None,
            }],
            activities: vec![Activity {
                id: "act-1".to_string(),
                name: "Gym".to_string(),
                activity_type: ActivityType::Exercise,
                duration: 1.0,
                priority: Priority::Medium,
                description: None,
                preferred_time: None,
                preferred_days: Vec::new(),
                time_block_id: None,
            }],
            ..ScheduleState::default()
        }
    }

    #[test]
    fn sqlite_load_is_none_before_first_save() {
        let db = TempDb::new();
        let repository = SqliteSnapshotRepository::new(&db.path);
        assert!(repository.load().expect("load").is_none());
    }

    #[test]
    fn sqlite_save_then_load_roundtrips_state() {
        let db = TempDb::new();
        let repository = SqliteSnapshotRepository::new(&db.path);
        let state = sample_state();

        repository.save(&state).expect("save snapshot");
        let loaded = repository.load().expect("load snapshot").expect("snapshot present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn sqlite_save_overwrites_previous_snapshot() {
        let db = TempDb::new();
        let repository = SqliteSnapshotRepository::new(&db.path);

        repository.save(&sample_state()).expect("first save");
        let mut updated = sample_state();
        updated.time_blocks.clear();
        repository.save(&updated).expect("second save");

        let loaded = repository.load().expect("load").expect("snapshot present");
        assert!(loaded.time_blocks.is_empty());
        assert_eq!(loaded.activities.len(), 1);
    }

    #[test]
    fn in_memory_repository_roundtrips_state() {
        let repository = InMemorySnapshotRepository::default();
        assert!(repository.load().expect("load").is_none());

        let state = sample_state();
        repository.save(&state).expect("save");
        assert_eq!(repository.load().expect("load"), Some(state));
    }
}
