use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayOfWeek {
    #[serde(rename = "lunes")]
    Lunes,
    #[serde(rename = "martes")]
    Martes,
    #[serde(rename = "miércoles")]
    Miercoles,
    #[serde(rename = "jueves")]
    Jueves,
    #[serde(rename = "viernes")]
    Viernes,
    #[serde(rename = "sábado")]
    Sabado,
    #[serde(rename = "domingo")]
    Domingo,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Lunes,
        DayOfWeek::Martes,
        DayOfWeek::Miercoles,
        DayOfWeek::Jueves,
        DayOfWeek::Viernes,
        DayOfWeek::Sabado,
        DayOfWeek::Domingo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Lunes => "lunes",
            DayOfWeek::Martes => "martes",
            DayOfWeek::Miercoles => "miércoles",
            DayOfWeek::Jueves => "jueves",
            DayOfWeek::Viernes => "viernes",
            DayOfWeek::Sabado => "sábado",
            DayOfWeek::Domingo => "domingo",
        }
    }

    pub fn from_label(value: &str) -> Option<DayOfWeek> {
        let normalized = value.trim().to_lowercase();
        DayOfWeek::ALL.into_iter().find(|day| day.label() == normalized)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Occupied,
    Free,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Academic,
    Work,
    Study,
    Exercise,
    Rest,
    Social,
    Personal,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 8] = [
        ActivityType::Academic,
        ActivityType::Work,
        ActivityType::Study,
        ActivityType::Exercise,
        ActivityType::Rest,
        ActivityType::Social,
        ActivityType::Personal,
        ActivityType::Other,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A fixed interval on one day of the week. `start_time`/`end_time` are
/// wall-clock `"HH:MM"` strings; an interval whose end precedes its start
/// crosses midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    #[serde(default)]
    pub id: String,
    pub day: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TimeBlock {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "block.title")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreferredTime {
    pub start_hour: u32,
    pub end_hour: u32,
}

/// A user-defined task with a target weekly duration and an optional
/// scheduling preference. An activity that carries both a preferred time and
/// at least one preferred day owns exactly one generated [`TimeBlock`],
/// referenced by `time_block_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub duration: f64,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<PreferredTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_days: Vec<DayOfWeek>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_block_id: Option<String>,
}

impl Activity {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "activity.name")?;
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err("activity.duration must be a non-negative number".to_string());
        }
        Ok(())
    }

    /// Whether the activity asks to be materialized on the weekly grid.
    pub fn wants_block(&self) -> bool {
        self.preferred_time.is_some() && !self.preferred_days.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyTechniques {
    pub pomodoro: bool,
    pub feynman: bool,
    pub spaced: bool,
    pub concept_mapping: bool,
}

impl Default for StudyTechniques {
    fn default() -> Self {
        Self {
            pomodoro: true,
            feynman: false,
            spaced: false,
            concept_mapping: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub study_techniques: StudyTechniques,
    pub minimum_sleep_hours: u32,
    pub break_duration: u32,
    pub maximum_study_session: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            study_techniques: StudyTechniques::default(),
            minimum_sleep_hours: 7,
            break_duration: 15,
            maximum_study_session: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_techniques: Option<StudyTechniques>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_sleep_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_study_session: Option<u32>,
}

impl Settings {
    pub fn apply_patch(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            study_techniques: patch
                .study_techniques
                .clone()
                .unwrap_or_else(|| self.study_techniques.clone()),
            minimum_sleep_hours: patch.minimum_sleep_hours.unwrap_or(self.minimum_sleep_hours),
            break_duration: patch.break_duration.unwrap_or(self.break_duration),
            maximum_study_session: patch
                .maximum_study_session
                .unwrap_or(self.maximum_study_session),
        }
    }
}

/// The full schedule snapshot. This exact serialized form is what the
/// snapshot store persists and restores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleState {
    #[serde(default)]
    pub time_blocks: Vec<TimeBlock>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub settings: Settings,
}

/// A partial snapshot; present sections replace the corresponding section of
/// the current state wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_blocks: Option<Vec<TimeBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

/// Lenient `"HH:MM"` parse. Malformed times are tolerated throughout the
/// schedule; callers fall back to a zero contribution instead of failing.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Fractional hours since midnight, `None` when the string is malformed.
pub fn time_as_hours(value: &str) -> Option<f64> {
    use chrono::Timelike;
    let parsed = parse_hhmm(value)?;
    Some(f64::from(parsed.hour()) + f64::from(parsed.minute()) / 60.0)
}

/// Leading hour of an `"HH:MM"` string, `None` when malformed.
pub fn hour_of(value: &str) -> Option<u32> {
    use chrono::Timelike;
    parse_hhmm(value).map(|parsed| parsed.hour())
}

/// Zero-padded on-the-hour time string, e.g. `18` -> `"18:00"`.
pub fn format_hour(hour: u32) -> String {
    format!("{hour:02}:00")
}
