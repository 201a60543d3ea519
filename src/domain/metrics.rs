use crate::domain::models::{time_as_hours, Activity, ActivityType, BlockKind, ScheduleState, TimeBlock};
use serde::Serialize;

/// Hours per day considered plannable (24 minus an assumed 8-hour sleep
/// block). Every percentage in the app is computed against the same weekly
/// total so free-time and productivity figures agree.
pub const DAILY_AVAILABLE_HOURS: f64 = 16.0;
pub const AVAILABLE_HOURS_PER_WEEK: f64 = DAILY_AVAILABLE_HOURS * 7.0;

/// Categories counted toward the productivity score. Exercise and rest are
/// included: both sustain academic performance.
pub const PRODUCTIVE_TYPES: [ActivityType; 5] = [
    ActivityType::Academic,
    ActivityType::Work,
    ActivityType::Study,
    ActivityType::Exercise,
    ActivityType::Rest,
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeHours {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetrics {
    pub total_occupied: f64,
    pub total_free: f64,
    pub productivity: u32,
    pub duration_by_type: Vec<TypeHours>,
}

/// Length of a block in hours. An end before the start means the interval
/// crosses midnight: `(24 - start) + end`. A block with a malformed time
/// contributes zero rather than poisoning the aggregates.
pub fn duration_of(block: &TimeBlock) -> f64 {
    let (Some(start), Some(end)) = (
        time_as_hours(&block.start_time),
        time_as_hours(&block.end_time),
    ) else {
        return 0.0;
    };
    if end >= start {
        end - start
    } else {
        (24.0 - start) + end
    }
}

pub fn total_occupied(state: &ScheduleState) -> f64 {
    state
        .time_blocks
        .iter()
        .filter(|block| block.kind == BlockKind::Occupied)
        .map(duration_of)
        .sum()
}

pub fn total_free(state: &ScheduleState) -> f64 {
    (AVAILABLE_HOURS_PER_WEEK - total_occupied(state)).max(0.0)
}

/// Weekly hours attributed to one category: occupied blocks tagged with it,
/// plus the declared duration of activities of that category that have no
/// resolvable block (missing or cleared link), multiplied by how many days
/// they are wanted on.
pub fn duration_by_type(state: &ScheduleState, activity_type: ActivityType) -> f64 {
    let block_hours: f64 = state
        .time_blocks
        .iter()
        .filter(|block| {
            block.kind == BlockKind::Occupied && block.activity_type == Some(activity_type)
        })
        .map(duration_of)
        .sum();

    let unscheduled_hours: f64 = state
        .activities
        .iter()
        .filter(|activity| {
            activity.activity_type == activity_type && !has_linked_block(state, activity)
        })
        .map(unscheduled_contribution)
        .sum();

    block_hours + unscheduled_hours
}

/// Share of the available week spent on productive categories, as an integer
/// percentage capped at 100.
pub fn productivity(state: &ScheduleState) -> u32 {
    let productive_hours: f64 = PRODUCTIVE_TYPES
        .iter()
        .map(|activity_type| duration_by_type(state, *activity_type))
        .sum();
    let percentage = (productive_hours / AVAILABLE_HOURS_PER_WEEK) * 100.0;
    (percentage.round() as u32).min(100)
}

pub fn compute_metrics(state: &ScheduleState) -> ScheduleMetrics {
    ScheduleMetrics {
        total_occupied: total_occupied(state),
        total_free: total_free(state),
        productivity: productivity(state),
        duration_by_type: ActivityType::ALL
            .iter()
            .map(|activity_type| TypeHours {
                activity_type: *activity_type,
                hours: duration_by_type(state, *activity_type),
            })
            .collect(),
    }
}

fn has_linked_block(state: &ScheduleState, activity: &Activity) -> bool {
    activity
        .time_block_id
        .as_deref()
        .map(|block_id| state.time_blocks.iter().any(|block| block.id == block_id))
        .unwrap_or(false)
}

fn unscheduled_contribution(activity: &Activity) -> f64 {
    let days = activity.preferred_days.len().max(1) as f64;
    if activity.duration.is_finite() && activity.duration > 0.0 {
        activity.duration * days
    } else {
        0.0
    }
}
