use crate::domain::models::{
    format_hour, hour_of, Activity, BlockKind, PreferredTime, SchedulePatch, ScheduleState,
    SettingsPatch, TimeBlock,
};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

/// One schedule mutation. Commands are applied one at a time by a single
/// logical actor; [`apply`] either returns the full next state or an error
/// message, in which case the current state stands.
#[derive(Debug, Clone)]
pub enum ScheduleCommand {
    AddTimeBlock(TimeBlock),
    RemoveTimeBlock(String),
    UpdateTimeBlock(TimeBlock),
    AddActivity(Activity),
    RemoveActivity(String),
    UpdateActivity(Activity),
    UpdateSettings(SettingsPatch),
    ClearSchedule,
    ImportSchedule(SchedulePatch),
}

pub fn apply(state: &ScheduleState, command: ScheduleCommand) -> Result<ScheduleState, String> {
    match command {
        ScheduleCommand::AddTimeBlock(block) => add_time_block(state, block),
        ScheduleCommand::RemoveTimeBlock(block_id) => Ok(remove_time_block(state, &block_id)),
        ScheduleCommand::UpdateTimeBlock(block) => update_time_block(state, block),
        ScheduleCommand::AddActivity(activity) => add_activity(state, activity),
        ScheduleCommand::RemoveActivity(activity_id) => Ok(remove_activity(state, &activity_id)),
        ScheduleCommand::UpdateActivity(activity) => update_activity(state, activity),
        ScheduleCommand::UpdateSettings(patch) => {
            let mut next = state.clone();
            next.settings = state.settings.apply_patch(&patch);
            Ok(next)
        }
        ScheduleCommand::ClearSchedule => Ok(ScheduleState {
            time_blocks: Vec::new(),
            activities: Vec::new(),
            settings: state.settings.clone(),
        }),
        ScheduleCommand::ImportSchedule(patch) => Ok(import_schedule(state, patch)),
    }
}

fn add_time_block(state: &ScheduleState, mut block: TimeBlock) -> Result<ScheduleState, String> {
    block.validate()?;
    if block.id.trim().is_empty() {
        block.id = next_id("blk");
    }
    let mut next = state.clone();
    next.time_blocks.push(block);
    Ok(next)
}

/// Removing a block never cascades upward: an activity that pointed at it is
/// de-linked and kept.
fn remove_time_block(state: &ScheduleState, block_id: &str) -> ScheduleState {
    let mut next = state.clone();
    next.time_blocks.retain(|block| block.id != block_id);
    for activity in &mut next.activities {
        if activity.time_block_id.as_deref() == Some(block_id) {
            activity.time_block_id = None;
        }
    }
    next
}

fn update_time_block(state: &ScheduleState, mut block: TimeBlock) -> Result<ScheduleState, String> {
    block.validate()?;
    // A directly edited block is assumed occupied.
    block.kind = BlockKind::Occupied;

    let mut next = state.clone();
    for activity in &mut next.activities {
        if activity.time_block_id.as_deref() == Some(block.id.as_str()) {
            if let Some(activity_type) = block.activity_type {
                activity.activity_type = activity_type;
            }
            activity.name = block.title.clone();
            activity.description = block.description.clone();
            activity.preferred_time = Some(PreferredTime {
                start_hour: hour_of(&block.start_time).unwrap_or(0),
                end_hour: hour_of(&block.end_time).unwrap_or(0),
            });
            activity.preferred_days = vec![block.day];
        }
    }
    if let Some(stored) = next
        .time_blocks
        .iter_mut()
        .find(|candidate| candidate.id == block.id)
    {
        *stored = block;
    }
    Ok(next)
}

fn add_activity(state: &ScheduleState, mut activity: Activity) -> Result<ScheduleState, String> {
    activity.validate()?;
    if activity.id.trim().is_empty() {
        activity.id = next_id("act");
    }
    let mut next = state.clone();
    if let Some(block) = materialize_block(&activity) {
        activity.time_block_id = Some(block.id.clone());
        next.time_blocks.push(block);
    }
    next.activities.push(activity);
    Ok(next)
}

/// Removing an activity cascades downward: the one block it owns goes with it.
fn remove_activity(state: &ScheduleState, activity_id: &str) -> ScheduleState {
    let mut next = state.clone();
    let owned_block = next
        .activities
        .iter()
        .find(|activity| activity.id == activity_id)
        .and_then(|activity| activity.time_block_id.clone());
    next.activities.retain(|activity| activity.id != activity_id);
    if let Some(block_id) = owned_block {
        next.time_blocks.retain(|block| block.id != block_id);
    }
    next
}

fn update_activity(state: &ScheduleState, mut activity: Activity) -> Result<ScheduleState, String> {
    activity.validate()?;
    if !state
        .activities
        .iter()
        .any(|candidate| candidate.id == activity.id)
    {
        // Unknown activity: no transition, and in particular no orphan block.
        return Ok(state.clone());
    }

    let mut next = state.clone();
    match activity.time_block_id.clone() {
        Some(block_id) => {
            let block_exists = next
                .time_blocks
                .iter()
                .any(|candidate| candidate.id == block_id);
            let preference = activity
                .preferred_time
                .zip(activity.preferred_days.first().copied());
            match (block_exists, preference) {
                (true, Some((preferred, day))) => {
                    if let Some(block) = next
                        .time_blocks
                        .iter_mut()
                        .find(|candidate| candidate.id == block_id)
                    {
                        block.day = day;
                        block.start_time = format_hour(preferred.start_hour);
                        block.end_time = format_hour(preferred.end_hour);
                        block.title = activity.name.clone();
                        block.description = activity.description.clone();
                        block.activity_type = Some(activity.activity_type);
                        block.kind = BlockKind::Occupied;
                    }
                }
                (true, None) => {
                    // Scheduling preference was dropped; the generated block
                    // has no reason to exist anymore.
                    next.time_blocks.retain(|candidate| candidate.id != block_id);
                    activity.time_block_id = None;
                }
                (false, _) => {
                    // Stale link: store the record, skip the resync step.
                }
            }
        }
        None => {
            if let Some(block) = materialize_block(&activity) {
                activity.time_block_id = Some(block.id.clone());
                next.time_blocks.push(block);
            }
        }
    }

    if let Some(stored) = next
        .activities
        .iter_mut()
        .find(|candidate| candidate.id == activity.id)
    {
        *stored = activity;
    }
    Ok(next)
}

/// The single block generated for an activity with a scheduling preference:
/// first preferred day, zero-padded on-the-hour times, occupied.
fn materialize_block(activity: &Activity) -> Option<TimeBlock> {
    let preferred = activity.preferred_time?;
    let day = *activity.preferred_days.first()?;
    Some(TimeBlock {
        id: next_id("blk"),
        day,
        start_time: format_hour(preferred.start_hour),
        end_time: format_hour(preferred.end_hour),
        kind: BlockKind::Occupied,
        title: activity.name.clone(),
        description: activity.description.clone(),
        location: None,
        activity_type: Some(activity.activity_type),
        color: None,
    })
}

fn import_schedule(state: &ScheduleState, patch: SchedulePatch) -> ScheduleState {
    ScheduleState {
        time_blocks: patch.time_blocks.unwrap_or_else(|| state.time_blocks.clone()),
        activities: patch.activities.unwrap_or_else(|| state.activities.clone()),
        settings: patch.settings.unwrap_or_else(|| state.settings.clone()),
    }
}
