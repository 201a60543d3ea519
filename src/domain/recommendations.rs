use crate::domain::metrics::{
    duration_by_type, total_free, total_occupied, AVAILABLE_HOURS_PER_WEEK,
};
use crate::domain::models::{ActivityType, ScheduleState};

/// Balance warnings for the dashboard, derived from the weekly totals.
pub fn schedule_recommendations(state: &ScheduleState) -> Vec<String> {
    if state.time_blocks.is_empty() {
        return vec![
            "Set up your weekly schedule to get personalized recommendations.".to_string(),
            "Start by adding every class and fixed weekly commitment.".to_string(),
        ];
    }

    let mut recommendations = Vec::new();
    let occupied = total_occupied(state);
    let free = total_free(state);
    let has_activities = !state.activities.is_empty();
    let academic_hours =
        duration_by_type(state, ActivityType::Academic) + duration_by_type(state, ActivityType::Study);
    let exercise_hours = duration_by_type(state, ActivityType::Exercise);
    let rest_hours = duration_by_type(state, ActivityType::Rest);

    if free / AVAILABLE_HOURS_PER_WEEK < 0.15 {
        recommendations.push(
            "Your week is very full. Consider dropping an activity to avoid burning out."
                .to_string(),
        );
    }
    if has_activities && occupied > 0.0 && academic_hours / occupied < 0.30 {
        recommendations.push(
            "Aim to spend at least 30% of your scheduled time on academics and study.".to_string(),
        );
    }
    if has_activities && exercise_hours < 3.0 {
        recommendations.push(
            "Try to fit in at least 3 hours of exercise a week to stay balanced.".to_string(),
        );
    }
    if has_activities && rest_hours < occupied * 0.15 {
        recommendations.push(
            "Schedule more downtime: at least 15% of your occupied hours should be rest."
                .to_string(),
        );
    }
    if academic_hours > 40.0 {
        recommendations.push(
            "Your academic load is heavy. Spread study and rest carefully across the week."
                .to_string(),
        );
    }

    if recommendations.is_empty() {
        recommendations.push("Your weekly distribution looks well balanced!".to_string());
    }
    recommendations
}

/// Study-technique advice keyed to how tight the week is and how study hours
/// compare with class hours.
pub fn study_recommendations(state: &ScheduleState) -> Vec<String> {
    let free = total_free(state);
    let study_hours = duration_by_type(state, ActivityType::Study);
    let academic_hours = duration_by_type(state, ActivityType::Academic);

    if free < 10.0 {
        return vec![
            "Tackle the most demanding subjects when your energy is highest.".to_string(),
            "Use the Pomodoro technique (25 min study / 5 min break) to stay focused."
                .to_string(),
            "Set very specific goals for every study session.".to_string(),
        ];
    }

    if study_hours < academic_hours * 0.5 {
        return vec![
            "Increase your study hours: plan at least 1 hour of study for every 2 hours of class."
                .to_string(),
            "Use spaced repetition to improve retention.".to_string(),
            "Schedule study sessions right after your hardest classes.".to_string(),
        ];
    }

    vec![
        "Your study balance looks right. Keep it consistent.".to_string(),
        "Rotate study techniques to keep sessions engaging.".to_string(),
        "Consider forming study groups for the most demanding subjects.".to_string(),
    ]
}

/// Wellbeing nudges based on how the non-academic categories add up.
pub fn time_management_tips(state: &ScheduleState) -> Vec<String> {
    let exercise_hours = duration_by_type(state, ActivityType::Exercise);
    let rest_hours = duration_by_type(state, ActivityType::Rest);
    let social_hours = duration_by_type(state, ActivityType::Social);

    let mut tips = Vec::new();
    if exercise_hours < 3.0 {
        tips.push(
            "Add at least 3 hours of exercise a week; it sharpens focus and wellbeing."
                .to_string(),
        );
    }
    if rest_hours < 7.0 {
        tips.push(
            "Plan more time for rest and leisure; it is what keeps you productive.".to_string(),
        );
    }
    if social_hours < 4.0 {
        tips.push("Don't underestimate social time; it matters for your wellbeing.".to_string());
    }

    if tips.is_empty() {
        tips.push("Your time across activities looks balanced. Nice work!".to_string());
    }
    tips
}
