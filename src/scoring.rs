use crate::assignments::Assignment;
use crate::data::{DAYS_PER_WEEK, PairIndex, Weekday};
use crate::scheduler::SchedulerContext;

pub const BASE_SCORE: i32 = 50;
pub const HARD_VIOLATION_THRESHOLD: i32 = -100;

pub fn is_hard_violation(score: i32) -> bool {
    score < HARD_VIOLATION_THRESHOLD
}

/// Total score of placing `assignment` at (`day`, `pair`) given the current state.
pub fn score_slot(
    ctx: &SchedulerContext<'_>,
    assignment: &Assignment<'_>,
    day: Weekday,
    pair: PairIndex,
) -> i32 {
    BASE_SCORE
        + assignment.rules.score(day, pair)
        + group_balance(ctx, &assignment.group.id)
        + teacher_balance(ctx, &assignment.teacher.id)
        + day_balance(ctx, day)
}

fn group_balance(ctx: &SchedulerContext<'_>, group_id: &str) -> i32 {
    let progress = ctx.group_progress(group_id);
    let average = ctx.average_group_progress();

    if progress < average - 0.1 {
        50
    } else if progress < average - 0.05 {
        30
    } else if progress > average + 0.1 {
        -40
    } else if progress > average + 0.05 {
        -20
    } else {
        0
    }
}

fn teacher_balance(ctx: &SchedulerContext<'_>, teacher_id: &str) -> i32 {
    let current = f64::from(ctx.teacher_load(teacher_id));
    let average = ctx.lesson_count() as f64 / ctx.teacher_count().max(1) as f64;
    relative_load(current, average, 25, -15)
}

fn day_balance(ctx: &SchedulerContext<'_>, day: Weekday) -> i32 {
    let current = f64::from(ctx.day_load(day));
    let average = ctx.lesson_count() as f64 / DAYS_PER_WEEK as f64;
    relative_load(current, average, 15, -10)
}

fn relative_load(current: f64, average: f64, under: i32, over: i32) -> i32 {
    if current < average * 0.8 {
        under
    } else if current > average * 1.2 {
        over
    } else {
        0
    }
}
