//! Greedy placement of assignments into one representative week.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use log::{debug, trace, warn};

use crate::assignments::Assignment;
use crate::config::GeneratorConfig;
use crate::data::{
    DAYS_PER_WEEK, Group, Lesson, PAIRS_PER_DAY, PairIndex, Room, WeekIndex, Weekday,
    WeeklySchedule, new_id,
};
use crate::scoring;

/// Two group completion ratios closer than this count as equal when ordering.
const PROGRESS_TOLERANCE: f64 = 0.001;

type SlotKey<'a> = (Weekday, PairIndex, &'a str);

/// Mutable state of one generation run. Created per call, never shared.
#[derive(Debug)]
pub struct SchedulerContext<'a> {
    teacher_busy: HashSet<SlotKey<'a>>,
    group_busy: HashSet<SlotKey<'a>>,
    /// Weekly pairs every group needs, over all its assignments.
    group_required: HashMap<&'a str, u32>,
    group_placed: HashMap<&'a str, u32>,
    teacher_placed: HashMap<&'a str, u32>,
    day_placed: [u32; DAYS_PER_WEEK],
    group_ids: Vec<&'a str>,
    teacher_count: usize,
    /// Pairs placed per assignment, by assignment position.
    placed: Vec<u32>,
    lessons: Vec<Lesson>,
}

impl<'a> SchedulerContext<'a> {
    pub fn new(assignments: &[Assignment<'a>], groups: &'a [Group], teacher_count: usize) -> Self {
        let mut group_required: HashMap<&'a str, u32> = HashMap::new();
        for assignment in assignments {
            let required = group_required.entry(assignment.group.id.as_str()).or_default();
            *required = required.saturating_add(assignment.required_pairs);
        }

        Self {
            teacher_busy: HashSet::new(),
            group_busy: HashSet::new(),
            group_required,
            group_placed: HashMap::new(),
            teacher_placed: HashMap::new(),
            day_placed: [0; DAYS_PER_WEEK],
            group_ids: groups.iter().map(|g| g.id.as_str()).collect(),
            teacher_count,
            placed: vec![0; assignments.len()],
            lessons: Vec::new(),
        }
    }

    pub fn is_free(&self, assignment: &Assignment<'a>, day: Weekday, pair: PairIndex) -> bool {
        !self.teacher_busy.contains(&(day, pair, assignment.teacher.id.as_str()))
            && !self.group_busy.contains(&(day, pair, assignment.group.id.as_str()))
    }

    /// Pairs placed so far over pairs required, 0 for a group with no work.
    pub fn group_progress(&self, group_id: &str) -> f64 {
        let required = self.group_required.get(group_id).copied().unwrap_or(0);
        if required == 0 {
            return 0.0;
        }
        f64::from(self.group_load(group_id)) / f64::from(required)
    }

    /// Mean progress over every input group, including groups with no work.
    pub fn average_group_progress(&self) -> f64 {
        if self.group_ids.is_empty() {
            return 0.0;
        }
        let total: f64 = self.group_ids.iter().map(|id| self.group_progress(id)).sum();
        total / self.group_ids.len() as f64
    }

    pub fn group_load(&self, group_id: &str) -> u32 {
        self.group_placed.get(group_id).copied().unwrap_or(0)
    }

    pub fn teacher_load(&self, teacher_id: &str) -> u32 {
        self.teacher_placed.get(teacher_id).copied().unwrap_or(0)
    }

    pub fn day_load(&self, day: Weekday) -> u32 {
        self.day_placed[day.slot()]
    }

    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }

    pub fn teacher_count(&self) -> usize {
        self.teacher_count
    }

    fn remaining(&self, index: usize, assignment: &Assignment<'a>) -> u32 {
        assignment.required_pairs.saturating_sub(self.placed[index])
    }

    pub(crate) fn book(
        &mut self,
        index: usize,
        assignment: &Assignment<'a>,
        day: Weekday,
        pair: PairIndex,
        room: &Room,
    ) {
        let group_id = assignment.group.id.as_str();
        let teacher_id = assignment.teacher.id.as_str();

        self.teacher_busy.insert((day, pair, teacher_id));
        self.group_busy.insert((day, pair, group_id));
        *self.group_placed.entry(group_id).or_default() += 1;
        *self.teacher_placed.entry(teacher_id).or_default() += 1;
        self.day_placed[day.slot()] += 1;
        self.placed[index] += 1;

        self.lessons.push(Lesson {
            id: new_id("l"),
            // corrected when the week is replicated
            week_index: 1,
            weekday: day.number(),
            pair_index: pair,
            group_id: group_id.to_string(),
            subject_id: assignment.subject.id.clone(),
            teacher_id: teacher_id.to_string(),
            room_id: room.id.clone(),
        });
    }

    /// Groups' completion ratios bucketed within `PROGRESS_TOLERANCE`.
    fn progress_ranks(&self) -> HashMap<&'a str, usize> {
        let mut progress: Vec<(&'a str, f64)> = self
            .group_required
            .keys()
            .map(|&id| (id, self.group_progress(id)))
            .collect();
        progress.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut ranks = HashMap::with_capacity(progress.len());
        let mut anchor: Option<f64> = None;
        let mut rank = 0;
        for (id, value) in progress {
            match anchor {
                Some(start) if value - start <= PROGRESS_TOLERANCE => {}
                Some(_) => {
                    rank += 1;
                    anchor = Some(value);
                }
                None => anchor = Some(value),
            }
            ranks.insert(id, rank);
        }
        ranks
    }

    /// Pending assignment indices in placement order.
    pub(crate) fn pending_in_order(&self, assignments: &[Assignment<'a>]) -> Vec<usize> {
        let mut pending: Vec<usize> = (0..assignments.len())
            .filter(|&i| self.remaining(i, &assignments[i]) > 0)
            .collect();
        let ranks = self.progress_ranks();

        pending.sort_by(|&a, &b| {
            let (a, b) = (&assignments[a], &assignments[b]);
            let rank = |x: &Assignment<'a>| ranks.get(x.group.id.as_str()).copied().unwrap_or(0);
            b.has_preference()
                .cmp(&a.has_preference())
                .then_with(|| rank(a).cmp(&rank(b)))
                .then_with(|| self.group_load(&a.group.id).cmp(&self.group_load(&b.group.id)))
                .then_with(|| a.group_index.cmp(&b.group_index))
        });
        pending
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    day: Weekday,
    pair: PairIndex,
    score: i32,
}

/// Result of placing the representative week.
#[derive(Debug)]
pub struct WeekPlacement {
    pub lessons: Vec<Lesson>,
    /// Pairs placed per assignment, by assignment position.
    pub placed: Vec<u32>,
    pub iterations: u32,
    pub timed_out: bool,
}

/// Places the representative week.
///
/// All lessons go to `room`. Under-placed assignments are left as they are;
/// compare `placed` against `required_pairs` to find them.
pub fn place_week<'a>(
    assignments: &[Assignment<'a>],
    groups: &'a [Group],
    teacher_count: usize,
    room: &Room,
    config: &GeneratorConfig,
) -> WeekPlacement {
    let deadline = config.time_budget.map(|budget| Instant::now() + budget);
    let expired = || deadline.is_some_and(|d| Instant::now() >= d);

    let mut ctx = SchedulerContext::new(assignments, groups, teacher_count);
    let mut iterations = 0;
    let mut timed_out = false;

    'passes: while iterations < config.max_iterations {
        let pending = ctx.pending_in_order(assignments);
        if pending.is_empty() {
            break;
        }
        if expired() {
            timed_out = true;
            break;
        }
        iterations += 1;
        let placed_before = ctx.lesson_count();

        for index in pending {
            if expired() {
                timed_out = true;
                break 'passes;
            }
            place_assignment(&mut ctx, index, &assignments[index], room);
        }

        let placed_now = ctx.lesson_count() - placed_before;
        debug!(
            "Pass {}: placed {} lessons ({} in week)",
            iterations,
            placed_now,
            ctx.lesson_count()
        );
        if placed_now == 0 {
            debug!("Pass {} made no progress, stopping", iterations);
            break;
        }
    }

    if timed_out {
        warn!(
            "Placement stopped after {} passes: time budget of {:?} exhausted",
            iterations, config.time_budget
        );
    }

    WeekPlacement {
        lessons: ctx.lessons,
        placed: ctx.placed,
        iterations,
        timed_out,
    }
}

fn place_assignment<'a>(
    ctx: &mut SchedulerContext<'a>,
    index: usize,
    assignment: &Assignment<'a>,
    room: &Room,
) {
    let remaining = ctx.remaining(index, assignment);
    if remaining == 0 {
        return;
    }

    // Scores are taken against the state before this assignment's placements.
    let state: &SchedulerContext<'a> = ctx;
    let mut candidates: Vec<Candidate> = Weekday::ALL
        .into_iter()
        .flat_map(|day| (1..=PAIRS_PER_DAY).map(move |pair| (day, pair)))
        .filter(|&(day, pair)| state.is_free(assignment, day, pair))
        .map(|(day, pair)| Candidate {
            day,
            pair,
            score: scoring::score_slot(state, assignment, day, pair),
        })
        .collect();
    candidates.sort_by(|a, b| b.score.cmp(&a.score));

    let mut placed = 0;
    let mut rejected = 0;
    for candidate in candidates {
        if placed >= remaining {
            break;
        }
        if scoring::is_hard_violation(candidate.score) {
            trace!(
                "Rejected {} pair {} for '{}' ({}): score {}",
                candidate.day,
                candidate.pair,
                assignment.group.name,
                assignment.subject.name,
                candidate.score
            );
            rejected += 1;
            continue;
        }
        if !ctx.is_free(assignment, candidate.day, candidate.pair) {
            continue;
        }
        ctx.book(index, assignment, candidate.day, candidate.pair, room);
        placed += 1;
    }

    if placed < remaining && rejected > 0 {
        warn!(
            "Group '{}' ({}): {} slots rejected as violating preferences of {}",
            assignment.group.name, assignment.subject.name, rejected, assignment.teacher.full_name
        );
    }
}

/// Copies the representative week into weeks `1..=semester_weeks`, each
/// lesson with a fresh id.
pub fn replicate_week(week: &[Lesson], semester_weeks: WeekIndex) -> Vec<WeeklySchedule> {
    (1..=semester_weeks)
        .map(|week_index| WeeklySchedule {
            id: new_id("w"),
            week_index,
            lessons: week
                .iter()
                .map(|lesson| Lesson {
                    id: new_id("l"),
                    week_index,
                    ..lesson.clone()
                })
                .collect(),
        })
        .collect()
}
