use serde::Serialize;

use crate::domain::project::Project;
use crate::domain::ticket::iteration_label;
use crate::domain::ticket_set::TicketSet;
use crate::services::report_yaml::{ticket_rows, TicketRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationMix {
    pub iteration: u32,
    pub delivered: usize,
    /// Fractions of the delivered tickets; absent when nothing was delivered.
    pub planned: Option<f64>,
    pub sidetracked: Option<f64>,
    pub accumulated: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningReport {
    pub iteration: u32,
    /// Iterations before the current one that had tickets planned for them.
    pub planned_iterations: Vec<u32>,
    pub completed: usize,
    /// Share of the planned tickets no longer active, in whole percent.
    /// Absent when nothing was planned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_completed: Option<usize>,
    /// Share of the planned tickets accepted within the iteration, in whole
    /// percent. Absent when nothing was planned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_delivered_in_time: Option<usize>,
    pub planned: Vec<TicketRow>,
    /// Completed tickets created during the iteration without being planned.
    pub sidetracked: Vec<TicketRow>,
    /// Completed tickets created before the iteration without being planned.
    pub accumulated: Vec<TicketRow>,
    pub history: Vec<IterationMix>,
}

/// How the work completed in `iteration` relates to what was planned for it,
/// plus the same split for each past iteration from `iteration_start`.
///
/// Returns `None` when `iteration` lies beyond any representable date.
pub fn build_planning_followup(
    project: &Project,
    iteration: u32,
    iteration_start: u32,
) -> Option<PlanningReport> {
    let stories = project.stories();
    let label = iteration_label(iteration);
    let (start, end) = project.iteration_window(i64::from(iteration))?;

    let completed = stories.query_accepted_between(start, end);
    let planned = stories.query_label_substring(&label);
    let sidetracked = completed
        .query_created_between(start, end)
        .query_not_label_substring(&label);
    let accumulated = completed
        .query_created_between(project.start(), start)
        .query_not_label_substring(&label);
    let percent_of_planned = |count: usize| (!planned.is_empty()).then(|| count * 100 / planned.len());
    let percent_completed = percent_of_planned(planned.len() - planned.query_active().len());
    let percent_delivered_in_time = percent_of_planned(completed.query_label_substring(&label).len());

    let planned_iterations = (0..project.current_iteration())
        .filter(|number| !stories.query_label_substring(&iteration_label(*number)).is_empty())
        .collect();
    let history = (iteration_start.max(1)..project.current_iteration())
        .map(|number| iteration_mix(project, stories, number))
        .collect();

    Some(PlanningReport {
        iteration,
        planned_iterations,
        completed: completed.len(),
        percent_completed,
        percent_delivered_in_time,
        planned: ticket_rows(&planned),
        sidetracked: ticket_rows(&sidetracked),
        accumulated: ticket_rows(&accumulated),
        history,
    })
}

fn iteration_mix(project: &Project, stories: &TicketSet, iteration: u32) -> IterationMix {
    let label = iteration_label(iteration);
    let Some((start, end)) = project.iteration_window(i64::from(iteration)) else {
        return IterationMix {
            iteration,
            delivered: 0,
            planned: None,
            sidetracked: None,
            accumulated: None,
        };
    };
    let delivered = stories.query_accepted_between(start, end);
    let total = delivered.len();
    if total == 0 {
        return IterationMix {
            iteration,
            delivered: 0,
            planned: None,
            sidetracked: None,
            accumulated: None,
        };
    }

    let planned = delivered.query_label_substring(&label).len();
    let sidetracked = delivered
        .query_not_label_substring(&label)
        .query_created_between(start, end)
        .len();
    let accumulated = total - planned - sidetracked;
    let share = |count: usize| Some(count as f64 / total as f64);

    IterationMix {
        iteration,
        delivered: total,
        planned: share(planned),
        sidetracked: share(sidetracked),
        accumulated: share(accumulated),
    }
}
