//! Progress events produced by a run, and the adapter that prints them.

use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;
use std::fmt;

use crate::data::{Lever, SolveStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum RunEvent {
    #[serde(rename_all = "camelCase")]
    ParametersAccepted {
        capacity: u32,
        max_spread: i64,
        price: u64,
        time_limit_secs: u32,
    },
    #[serde(rename_all = "camelCase")]
    UnknownProject { project: String },
    #[serde(rename_all = "camelCase")]
    WorkUnitsCreated { count: usize },
    #[serde(rename_all = "camelCase")]
    PoolCreated { count: usize },
    #[serde(rename_all = "camelCase")]
    ModelBuilt {
        assignment_vars: usize,
        activation_vars: usize,
        tracked_resources: usize,
    },
    #[serde(rename_all = "camelCase")]
    Solved { status: SolveStatus, elapsed_ms: u64 },
    #[serde(rename_all = "camelCase")]
    Allocated {
        predicted_cost: u64,
        resources_used: usize,
        realized_spread: u32,
    },
    #[serde(rename_all = "camelCase")]
    AllocationFailed {
        status: SolveStatus,
        suggestions: Vec<Lever>,
    },
}

impl RunEvent {
    fn is_warning(&self) -> bool {
        matches!(
            self,
            RunEvent::UnknownProject { .. } | RunEvent::AllocationFailed { .. }
        )
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::ParametersAccepted {
                capacity,
                max_spread,
                price,
                time_limit_secs,
            } => write!(
                f,
                "Capacity {capacity} classes/month per instructor, max spread {max_spread}, \
                 price {price} per instructor-month, time limit {time_limit_secs}s"
            ),
            RunEvent::UnknownProject { project } => {
                write!(f, "Schedule references unknown project '{project}', skipped")
            }
            RunEvent::WorkUnitsCreated { count } => write!(f, "Created {count} classes to allocate"),
            RunEvent::PoolCreated { count } => write!(f, "Hypothetical instructor pool: {count}"),
            RunEvent::ModelBuilt {
                assignment_vars,
                activation_vars,
                tracked_resources,
            } => write!(
                f,
                "Model built: {assignment_vars} assignment variables, {activation_vars} monthly \
                 activations, {tracked_resources} instructors with candidates"
            ),
            RunEvent::Solved { status, elapsed_ms } => {
                write!(f, "Solver finished with status {status} after {elapsed_ms} ms")
            }
            RunEvent::Allocated {
                predicted_cost,
                resources_used,
                realized_spread,
            } => write!(
                f,
                "Success: predicted cost {predicted_cost}, {resources_used} instructors, load spread {realized_spread}"
            ),
            RunEvent::AllocationFailed { status, suggestions } => {
                write!(f, "Allocation failed: {status}.")?;
                if !suggestions.is_empty() {
                    write!(f, " Try to {}.", suggestions.iter().join(", or "))?;
                }
                Ok(())
            }
        }
    }
}

/// Writes the events of one run through the `log` facade, in order.
pub fn log_events(events: &[RunEvent]) {
    for event in events {
        if event.is_warning() {
            warn!("{event}");
        } else {
            info!("{event}");
        }
    }
}
