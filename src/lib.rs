//! Allocation of monthly classes to a pool of interchangeable instructors.
//!
//! Classes are generated from a flexible schedule, a hypothetical instructor
//! pool is created per skill, and a MILP model picks the assignment that
//! minimizes billed instructor-months under per-month capacity and a ceiling
//! on the workload spread between used instructors.

pub mod calendar;
pub mod data;
pub mod error;
pub mod events;
pub mod extract;
pub mod generator;
pub mod postprocess;
pub mod server;
pub mod solver;

pub use calendar::{Horizon, active_periods};
pub use data::{
    AllocationRequest, AllocationResult, Assignment, Lever, Outcome, Parameters, Project,
    Resource, Schedule, ScheduleEntry, Skill, SolveStatus, WorkUnit,
};
pub use error::{AllocationError, CalendarError, ConfigError};
pub use solver::{AllocationReport, build_model, solve, solve_model, solve_request};
