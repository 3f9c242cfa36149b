use good_lp::solvers::SolutionStatus;
use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
    constraint, default_solver, variable,
};
use log::{debug, info, trace};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::calendar::Horizon;
use crate::data::{
    AllocationRequest, Lever, Outcome, Parameters, Period, Project, Resource, Schedule, Skill,
    SolveStatus, WorkUnit,
};
use crate::error::AllocationError;
use crate::events::RunEvent;
use crate::extract::{SolvedValues, extract_result};
use crate::generator::{generate_pool, generate_work_units};

/// Outcome of one run plus the ordered progress events it produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub outcome: Outcome,
    pub events: Vec<RunEvent>,
}

/// Variables of the load-balancing part of the model.
struct SpreadVars {
    spread: Variable,
    max_load: Variable,
    min_used_load: Variable,
}

/// The assignment problem, ready to hand to the solver.
pub struct AllocationModel {
    variables: ProblemVariables,
    constraints: Vec<Constraint>,
    objective: Expression,
    /// Per work unit: candidate (pool index, assignment variable), in pool order.
    candidates: Vec<Vec<(usize, Variable)>>,
    /// (pool index, period, activation indicator)
    activations: Vec<(usize, Period, Variable)>,
    /// (pool index, total workload, in-use flag) for resources with candidates.
    totals: Vec<(usize, Variable, Variable)>,
    spread: Option<SpreadVars>,
    zero_spread: Variable,
}

impl AllocationModel {
    pub fn assignment_vars(&self) -> usize {
        self.candidates.iter().map(Vec::len).sum()
    }

    pub fn activation_vars(&self) -> usize {
        self.activations.len()
    }

    pub fn tracked_resources(&self) -> usize {
        self.totals.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

/// Builds the cost-minimizing assignment model.
///
/// Skill matching is enforced by only creating assignment variables for
/// matching (class, instructor) pairs. Monthly load uses each class's active
/// months as computed by the horizon, truncated windows included.
pub fn build_model(
    units: &[WorkUnit],
    pool: &[Resource],
    horizon: &Horizon,
    max_spread: i64,
    price: u64,
) -> AllocationModel {
    info!(
        "Setting up allocation model with {} classes, {} candidate instructors and {} months...",
        units.len(),
        pool.len(),
        horizon.len()
    );
    let mut problem = ProblemVariables::new();
    let mut constraints = Vec::new();

    // classes grouped by skill, in input order
    let mut units_by_skill: BTreeMap<Skill, Vec<usize>> = BTreeMap::new();
    for skill in Skill::ALL {
        units_by_skill.insert(skill, Vec::new());
    }
    for (u, unit) in units.iter().enumerate() {
        if let Some(list) = units_by_skill.get_mut(&unit.skill) {
            list.push(u);
        }
    }

    // x_ur = 1 if class u is taught by instructor r
    let mut candidates: Vec<Vec<(usize, Variable)>> = vec![Vec::new(); units.len()];
    let mut assign: BTreeMap<(usize, usize), Variable> = BTreeMap::new();
    for (u, unit) in units.iter().enumerate() {
        for (r, resource) in pool.iter().enumerate() {
            if resource.skill == unit.skill {
                let var = problem.add(variable().binary());
                candidates[u].push((r, var));
                assign.insert((u, r), var);
            }
        }
    }
    trace!(
        "Generated {} assignment variables out of a theoretical maximum of {}.",
        assign.len(),
        units.len() * pool.len()
    );

    debug!("Adding 'exactly one instructor per class' constraints...");
    for options in &candidates {
        let chosen: Expression = options.iter().map(|(_, var)| *var).sum();
        constraints.push(constraint!(chosen == 1));
    }

    // month -> classes running that month, per skill
    let mut running: BTreeMap<(Skill, Period), Vec<usize>> = BTreeMap::new();
    for (u, unit) in units.iter().enumerate() {
        for m in horizon.active_periods(unit.start, unit.duration) {
            running.entry((unit.skill, m)).or_insert_with(Vec::new).push(u);
        }
    }

    debug!("Adding monthly activation and capacity constraints...");
    let mut activations = Vec::new();
    for (r, resource) in pool.iter().enumerate() {
        let capacity = resource.capacity as f64;
        for m in 0..horizon.len() {
            let Some(running_units) = running.get(&(resource.skill, m)) else {
                continue;
            };
            let load: Expression = running_units
                .iter()
                .filter_map(|u| assign.get(&(*u, r)).copied())
                .sum();

            let active = problem.add(variable().binary());
            // load > 0 when active, load == 0 otherwise
            constraints.push(constraint!(load.clone() >= active));
            constraints.push(constraint!(load.clone() <= capacity * active));
            constraints.push(constraint!(load <= capacity));
            activations.push((r, m, active));
        }
    }
    trace!("Generated {} monthly activation indicators.", activations.len());

    debug!("Adding workload totals...");
    let mut totals = Vec::new();
    let mut previous_used: Option<(Skill, Variable)> = None;
    for (r, resource) in pool.iter().enumerate() {
        let skill_units = &units_by_skill[&resource.skill];
        if skill_units.is_empty() {
            continue;
        }
        let bound = skill_units.len() as f64;
        let total = problem.add(variable().integer().min(0).max(bound));
        let used = problem.add(variable().binary());

        let assigned: Expression = skill_units
            .iter()
            .filter_map(|u| assign.get(&(*u, r)).copied())
            .sum();
        constraints.push(constraint!(assigned == total));
        constraints.push(constraint!(total >= used));
        constraints.push(constraint!(total <= bound * used));

        // candidates are interchangeable: use the lowest indices first
        if let Some((skill, prev)) = previous_used {
            if skill == resource.skill {
                constraints.push(constraint!(prev >= used));
            }
        }
        previous_used = Some((resource.skill, used));
        totals.push((r, total, used));
    }

    // stands in for the spread when no instructor has candidates
    let zero_spread = problem.add(variable().integer().min(0).max(0));
    let spread = if totals.is_empty() {
        None
    } else {
        debug!("Adding load spread constraints...");
        let big_m = units_by_skill.values().map(Vec::len).max().unwrap_or(0).max(1) as f64;
        let spread_vars = add_spread(&mut problem, &mut constraints, &totals, big_m);
        let spread = spread_vars.spread;
        constraints.push(constraint!(spread <= max_spread as f64));
        Some(spread_vars)
    };

    let activation_count: Expression = activations.iter().map(|(_, _, var)| *var).sum();
    let objective = price as f64 * activation_count;
    info!("Objective defined: minimize {} x monthly instructor activations.", price);

    AllocationModel {
        variables: problem,
        constraints,
        objective,
        candidates,
        activations,
        totals,
        spread,
        zero_spread,
    }
}

/// spread = max(total) - min(adjusted), where an unused instructor's adjusted
/// load is `max_load` so that idle candidates never define the minimum.
fn add_spread(
    problem: &mut ProblemVariables,
    constraints: &mut Vec<Constraint>,
    totals: &[(usize, Variable, Variable)],
    big_m: f64,
) -> SpreadVars {
    let max_load = problem.add(variable().integer().min(0).max(big_m));
    let min_used_load = problem.add(variable().integer().min(0).max(big_m));
    let spread = problem.add(variable().integer().min(0).max(big_m));

    // max_load == max(total)
    let mut max_selectors = Vec::with_capacity(totals.len());
    for &(_, total, _) in totals {
        let is_max = problem.add(variable().binary());
        constraints.push(constraint!(max_load >= total));
        constraints.push(constraint!(max_load - total + big_m * is_max <= big_m));
        max_selectors.push(is_max);
    }
    let one_max: Expression = max_selectors.iter().copied().sum();
    constraints.push(constraint!(one_max == 1));

    // adjusted == total if used, max_load otherwise; min_used_load == min(adjusted)
    let mut min_selectors = Vec::with_capacity(totals.len());
    for &(_, total, used) in totals {
        let adjusted = problem.add(variable().integer().min(0).max(big_m));
        constraints.push(constraint!(adjusted - total + big_m * used <= big_m));
        constraints.push(constraint!(total - adjusted + big_m * used <= big_m));
        constraints.push(constraint!(adjusted - max_load - big_m * used <= 0));
        constraints.push(constraint!(max_load - adjusted - big_m * used <= 0));

        let is_min = problem.add(variable().binary());
        constraints.push(constraint!(min_used_load <= adjusted));
        constraints.push(constraint!(adjusted - min_used_load + big_m * is_min <= big_m));
        min_selectors.push(is_min);
    }
    let one_min: Expression = min_selectors.iter().copied().sum();
    constraints.push(constraint!(one_min == 1));

    constraints.push(constraint!(spread == max_load - min_used_load));

    SpreadVars {
        spread,
        max_load,
        min_used_load,
    }
}

/// Status and decoded values of one solver call.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub values: Option<SolvedValues>,
}

/// Runs the HiGHS MILP solver on the model within `time_limit_secs`.
///
/// A solution cut short by the time limit counts as feasible only when it
/// assigns every class; otherwise it is reported as `Unknown`.
pub fn solve_model(model: AllocationModel, time_limit_secs: u32) -> Result<SolveResult, AllocationError> {
    let AllocationModel {
        variables,
        constraints,
        objective,
        candidates,
        activations,
        totals,
        spread,
        zero_spread,
    } = model;

    let mut solver = variables
        .minimise(objective)
        .using(default_solver)
        .set_option("time_limit", time_limit_secs as f64)
        .set_option("threads", 1) // limit to 1 thread for reproducibility
        .set_option("random_seed", 1234); //set seed for reproducibility
    for c in constraints {
        solver.add_constraint(c);
    }

    info!("Starting MILP solver with a {}s time limit...", time_limit_secs);
    let solution = match solver.solve() {
        Ok(s) => s,
        Err(e) => {
            return status_for_error(e).map(|status| SolveResult { status, values: None });
        }
    };

    let status = status_for_solution(solution.status());

    // first true candidate in pool order
    let assigned: Vec<Option<usize>> = candidates
        .iter()
        .map(|options| {
            options
                .iter()
                .find(|(_, var)| solution.value(*var) > 0.5)
                .map(|(r, _)| *r)
        })
        .collect();
    if assigned.iter().any(Option::is_none) {
        debug!("Solver returned without assigning every class");
        return Ok(SolveResult {
            status: SolveStatus::Unknown,
            values: None,
        });
    }

    let active: Vec<(usize, Period)> = activations
        .iter()
        .filter(|(_, _, var)| solution.value(*var) > 0.5)
        .map(|(r, m, _)| (*r, *m))
        .collect();
    let workloads: Vec<(usize, u32)> = totals
        .iter()
        .map(|(r, total, _)| (*r, solution.value(*total).round() as u32))
        .collect();
    let (model_spread, model_max_load, model_min_load) = match &spread {
        Some(vars) => (
            solution.value(vars.spread).round() as i64,
            solution.value(vars.max_load).round() as u32,
            solution.value(vars.min_used_load).round() as u32,
        ),
        None => (solution.value(zero_spread).round() as i64, 0, 0),
    };
    trace!(
        "Model spread {} (max load {}, min used load {})",
        model_spread, model_max_load, model_min_load
    );

    Ok(SolveResult {
        status,
        values: Some(SolvedValues {
            assigned: assigned.into_iter().flatten().collect(),
            activations: active,
            workloads,
            model_spread,
        }),
    })
}

/// Maps a failed solve to a run status. HiGHS reports a time or iteration
/// limit hit before any incumbent as `NoSolutionFound` or `Reached...Limit`;
/// those are `UNKNOWN`, anything else is a backend failure.
fn status_for_error(err: ResolutionError) -> Result<SolveStatus, AllocationError> {
    match err {
        ResolutionError::Infeasible => Ok(SolveStatus::Infeasible),
        ResolutionError::Other(reason) if is_limit_without_solution(reason) => Ok(SolveStatus::Unknown),
        ResolutionError::Str(ref reason) if is_limit_without_solution(reason) => Ok(SolveStatus::Unknown),
        other => Err(AllocationError::Backend(other.to_string())),
    }
}

fn is_limit_without_solution(reason: &str) -> bool {
    reason == "NoSolutionFound" || reason.contains("Limit")
}

/// Only a proven optimum is `OPTIMAL`. A solution returned at the time limit
/// or at the gap tolerance is an unproven incumbent and counts as `FEASIBLE`.
fn status_for_solution(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::TimeLimit | SolutionStatus::GapLimit => SolveStatus::Feasible,
    }
}

fn suggestions(status: SolveStatus) -> Vec<Lever> {
    match status {
        SolveStatus::Unknown => vec![Lever::TimeBudget, Lever::SpreadCeiling, Lever::Capacity],
        _ => vec![Lever::SpreadCeiling, Lever::Capacity, Lever::TimeBudget],
    }
}

/// Generates classes and the candidate pool, builds the model, solves it and
/// packages the result.
pub fn solve(
    horizon: &Horizon,
    projects: &[Project],
    schedule: &Schedule,
    params: &Parameters,
) -> Result<AllocationReport, AllocationError> {
    params.validate()?;
    let start_time = Instant::now();
    let mut events = vec![RunEvent::ParametersAccepted {
        capacity: params.capacity,
        max_spread: params.max_spread,
        price: params.price,
        time_limit_secs: params.time_limit_secs,
    }];

    let (units, skipped) = generate_work_units(schedule, projects);
    events.extend(
        skipped
            .into_iter()
            .map(|project| RunEvent::UnknownProject { project }),
    );
    events.push(RunEvent::WorkUnitsCreated { count: units.len() });

    let pool = generate_pool(params.pool_size, params.capacity);
    events.push(RunEvent::PoolCreated { count: pool.len() });

    let model = build_model(&units, &pool, horizon, params.max_spread, params.price);
    events.push(RunEvent::ModelBuilt {
        assignment_vars: model.assignment_vars(),
        activation_vars: model.activation_vars(),
        tracked_resources: model.tracked_resources(),
    });
    trace!("Model holds {} constraints.", model.constraint_count());

    let SolveResult { status, values } = solve_model(model, params.time_limit_secs)?;
    let duration = start_time.elapsed();
    events.push(RunEvent::Solved {
        status,
        elapsed_ms: duration.as_millis() as u64,
    });

    let outcome = match values {
        Some(values) if status.is_accepted() => {
            let result = extract_result(status, &values, units, pool, params.price, params.capacity);
            events.push(RunEvent::Allocated {
                predicted_cost: result.predicted_cost,
                resources_used: result.resources_used,
                realized_spread: result.realized_spread,
            });
            Outcome::Success(result)
        }
        _ => {
            let suggestions = suggestions(status);
            events.push(RunEvent::AllocationFailed {
                status,
                suggestions: suggestions.clone(),
            });
            Outcome::Failure {
                status,
                suggestions,
            }
        }
    };

    Ok(AllocationReport { outcome, events })
}

/// Runs a wire-format request end to end.
pub fn solve_request(request: &AllocationRequest) -> Result<AllocationReport, AllocationError> {
    request.parameters.validate()?;
    let horizon = Horizon::try_from(&request.horizon)?;
    solve(&horizon, &request.projects, &request.schedule, &request.parameters)
}
