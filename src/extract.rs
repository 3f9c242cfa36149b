use itertools::{Itertools, MinMaxResult};
use log::debug;
use std::collections::BTreeMap;

use crate::data::{AllocationResult, Assignment, Period, Resource, ResourceId, SolveStatus, WorkUnit};

/// Solver values decoded into pool indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedValues {
    /// Pool index of the instructor chosen for each class, in class order.
    pub assigned: Vec<usize>,
    /// (pool index, month) pairs whose activation indicator is set.
    pub activations: Vec<(usize, Period)>,
    /// (pool index, total workload) as seen by the model.
    pub workloads: Vec<(usize, u32)>,
    pub model_spread: i64,
}

/// Packages an accepted solution for reporting.
///
/// The realized spread is recomputed from the assignment counts over the
/// instructors that received at least one class. The predicted cost is
/// `price` times the number of set activation indicators.
pub fn extract_result(
    status: SolveStatus,
    values: &SolvedValues,
    units: Vec<WorkUnit>,
    pool: Vec<Resource>,
    price: u64,
    capacity: u32,
) -> AllocationResult {
    let assignments: Vec<Assignment> = units
        .iter()
        .zip(&values.assigned)
        .map(|(unit, &r)| Assignment {
            work_unit: unit.id.clone(),
            resource: pool[r].id.clone(),
        })
        .collect();

    let mut load_per_resource: BTreeMap<ResourceId, u32> = BTreeMap::new();
    for assignment in &assignments {
        *load_per_resource.entry(assignment.resource.clone()).or_insert(0) += 1;
    }

    let realized_spread = match load_per_resource.values().minmax() {
        MinMaxResult::NoElements | MinMaxResult::OneElement(_) => 0,
        MinMaxResult::MinMax(min, max) => max - min,
    };

    let mut active_periods: BTreeMap<ResourceId, Vec<Period>> = BTreeMap::new();
    for &(r, m) in &values.activations {
        active_periods.entry(pool[r].id.clone()).or_insert_with(Vec::new).push(m);
    }
    for periods in active_periods.values_mut() {
        periods.sort_unstable();
    }

    let predicted_cost = price * values.activations.len() as u64;
    let mismatched = values
        .workloads
        .iter()
        .filter(|(r, w)| load_per_resource.get(&pool[*r].id).copied().unwrap_or(0) != *w)
        .count();
    debug!(
        "Decoded {} assignments; realized spread {}, model spread {}, {} workload mismatches",
        assignments.len(),
        realized_spread,
        values.model_spread,
        mismatched
    );

    AllocationResult {
        status,
        assignments,
        predicted_cost,
        resources_used: load_per_resource.len(),
        load_per_resource,
        realized_spread,
        active_periods,
        work_units: units,
        resources: pool,
        capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Skill;
    use crate::generator::generate_pool;

    fn unit(id: &str, skill: Skill) -> WorkUnit {
        WorkUnit {
            id: id.to_string(),
            project: "P".to_string(),
            skill,
            start: 0,
            duration: 2,
        }
    }

    #[test]
    fn packages_counts_cost_and_spread() {
        // pool: PROG_0..PROG_2 at 0..3, ROBOTICA_0..2 at 3..6
        let pool = generate_pool(3, 2);
        let units = vec![
            unit("a", Skill::Programming),
            unit("b", Skill::Programming),
            unit("c", Skill::Programming),
            unit("d", Skill::Robotics),
        ];
        let values = SolvedValues {
            assigned: vec![0, 0, 1, 3],
            activations: vec![(1, 1), (0, 0), (0, 1), (1, 0), (3, 0), (3, 1)],
            workloads: vec![(0, 2), (1, 1), (2, 0), (3, 1), (4, 0), (5, 0)],
            model_spread: 1,
        };
        let result = extract_result(SolveStatus::Optimal, &values, units, pool, 5000, 2);

        assert_eq!(result.assignments.len(), 4);
        assert_eq!(result.assignments[2].resource, "PROG_1");
        assert_eq!(result.assignments[3].resource, "ROBOTICA_0");
        assert_eq!(result.resources_used, 3);
        assert_eq!(result.load_per_resource["PROG_0"], 2);
        assert_eq!(result.realized_spread, 1);
        assert_eq!(result.predicted_cost, 30_000);
        assert_eq!(result.total_activations(), 6);
        assert_eq!(result.active_periods["PROG_1"], vec![0, 1]);
        assert_eq!(result.capacity, 2);
        assert_eq!(result.resources.len(), 6);
    }

    #[test]
    fn empty_solution_has_zero_spread() {
        let values = SolvedValues {
            assigned: vec![],
            activations: vec![],
            workloads: vec![],
            model_spread: 0,
        };
        let result = extract_result(SolveStatus::Optimal, &values, vec![], generate_pool(1, 1), 100, 1);
        assert_eq!(result.realized_spread, 0);
        assert_eq!(result.resources_used, 0);
        assert_eq!(result.predicted_cost, 0);
    }
}
