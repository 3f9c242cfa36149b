//! Read-only views over an `AllocationResult` for presentation.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::calendar::Horizon;
use crate::data::{AllocationResult, Resource, ResourceId, Skill, WorkUnitId};

/// Marks a project split into waves, e.g. `Alpha_Onda2`.
pub const WAVE_SUFFIX: &str = "_Onda";

/// Project name without its wave suffix.
pub fn base_project(name: &str) -> &str {
    name.split(WAVE_SUFFIX).next().unwrap_or(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenumberedAssignment {
    pub work_unit: WorkUnitId,
    pub resource: Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Renumbering {
    pub assignments: Vec<RenumberedAssignment>,
    pub count_per_skill: BTreeMap<Skill, usize>,
}

/// Gives the instructors that received classes consecutive ids (`PROG_1`,
/// `PROG_2`, ..., `ROB_1`, ...) ordered by skill then pool index.
pub fn renumber_active(result: &AllocationResult) -> Renumbering {
    let used: BTreeSet<&str> = result.assignments.iter().map(|a| a.resource.as_str()).collect();
    let mut active: Vec<&Resource> = result
        .resources
        .iter()
        .filter(|r| used.contains(r.id.as_str()))
        .collect();
    active.sort_by_key(|r| (r.skill, r.index));

    let mut count_per_skill: BTreeMap<Skill, usize> = BTreeMap::new();
    let mut renamed: BTreeMap<&str, Resource> = BTreeMap::new();
    for resource in active {
        let count = count_per_skill.entry(resource.skill).or_insert(0);
        *count += 1;
        renamed.insert(
            resource.id.as_str(),
            Resource {
                id: format!("{}_{}", resource.skill.prefix(), count),
                ..resource.clone()
            },
        );
    }

    let assignments = result
        .assignments
        .iter()
        .filter_map(|a| {
            renamed.get(a.resource.as_str()).map(|resource| RenumberedAssignment {
                work_unit: a.work_unit.clone(),
                resource: resource.clone(),
            })
        })
        .collect();

    Renumbering {
        assignments,
        count_per_skill,
    }
}

/// Distinct instructors per base project and skill.
pub fn instructors_per_project(result: &AllocationResult) -> BTreeMap<String, BTreeMap<Skill, usize>> {
    let mut seen: BTreeMap<String, BTreeMap<Skill, BTreeSet<&str>>> = BTreeMap::new();
    for assignment in &result.assignments {
        let Some(unit) = result.work_unit(&assignment.work_unit) else {
            continue;
        };
        let per_skill = seen
            .entry(base_project(&unit.project).to_string())
            .or_insert_with(BTreeMap::new);
        for skill in Skill::ALL {
            per_skill.entry(skill).or_insert_with(BTreeSet::new);
        }
        if let Some(ids) = per_skill.get_mut(&unit.skill) {
            ids.insert(assignment.resource.as_str());
        }
    }

    seen.into_iter()
        .map(|(project, per_skill)| {
            let counts = per_skill.into_iter().map(|(skill, ids)| (skill, ids.len())).collect();
            (project, counts)
        })
        .collect()
}

/// Monthly cost per base project: `price` for each distinct instructor
/// working on the project in that month, keyed by month label.
pub fn cash_flow_by_project(
    result: &AllocationResult,
    horizon: &Horizon,
    price: u64,
) -> BTreeMap<String, BTreeMap<String, u64>> {
    let mut working: BTreeMap<String, BTreeMap<u32, BTreeSet<&ResourceId>>> = BTreeMap::new();
    for assignment in &result.assignments {
        let Some(unit) = result.work_unit(&assignment.work_unit) else {
            continue;
        };
        let months = working
            .entry(base_project(&unit.project).to_string())
            .or_insert_with(BTreeMap::new);
        for m in horizon.active_periods(unit.start, unit.duration) {
            months
                .entry(m)
                .or_insert_with(BTreeSet::new)
                .insert(&assignment.resource);
        }
    }

    working
        .into_iter()
        .map(|(project, months)| {
            let flow = months
                .into_iter()
                .filter_map(|(m, ids)| horizon.label(m).map(|label| (label.to_string(), price * ids.len() as u64)))
                .collect();
            (project, flow)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Assignment, SolveStatus, WorkUnit};
    use crate::generator::generate_pool;

    fn unit(id: &str, project: &str, skill: Skill, start: u32) -> WorkUnit {
        WorkUnit {
            id: id.to_string(),
            project: project.to_string(),
            skill,
            start,
            duration: 2,
        }
    }

    fn assign(work_unit: &str, resource: &str) -> Assignment {
        Assignment {
            work_unit: work_unit.to_string(),
            resource: resource.to_string(),
        }
    }

    fn sample() -> AllocationResult {
        let units = vec![
            unit("a", "Alpha_Onda1", Skill::Programming, 0),
            unit("b", "Alpha_Onda2", Skill::Programming, 1),
            unit("c", "Alpha_Onda1", Skill::Robotics, 0),
            unit("d", "Beta", Skill::Programming, 2),
        ];
        let assignments = vec![
            assign("a", "PROG_4"),
            assign("b", "PROG_9"),
            assign("c", "ROBOTICA_2"),
            assign("d", "PROG_4"),
        ];
        AllocationResult {
            status: SolveStatus::Optimal,
            assignments,
            predicted_cost: 0,
            resources_used: 3,
            load_per_resource: BTreeMap::new(),
            realized_spread: 1,
            active_periods: BTreeMap::new(),
            work_units: units,
            resources: generate_pool(10, 2),
            capacity: 2,
        }
    }

    #[test]
    fn strips_wave_suffix() {
        assert_eq!(base_project("Alpha_Onda3"), "Alpha");
        assert_eq!(base_project("Beta"), "Beta");
    }

    #[test]
    fn renumbers_only_used_instructors() {
        let renumbering = renumber_active(&sample());
        assert_eq!(renumbering.count_per_skill[&Skill::Programming], 2);
        assert_eq!(renumbering.count_per_skill[&Skill::Robotics], 1);
        let ids: Vec<&str> = renumbering
            .assignments
            .iter()
            .map(|a| a.resource.id.as_str())
            .collect();
        assert_eq!(ids, vec!["PROG_1", "PROG_2", "ROB_1", "PROG_1"]);
        assert_eq!(renumbering.assignments[0].resource.capacity, 2);
    }

    #[test]
    fn counts_instructors_per_base_project() {
        let counts = instructors_per_project(&sample());
        assert_eq!(counts["Alpha"][&Skill::Programming], 2);
        assert_eq!(counts["Alpha"][&Skill::Robotics], 1);
        assert_eq!(counts["Beta"][&Skill::Programming], 1);
        assert_eq!(counts["Beta"][&Skill::Robotics], 0);
    }

    #[test]
    fn cash_flow_charges_distinct_instructors_per_month() {
        let labels = vec!["Jan/26", "Fev/26", "Mar/26", "Abr/26"]
            .into_iter()
            .map(String::from)
            .collect();
        let horizon = Horizon::new(labels, [1]).unwrap();
        let flow = cash_flow_by_project(&sample(), &horizon, 100);

        // a: 0,2  b: 2,3  c: 0,2
        let alpha = &flow["Alpha"];
        assert_eq!(alpha["Jan/26"], 200);
        assert_eq!(alpha["Mar/26"], 300);
        assert_eq!(alpha["Abr/26"], 100);
        assert!(!alpha.contains_key("Fev/26"));
        // d: 2,3
        assert_eq!(flow["Beta"]["Mar/26"], 100);
        assert_eq!(flow["Beta"].len(), 2);
    }
}
