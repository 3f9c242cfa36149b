use log::warn;
use std::collections::BTreeMap;

use crate::data::{Project, Resource, Schedule, Skill, WorkUnit};

/// Expands the flexible schedule into one `WorkUnit` per required class.
///
/// Entries for projects missing from `projects` are skipped; their names are
/// returned alongside the units. Ids are `<project>_<skill prefix>_<counter>`
/// with a counter shared across the whole run.
pub fn generate_work_units(schedule: &Schedule, projects: &[Project]) -> (Vec<WorkUnit>, Vec<String>) {
    let mut by_name: BTreeMap<&str, &Project> = BTreeMap::new();
    for project in projects {
        by_name.insert(project.name.as_str(), project);
    }

    let mut units = Vec::new();
    let mut skipped = Vec::new();
    let mut counter = 0usize;

    for (project_name, entries) in schedule {
        let Some(project) = by_name.get(project_name.as_str()) else {
            skipped.push(project_name.clone());
            continue;
        };

        for skill in Skill::ALL {
            let scheduled: u32 = entries.iter().filter(|e| e.skill == skill).map(|e| e.count).sum();
            if scheduled != project.required(skill) {
                warn!(
                    "Project {} schedules {} {} classes but requires {}",
                    project_name,
                    scheduled,
                    skill,
                    project.required(skill)
                );
            }
        }

        for entry in entries {
            for _ in 0..entry.count {
                units.push(WorkUnit {
                    id: format!("{}_{}_{}", project_name, entry.skill.prefix(), counter),
                    project: project_name.clone(),
                    skill: entry.skill,
                    start: entry.start,
                    duration: project.duration,
                });
                counter += 1;
            }
        }
    }

    (units, skipped)
}

/// `pool_size` interchangeable candidates per skill, programming first.
pub fn generate_pool(pool_size: u32, capacity: u32) -> Vec<Resource> {
    Skill::ALL
        .iter()
        .flat_map(|&skill| {
            (0..pool_size).map(move |index| Resource {
                id: format!("{}_{}", skill.tag(), index),
                index,
                skill,
                capacity,
                facility: None,
            })
        })
        .collect()
}
