use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

// Type aliases for clarity
pub type Period = u32;
pub type WorkUnitId = String;
pub type ResourceId = String;

/// The two skills a class can require. Any tag other than `PROG` is read as robotics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Skill {
    Programming,
    Robotics,
}

impl Skill {
    pub const ALL: [Skill; 2] = [Skill::Programming, Skill::Robotics];

    pub fn tag(self) -> &'static str {
        match self {
            Skill::Programming => "PROG",
            Skill::Robotics => "ROBOTICA",
        }
    }

    /// Short prefix used in generated class ids and renumbered instructor ids.
    pub fn prefix(self) -> &'static str {
        match self {
            Skill::Programming => "PROG",
            Skill::Robotics => "ROB",
        }
    }
}

impl From<&str> for Skill {
    fn from(tag: &str) -> Self {
        if tag == "PROG" {
            Skill::Programming
        } else {
            Skill::Robotics
        }
    }
}

impl From<String> for Skill {
    fn from(tag: String) -> Self {
        Skill::from(tag.as_str())
    }
}

impl From<Skill> for String {
    fn from(skill: Skill) -> Self {
        skill.tag().to_string()
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A project (or one wave of a project) as handed over by the conversion step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub programming: u32,
    pub robotics: u32,
    pub duration: u32,
    pub start_min: Period,
    pub start_max: Period,
    pub deadline: Period,
}

impl Project {
    pub fn required(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Programming => self.programming,
            Skill::Robotics => self.robotics,
        }
    }
}

/// One line of a project's flexible schedule: `count` classes of `skill` starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(default = "default_skill")]
    pub skill: Skill,
    pub start: Period,
    pub count: u32,
}

fn default_skill() -> Skill {
    Skill::Programming
}

/// Project name -> schedule entries.
pub type Schedule = BTreeMap<String, Vec<ScheduleEntry>>;

/// A concrete class instance that needs exactly one instructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    pub id: WorkUnitId,
    pub project: String,
    pub skill: Skill,
    pub start: Period,
    pub duration: u32,
}

/// A hypothetical instructor from the candidate pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    /// Position within its skill's pool; lower indices are preferred.
    pub index: u32,
    pub skill: Skill,
    pub capacity: u32,
    pub facility: Option<u32>,
}

/// Global knobs of one optimization run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// Max classes per instructor per month.
    pub capacity: u32,
    pub max_spread: i64,
    pub time_limit_secs: u32,
    /// Cost of one instructor for one month, in whole currency units.
    #[serde(default = "default_price")]
    pub price: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

pub const DEFAULT_PRICE: u64 = 5000;
pub const DEFAULT_POOL_SIZE: u32 = 80;

fn default_price() -> u64 {
    DEFAULT_PRICE
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl Parameters {
    pub fn new(capacity: u32, max_spread: i64, time_limit_secs: u32) -> Self {
        Self {
            capacity,
            max_spread,
            time_limit_secs,
            price: DEFAULT_PRICE,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn with_price(mut self, price: u64) -> Self {
        self.price = price;
        self
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Rejects the first offending field. Must pass before any model is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Capacity);
        }
        if self.max_spread < 0 {
            return Err(ConfigError::MaxSpread(self.max_spread));
        }
        if self.time_limit_secs == 0 {
            return Err(ConfigError::TimeLimit);
        }
        if self.price == 0 {
            return Err(ConfigError::Price);
        }
        if self.pool_size == 0 {
            return Err(ConfigError::PoolSize);
        }
        Ok(())
    }
}

/// Planning horizon as sent over the wire.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonInput {
    pub labels: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<Period>,
}

/// The complete input for one allocation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub horizon: HorizonInput,
    pub projects: Vec<Project>,
    pub schedule: Schedule,
    pub parameters: Parameters,
}

/// Terminal status reported by the solving backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    /// Time budget ran out before any feasible solution was found.
    Unknown,
}

impl SolveStatus {
    pub fn is_accepted(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    pub fn name(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A class and the instructor it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub work_unit: WorkUnitId,
    pub resource: ResourceId,
}

/// Everything reporting collaborators get to see from a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub status: SolveStatus,
    pub assignments: Vec<Assignment>,
    pub predicted_cost: u64,
    pub resources_used: usize,
    pub load_per_resource: BTreeMap<ResourceId, u32>,
    pub realized_spread: u32,
    /// Billable months per used instructor.
    pub active_periods: BTreeMap<ResourceId, Vec<Period>>,
    pub work_units: Vec<WorkUnit>,
    pub resources: Vec<Resource>,
    pub capacity: u32,
}

impl AllocationResult {
    pub fn work_unit(&self, id: &str) -> Option<&WorkUnit> {
        self.work_units.iter().find(|w| w.id == id)
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn total_activations(&self) -> usize {
        self.active_periods.values().map(Vec::len).sum()
    }
}

/// A parameter the caller can relax before re-running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Lever {
    Capacity,
    SpreadCeiling,
    TimeBudget,
}

impl fmt::Display for Lever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lever::Capacity => f.write_str("increase the per-instructor capacity"),
            Lever::SpreadCeiling => f.write_str("increase the maximum spread"),
            Lever::TimeBudget => f.write_str("extend the solver time limit"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Outcome {
    Success(AllocationResult),
    #[serde(rename_all = "camelCase")]
    Failure {
        status: SolveStatus,
        suggestions: Vec<Lever>,
    },
}

impl Outcome {
    pub fn result(&self) -> Option<&AllocationResult> {
        match self {
            Outcome::Success(result) => Some(result),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn status(&self) -> SolveStatus {
        match self {
            Outcome::Success(result) => result.status,
            Outcome::Failure { status, .. } => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_tags_fold_into_two_variants() {
        assert_eq!(Skill::from("PROG"), Skill::Programming);
        assert_eq!(Skill::from("ROBOTICA"), Skill::Robotics);
        assert_eq!(Skill::from("prog"), Skill::Robotics);
        assert_eq!(Skill::from(""), Skill::Robotics);
    }

    #[test]
    fn schedule_entry_defaults_to_programming() {
        let entry: ScheduleEntry = serde_json::from_str(r#"{"start": 2, "count": 3}"#).unwrap();
        assert_eq!(entry.skill, Skill::Programming);
        let entry: ScheduleEntry =
            serde_json::from_str(r#"{"skill": "ROB", "start": 0, "count": 1}"#).unwrap();
        assert_eq!(entry.skill, Skill::Robotics);
    }

    #[test]
    fn parameters_name_the_offending_field() {
        assert!(Parameters::new(3, 2, 60).validate().is_ok());
        assert_eq!(Parameters::new(0, 2, 60).validate(), Err(ConfigError::Capacity));
        assert_eq!(
            Parameters::new(3, -1, 60).validate(),
            Err(ConfigError::MaxSpread(-1))
        );
        assert_eq!(Parameters::new(3, 2, 0).validate(), Err(ConfigError::TimeLimit));
        assert_eq!(
            Parameters::new(3, 2, 60).with_price(0).validate(),
            Err(ConfigError::Price)
        );
        assert_eq!(
            Parameters::new(3, 2, 60).with_pool_size(0).validate(),
            Err(ConfigError::PoolSize)
        );
        let message = ConfigError::TimeLimit.to_string();
        assert!(message.contains("timeLimitSecs"));
    }

    #[test]
    fn parameters_fill_defaults_from_json() {
        let params: Parameters =
            serde_json::from_str(r#"{"capacity": 4, "maxSpread": 3, "timeLimitSecs": 30}"#).unwrap();
        assert_eq!(params.price, DEFAULT_PRICE);
        assert_eq!(params.pool_size, DEFAULT_POOL_SIZE);
    }
}
