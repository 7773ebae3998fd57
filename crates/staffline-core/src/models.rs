//! Domain models for Staffline
//!
//! Plain records for the CRUD side of the application (employees, skills,
//! projects, allocations). Analytical types live in `capacity::types`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity::types::{BottleneckStatus, BottleneckType, Severity};

/// An employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub department: String,
    /// Contracted hours per week
    pub default_hours: f64,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
}

/// New employee for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
    #[serde(default = "default_weekly_hours")]
    pub default_hours: f64,
}

fn default_weekly_hours() -> f64 {
    40.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown employee status: {}", s)),
        }
    }
}

impl std::fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A skill in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: SkillCategory,
}

/// Skill category; drives the trend heuristic when history is thin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Soft,
    Domain,
    #[default]
    Other,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Soft => "soft",
            Self::Domain => "domain",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technical" => Ok(Self::Technical),
            "soft" => Ok(Self::Soft),
            "domain" => Ok(Self::Domain),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown skill category: {}", s)),
        }
    }
}

impl std::fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Proficiency an employee holds in a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ProficiencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    /// Numeric score (1-4) used for averages
    pub fn score(&self) -> f64 {
        match self {
            Self::Beginner => 1.0,
            Self::Intermediate => 2.0,
            Self::Advanced => 3.0,
            Self::Expert => 4.0,
        }
    }
}

impl std::str::FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            _ => Err(format!("Unknown proficiency level: {}", s)),
        }
    }
}

impl std::fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A skill held by an employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSkill {
    pub skill: String,
    pub category: SkillCategory,
    pub level: ProficiencyLevel,
}

/// A project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// New project for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }

    /// Whether skill requirements of this project count as demand
    pub fn generates_demand(&self) -> bool {
        matches!(self, Self::Planning | Self::Active)
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "on_hold" | "onhold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown project status: {}", s)),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Headcount a project requests for a skill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSkillRequirement {
    pub project_id: i64,
    pub skill: String,
    pub quantity: i64,
}

/// Hours an employee is allocated to a project for one week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub employee_id: i64,
    pub project_id: i64,
    /// Monday of the allocated week
    pub week_start: NaiveDate,
    pub allocated_hours: f64,
    pub created_at: DateTime<Utc>,
}

/// New allocation for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAllocation {
    pub employee_id: i64,
    pub project_id: i64,
    pub week_start: NaiveDate,
    pub allocated_hours: f64,
}

/// New bottleneck record; severity is derived from `impact` on insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBottleneck {
    #[serde(rename = "type")]
    pub bottleneck_type: BottleneckType,
    pub affected_resource: String,
    pub impact: f64,
    #[serde(default)]
    pub affected_projects: Vec<i64>,
    #[serde(default)]
    pub estimated_duration_days: i64,
    #[serde(default)]
    pub root_causes: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

/// A stored bottleneck as listed by the CRUD endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub bottleneck_type: BottleneckType,
    pub affected_resource: String,
    pub severity: Severity,
    pub impact: f64,
    pub status: BottleneckStatus,
    pub identified_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
