use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HORIZON_DAYS: u32 = 45;
pub const DEFAULT_HOURS_PER_DAY: f64 = 2.0;

/// How tasks are handed out once every task has had a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// Keep rotating through the task list until the horizon is filled.
    #[default]
    Cycle,
    /// Give every task one day and stop, even if the horizon is longer.
    Exhaust,
}

impl AssignmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentPolicy::Cycle => "cycle",
            AssignmentPolicy::Exhaust => "exhaust",
        }
    }
}

impl fmt::Display for AssignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cycle" => Ok(AssignmentPolicy::Cycle),
            "exhaust" => Ok(AssignmentPolicy::Exhaust),
            other => Err(format!("unknown assignment policy '{other}' (cycle|exhaust)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub start_date: NaiveDate,
    pub horizon_days: u32,
    pub hours_per_day: f64,
    #[serde(default)]
    pub policy: AssignmentPolicy,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self::starting(Local::now().date_naive())
    }
}

impl ScheduleParams {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            horizon_days: DEFAULT_HORIZON_DAYS,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            policy: AssignmentPolicy::default(),
        }
    }

    pub fn with_horizon(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_hours_per_day(mut self, hours_per_day: f64) -> Self {
        self.hours_per_day = hours_per_day;
        self
    }

    pub fn with_policy(mut self, policy: AssignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// File name offered for the CSV download, e.g. `45_day_study_schedule.csv`.
    pub fn export_file_name(&self) -> String {
        format!("{}_day_study_schedule.csv", self.horizon_days)
    }
}
