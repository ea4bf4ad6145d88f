use crate::params::{AssignmentPolicy, ScheduleParams};
use crate::task::Task;
use crate::validation::{self, ScheduleError};
use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub day: u32,
    pub date: NaiveDate,
    pub task: Task,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub entry_count: usize,
    pub distinct_tasks: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_hours: f64,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("days={}", self.entry_count));
        parts.push(format!("tasks={}", self.distinct_tasks));
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            parts.push(format!("span={first}..{last}"));
        }
        parts.push(format!("hours={}", self.total_hours));
        parts.join(", ")
    }
}

/// An ordered, dated assignment of tasks to days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    params: ScheduleParams,
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn params(&self) -> &ScheduleParams {
        &self.params
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> ScheduleSummary {
        let mut distinct: Vec<&str> = self
            .entries
            .iter()
            .map(|e| e.task.description.as_str())
            .collect();
        distinct.sort_unstable();
        distinct.dedup();
        ScheduleSummary {
            entry_count: self.entries.len(),
            distinct_tasks: distinct.len(),
            first_date: self.entries.first().map(|e| e.date),
            last_date: self.entries.last().map(|e| e.date),
            total_hours: self.entries.iter().map(|e| e.duration_hours).sum(),
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let days: Vec<u32> = self.entries.iter().map(|e| e.day).collect();
        let dates: Vec<i32> = self
            .entries
            .iter()
            .map(|e| Self::date_to_i32(e.date))
            .collect();
        let tasks: Vec<&str> = self
            .entries
            .iter()
            .map(|e| e.task.description.as_str())
            .collect();
        let hours: Vec<f64> = self.entries.iter().map(|e| e.duration_hours).collect();

        let columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("day"), days).into_column(),
            Series::new(PlSmallStr::from_static("date"), dates)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static("task"), tasks).into_column(),
            Series::new(PlSmallStr::from_static("duration_hours"), hours).into_column(),
        ];
        DataFrame::new(columns)
    }

    fn date_to_i32(date: NaiveDate) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date");
        (date - epoch).num_days() as i32
    }
}

/// Distribute `tasks` round-robin over the horizon in `params`.
///
/// Entry `i` gets `tasks[i % N]` on `start_date + i` days. With
/// [`AssignmentPolicy::Exhaust`] the schedule ends once every task has
/// been placed, so it never repeats a task.
pub fn build_schedule(tasks: &[Task], params: &ScheduleParams) -> Result<Schedule, ScheduleError> {
    validation::validate_tasks(tasks)?;
    validation::validate_params(params)?;

    let slots = match params.policy {
        AssignmentPolicy::Cycle => params.horizon_days as usize,
        AssignmentPolicy::Exhaust => tasks.len().min(params.horizon_days as usize),
    };

    let last_offset = slots.saturating_sub(1) as i64;
    if params
        .start_date
        .checked_add_signed(Duration::days(last_offset))
        .is_none()
    {
        return Err(ScheduleError::DateOverflow {
            start: params.start_date,
            days: last_offset as u32,
        });
    }

    let mut entries = Vec::with_capacity(slots);
    for i in 0..slots {
        let date = params
            .start_date
            .checked_add_signed(Duration::days(i as i64))
            .ok_or(ScheduleError::DateOverflow {
                start: params.start_date,
                days: i as u32,
            })?;
        entries.push(ScheduleEntry {
            day: i as u32 + 1,
            date,
            task: tasks[i % tasks.len()].clone(),
            duration_hours: params.hours_per_day,
        });
    }

    tracing::debug!(
        entries = entries.len(),
        tasks = tasks.len(),
        policy = %params.policy,
        "built schedule"
    );

    Ok(Schedule {
        params: params.clone(),
        entries,
    })
}
