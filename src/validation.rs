use crate::params::ScheduleParams;
use crate::task::Task;
use chrono::NaiveDate;
use thiserror::Error;

pub const MAX_HOURS_PER_DAY: f64 = 24.0;
/// One year, leap day included.
pub const MAX_HORIZON_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("at least one task is required to build a schedule")]
    NoTasks,
    #[error("horizon must cover between 1 and {MAX_HORIZON_DAYS} days")]
    InvalidHorizon,
    #[error("hours per day must be greater than 0 and at most {MAX_HOURS_PER_DAY} (got {0})")]
    InvalidCapacity(f64),
    #[error("task #{0} has an empty description")]
    BlankTask(usize),
    #[error("schedule starting {start} overflows the calendar after {days} days")]
    DateOverflow { start: NaiveDate, days: u32 },
}

pub fn validate_params(params: &ScheduleParams) -> Result<(), ScheduleError> {
    if params.horizon_days == 0 || params.horizon_days > MAX_HORIZON_DAYS {
        return Err(ScheduleError::InvalidHorizon);
    }
    let hours = params.hours_per_day;
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_HOURS_PER_DAY {
        return Err(ScheduleError::InvalidCapacity(hours));
    }
    Ok(())
}

pub fn validate_tasks(tasks: &[Task]) -> Result<(), ScheduleError> {
    if tasks.is_empty() {
        return Err(ScheduleError::NoTasks);
    }
    if let Some(idx) = tasks.iter().position(|t| t.description.trim().is_empty()) {
        return Err(ScheduleError::BlankTask(idx + 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScheduleParams {
        ScheduleParams::starting(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
    }

    #[test]
    fn rejects_zero_horizon() {
        assert_eq!(
            validate_params(&params().with_horizon(0)),
            Err(ScheduleError::InvalidHorizon)
        );
    }

    #[test]
    fn rejects_horizon_beyond_a_year() {
        assert!(validate_params(&params().with_horizon(MAX_HORIZON_DAYS)).is_ok());
        for days in [MAX_HORIZON_DAYS + 1, u32::MAX] {
            assert_eq!(
                validate_params(&params().with_horizon(days)),
                Err(ScheduleError::InvalidHorizon)
            );
        }
    }

    #[test]
    fn rejects_out_of_range_capacity() {
        for hours in [0.0, -1.0, 24.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                validate_params(&params().with_hours_per_day(hours)),
                Err(ScheduleError::InvalidCapacity(_))
            ));
        }
        assert!(validate_params(&params().with_hours_per_day(24.0)).is_ok());
    }

    #[test]
    fn rejects_blank_task() {
        let tasks = vec![Task::new("Revit"), Task::new("   ")];
        assert_eq!(validate_tasks(&tasks), Err(ScheduleError::BlankTask(2)));
        assert_eq!(validate_tasks(&[]), Err(ScheduleError::NoTasks));
    }
}
