use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::calendar::{CalendarWriter, EventId};
use crate::dates::{DateRange, DateRangeExtractor};
use crate::generation::TextGenerator;
use crate::http_client::ApiError;
use crate::params::ScheduleParams;
use crate::persistence::{NewRecord, PersistenceResult, Record, RecordStore};
use crate::prompt;
use crate::schedule::Schedule;
use crate::task::Task;

pub const FALLBACK_PREFIX: &str = "No plan available";

/// One row of the rendered/exported plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDay {
    pub day: u32,
    pub date: NaiveDate,
    pub course: String,
    pub plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub params: ScheduleParams,
    pub days: Vec<PlannedDay>,
}

impl StudyPlan {
    /// A plan with empty plan text, used when no generator is involved.
    pub fn without_tips(schedule: &Schedule) -> Self {
        let days = schedule
            .entries()
            .iter()
            .map(|entry| PlannedDay {
                day: entry.day,
                date: entry.date,
                course: entry.task.description.clone(),
                plan: String::new(),
            })
            .collect();
        Self {
            params: schedule.params().clone(),
            days,
        }
    }

    pub fn export_file_name(&self) -> String {
        self.params.export_file_name()
    }
}

pub fn fallback_text(err: &ApiError) -> String {
    format!("{FALLBACK_PREFIX}: {err}")
}

/// Walks a schedule and asks the generator for each day's plan, one call
/// at a time.
pub struct StudyPlanner<'a> {
    generator: &'a dyn TextGenerator,
    pacing: Duration,
}

impl<'a> StudyPlanner<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self {
            generator,
            pacing: Duration::ZERO,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub async fn plan(&self, schedule: &Schedule) -> StudyPlan {
        let mut plan = StudyPlan::without_tips(schedule);
        let total = plan.days.len();
        tracing::info!(days = total, "generating study plan");

        for (idx, day) in plan.days.iter_mut().enumerate() {
            if idx > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            let request = prompt::study_plan_prompt(day.day, &day.course);
            day.plan = match self.generator.generate(&request).await {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    tracing::warn!(day = day.day, course = %day.course, error = %err, "plan generation failed");
                    fallback_text(&err)
                }
            };
        }
        plan
    }

    pub async fn suggest(&self, task: &str, existing: &[Record]) -> String {
        let request = prompt::task_suggestion_prompt(task, existing);
        match self.generator.generate(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                tracing::warn!(%task, error = %err, "suggestion generation failed");
                fallback_text(&err)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub record: Record,
    pub range: DateRange,
    pub event_id: Option<EventId>,
    pub calendar_error: Option<String>,
}

/// Store `task` with its date range and mirror it to the calendar when one
/// is configured. Unless `dates` is supplied, the range is extracted from the
/// task's date hint, or from its description when it has none.
pub async fn record_task(
    store: &dyn RecordStore,
    calendar: Option<&dyn CalendarWriter>,
    task: &Task,
    dates: Option<DateRange>,
    today: NaiveDate,
) -> PersistenceResult<RecordOutcome> {
    let range = dates
        .unwrap_or_else(|| DateRangeExtractor::default().extract(task.date_text(), today));
    let record = store.insert(&NewRecord::new(&task.description, range.start, range.end))?;
    let task = record.task.as_str();

    let (event_id, calendar_error) = match calendar {
        Some(calendar) => match calendar.create_event(task, range.start, range.end).await {
            Ok(id) => {
                tracing::info!(event = %id, %task, "calendar event created");
                (Some(id), None)
            }
            Err(err) => {
                tracing::warn!(%task, error = %err, "calendar write failed");
                (None, Some(err.to_string()))
            }
        },
        None => (None, None),
    };

    Ok(RecordOutcome {
        record,
        range,
        event_id,
        calendar_error,
    })
}
