use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use study_planner::persistence::PersistenceResult;
use study_planner::planner::FALLBACK_PREFIX;
use study_planner::{
    ApiError, CalendarWriter, DateRange, DateSource, EventId, NewRecord, Record, RecordStore,
    ScheduleParams, StudyPlanner, Task, TextGenerator, build_schedule, record_task,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Echoes a canned reply and remembers every prompt it saw.
#[derive(Default)]
struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        if self.fail_on_call == Some(prompts.len()) {
            return Err(ApiError::Status {
                status: 429,
                body: "quota exceeded".into(),
            });
        }
        Ok(format!("  plan #{}  \n", prompts.len()))
    }
}

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<Record>>,
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: &NewRecord) -> PersistenceResult<Record> {
        study_planner::persistence::validate_new_record(record)?;
        let mut rows = self.rows.lock().unwrap();
        let stored = Record {
            id: rows.len() as i64 + 1,
            task: record.task.clone(),
            start_date: record.start_date.to_string(),
            end_date: record.end_date.to_string(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    fn list(&self) -> PersistenceResult<Vec<Record>> {
        Ok(self.rows.lock().unwrap().clone())
    }
}

struct FixedCalendar {
    result: Result<&'static str, u16>,
    calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl FixedCalendar {
    fn ok(id: &'static str) -> Self {
        Self {
            result: Ok(id),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            result: Err(status),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CalendarWriter for FixedCalendar {
    async fn create_event(
        &self,
        title: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<EventId, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), start, end));
        match self.result {
            Ok(id) => Ok(EventId(id.to_string())),
            Err(status) => Err(ApiError::Status {
                status,
                body: "forbidden".into(),
            }),
        }
    }
}

#[tokio::test]
async fn plan_requests_one_prompt_per_day_in_order() {
    let generator = ScriptedGenerator::default();
    let params = ScheduleParams::starting(d(2024, 1, 1)).with_horizon(3);
    let schedule = build_schedule(&[Task::new("Math"), Task::new("Art")], &params).unwrap();

    let plan = StudyPlanner::new(&generator).plan(&schedule).await;

    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.days[0].plan, "plan #1");
    assert_eq!(plan.days[2].plan, "plan #3");
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Day 1 for the course: Math"));
    assert!(prompts[1].contains("Day 2 for the course: Art"));
    assert!(prompts[2].contains("Day 3 for the course: Math"));
}

#[tokio::test]
async fn failed_day_gets_fallback_text_and_others_continue() {
    let generator = ScriptedGenerator {
        fail_on_call: Some(2),
        ..Default::default()
    };
    let params = ScheduleParams::starting(d(2024, 1, 1)).with_horizon(3);
    let schedule = build_schedule(&[Task::new("Math")], &params).unwrap();

    let plan = StudyPlanner::new(&generator).plan(&schedule).await;

    assert_eq!(plan.days[0].plan, "plan #1");
    assert!(plan.days[1].plan.starts_with(FALLBACK_PREFIX));
    assert!(plan.days[1].plan.contains("429"));
    assert_eq!(plan.days[2].plan, "plan #3");
}

#[tokio::test(start_paused = true)]
async fn pacing_sleeps_between_calls_only() {
    let generator = ScriptedGenerator::default();
    let params = ScheduleParams::starting(d(2024, 1, 1)).with_horizon(3);
    let schedule = build_schedule(&[Task::new("Math")], &params).unwrap();
    let pacing = Duration::from_secs(2);

    let started = tokio::time::Instant::now();
    StudyPlanner::new(&generator)
        .with_pacing(pacing)
        .plan(&schedule)
        .await;
    let elapsed = started.elapsed();

    assert!(elapsed >= pacing * 2, "elapsed {elapsed:?}");
    assert!(elapsed < pacing * 3, "elapsed {elapsed:?}");
}

#[tokio::test]
async fn suggestion_prompt_lists_existing_records() {
    let generator = ScriptedGenerator::default();
    let existing = vec![Record {
        id: 1,
        task: "Chemistry exam".into(),
        start_date: "2024-04-02".into(),
        end_date: "2024-04-02".into(),
    }];

    let reply = StudyPlanner::new(&generator)
        .suggest("Start the history essay", &existing)
        .await;

    assert_eq!(reply, "plan #1");
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Start the history essay"));
    assert!(prompts[0].contains("Chemistry exam"));
}

#[tokio::test]
async fn record_task_extracts_dates_and_creates_event() {
    let store = MemoryStore::default();
    let calendar = FixedCalendar::ok("evt-1");

    let outcome = record_task(
        &store,
        Some(&calendar as &dyn CalendarWriter),
        &Task::new("Physics revision 2024-05-02 to 2024-05-04"),
        None,
        d(2024, 5, 1),
    )
    .await
    .unwrap();

    assert_eq!(outcome.record.start_date, "2024-05-02");
    assert_eq!(outcome.record.end_date, "2024-05-04");
    assert_eq!(outcome.range.source, DateSource::Entity);
    assert_eq!(outcome.event_id, Some(EventId("evt-1".into())));
    assert!(outcome.calendar_error.is_none());
    assert_eq!(
        calendar.calls.lock().unwrap()[0],
        (
            "Physics revision 2024-05-02 to 2024-05-04".to_string(),
            d(2024, 5, 2),
            d(2024, 5, 4)
        )
    );
}

#[tokio::test]
async fn calendar_failure_keeps_the_stored_record() {
    let store = MemoryStore::default();
    let calendar = FixedCalendar::failing(403);
    let today = d(2024, 5, 1);

    let outcome = record_task(
        &store,
        Some(&calendar as &dyn CalendarWriter),
        &Task::new("Read poetry"),
        None,
        today,
    )
    .await
    .unwrap();

    assert!(outcome.event_id.is_none());
    assert!(outcome.calendar_error.unwrap().contains("403"));
    assert_eq!(outcome.range, DateRange::fallback(today));
    assert_eq!(store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn provided_dates_skip_extraction() {
    let store = MemoryStore::default();
    let dates = DateRange::ordered(d(2024, 7, 9), d(2024, 7, 1), DateSource::Provided);

    let task = Task::new("Summer reading 2030-01-01");
    let outcome = record_task(&store, None, &task, Some(dates), d(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(outcome.record.start_date, "2024-07-01");
    assert_eq!(outcome.record.end_date, "2024-07-09");
    assert_eq!(outcome.range.source, DateSource::Provided);
    assert!(outcome.event_id.is_none());
}

#[tokio::test]
async fn date_hint_is_preferred_over_description() {
    let store = MemoryStore::default();
    let task = Task::new("Submit form 2030-01-01").with_date_hint("tomorrow");

    let outcome = record_task(&store, None, &task, None, d(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(outcome.record.task, "Submit form 2030-01-01");
    assert_eq!(outcome.record.start_date, "2024-06-02");
    assert_eq!(outcome.record.end_date, "2024-06-02");
}
