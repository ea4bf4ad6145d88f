use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::calendar::CalendarWriter;
use crate::config::{GEMINI_API_KEY, ScheduleDefaults};
use crate::dates::{DateRange, DateSource, extract_date_range};
use crate::generation::TextGenerator;
use crate::params::{AssignmentPolicy, ScheduleParams};
use crate::persistence::{PersistenceError, Record, RecordStore, plan_to_csv_string};
use crate::planner::{RecordOutcome, StudyPlan, StudyPlanner, record_task};
use crate::schedule::build_schedule;
use crate::task::{Task, parse_task_list};
use crate::validation::ScheduleError;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    calendar: Option<Arc<dyn CalendarWriter>>,
    defaults: ScheduleDefaults,
    pacing: Duration,
    last_plan: Arc<RwLock<Option<StudyPlan>>>,
    clock: Clock,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            generator: None,
            calendar: None,
            defaults: ScheduleDefaults::default(),
            pacing: Duration::ZERO,
            last_plan: Arc::new(RwLock::new(None)),
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarWriter>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_defaults(mut self, defaults: ScheduleDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    fn generator(&self) -> Result<Arc<dyn TextGenerator>, HttpError> {
        self.generator.clone().ok_or_else(|| {
            HttpError::Unauthorized(format!(
                "{GEMINI_API_KEY} is not configured; text generation is unavailable"
            ))
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum HttpError {
    NotFound(String),
    Unauthorized(String),
    Invalid(String),
    Internal(String),
}

impl HttpError {
    fn not_found(message: impl Into<String>) -> Self {
        HttpError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        HttpError::Invalid(message.into())
    }
}

impl From<ScheduleError> for HttpError {
    fn from(value: ScheduleError) -> Self {
        HttpError::Invalid(value.to_string())
    }
}

impl From<PersistenceError> for HttpError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(message) => HttpError::Invalid(message),
            other => HttpError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            HttpError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            HttpError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "missing_credential", message)
            }
            HttpError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            HttpError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ExtractPayload {
    text: String,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    courses: String,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    horizon_days: Option<u32>,
    #[serde(default)]
    hours_per_day: Option<f64>,
    #[serde(default)]
    policy: Option<AssignmentPolicy>,
    #[serde(default = "default_tips")]
    tips: bool,
}

fn default_tips() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RecordPayload {
    task: String,
    /// Free text the dates are read from instead of `task`, e.g. "next friday".
    #[serde(default)]
    when: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct SuggestPayload {
    task: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_dates))
        .route("/schedule", get(get_schedule).post(create_schedule))
        .route("/schedule.csv", get(download_schedule_csv))
        .route("/records", get(list_records).post(create_record))
        .route("/suggest", post(suggest))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn extract_dates(
    State(state): State<AppState>,
    Json(payload): Json<ExtractPayload>,
) -> Json<DateRange> {
    let today = payload.today.unwrap_or_else(|| state.today());
    Json(extract_date_range(&payload.text, today))
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<SchedulePayload>,
) -> Result<Json<StudyPlan>, HttpError> {
    let tasks = parse_task_list(&payload.courses);
    let params = ScheduleParams::starting(payload.start_date.unwrap_or_else(|| state.today()))
        .with_horizon(payload.horizon_days.unwrap_or(state.defaults.horizon_days))
        .with_hours_per_day(payload.hours_per_day.unwrap_or(state.defaults.hours_per_day))
        .with_policy(payload.policy.unwrap_or(state.defaults.policy));

    // Credentials are checked before anything is scheduled or sent out.
    let generator = if payload.tips {
        Some(state.generator()?)
    } else {
        None
    };

    let schedule = build_schedule(&tasks, &params)?;
    let plan = match generator {
        Some(generator) => {
            StudyPlanner::new(generator.as_ref())
                .with_pacing(state.pacing)
                .plan(&schedule)
                .await
        }
        None => StudyPlan::without_tips(&schedule),
    };

    *state.last_plan.write() = Some(plan.clone());
    Ok(Json(plan))
}

async fn get_schedule(State(state): State<AppState>) -> Result<Json<StudyPlan>, HttpError> {
    let plan = state.last_plan.read().clone();
    plan.map(Json)
        .ok_or_else(|| HttpError::not_found("no schedule has been generated yet"))
}

async fn download_schedule_csv(State(state): State<AppState>) -> Result<Response, HttpError> {
    let plan = state
        .last_plan
        .read()
        .clone()
        .ok_or_else(|| HttpError::not_found("no schedule has been generated yet"))?;
    let body = plan_to_csv_string(&plan)?;
    let disposition = format!("attachment; filename=\"{}\"", plan.export_file_name());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<Record>>, HttpError> {
    Ok(Json(state.store.list()?))
}

async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<RecordPayload>,
) -> Result<(StatusCode, Json<RecordOutcome>), HttpError> {
    if payload.task.trim().is_empty() {
        return Err(HttpError::invalid("task must not be empty"));
    }
    let dates = match (payload.start_date, payload.end_date) {
        (Some(start), Some(end)) => Some(DateRange::ordered(start, end, DateSource::Provided)),
        (None, None) => None,
        _ => {
            return Err(HttpError::invalid(
                "start_date and end_date must be given together",
            ));
        }
    };
    let mut task = Task::new(payload.task);
    if let Some(when) = payload.when {
        task = task.with_date_hint(when);
    }
    let outcome = record_task(
        state.store.as_ref(),
        state.calendar.as_deref(),
        &task,
        dates,
        state.today(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn suggest(
    State(state): State<AppState>,
    Json(payload): Json<SuggestPayload>,
) -> Result<Json<serde_json::Value>, HttpError> {
    if payload.task.trim().is_empty() {
        return Err(HttpError::invalid("task must not be empty"));
    }
    let generator = state.generator()?;
    let existing = state.store.list()?;
    let suggestion = StudyPlanner::new(generator.as_ref())
        .suggest(payload.task.trim(), &existing)
        .await;
    Ok(Json(json!({ "task": payload.task.trim(), "suggestion": suggestion })))
}
