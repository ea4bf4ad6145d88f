pub mod calendar;
pub mod config;
pub mod dates;
pub mod generation;
pub mod http_client;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod params;
pub mod persistence;
pub mod planner;
pub mod prompt;
pub mod schedule;
pub mod task;
pub mod validation;

pub use calendar::{CalendarWriter, EventId, GoogleCalendarClient};
pub use config::{Credential, SecretStore, Settings, resolve_credential};
pub use dates::{DateRange, DateRangeExtractor, DateSource, extract_date_range};
pub use generation::{GeminiClient, TextGenerator};
pub use http_client::ApiError;
pub use params::{AssignmentPolicy, ScheduleParams};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteRecordStore;
pub use persistence::{
    NewRecord, PersistenceError, Record, RecordStore, plan_to_csv_string, save_plan_to_csv,
    save_plan_to_json, write_plan_csv,
};
pub use planner::{PlannedDay, RecordOutcome, StudyPlan, StudyPlanner, record_task};
pub use schedule::{Schedule, ScheduleEntry, ScheduleSummary, build_schedule};
pub use task::{Task, parse_task_list};
pub use validation::ScheduleError;
