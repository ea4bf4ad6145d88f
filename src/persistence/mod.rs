use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("record store lock poisoned")]
    LockPoisoned,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A stored task row. Dates are kept as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub task: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub task: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewRecord {
    pub fn new(task: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            task: task.into(),
            start_date,
            end_date,
        }
    }
}

/// Append-only store of task rows.
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: &NewRecord) -> PersistenceResult<Record>;
    fn list(&self) -> PersistenceResult<Vec<Record>>;
}

pub fn validate_new_record(record: &NewRecord) -> PersistenceResult<()> {
    if record.task.trim().is_empty() {
        return Err(PersistenceError::InvalidData(
            "record task text must not be empty".into(),
        ));
    }
    if record.end_date < record.start_date {
        return Err(PersistenceError::InvalidData(format!(
            "record end date {} precedes start date {}",
            record.end_date, record.start_date
        )));
    }
    Ok(())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{plan_to_csv_string, save_plan_to_csv, save_plan_to_json, write_plan_csv};
