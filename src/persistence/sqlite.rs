use super::{NewRecord, PersistenceError, PersistenceResult, Record, RecordStore, format_date};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

pub struct SqliteRecordStore {
    connection: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, record: &NewRecord) -> PersistenceResult<Record> {
        super::validate_new_record(record)?;
        let conn = self
            .connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        let start_date = format_date(record.start_date);
        let end_date = format_date(record.end_date);
        conn.execute(
            "INSERT INTO tasks (task, start_date, end_date) VALUES (?1, ?2, ?3)",
            params![record.task, start_date, end_date],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, task = %record.task, %start_date, %end_date, "stored task record");
        Ok(Record {
            id,
            task: record.task.clone(),
            start_date,
            end_date,
        })
    }

    fn list(&self) -> PersistenceResult<Vec<Record>> {
        let conn = self
            .connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        let mut stmt =
            conn.prepare("SELECT id, task, start_date, end_date FROM tasks ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Record {
                id: row.get(0)?,
                task: row.get(1)?,
                start_date: row.get(2)?,
                end_date: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}
