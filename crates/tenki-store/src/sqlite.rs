//! SQLite-backed forecast log.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use tenki_core::RusqliteErrorExt;

use crate::backend::{ForecastEntry, ForecastStore, StoreError, StoreResult, StoredReport};

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.into_database_error())
}

/// SQLite forecast store. The connection is guarded so the store can be
/// shared across threads.
pub struct SqliteForecastStore {
    conn: Mutex<Connection>,
}

impl SqliteForecastStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(tenki_core::DatabaseError::ConnectionFailed(e.to_string()))
            })?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        tracing::debug!("Opened forecast store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS weather_reports (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    location TEXT NOT NULL,
                    datetime TEXT NOT NULL,
                    weather TEXT NOT NULL,
                    temperature_max REAL,
                    temperature_min REAL,
                    recorded_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_weather_reports_location
                    ON weather_reports(location, datetime);
                "#,
            )
            .map_err(db_err)
    }

    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<StoredReport> {
        let recorded_at_str: String = row.get(6)?;
        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(StoredReport {
            id: row.get(0)?,
            entry: ForecastEntry {
                location: row.get(1)?,
                date: row.get(2)?,
                condition: row.get(3)?,
                temperature_max: row.get(4)?,
                temperature_min: row.get(5)?,
            },
            recorded_at,
        })
    }
}

impl ForecastStore for SqliteForecastStore {
    fn append(&self, entry: &ForecastEntry) -> StoreResult<()> {
        entry.validate()?;

        self.conn
            .lock()
            .execute(
                "INSERT INTO weather_reports
                    (location, datetime, weather, temperature_max, temperature_min, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.location,
                    entry.date,
                    entry.condition,
                    entry.temperature_max,
                    entry.temperature_min,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(db_err)?;

        tracing::debug!("Stored forecast for {} on {}", entry.location, entry.date);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<StoredReport>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, location, datetime, weather, temperature_max, temperature_min, recorded_at
                 FROM weather_reports ORDER BY id",
            )
            .map_err(db_err)?;

        let reports = stmt
            .query_map([], Self::row_to_report)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(reports)
    }

    fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM weather_reports", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
