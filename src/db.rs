use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use rusqlite::{types::ValueRef, Connection, OpenFlags, Params};
use serde_json::{Map, Number, Value};

/// How long a handle waits on a lock held by another connection.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the catalog database for writing.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating database directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed opening database {}", path.display()))?;
    // Junction foreign keys are documentation only; the bundled SQLite would
    // otherwise enforce them, and dropping a previous schema would fail.
    conn.execute_batch(
        "
        PRAGMA foreign_keys = OFF;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Opens an independent read-only handle; every request gets its own.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed opening database {} read-only", path.display()))?;
    // Wait out an ingestion commit instead of failing the request.
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Runs a read query and returns each row keyed by column name.
pub fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Map<String, Value>>> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            record.insert(column.clone(), value_to_json(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(out)
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

/// Tables that may be dumped by name from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Shows,
    Metascore,
    Userscore,
    Genres,
    Companies,
    People,
    Types,
    Production,
    Directors,
    Writers,
    TopCast,
    Creators,
}

impl Table {
    pub fn parse(value: &str) -> Option<Self> {
        let table = match value.trim() {
            "shows" => Self::Shows,
            "metascore" => Self::Metascore,
            "userscore" => Self::Userscore,
            "genres" => Self::Genres,
            "companies" => Self::Companies,
            "people" => Self::People,
            "types" => Self::Types,
            "production" => Self::Production,
            "directors" => Self::Directors,
            "writers" => Self::Writers,
            "top_cast" => Self::TopCast,
            "creators" => Self::Creators,
            _ => return None,
        };
        Some(table)
    }

    pub fn select_all_sql(&self) -> &'static str {
        match self {
            Self::Shows => "SELECT * FROM shows ORDER BY show_id",
            Self::Metascore => "SELECT * FROM metascore ORDER BY show_id",
            Self::Userscore => "SELECT * FROM userscore ORDER BY show_id",
            Self::Genres => "SELECT * FROM genres ORDER BY genre_id",
            Self::Companies => "SELECT * FROM companies ORDER BY producer_id",
            Self::People => "SELECT * FROM people ORDER BY person_id",
            Self::Types => "SELECT * FROM types ORDER BY show_id, genre_id",
            Self::Production => "SELECT * FROM production ORDER BY show_id, producer_id",
            Self::Directors => "SELECT * FROM directors ORDER BY show_id, person_id",
            Self::Writers => "SELECT * FROM writers ORDER BY show_id, person_id",
            Self::TopCast => "SELECT * FROM top_cast ORDER BY show_id, person_id",
            Self::Creators => "SELECT * FROM creators ORDER BY show_id, person_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;

    use super::{open, open_read_only, query_rows, Table, BUSY_TIMEOUT};

    #[test]
    fn rows_are_addressable_by_column_name() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t(id INTEGER, name TEXT, score REAL, note TEXT);
             INSERT INTO t VALUES(1, 'Fargo', 8.5, NULL);",
        )
        .unwrap();

        let rows = query_rows(&conn, "SELECT * FROM t WHERE id = ?1", [1]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[0]["name"], json!("Fargo"));
        assert_eq!(rows[0]["score"], json!(8.5));
        assert_eq!(rows[0]["note"], json!(null));
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t(id INTEGER)")
            .unwrap();

        let reader = open_read_only(&path).unwrap();
        assert!(reader.execute("INSERT INTO t VALUES(1)", []).is_err());
    }

    #[test]
    fn handles_wait_on_locks_and_skip_foreign_key_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let writer = open(&path).unwrap();
        let timeout: i64 = writer
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, BUSY_TIMEOUT.as_millis() as i64);
        let foreign_keys: i64 = writer
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 0);

        let reader = open_read_only(&path).unwrap();
        let timeout: i64 = reader
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, BUSY_TIMEOUT.as_millis() as i64);
    }

    #[test]
    fn only_known_tables_parse() {
        assert_eq!(Table::parse("top_cast"), Some(Table::TopCast));
        assert_eq!(Table::parse("shows; DROP TABLE shows"), None);
    }
}
