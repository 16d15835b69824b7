use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::warn;

use crate::models::{Lookup, Role};

/// Inserts `name` unless it is already present. Returns whether a row was added.
pub fn insert_lookup_name(conn: &Connection, lookup: Lookup, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached(lookup.insert_sql())?;
    Ok(stmt.execute(params![name])? > 0)
}

pub fn lookup_id(conn: &Connection, lookup: Lookup, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare_cached(lookup.select_id_sql())?;
    stmt.query_row(params![name], |row| row.get(0))
        .with_context(|| format!("No {} row named {name:?}", lookup.label()))
}

/// Returns the canonical person id for `name`, creating the row if needed.
///
/// Callers pass an already trimmed, non-empty name. When the store holds more
/// than one row for the name (an import that predates the unique index), the
/// lowest id wins: links of the others are moved onto it and the extra rows
/// are deleted.
pub fn resolve_person(conn: &Connection, name: &str) -> Result<i64> {
    debug_assert!(!name.trim().is_empty(), "person names must be non-empty");

    let ids = person_ids(conn, name)?;
    match ids.as_slice() {
        [] => {
            conn.prepare_cached("INSERT OR IGNORE INTO people(name) VALUES(?1)")?
                .execute(params![name])?;
            let mut stmt = conn.prepare_cached(
                "SELECT person_id FROM people WHERE name = ?1 ORDER BY person_id LIMIT 1",
            )?;
            stmt.query_row(params![name], |row| row.get(0))
                .with_context(|| format!("Person {name:?} missing after insert"))
        }
        [id] => Ok(*id),
        [canonical, duplicates @ ..] => {
            merge_people(conn, *canonical, duplicates)?;
            warn!(
                person = %name,
                canonical = *canonical,
                merged = duplicates.len(),
                "Merged duplicate people rows"
            );
            Ok(*canonical)
        }
    }
}

fn person_ids(conn: &Connection, name: &str) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare_cached("SELECT person_id FROM people WHERE name = ?1 ORDER BY person_id")?;
    let ids = stmt
        .query_map(params![name], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn merge_people(conn: &Connection, canonical: i64, duplicates: &[i64]) -> Result<()> {
    for duplicate in duplicates {
        for role in Role::ALL {
            conn.execute(role.repoint_sql(), params![canonical, duplicate])?;
            // Whatever could not move already exists for the canonical row.
            conn.execute(role.unlink_sql(), params![duplicate])?;
        }
        conn.execute("DELETE FROM people WHERE person_id = ?1", params![duplicate])?;
    }
    Ok(())
}
