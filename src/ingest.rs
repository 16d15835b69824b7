use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    db,
    dedup::{insert_lookup_name, lookup_id},
    models::{Lookup, Role},
    populate::populate,
    schema,
    source::{read_source, split_names, SourceRow},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkCounts {
    pub types: i64,
    pub production: i64,
    pub directors: i64,
    pub writers: i64,
    pub top_cast: i64,
    pub creators: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub source: String,
    pub shows: i64,
    pub skipped_rows: usize,
    pub genres: i64,
    pub companies: i64,
    pub people: i64,
    pub links: LinkCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Rebuilds the catalog at `db_path` from the CSV dump at `source`.
///
/// The source is fully read and validated before the database is touched, and
/// the rebuild runs in one transaction: on any failure the previous catalog
/// stays in place.
pub fn ingest(source: &Path, db_path: &Path) -> Result<IngestReport> {
    let started_at = Utc::now();
    let rows = read_source(source)?;
    info!(source = %source.display(), rows = rows.len(), "Source table loaded");

    let mut conn = db::open(db_path)?;
    let mut report = ingest_rows(&mut conn, &rows)
        .with_context(|| format!("Ingestion into {} failed", db_path.display()))?;
    report.source = source.display().to_string();
    report.started_at = started_at;
    Ok(report)
}

pub fn ingest_rows(conn: &mut Connection, rows: &[SourceRow]) -> Result<IngestReport> {
    let started_at = Utc::now();
    // Must precede the transaction; see `schema::rebuild`.
    conn.pragma_update(None, "foreign_keys", false)?;
    let tx = conn.transaction()?;

    schema::rebuild(&tx)?;

    let skipped_rows = insert_shows(&tx, rows)?;
    info!(
        shows = rows.len() - skipped_rows,
        skipped = skipped_rows,
        "Shows and score pairs inserted"
    );

    for lookup in [Lookup::Genre, Lookup::Company] {
        let added = insert_lookup_names(&tx, lookup, rows)?;
        let linked = link_lookup(&tx, lookup, rows)?;
        info!(kind = lookup.label(), added, linked, "Lookup table populated");
    }

    for role in Role::ALL {
        let linked = populate(&tx, rows, role)
            .with_context(|| format!("Failed linking {} column", role.source_column()))?;
        info!(role = role.as_str(), table = role.table(), linked, "People linked");
    }

    let report = IngestReport {
        source: String::new(),
        shows: count(&tx, "SELECT COUNT(*) FROM shows")?,
        skipped_rows,
        genres: count(&tx, "SELECT COUNT(*) FROM genres")?,
        companies: count(&tx, "SELECT COUNT(*) FROM companies")?,
        people: count(&tx, "SELECT COUNT(*) FROM people")?,
        links: link_counts(&tx)?,
        started_at,
        finished_at: Utc::now(),
    };

    tx.commit().context("Failed committing catalog rebuild")?;
    Ok(report)
}

/// Returns how many rows were skipped for lacking a show id.
fn insert_shows(conn: &Connection, rows: &[SourceRow]) -> Result<usize> {
    let mut shows = conn.prepare_cached(
        "INSERT INTO shows(show_id,title,releaseDate,rating,description,duration,num_seasons,tagline) VALUES(?1,?2,?3,?4,?5,?6,?7,?8)",
    )?;
    let mut metascore = conn.prepare_cached(
        "INSERT INTO metascore(show_id,metascore,metascore_count) VALUES(?1,?2,?3)",
    )?;
    let mut userscore = conn.prepare_cached(
        "INSERT INTO userscore(show_id,userscore,userscore_count) VALUES(?1,?2,?3)",
    )?;

    let mut skipped = 0usize;
    for row in rows {
        let Some(show_id) = row.show_id else {
            debug!(title = %row.title, "Skipping show row without id");
            skipped += 1;
            continue;
        };

        shows
            .execute(params![
                show_id,
                row.title,
                row.release_date,
                row.rating,
                row.description,
                row.duration,
                row.num_seasons,
                row.tagline
            ])
            .with_context(|| format!("Failed inserting show {show_id}"))?;
        metascore.execute(params![show_id, row.metascore, row.metascore_count])?;
        userscore.execute(params![show_id, row.userscore, row.userscore_count])?;
    }
    Ok(skipped)
}

/// Inserts the distinct names of one delimited column, in first-seen order.
fn insert_lookup_names(
    conn: &Connection,
    lookup: Lookup,
    rows: &[SourceRow],
) -> Result<usize> {
    let mut seen = HashSet::new();
    let mut added = 0usize;
    for name in rows.iter().flat_map(|row| split_names(row.names(lookup))) {
        if seen.insert(name) && insert_lookup_name(conn, lookup, name)? {
            added += 1;
        }
    }
    Ok(added)
}

fn link_lookup(
    conn: &Connection,
    lookup: Lookup,
    rows: &[SourceRow],
) -> Result<usize> {
    let mut linked = 0usize;
    for row in rows {
        let Some(show_id) = row.show_id else {
            continue;
        };
        for name in split_names(row.names(lookup)) {
            let id = lookup_id(conn, lookup, name)?;
            let mut stmt = conn.prepare_cached(lookup.link_sql())?;
            linked += stmt.execute(params![show_id, id])?;
        }
    }
    Ok(linked)
}

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}

fn link_counts(conn: &Connection) -> Result<LinkCounts> {
    Ok(LinkCounts {
        types: count(conn, "SELECT COUNT(*) FROM types")?,
        production: count(conn, "SELECT COUNT(*) FROM production")?,
        directors: count(conn, Role::Director.count_sql())?,
        writers: count(conn, Role::Writer.count_sql())?,
        top_cast: count(conn, Role::Cast.count_sql())?,
        creators: count(conn, Role::Creator.count_sql())?,
    })
}
