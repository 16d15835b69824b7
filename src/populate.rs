use anyhow::Result;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::{
    dedup::resolve_person,
    models::Role,
    source::{split_names, SourceRow},
};

/// Links every show to the people named in its `role` column.
///
/// Rows without a show id are skipped. Pairs already present are left alone,
/// so re-running over the same rows adds nothing. Returns the number of new
/// links.
pub fn populate(conn: &Connection, rows: &[SourceRow], role: Role) -> Result<usize> {
    let mut inserted = 0usize;
    for row in rows {
        let Some(show_id) = row.show_id else {
            debug!(role = role.as_str(), title = %row.title, "Skipping row without show id");
            continue;
        };

        for name in split_names(row.people(role)) {
            let person_id = resolve_person(conn, name)?;
            let mut stmt = conn.prepare_cached(role.insert_link_sql())?;
            inserted += stmt.execute(params![show_id, person_id])?;
        }
    }
    Ok(inserted)
}
